//! Error type for binary tile container parsing.

use thiserror::Error;

/// Errors raised while parsing a binary tile container or dispatching on
/// its content kind.
#[derive(Debug, Error)]
pub enum FormatError {
    /// First four bytes did not match the expected magic tag.
    #[error("bad magic: expected {expected:?}, got {actual:?}")]
    BadMagic { expected: String, actual: String },

    /// Buffer too short for the fixed header.
    #[error("container header truncated: need {needed} bytes, have {available}")]
    HeaderTruncated { needed: usize, available: usize },

    /// A declared section length would read past the end of the buffer.
    #[error("{section} section overruns buffer: need {needed} bytes, {available} remain")]
    SectionOverrun {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    /// A JSON table section did not parse as a JSON object.
    #[error("{section} table is not valid JSON: {message}")]
    InvalidTableJson {
        section: &'static str,
        message: String,
    },

    /// Content kind is recognized but has no implementation.
    #[error("composite tiles not implemented")]
    UnimplementedKind,

    /// Content kind could not be determined from declaration or payload.
    #[error("unrecognized content kind for {url}")]
    UnknownKind { url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic_display() {
        let err = FormatError::BadMagic {
            expected: "b3dm".to_string(),
            actual: "pnts".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("b3dm"));
        assert!(msg.contains("pnts"));
    }

    #[test]
    fn test_section_overrun_display() {
        let err = FormatError::SectionOverrun {
            section: "feature table JSON",
            needed: 100,
            available: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("feature table JSON"));
        assert!(msg.contains("100"));
        assert!(msg.contains("10"));
    }
}
