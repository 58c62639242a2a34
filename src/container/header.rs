//! Fixed 28-byte container header.
//!
//! Layout (all fields little-endian u32 except the magic tag):
//!
//! ```text
//!   00 : [u8;4] magic ("b3dm" / "pnts" / "cmpt")
//!   04 : u32    version
//!   08 : u32    total byte length
//!   0C : u32    feature table JSON byte length
//!   10 : u32    feature table binary byte length
//!   14 : u32    batch table JSON byte length
//!   18 : u32    batch table binary byte length
//! ```

use super::error::FormatError;

/// Header length in bytes.
pub const HEADER_LEN: usize = 28;

/// Magic tag for mesh tile containers.
pub const MESH_MAGIC: [u8; 4] = *b"b3dm";
/// Magic tag for point tile containers.
pub const POINT_MAGIC: [u8; 4] = *b"pnts";
/// Magic tag for composite containers (recognized, unimplemented).
pub const COMPOSITE_MAGIC: [u8; 4] = *b"cmpt";

/// Parsed container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub total_byte_length: u32,
    pub feature_json_len: u32,
    pub feature_binary_len: u32,
    pub batch_json_len: u32,
    pub batch_binary_len: u32,
}

impl ContainerHeader {
    /// Parse the fixed header and verify the magic tag.
    pub fn parse(buf: &[u8], expected_magic: [u8; 4]) -> Result<Self, FormatError> {
        if buf.len() < HEADER_LEN {
            return Err(FormatError::HeaderTruncated {
                needed: HEADER_LEN,
                available: buf.len(),
            });
        }
        let magic = [buf[0], buf[1], buf[2], buf[3]];
        if magic != expected_magic {
            return Err(FormatError::BadMagic {
                expected: String::from_utf8_lossy(&expected_magic).into_owned(),
                actual: String::from_utf8_lossy(&magic).into_owned(),
            });
        }
        Ok(Self {
            magic,
            version: read_u32(buf, 4),
            total_byte_length: read_u32(buf, 8),
            feature_json_len: read_u32(buf, 12),
            feature_binary_len: read_u32(buf, 16),
            batch_json_len: read_u32(buf, 20),
            batch_binary_len: read_u32(buf, 24),
        })
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(magic: &[u8; 4], fields: [u32; 6]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(magic);
        for f in fields {
            out.extend_from_slice(&f.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_parse_valid_header() {
        let buf = header_bytes(b"b3dm", [1, 100, 10, 20, 30, 40]);
        let h = ContainerHeader::parse(&buf, MESH_MAGIC).unwrap();
        assert_eq!(h.version, 1);
        assert_eq!(h.total_byte_length, 100);
        assert_eq!(h.feature_json_len, 10);
        assert_eq!(h.feature_binary_len, 20);
        assert_eq!(h.batch_json_len, 30);
        assert_eq!(h.batch_binary_len, 40);
    }

    #[test]
    fn test_parse_wrong_magic() {
        let buf = header_bytes(b"pnts", [1, 100, 0, 0, 0, 0]);
        let err = ContainerHeader::parse(&buf, MESH_MAGIC).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic { .. }));
    }

    #[test]
    fn test_parse_short_buffer() {
        let err = ContainerHeader::parse(b"b3dm\x01", MESH_MAGIC).unwrap_err();
        assert!(matches!(err, FormatError::HeaderTruncated { .. }));
    }
}
