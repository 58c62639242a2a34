//! Binary tile container parsing.
//!
//! Both recognized container formats (mesh tiles and point tiles) share one
//! layout: a fixed 28-byte header followed by four length-prefixed sections
//! (feature table JSON, feature table binary, batch table JSON, batch table
//! binary) and an opaque payload. The declared section lengths must exactly
//! fit the buffer; any overrun is a [`FormatError`].

mod error;
mod header;
mod kind;
mod table;

pub use error::FormatError;
pub use header::{ContainerHeader, COMPOSITE_MAGIC, HEADER_LEN, MESH_MAGIC, POINT_MAGIC};
pub use kind::ContentKind;
pub use table::{BatchTable, FeatureTable};

use bytes::Bytes;

/// A fully sectioned tile container.
#[derive(Debug, Clone)]
pub struct TileContainer {
    pub header: ContainerHeader,
    pub feature_table: FeatureTable,
    pub batch_table: BatchTable,
    /// Bytes remaining after the four sections. For mesh tiles this is the
    /// opaque scene-graph payload; point tiles carry their data in the
    /// feature table binary instead.
    pub payload: Bytes,
}

/// Parse a container buffer against an expected magic tag.
///
/// Section boundaries are validated before any slice is taken, so a failed
/// parse leaves no partial state behind.
pub fn parse_container(buf: Bytes, expected_magic: [u8; 4]) -> Result<TileContainer, FormatError> {
    let header = ContainerHeader::parse(&buf, expected_magic)?;

    let mut pos = HEADER_LEN;
    let feature_json = take_section(&buf, &mut pos, header.feature_json_len, "feature table JSON")?;
    let feature_binary =
        take_section(&buf, &mut pos, header.feature_binary_len, "feature table binary")?;
    let batch_json = take_section(&buf, &mut pos, header.batch_json_len, "batch table JSON")?;
    let batch_binary =
        take_section(&buf, &mut pos, header.batch_binary_len, "batch table binary")?;

    let feature_table = FeatureTable {
        json: table::parse_table_json("feature table JSON", &feature_json)?,
        binary: feature_binary,
    };
    let batch_table = BatchTable {
        json: table::parse_table_json("batch table JSON", &batch_json)?,
        binary: batch_binary,
    };

    Ok(TileContainer {
        header,
        feature_table,
        batch_table,
        payload: buf.slice(pos..),
    })
}

fn take_section(
    buf: &Bytes,
    pos: &mut usize,
    len: u32,
    section: &'static str,
) -> Result<Bytes, FormatError> {
    let len = len as usize;
    let end = pos.checked_add(len).ok_or(FormatError::SectionOverrun {
        section,
        needed: len,
        available: 0,
    })?;
    if end > buf.len() {
        return Err(FormatError::SectionOverrun {
            section,
            needed: len,
            available: buf.len().saturating_sub(*pos),
        });
    }
    let out = buf.slice(*pos..end);
    *pos = end;
    Ok(out)
}
