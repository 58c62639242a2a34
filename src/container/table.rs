//! Feature and batch tables: a JSON object paired with a binary section.

use bytes::Bytes;
use serde_json::{Map, Value};

use super::error::FormatError;

/// Parse a JSON table section. A zero-length section yields an empty map.
pub(crate) fn parse_table_json(
    section: &'static str,
    bytes: &[u8],
) -> Result<Map<String, Value>, FormatError> {
    if bytes.is_empty() {
        return Ok(Map::new());
    }
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| FormatError::InvalidTableJson {
            section,
            message: e.to_string(),
        })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(FormatError::InvalidTableJson {
            section,
            message: format!("expected object, got {}", kind_of(&other)),
        }),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Structured description of a binary payload section: semantic fields in
/// JSON, their data in the binary block.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub json: Map<String, Value>,
    pub binary: Bytes,
}

impl FeatureTable {
    /// `POINTS_LENGTH` semantic: number of points in a point tile.
    pub fn points_length(&self) -> Option<usize> {
        self.json.get("POINTS_LENGTH")?.as_u64().map(|v| v as usize)
    }

    /// Byte offset of a semantic's data within the binary section, read
    /// from its `byteOffset` field.
    pub fn byte_offset(&self, semantic: &str) -> Option<usize> {
        self.json
            .get(semantic)?
            .get("byteOffset")?
            .as_u64()
            .map(|v| v as usize)
    }

    /// Whether a semantic is declared at all (with or without an offset).
    pub fn has(&self, semantic: &str) -> bool {
        self.json.contains_key(semantic)
    }

    /// `RTC_CENTER` semantic: center-of-mass offset for precision.
    pub fn rtc_center(&self) -> Option<[f64; 3]> {
        let arr = self.json.get("RTC_CENTER")?.as_array()?;
        if arr.len() != 3 {
            return None;
        }
        Some([arr[0].as_f64()?, arr[1].as_f64()?, arr[2].as_f64()?])
    }

    /// Slice `count` little-endian 3xf32 positions starting at `offset` in
    /// the binary section. Returns `None` when the section is too short.
    pub fn read_positions(&self, offset: usize, count: usize) -> Option<Vec<[f32; 3]>> {
        let needed = count.checked_mul(12)?;
        let end = offset.checked_add(needed)?;
        let data = self.binary.get(offset..end)?;
        let mut out = Vec::with_capacity(count);
        for chunk in data.chunks_exact(12) {
            out.push([
                f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
                f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
                f32::from_le_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]),
            ]);
        }
        Some(out)
    }

    /// Slice `count` fixed-width byte records starting at `offset`.
    pub fn read_bytes(&self, offset: usize, count: usize, stride: usize) -> Option<&[u8]> {
        let needed = count.checked_mul(stride)?;
        let end = offset.checked_add(needed)?;
        self.binary.get(offset..end)
    }
}

/// Per-primitive metadata table indexed by batch ID.
#[derive(Debug, Clone, Default)]
pub struct BatchTable {
    pub json: Map<String, Value>,
    pub binary: Bytes,
}

impl BatchTable {
    pub fn is_empty(&self) -> bool {
        self.json.is_empty()
    }

    /// Resolve all property columns at one batch index.
    ///
    /// Each JSON value is expected to be a per-feature array; scalar or
    /// out-of-range columns are skipped.
    pub fn properties_for(&self, batch_id: usize) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, column) in &self.json {
            if let Some(values) = column.as_array() {
                if let Some(v) = values.get(batch_id) {
                    out.insert(key.clone(), v.clone());
                }
            }
        }
        out
    }
}
