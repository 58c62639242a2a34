//! Point tile decoding.
//!
//! Positions live in the feature table binary at `POSITION.byteOffset`;
//! when the draco compression extension is declared the compressed block is
//! handed to the external point codec instead. Color channels are read in
//! preference order RGBA, RGB; packed 16-bit modes are unsupported and the
//! cloud decodes colorless.

use tracing::{debug, warn};

use crate::container::TileContainer;
use crate::tileset::StyleParams;

use super::codec::PointCodec;
use super::content::PointContent;
use super::error::DecodeError;

const DRACO_EXTENSION: &str = "3DTILES_draco_point_compression";
const DEFAULT_POINT_SIZE: f32 = 1.0;

/// Decode a point container into a point cloud.
///
/// Missing or truncated position data is not an error: the tile decodes to
/// an empty cloud and simply renders nothing.
pub fn decode_points(
    codec: &dyn PointCodec,
    container: &TileContainer,
    style: &StyleParams,
) -> Result<PointContent, DecodeError> {
    let ft = &container.feature_table;
    let point_size = style.point_size.unwrap_or(DEFAULT_POINT_SIZE);

    let (Some(count), Some(position_offset)) = (ft.points_length(), ft.byte_offset("POSITION"))
    else {
        debug!("point tile without POINTS_LENGTH/POSITION; no point geometry");
        return Ok(PointContent {
            point_size,
            ..PointContent::default()
        });
    };

    let positions = if let Some(ext) = ft
        .json
        .get("extensions")
        .and_then(|e| e.get(DRACO_EXTENSION))
    {
        let offset = ext
            .get("byteOffset")
            .and_then(|v| v.as_u64())
            .unwrap_or(position_offset as u64) as usize;
        let length = ext
            .get("byteLength")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or_else(|| ft.binary.len().saturating_sub(offset));
        match ft.binary.get(offset..offset + length) {
            Some(block) => codec.decode_positions(block, count)?,
            None => {
                debug!(offset, length, "compressed position block out of range");
                Vec::new()
            }
        }
    } else {
        ft.read_positions(position_offset, count).unwrap_or_else(|| {
            debug!(count, position_offset, "position data out of range; no point geometry");
            Vec::new()
        })
    };

    if positions.is_empty() {
        return Ok(PointContent {
            point_size,
            ..PointContent::default()
        });
    }

    let colors = read_colors(ft, count);

    Ok(PointContent {
        positions,
        colors,
        rtc_center: ft.rtc_center(),
        point_size,
    })
}

/// Read per-point colors, normalizing 8-bit channels to unit floats.
fn read_colors(
    ft: &crate::container::FeatureTable,
    count: usize,
) -> Option<Vec<[f32; 4]>> {
    if let Some(offset) = ft.byte_offset("RGBA") {
        let data = ft.read_bytes(offset, count, 4)?;
        return Some(
            data.chunks_exact(4)
                .map(|c| {
                    [
                        c[0] as f32 / 255.0,
                        c[1] as f32 / 255.0,
                        c[2] as f32 / 255.0,
                        c[3] as f32 / 255.0,
                    ]
                })
                .collect(),
        );
    }
    if let Some(offset) = ft.byte_offset("RGB") {
        let data = ft.read_bytes(offset, count, 3)?;
        return Some(
            data.chunks_exact(3)
                .map(|c| {
                    [
                        c[0] as f32 / 255.0,
                        c[1] as f32 / 255.0,
                        c[2] as f32 / 255.0,
                        1.0,
                    ]
                })
                .collect(),
        );
    }
    if ft.has("RGB565") {
        warn!("packed 16-bit point colors are unsupported; rendering colorless");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{parse_container, HEADER_LEN, POINT_MAGIC};
    use bytes::Bytes;

    struct NoCodec;

    impl PointCodec for NoCodec {
        fn decode_positions(
            &self,
            _data: &[u8],
            _point_count: usize,
        ) -> Result<Vec<[f32; 3]>, DecodeError> {
            panic!("codec must not run for raw positions");
        }
    }

    fn point_container(ft_json: &str, ft_binary: &[u8]) -> TileContainer {
        let total = HEADER_LEN + ft_json.len() + ft_binary.len();
        let mut buf = Vec::new();
        buf.extend_from_slice(b"pnts");
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&(total as u32).to_le_bytes());
        buf.extend_from_slice(&(ft_json.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(ft_binary.len() as u32).to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(ft_json.as_bytes());
        buf.extend_from_slice(ft_binary);
        parse_container(Bytes::from(buf), POINT_MAGIC).unwrap()
    }

    fn positions_binary(points: &[[f32; 3]]) -> Vec<u8> {
        let mut out = Vec::new();
        for p in points {
            for c in p {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn test_raw_positions_decoded() {
        let bin = positions_binary(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let c = point_container(
            r#"{"POINTS_LENGTH":2,"POSITION":{"byteOffset":0}}"#,
            &bin,
        );
        let content = decode_points(&NoCodec, &c, &StyleParams::default()).unwrap();
        assert_eq!(content.positions, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert!(content.colors.is_none());
    }

    #[test]
    fn test_missing_position_is_empty_not_error() {
        let c = point_container(r#"{"POINTS_LENGTH":2}"#, &[]);
        let content = decode_points(&NoCodec, &c, &StyleParams::default()).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_truncated_positions_is_empty_not_error() {
        let c = point_container(
            r#"{"POINTS_LENGTH":100,"POSITION":{"byteOffset":0}}"#,
            &[0u8; 8],
        );
        let content = decode_points(&NoCodec, &c, &StyleParams::default()).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_rgba_normalized_to_unit_floats() {
        let mut bin = positions_binary(&[[0.0; 3], [0.0; 3]]);
        let rgba_offset = bin.len();
        bin.extend_from_slice(&[255, 0, 128, 255, 0, 255, 0, 0]);
        let json = format!(
            r#"{{"POINTS_LENGTH":2,"POSITION":{{"byteOffset":0}},"RGBA":{{"byteOffset":{rgba_offset}}}}}"#
        );
        let c = point_container(&json, &bin);
        let content = decode_points(&NoCodec, &c, &StyleParams::default()).unwrap();
        let colors = content.colors.unwrap();
        assert_eq!(colors[0][0], 1.0);
        assert_eq!(colors[0][1], 0.0);
        assert_eq!(colors[1][3], 0.0);
    }

    #[test]
    fn test_rgb_preferred_only_without_rgba() {
        let mut bin = positions_binary(&[[0.0; 3]]);
        let rgb_offset = bin.len();
        bin.extend_from_slice(&[255, 255, 0]);
        let json = format!(
            r#"{{"POINTS_LENGTH":1,"POSITION":{{"byteOffset":0}},"RGB":{{"byteOffset":{rgb_offset}}}}}"#
        );
        let c = point_container(&json, &bin);
        let content = decode_points(&NoCodec, &c, &StyleParams::default()).unwrap();
        let colors = content.colors.unwrap();
        assert_eq!(colors[0], [1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_packed_color_unsupported_yields_colorless() {
        let bin = positions_binary(&[[0.0; 3]]);
        let c = point_container(
            r#"{"POINTS_LENGTH":1,"POSITION":{"byteOffset":0},"RGB565":{"byteOffset":0}}"#,
            &bin,
        );
        let content = decode_points(&NoCodec, &c, &StyleParams::default()).unwrap();
        assert_eq!(content.positions.len(), 1);
        assert!(content.colors.is_none());
    }

    #[test]
    fn test_rtc_center_carried() {
        let bin = positions_binary(&[[0.0; 3]]);
        let c = point_container(
            r#"{"POINTS_LENGTH":1,"POSITION":{"byteOffset":0},"RTC_CENTER":[100.0,200.0,300.0]}"#,
            &bin,
        );
        let content = decode_points(&NoCodec, &c, &StyleParams::default()).unwrap();
        assert_eq!(content.rtc_center, Some([100.0, 200.0, 300.0]));
    }

    #[test]
    fn test_style_point_size_applied() {
        let style = StyleParams {
            point_size: Some(3.0),
            ..StyleParams::default()
        };
        let c = point_container(r#"{}"#, &[]);
        let content = decode_points(&NoCodec, &c, &style).unwrap();
        assert_eq!(content.point_size, 3.0);
    }

    struct CountingCodec;

    impl PointCodec for CountingCodec {
        fn decode_positions(
            &self,
            data: &[u8],
            point_count: usize,
        ) -> Result<Vec<[f32; 3]>, DecodeError> {
            assert_eq!(data, b"DRC");
            Ok(vec![[9.0, 9.0, 9.0]; point_count])
        }
    }

    #[test]
    fn test_compressed_block_routed_through_codec() {
        let json = format!(
            r#"{{"POINTS_LENGTH":2,"POSITION":{{"byteOffset":0}},"extensions":{{"{DRACO_EXTENSION}":{{"byteOffset":0,"byteLength":3}}}}}}"#
        );
        let c = point_container(&json, b"DRC");
        let content = decode_points(&CountingCodec, &c, &StyleParams::default()).unwrap();
        assert_eq!(content.positions.len(), 2);
        assert_eq!(content.positions[0], [9.0, 9.0, 9.0]);
    }
}
