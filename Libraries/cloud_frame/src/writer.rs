use byteorder::{ByteOrder, LittleEndian};

use crate::types::{CloudFrame, FieldType, FrameHeader, PointField, PointXYZI};

/// Byte stride of one x/y/z/intensity record in an encoded frame.
pub const XYZI_POINT_STEP: u32 = 16;

/// The fixed output layout: x@0, y@4, z@8, intensity@12, all Float32.
pub fn xyzi_fields() -> Vec<PointField> {
    vec![
        PointField { name: "x".to_owned(), offset: 0, datatype: FieldType::Float32, count: 1 },
        PointField { name: "y".to_owned(), offset: 4, datatype: FieldType::Float32, count: 1 },
        PointField { name: "z".to_owned(), offset: 8, datatype: FieldType::Float32, count: 1 },
        PointField {
            name: "intensity".to_owned(),
            offset: 12,
            datatype: FieldType::Float32,
            count: 1,
        },
    ]
}

/// Packs points into a single-row little-endian frame with the fixed
/// x/y/z/intensity layout. The header is carried over verbatim; the stamp
/// and frame id are never recomputed.
pub fn encode_xyzi(header: FrameHeader, points: &[PointXYZI]) -> CloudFrame {
    let width = points.len() as u32;
    let mut data = vec![0u8; points.len() * XYZI_POINT_STEP as usize];
    for (slot, point) in data.chunks_exact_mut(XYZI_POINT_STEP as usize).zip(points) {
        LittleEndian::write_f32(&mut slot[0..4], point.x);
        LittleEndian::write_f32(&mut slot[4..8], point.y);
        LittleEndian::write_f32(&mut slot[8..12], point.z);
        LittleEndian::write_f32(&mut slot[12..16], point.intensity);
    }

    CloudFrame {
        header,
        height: 1,
        width,
        fields: xyzi_fields(),
        is_bigendian: false,
        point_step: XYZI_POINT_STEP,
        row_step: XYZI_POINT_STEP * width,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrameStamp;

    fn header() -> FrameHeader {
        FrameHeader {
            stamp: FrameStamp { sec: 1714, nsec: 250_000_000 },
            frame_id: "velodyne".to_owned(),
        }
    }

    #[test]
    fn output_layout_is_fixed() {
        let points = [
            PointXYZI { x: 1.0, y: 2.0, z: 3.0, intensity: 150.0 },
            PointXYZI { x: 4.0, y: 5.0, z: 6.0, intensity: 200.0 },
        ];
        let frame = encode_xyzi(header(), &points);

        assert_eq!(frame.height, 1);
        assert_eq!(frame.width, 2);
        assert_eq!(frame.point_step, 16);
        assert_eq!(frame.row_step, 32);
        assert!(!frame.is_bigendian);
        assert_eq!(frame.data.len(), 32);

        let offsets: Vec<(String, u32)> = frame
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.offset))
            .collect();
        assert_eq!(
            offsets,
            vec![
                ("x".to_owned(), 0),
                ("y".to_owned(), 4),
                ("z".to_owned(), 8),
                ("intensity".to_owned(), 12)
            ]
        );
        assert!(frame.fields.iter().all(|field| field.datatype == FieldType::Float32));
    }

    #[test]
    fn header_is_copied_verbatim() {
        let frame = encode_xyzi(header(), &[]);
        assert_eq!(frame.header, header());
        assert_eq!(frame.width, 0);
        assert!(frame.data.is_empty());
    }

    #[test]
    fn serializes_records_little_endian() {
        let points = [PointXYZI { x: 1.0, y: -2.0, z: 0.5, intensity: 200.0 }];
        let frame = encode_xyzi(header(), &points);

        assert_eq!(LittleEndian::read_f32(&frame.data[0..4]), 1.0);
        assert_eq!(LittleEndian::read_f32(&frame.data[4..8]), -2.0);
        assert_eq!(LittleEndian::read_f32(&frame.data[8..12]), 0.5);
        assert_eq!(LittleEndian::read_f32(&frame.data[12..16]), 200.0);
    }

    #[test]
    fn encoding_is_deterministic() {
        let points = [
            PointXYZI { x: 1.0, y: 2.0, z: 3.0, intensity: 150.0 },
            PointXYZI { x: 4.0, y: 5.0, z: 6.0, intensity: 200.0 },
        ];
        let first = encode_xyzi(header(), &points);
        let second = encode_xyzi(header(), &points);
        assert_eq!(first, second);
        assert_eq!(first.data, second.data);
    }
}
