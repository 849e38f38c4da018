use bitcode::{Decode as DecodeBitcode, Encode as EncodeBitcode};
use serde::{Deserialize, Serialize};

/// Scalar datatype of one channel within a packed point record.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, EncodeBitcode, DecodeBitcode, PartialEq, Eq)]
pub enum FieldType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl FieldType {
    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            FieldType::Int8 | FieldType::UInt8 => 1,
            FieldType::Int16 | FieldType::UInt16 => 2,
            FieldType::Int32 | FieldType::UInt32 | FieldType::Float32 => 4,
            FieldType::Float64 => 8,
        }
    }
}

/// Metadata locating one named channel within a point record.
/// Names are unique within a frame.
#[derive(Clone, Debug, Deserialize, Serialize, EncodeBitcode, DecodeBitcode, PartialEq)]
pub struct PointField {
    pub name: String,
    pub offset: u32,
    pub datatype: FieldType,
    pub count: u32,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, EncodeBitcode, DecodeBitcode, PartialEq, Eq)]
pub struct FrameStamp {
    pub sec: u32,
    pub nsec: u32,
}

impl FrameStamp {
    /// Seconds as a float, for display only. The stamp itself is never
    /// recomputed when a frame is republished.
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 * 1e-9
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, EncodeBitcode, DecodeBitcode, PartialEq)]
pub struct FrameHeader {
    pub stamp: FrameStamp,
    pub frame_id: String,
}

/// A timestamped point-cloud frame packed as fixed-stride binary records.
///
/// `data` holds `height` rows of `width` records each; a record starts every
/// `point_step` bytes within a row and a row starts every `row_step` bytes.
#[derive(Clone, Debug, Deserialize, Serialize, EncodeBitcode, DecodeBitcode, PartialEq)]
pub struct CloudFrame {
    pub header: FrameHeader,
    pub height: u32,
    pub width: u32,
    pub fields: Vec<PointField>,
    pub is_bigendian: bool,
    pub point_step: u32,
    pub row_step: u32,
    pub data: Vec<u8>,
}

/// The four channels the filter consumes, extracted by name.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointXYZI {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

impl PointXYZI {
    /// A record with a NaN or infinite coordinate carries no usable geometry
    /// and is excluded before any intensity comparison.
    pub fn has_finite_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_position_predicate() {
        let finite = PointXYZI { x: 1.0, y: -2.0, z: 0.0, intensity: 500.0 };
        assert!(finite.has_finite_position());

        let nan_x = PointXYZI { x: f32::NAN, ..finite };
        assert!(!nan_x.has_finite_position());

        let inf_z = PointXYZI { z: f32::INFINITY, ..finite };
        assert!(!inf_z.has_finite_position());

        // Intensity is not part of the geometry check
        let nan_intensity = PointXYZI { intensity: f32::NAN, ..finite };
        assert!(nan_intensity.has_finite_position());
    }

    #[test]
    fn stamp_converts_to_seconds() {
        let stamp = FrameStamp { sec: 12, nsec: 500_000_000 };
        assert!((stamp.as_secs_f64() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn field_type_sizes() {
        assert_eq!(FieldType::UInt8.size(), 1);
        assert_eq!(FieldType::Int16.size(), 2);
        assert_eq!(FieldType::Float32.size(), 4);
        assert_eq!(FieldType::Float64.size(), 8);
    }
}
