use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::types::{CloudFrame, FieldType, PointXYZI};

/// Frame-local decoding failures. A frame that fails to decode is dropped
/// and the next frame is attempted; nothing here is fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// One of the requested channels is absent from the frame's field list.
    MissingField(String),
    /// A resolved field does not fit inside a single point record.
    FieldOutOfBounds {
        name: String,
        offset: u32,
        point_step: u32,
    },
    /// The data buffer is smaller than the layout claims.
    TruncatedData { expected: usize, actual: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingField(name) => {
                write!(f, "point field '{}' is missing from the frame", name)
            }
            DecodeError::FieldOutOfBounds { name, offset, point_step } => write!(
                f,
                "point field '{}' at offset {} does not fit in a point record of {} bytes",
                name, offset, point_step
            ),
            DecodeError::TruncatedData { expected, actual } => write!(
                f,
                "frame data is {} bytes, layout requires at least {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Clone, Copy, Debug)]
struct ResolvedField {
    offset: usize,
    datatype: FieldType,
}

/// Decodes x/y/z/intensity records out of a packed cloud frame.
///
/// The four channels are resolved by name once at construction and the
/// resulting offsets are reused for every record, instead of scanning the
/// field list per point.
#[derive(Debug)]
pub struct PointReader<'a> {
    frame: &'a CloudFrame,
    x: ResolvedField,
    y: ResolvedField,
    z: ResolvedField,
    intensity: ResolvedField,
}

impl<'a> PointReader<'a> {
    pub fn new(frame: &'a CloudFrame) -> Result<Self, DecodeError> {
        let x = resolve_field(frame, "x")?;
        let y = resolve_field(frame, "y")?;
        let z = resolve_field(frame, "z")?;
        let intensity = resolve_field(frame, "intensity")?;

        // The furthest byte any record read can touch. Fields were already
        // checked to fit within point_step.
        let expected = if frame.width == 0 || frame.height == 0 {
            0
        } else {
            (frame.height as usize - 1) * frame.row_step as usize
                + frame.width as usize * frame.point_step as usize
        };
        if frame.data.len() < expected {
            return Err(DecodeError::TruncatedData {
                expected,
                actual: frame.data.len(),
            });
        }

        Ok(Self { frame, x, y, z, intensity })
    }

    /// Lazy pass over all `width * height` record slots in row-major order.
    /// Restartable only by calling `points` again.
    pub fn points(&self) -> Points<'a> {
        Points {
            frame: self.frame,
            x: self.x,
            y: self.y,
            z: self.z,
            intensity: self.intensity,
            index: 0,
            total: self.frame.width as usize * self.frame.height as usize,
        }
    }
}

fn resolve_field(frame: &CloudFrame, name: &str) -> Result<ResolvedField, DecodeError> {
    let field = frame
        .fields
        .iter()
        .find(|field| field.name == name)
        .ok_or_else(|| DecodeError::MissingField(name.to_owned()))?;

    if field.offset as usize + field.datatype.size() > frame.point_step as usize {
        return Err(DecodeError::FieldOutOfBounds {
            name: name.to_owned(),
            offset: field.offset,
            point_step: frame.point_step,
        });
    }

    Ok(ResolvedField {
        offset: field.offset as usize,
        datatype: field.datatype,
    })
}

/// Iterator returned by [`PointReader::points`].
#[derive(Debug)]
pub struct Points<'a> {
    frame: &'a CloudFrame,
    x: ResolvedField,
    y: ResolvedField,
    z: ResolvedField,
    intensity: ResolvedField,
    index: usize,
    total: usize,
}

impl Iterator for Points<'_> {
    type Item = PointXYZI;

    fn next(&mut self) -> Option<PointXYZI> {
        if self.index >= self.total {
            return None;
        }

        let width = self.frame.width as usize;
        let row = self.index / width;
        let col = self.index % width;
        let base = row * self.frame.row_step as usize + col * self.frame.point_step as usize;
        self.index += 1;

        let data = &self.frame.data;
        let big_endian = self.frame.is_bigendian;
        Some(PointXYZI {
            x: read_scalar(data, base + self.x.offset, self.x.datatype, big_endian),
            y: read_scalar(data, base + self.y.offset, self.y.datatype, big_endian),
            z: read_scalar(data, base + self.z.offset, self.z.datatype, big_endian),
            intensity: read_scalar(
                data,
                base + self.intensity.offset,
                self.intensity.datatype,
                big_endian,
            ),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}

fn read_scalar(data: &[u8], offset: usize, datatype: FieldType, big_endian: bool) -> f32 {
    let bytes = &data[offset..offset + datatype.size()];
    match datatype {
        FieldType::Int8 => bytes[0] as i8 as f32,
        FieldType::UInt8 => bytes[0] as f32,
        FieldType::Int16 => (if big_endian {
            BigEndian::read_i16(bytes)
        } else {
            LittleEndian::read_i16(bytes)
        }) as f32,
        FieldType::UInt16 => (if big_endian {
            BigEndian::read_u16(bytes)
        } else {
            LittleEndian::read_u16(bytes)
        }) as f32,
        FieldType::Int32 => (if big_endian {
            BigEndian::read_i32(bytes)
        } else {
            LittleEndian::read_i32(bytes)
        }) as f32,
        FieldType::UInt32 => (if big_endian {
            BigEndian::read_u32(bytes)
        } else {
            LittleEndian::read_u32(bytes)
        }) as f32,
        FieldType::Float32 => {
            if big_endian {
                BigEndian::read_f32(bytes)
            } else {
                LittleEndian::read_f32(bytes)
            }
        }
        FieldType::Float64 => (if big_endian {
            BigEndian::read_f64(bytes)
        } else {
            LittleEndian::read_f64(bytes)
        }) as f32,
    }
}
