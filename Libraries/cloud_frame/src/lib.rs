mod reader;
mod types;
mod writer;

pub use reader::{DecodeError, PointReader, Points};
pub use types::{CloudFrame, FieldType, FrameHeader, FrameStamp, PointField, PointXYZI};
pub use writer::{encode_xyzi, xyzi_fields, XYZI_POINT_STEP};
