use tracing::instrument;

use cloud_frame::CloudFrame;

/// Unwraps the transport envelope around a cloud frame: a 3-byte magic
/// followed by the bitcode payload.
#[instrument(skip_all)]
pub fn decode_frame(raw_data: Vec<u8>) -> Result<CloudFrame, Box<dyn std::error::Error>> {
    if raw_data.len() < 3 {
        return Err("Not enough data to contain header".into());
    }

    match &raw_data[0..3] {
        b"PC2" => Ok(bitcode::decode::<CloudFrame>(&raw_data[3..])?),
        _ => Err("Unsupported data format".into()),
    }
}
