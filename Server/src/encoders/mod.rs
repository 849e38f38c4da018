use bitcode::encode as bt_encode;
use tracing::{debug, instrument};

use cloud_frame::CloudFrame;

/// Wraps a cloud frame in the transport envelope: `PC2` magic plus the
/// bitcode payload.
#[instrument(skip_all)]
pub fn encode_frame(frame: &CloudFrame) -> Vec<u8> {
    let bitcode_raw = bt_encode(frame);

    debug!("Encoded frame to {} bytes", bitcode_raw.len());

    // We know the final size is 3 + bitcode_raw.len()
    // So we can reserve that up front:
    let mut encoded = Vec::with_capacity(3 + bitcode_raw.len());
    encoded.extend_from_slice(b"PC2");
    encoded.extend_from_slice(&bitcode_raw);

    encoded
}
