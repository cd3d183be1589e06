//! # Codec
//!
//! Wire codec for `SparseFrame`, the contract with the ingestion server.
//!
//! The schema (`proto/telemetry.proto`) is protobuf with proto3 `optional`
//! scalars, so an absent field stays distinguishable from a zero value.
//!
//! ```
//! use codec::{decode, encode};
//! use contracts::{SparseFrame, VehicleState};
//!
//! let state = VehicleState { timestamp: 1000, odometer: 1.5, ..Default::default() };
//! let frame = SparseFrame::resync(&state);
//! let bytes = encode(&frame);
//! assert_eq!(decode(&bytes).unwrap(), frame);
//! ```

mod wire;

use bytes::Bytes;
use contracts::{DecodeError, SparseFrame};
use prost::Message;

pub use wire::WireFrame;

/// Content type announced on every upload
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Serialize a frame to its wire bytes
pub fn encode(frame: &SparseFrame) -> Bytes {
    Bytes::from(WireFrame::from(frame).encode_to_vec())
}

/// Parse wire bytes, enforcing the resync invariant
///
/// # Errors
/// - `DecodeError::Malformed` if the bytes are not a valid message
/// - `DecodeError::IncompleteResync` if `is_resync` is set but a field is absent
pub fn decode(bytes: &[u8]) -> Result<SparseFrame, DecodeError> {
    let wire = WireFrame::decode(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let frame = SparseFrame::from(wire);

    if let Some(field) = frame.missing_for_resync() {
        return Err(DecodeError::IncompleteResync {
            timestamp: frame.timestamp,
            field: field.wire_name(),
        });
    }

    Ok(frame)
}
