//! Uplink implementations

mod http;
mod mock;

pub use http::{HttpUplink, COMPRESSED_HEADER, VIN_HEADER};
pub use mock::MockUplink;
