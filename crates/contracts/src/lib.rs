//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the edge agent:
//! frame types, buffer rows, configuration, error kinds and the traits at the
//! pipeline seams (`Uplink`, `FrameStore`).
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `timestamp` is device-local epoch milliseconds, copied verbatim from the record
//! - resync cadence is driven by the agent's monotonic clock, never by record timestamps

mod agent_config;
mod connectivity;
mod error;
mod frame;
mod store;
mod uplink;
mod vin;

pub use agent_config::*;
pub use connectivity::Connectivity;
pub use error::*;
pub use frame::*;
pub use store::{BufferRow, FrameStore, Scan};
pub use uplink::{LocalUplink, Uplink};
pub use vin::{Vin, DEFAULT_VIN, VIN_LEN};
