//! # Forwarder
//!
//! Store-and-forward orchestration for one vehicle.
//!
//! Responsibilities:
//! - Pull raw frames, fill gaps, run them through the predictor
//! - Route encoded frames to the uplink while online and healthy
//! - Persist self-sufficient resync frames while offline or after a failure
//! - Drain the buffer, oldest first, before live frames resume
//!
//! ## Usage Example
//!
//! ```ignore
//! use forwarder::{Forwarder, HttpUplink};
//!
//! let uplink = HttpUplink::new(&config.uplink, vin.clone())?;
//! let store = store::SqliteBuffer::open(&path, None)?;
//! let mut forwarder = Forwarder::new(vin, config.forwarder, predictor, uplink, store, connectivity);
//! let report = forwarder.run(source).await;
//! ```

mod fill;
mod forwarder;
pub mod metrics;
mod report;
pub mod uplink;

pub use contracts::{Connectivity, FrameStore, Uplink};
pub use fill::LastKnown;
pub use forwarder::{DrainOutcome, Forwarder};
pub use metrics::{ForwarderMetrics, MetricsSnapshot};
pub use report::ForwarderReport;
pub use uplink::{HttpUplink, MockUplink};
