//! # Ingestion
//!
//! Raw vehicle-state record source.
//!
//! Responsibilities:
//! - Open the per-vehicle newline-delimited JSON log
//! - Parse each line (vehicle-API nested shape or flat shape) into a `RawFrame`
//! - Report malformed lines as `SourceParseError` without ending the stream
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::JsonlSource;
//!
//! let source = JsonlSource::open("data/vehicle_logs/tesla_log_5YJ3E1EA1KF000001.jsonl")?;
//! for item in source {
//!     match item {
//!         Ok(frame) => { /* admit */ }
//!         Err(e) => { /* log and continue */ }
//!     }
//! }
//! ```

mod error;
mod metrics;
mod record;
mod source;

// Re-exports
pub use contracts::{RawFrame, SourceParseError};
pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use record::parse_record;
pub use source::JsonlSource;
