//! # Predictor
//!
//! Predictive compression filter for vehicle telemetry.
//!
//! Responsibilities:
//! - Track an exponentially smoothed estimate per filtered signal
//! - Decide per frame which signals diverged beyond their threshold
//! - Force a self-sufficient resync frame on a monotonic-clock cadence
//! - Count transmitted vs skipped frames
//!
//! The `Reconstructor` is the receiving side's mirror: fed only the sparse
//! frames, it rebuilds a full stream.
//!
//! ## Usage Example
//!
//! ```ignore
//! use predictor::Predictor;
//!
//! let mut predictor = Predictor::new(config.predictor.clone());
//! let admission = predictor.admit(&state);
//! let bytes = codec::encode(&admission.frame);
//! ```

mod clock;
mod estimator;
mod predictor;
mod reconstruct;
mod stats;

// Re-exports
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use contracts::{FieldDecisions, PredictorConfig, SparseFrame, VehicleState};
pub use estimator::Ewma;
pub use predictor::{Admission, Predictor};
pub use reconstruct::{ReconstructedFrame, Reconstructor};
pub use stats::CompressionStats;
