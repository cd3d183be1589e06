//! # Integration Tests
//!
//! End-to-end tests of the edge agent without a real cloud.
//!
//! Covers:
//! - Scenarios: offline burst, uplink failure, threshold filtering, forced
//!   resync, malformed input, per-vehicle isolation
//! - Properties: durability, reconstructibility, conservation, drain order,
//!   idempotent remove, resync cadence

#[cfg(test)]
mod support;

#[cfg(test)]
mod scenarios;

#[cfg(test)]
mod properties;
