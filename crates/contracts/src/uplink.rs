//! Uplink trait - Forwarder output interface
//!
//! Defines the abstract "POST bytes" interface towards the ingestion endpoint.

use crate::UplinkError;

/// Stateless uplink to the cloud endpoint
///
/// Every call either completes within the implementation's timeout or fails;
/// a failure leaves no partial state behind. Retry policy belongs to the caller.
#[trait_variant::make(Uplink: Send)]
pub trait LocalUplink {
    /// Uplink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one encoded frame
    ///
    /// # Errors
    /// Any transport failure, timeout or non-2xx response
    async fn post(&self, payload: &[u8]) -> Result<(), UplinkError>;
}
