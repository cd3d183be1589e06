//! Connectivity - the only datum shared across threads
//!
//! Written by whatever observes the link (console, probe, RPC), read by the
//! forwarder once per frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Advisory online/offline flag, cheap to clone
#[derive(Debug, Clone)]
pub struct Connectivity(Arc<AtomicBool>);

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    #[inline]
    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the flag, returning the previous value
    pub fn set_online(&self, online: bool) -> bool {
        self.0.swap(online, Ordering::AcqRel)
    }

    /// Flip the flag, returning the new value
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
