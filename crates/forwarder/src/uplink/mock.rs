//! MockUplink - in-process recording uplink for tests and dry runs

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::{SparseFrame, Uplink, UplinkError};

#[derive(Debug, Default)]
struct Inner {
    posts: Mutex<Vec<Bytes>>,
    failing: AtomicBool,
    fail_next: AtomicUsize,
    attempts: AtomicUsize,
}

/// Uplink that records every accepted payload
///
/// Clones share state, so a test keeps one handle while the forwarder owns
/// another. Failed attempts are counted but not recorded.
#[derive(Debug, Clone, Default)]
pub struct MockUplink {
    inner: Arc<Inner>,
}

impl MockUplink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every POST until switched back
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::Release);
    }

    /// Fail the next `n` POSTs, then recover
    pub fn fail_next(&self, n: usize) {
        self.inner.fail_next.store(n, Ordering::Release);
    }

    /// Accepted payloads in arrival order
    pub fn payloads(&self) -> Vec<Bytes> {
        self.inner
            .posts
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }

    /// Accepted payloads decoded; undecodable payloads are skipped
    pub fn frames(&self) -> Vec<SparseFrame> {
        self.payloads()
            .iter()
            .filter_map(|p| codec::decode(p).ok())
            .collect()
    }

    pub fn post_count(&self) -> usize {
        self.inner.posts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Every POST attempt, including failed ones
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::Acquire)
    }

    fn should_fail(&self) -> bool {
        if self.inner.failing.load(Ordering::Acquire) {
            return true;
        }
        self.inner
            .fail_next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Uplink for MockUplink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn post(&self, payload: &[u8]) -> Result<(), UplinkError> {
        self.inner.attempts.fetch_add(1, Ordering::AcqRel);

        if self.should_fail() {
            return Err(UplinkError::new("mock", "simulated failure"));
        }

        self.inner
            .posts
            .lock()
            .map_err(|_| UplinkError::new("mock", "recorder lock poisoned"))?
            .push(Bytes::copy_from_slice(payload));
        Ok(())
    }
}
