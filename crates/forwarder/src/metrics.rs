//! Forwarder metrics for reporting

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one forwarder run
#[derive(Debug, Default)]
pub struct ForwarderMetrics {
    frames_read: AtomicU64,
    parse_errors: AtomicU64,
    live_posts: AtomicU64,
    live_failures: AtomicU64,
    buffered: AtomicU64,
    buffer_errors: AtomicU64,
    drained: AtomicU64,
    drain_failures: AtomicU64,
    decode_errors: AtomicU64,
}

macro_rules! counter_ops {
    ($($field:ident => $inc:ident),* $(,)?) => {
        impl ForwarderMetrics {
            $(
                pub fn $inc(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }

                pub fn $field(&self) -> u64 {
                    self.$field.load(Ordering::Relaxed)
                }
            )*
        }
    };
}

counter_ops! {
    frames_read => inc_frames_read,
    parse_errors => inc_parse_errors,
    live_posts => inc_live_posts,
    live_failures => inc_live_failures,
    buffered => inc_buffered,
    buffer_errors => inc_buffer_errors,
    drained => inc_drained,
    drain_failures => inc_drain_failures,
    decode_errors => inc_decode_errors,
}

impl ForwarderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_read: self.frames_read(),
            parse_errors: self.parse_errors(),
            live_posts: self.live_posts(),
            live_failures: self.live_failures(),
            buffered: self.buffered(),
            buffer_errors: self.buffer_errors(),
            drained: self.drained(),
            drain_failures: self.drain_failures(),
            decode_errors: self.decode_errors(),
        }
    }
}

/// Snapshot of forwarder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Records pulled from the source (parsed or not)
    pub frames_read: u64,
    pub parse_errors: u64,
    /// Successful live POSTs
    pub live_posts: u64,
    pub live_failures: u64,
    /// Rows appended to the buffer
    pub buffered: u64,
    pub buffer_errors: u64,
    /// Rows uploaded and removed by drain passes
    pub drained: u64,
    /// Drain passes aborted by an upload failure
    pub drain_failures: u64,
    pub decode_errors: u64,
}
