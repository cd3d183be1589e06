//! Forwarder metrics
//!
//! Thin wrappers over the `metrics` facade so every crate records the same
//! names and labels. Without an installed recorder these are no-ops.

use metrics::{counter, gauge, histogram};
use serde::Serialize;

/// Which path an upload took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Freshly admitted frame
    Live,
    /// Replayed buffer row
    Drain,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Live => "live",
            UploadKind::Drain => "drain",
        }
    }
}

/// Why a frame went to the buffer instead of the uplink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferReason {
    /// Connectivity flag was off
    Offline,
    /// Live POST failed
    UploadFailed,
    /// A drain pass aborted before this frame
    DrainAborted,
}

impl BufferReason {
    pub fn as_str(self) -> &'static str {
        match self {
            BufferReason::Offline => "offline",
            BufferReason::UploadFailed => "upload_failed",
            BufferReason::DrainAborted => "drain_aborted",
        }
    }
}

/// Record one POST attempt
pub fn record_upload(kind: UploadKind, success: bool, latency_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "telemetry_agent_uploads_total",
        "kind" => kind.as_str(),
        "status" => status
    )
    .increment(1);
    histogram!("telemetry_agent_upload_latency_ms", "kind" => kind.as_str()).record(latency_ms);
}

/// Record a frame persisted to the offline buffer
pub fn record_buffered(reason: BufferReason) {
    counter!("telemetry_agent_frames_buffered_total", "reason" => reason.as_str()).increment(1);
}

/// Record a failed buffer operation
pub fn record_buffer_error(operation: &'static str) {
    counter!("telemetry_agent_buffer_errors_total", "operation" => operation).increment(1);
}

/// Record a buffered row that could not be decoded
pub fn record_decode_error() {
    counter!("telemetry_agent_decode_errors_total").increment(1);
}

/// Record the outcome of one drain pass
pub fn record_drain_pass(uploaded: u64, clean: bool) {
    let status = if clean { "complete" } else { "aborted" };
    counter!("telemetry_agent_drain_passes_total", "status" => status).increment(1);
    counter!("telemetry_agent_rows_drained_total").increment(uploaded);
}

/// Current number of rows waiting in the buffer
pub fn record_buffer_depth(rows: u64) {
    gauge!("telemetry_agent_buffer_rows").set(rows as f64);
}

/// Connectivity flag as observed by the forwarder
pub fn record_connectivity(online: bool) {
    gauge!("telemetry_agent_online").set(if online { 1.0 } else { 0.0 });
}

/// Predictor counters and derived compression ratio
pub fn record_compression(total: u64, transmitted: u64, skipped: u64) {
    gauge!("telemetry_agent_predictor_total").set(total as f64);
    gauge!("telemetry_agent_predictor_transmitted").set(transmitted as f64);
    gauge!("telemetry_agent_predictor_skipped").set(skipped as f64);
    if total > 0 {
        gauge!("telemetry_agent_compression_ratio_percent")
            .set(skipped as f64 / total as f64 * 100.0);
    }
}

/// Statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
