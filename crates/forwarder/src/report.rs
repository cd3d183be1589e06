//! End-of-run report

use observability::StatsSummary;
use predictor::CompressionStats;
use serde::Serialize;

use crate::metrics::MetricsSnapshot;

/// Everything a run did, returned when the source is exhausted
#[derive(Debug, Clone, Serialize)]
pub struct ForwarderReport {
    pub vin: String,
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    /// Rows still buffered at shutdown (`None` if the count failed)
    pub rows_remaining: Option<u64>,
    /// True if the run ended with undrained rows or an aborted drain
    pub degraded: bool,
    pub compression: CompressionStats,
    pub upload_latency_ms: StatsSummary,
}

impl ForwarderReport {
    /// Share of frames that carried no optional field, in percent
    pub fn compression_ratio(&self) -> f64 {
        self.compression.compression_ratio()
    }
}
