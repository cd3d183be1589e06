//! Compression counters

use serde::Serialize;

/// Transmitted/skipped counter triple
///
/// `total == transmitted + skipped` after every admitted frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompressionStats {
    pub total: u64,
    pub transmitted: u64,
    pub skipped: u64,
}

impl CompressionStats {
    pub(crate) fn record(&mut self, transmitted: bool) {
        self.total += 1;
        if transmitted {
            self.transmitted += 1;
        } else {
            self.skipped += 1;
        }
    }

    /// Share of frames that carried no optional field, in percent
    pub fn compression_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.skipped as f64 / self.total as f64 * 100.0
        }
    }
}
