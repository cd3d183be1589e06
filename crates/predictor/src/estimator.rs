//! Per-signal exponentially weighted moving average.
//!
//! Update rule `x̂ ← α·x + (1−α)·x̂`; the first observation seeds the
//! estimate directly.

/// EWMA estimator for one signal
#[derive(Debug, Clone, Copy)]
pub struct Ewma {
    alpha: f64,
    estimate: f64,
    has_sample: bool,
}

impl Ewma {
    /// Create an empty estimator. `alpha` is clamped into (0, 1].
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::MIN_POSITIVE, 1.0),
            estimate: 0.0,
            has_sample: false,
        }
    }

    /// Current estimate, `None` before the first observation
    pub fn estimate(&self) -> Option<f64> {
        self.has_sample.then_some(self.estimate)
    }

    pub fn has_sample(&self) -> bool {
        self.has_sample
    }

    /// True if `value` must be transmitted: no sample yet, or the absolute
    /// divergence from the estimate strictly exceeds `threshold`.
    pub fn diverges(&self, value: f64, threshold: f64) -> bool {
        !self.has_sample || (value - self.estimate).abs() > threshold
    }

    /// Fold one observation into the estimate
    pub fn update(&mut self, value: f64) {
        if self.has_sample {
            self.estimate = self.alpha * value + (1.0 - self.alpha) * self.estimate;
        } else {
            self.estimate = value;
            self.has_sample = true;
        }
    }

    /// Replace the estimate outright (resync on the receiving side)
    pub fn reset_to(&mut self, value: f64) {
        self.estimate = value;
        self.has_sample = true;
    }
}
