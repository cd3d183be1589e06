//! Predictor implementation.

use std::time::Duration;

use contracts::{Field, FieldDecisions, PredictorConfig, SparseFrame, VehicleState};
use tracing::{debug, instrument};

use crate::clock::{Clock, MonotonicClock};
use crate::estimator::Ewma;
use crate::stats::CompressionStats;

/// Result of admitting one observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Admission {
    /// Frame to put on the wire
    pub frame: SparseFrame,
    /// Which fields were flagged, and whether this was a resync
    pub decisions: FieldDecisions,
}

/// Stateful predictive-compression filter
///
/// Created once at agent start and never reset while the agent runs; in
/// particular reconnecting does not reset it.
#[derive(Debug)]
pub struct Predictor<C = MonotonicClock> {
    config: PredictorConfig,
    clock: C,
    /// Indexed in `Field::ALL` order
    estimators: [Ewma; 4],
    /// Monotonic time of the last resync (agent start until the first one)
    last_resync: Duration,
    stats: CompressionStats,
}

impl Predictor<MonotonicClock> {
    /// Predictor driven by the process monotonic clock
    pub fn new(config: PredictorConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> Predictor<C> {
    /// Predictor driven by an explicit clock
    pub fn with_clock(config: PredictorConfig, clock: C) -> Self {
        let alpha = config.alpha;
        let last_resync = clock.elapsed();
        Self {
            config,
            clock,
            estimators: [Ewma::new(alpha); 4],
            last_resync,
            stats: CompressionStats::default(),
        }
    }

    /// Decide which fields to transmit, then fold the observation in.
    ///
    /// Every field's estimate is updated whether or not it was transmitted,
    /// so admitting a frame that ends up buffered still advances the state.
    #[instrument(
        level = "trace",
        name = "predictor_admit",
        skip(self, state),
        fields(timestamp = state.timestamp)
    )]
    pub fn admit(&mut self, state: &VehicleState) -> Admission {
        let now = self.clock.elapsed();
        let resync = now.saturating_sub(self.last_resync) >= self.config.resync_interval();

        let decisions = if resync {
            self.last_resync = now;
            FieldDecisions::resync()
        } else {
            let mut decisions = FieldDecisions::default();
            for (field, estimator) in Field::ALL.into_iter().zip(&self.estimators) {
                let diverged =
                    estimator.diverges(state.value(field), self.config.threshold(field));
                decisions.set(field, diverged);
            }
            decisions
        };

        let frame = SparseFrame::from_decisions(state, &decisions);

        for (field, estimator) in Field::ALL.into_iter().zip(&mut self.estimators) {
            estimator.update(state.value(field));
        }

        let transmitted = decisions.transmits();
        self.stats.record(transmitted);
        Self::record_metrics(&decisions);

        if resync {
            debug!(timestamp = state.timestamp, "Resync frame forced");
        }

        Admission { frame, decisions }
    }

    /// Current estimate for a field, `None` before its first observation
    pub fn estimate(&self, field: Field) -> Option<f64> {
        self.estimators[Self::index(field)].estimate()
    }

    pub fn stats(&self) -> CompressionStats {
        self.stats
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    fn index(field: Field) -> usize {
        match field {
            Field::Speed => 0,
            Field::Power => 1,
            Field::Battery => 2,
            Field::Heading => 3,
        }
    }

    fn record_metrics(decisions: &FieldDecisions) {
        let outcome = if decisions.is_resync {
            "resync"
        } else if decisions.transmits() {
            "transmitted"
        } else {
            "skipped"
        };
        metrics::counter!("telemetry_agent_frames_admitted_total", "outcome" => outcome)
            .increment(1);
    }
}
