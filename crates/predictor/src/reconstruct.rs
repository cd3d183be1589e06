//! Receiving-side reconstruction from sparse frames.
//!
//! The reconstructor keeps one EWMA per signal with the same `alpha` as the
//! edge. A resync frame overwrites every estimate; a transmitted field is
//! reported as received and folded into its estimate; an absent field is
//! reported from the estimate.
//!
//! Bounds: exact at resync frames and for transmitted fields. For a skipped
//! field the edge guarantees `|x - x̂_edge| <= θ`; the two estimates can drift
//! apart between resyncs because the edge also smooths values it skipped.

use contracts::{Field, PredictorConfig, SparseFrame};
use serde::Serialize;

use crate::estimator::Ewma;

/// One fully populated reconstructed observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconstructedFrame {
    pub timestamp: u64,
    pub odometer: f32,
    pub speed: f64,
    pub power: f64,
    pub battery: f64,
    pub heading: f64,
    pub is_resync: bool,
}

impl ReconstructedFrame {
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::Speed => self.speed,
            Field::Power => self.power,
            Field::Battery => self.battery,
            Field::Heading => self.heading,
        }
    }

    fn set(&mut self, field: Field, value: f64) {
        match field {
            Field::Speed => self.speed = value,
            Field::Power => self.power = value,
            Field::Battery => self.battery = value,
            Field::Heading => self.heading = value,
        }
    }
}

/// Server-side mirror of the predictor
#[derive(Debug, Clone)]
pub struct Reconstructor {
    estimators: [Ewma; 4],
}

impl Reconstructor {
    pub fn new(config: &PredictorConfig) -> Self {
        Self {
            estimators: [Ewma::new(config.alpha); 4],
        }
    }

    /// Rebuild a full observation from one sparse frame
    ///
    /// Fields absent before any observation of that signal come back as 0.
    pub fn apply(&mut self, frame: &SparseFrame) -> ReconstructedFrame {
        let mut out = ReconstructedFrame {
            timestamp: frame.timestamp,
            odometer: frame.odometer,
            speed: 0.0,
            power: 0.0,
            battery: 0.0,
            heading: 0.0,
            is_resync: frame.is_resync,
        };

        for (field, estimator) in Field::ALL.into_iter().zip(&mut self.estimators) {
            let value = match frame.value(field) {
                Some(v) if frame.is_resync => {
                    estimator.reset_to(v);
                    v
                }
                Some(v) => {
                    estimator.update(v);
                    v
                }
                None => estimator.estimate().unwrap_or(0.0),
            };
            out.set(field, value);
        }

        out
    }
}
