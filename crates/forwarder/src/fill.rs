//! Last-known-value substitution for absent raw signals

use contracts::{RawFrame, VehicleState};

/// Remembers the most recent value of each optional signal.
///
/// Before any observation of a signal its substitute is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastKnown {
    speed: f32,
    power: f32,
    battery: i32,
    heading: i32,
}

impl LastKnown {
    /// Complete a raw frame, remembering whatever it did carry
    pub fn fill(&mut self, raw: &RawFrame) -> VehicleState {
        if let Some(v) = raw.speed {
            self.speed = v;
        }
        if let Some(v) = raw.power {
            self.power = v;
        }
        if let Some(v) = raw.battery {
            self.battery = v;
        }
        if let Some(v) = raw.heading {
            self.heading = v;
        }

        VehicleState {
            timestamp: raw.timestamp,
            odometer: raw.odometer,
            speed: self.speed,
            power: self.power,
            battery: self.battery,
            heading: self.heading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_before_first_observation() {
        let mut last = LastKnown::default();
        let state = last.fill(&RawFrame::new(1, 2.0));
        assert_eq!(state.speed, 0.0);
        assert_eq!(state.battery, 0);
        assert_eq!(state.odometer, 2.0);
    }

    #[test]
    fn test_carries_last_value_forward() {
        let mut last = LastKnown::default();
        let mut raw = RawFrame::new(1, 0.0);
        raw.speed = Some(33.0);
        raw.heading = Some(12);
        last.fill(&raw);

        let mut next = RawFrame::new(2, 0.1);
        next.power = Some(-4.0);
        let state = last.fill(&next);
        assert_eq!(state.speed, 33.0);
        assert_eq!(state.heading, 12);
        assert_eq!(state.power, -4.0);
        assert_eq!(state.timestamp, 2);
    }
}
