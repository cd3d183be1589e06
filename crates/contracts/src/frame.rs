//! Frame types - Ingestion output, Predictor input/output
//!
//! `RawFrame` is what the record source produces, `VehicleState` is a raw frame
//! with every gap filled, `SparseFrame` is what goes on the wire.

use serde::{Deserialize, Serialize};

/// Raw vehicle-state record
///
/// Only `timestamp` and `odometer` are guaranteed; every other signal may be
/// missing from a given record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Device-local epoch milliseconds
    pub timestamp: u64,

    /// Miles, monotonic non-decreasing within a session
    pub odometer: f32,

    /// mph
    pub speed: Option<f32>,

    /// kW, negative while regenerating
    pub power: Option<f32>,

    /// Percent, 0..=100
    pub battery: Option<i32>,

    /// Degrees, 0..=359
    pub heading: Option<i32>,
}

impl RawFrame {
    /// A frame carrying only the mandatory fields
    pub fn new(timestamp: u64, odometer: f32) -> Self {
        Self {
            timestamp,
            odometer,
            speed: None,
            power: None,
            battery: None,
            heading: None,
        }
    }
}

/// Fully populated observation, the unit the predictor works on
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleState {
    pub timestamp: u64,
    pub odometer: f32,
    pub speed: f32,
    pub power: f32,
    pub battery: i32,
    pub heading: i32,
}

impl VehicleState {
    /// Value of a filtered field, widened for prediction math
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::Speed => f64::from(self.speed),
            Field::Power => f64::from(self.power),
            Field::Battery => f64::from(self.battery),
            Field::Heading => f64::from(self.heading),
        }
    }
}

/// The four predictor-filtered signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Speed,
    Power,
    Battery,
    Heading,
}

impl Field {
    /// All filtered fields in wire order
    pub const ALL: [Field; 4] = [Field::Speed, Field::Power, Field::Battery, Field::Heading];

    /// Wire-schema field name
    pub fn wire_name(self) -> &'static str {
        match self {
            Field::Speed => "vehicle_speed",
            Field::Power => "power_kw",
            Field::Battery => "battery_level",
            Field::Heading => "heading",
        }
    }

    /// Short name used in config keys (`{name}_threshold`) and logs
    pub fn name(self) -> &'static str {
        match self {
            Field::Speed => "speed",
            Field::Power => "power",
            Field::Battery => "battery",
            Field::Heading => "heading",
        }
    }
}

/// Per-field transmit decisions for one admitted frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecisions {
    pub speed: bool,
    pub power: bool,
    pub battery: bool,
    pub heading: bool,
    pub is_resync: bool,
}

impl FieldDecisions {
    /// Every field flagged, resync set
    pub fn resync() -> Self {
        Self {
            speed: true,
            power: true,
            battery: true,
            heading: true,
            is_resync: true,
        }
    }

    pub fn get(&self, field: Field) -> bool {
        match field {
            Field::Speed => self.speed,
            Field::Power => self.power,
            Field::Battery => self.battery,
            Field::Heading => self.heading,
        }
    }

    pub fn set(&mut self, field: Field, present: bool) {
        match field {
            Field::Speed => self.speed = present,
            Field::Power => self.power = present,
            Field::Battery => self.battery = present,
            Field::Heading => self.heading = present,
        }
    }

    /// Number of optional fields flagged present
    pub fn present_count(&self) -> usize {
        Field::ALL.iter().filter(|f| self.get(**f)).count()
    }

    /// True if this frame counts as transmitted
    pub fn transmits(&self) -> bool {
        self.is_resync || self.present_count() > 0
    }
}

/// Wire frame with independently optional signals
///
/// Invariant: `is_resync` implies all four optional fields are present.
/// Constructors uphold it; `missing_for_resync` checks frames built elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparseFrame {
    pub timestamp: u64,
    pub odometer: f32,
    pub speed: Option<f32>,
    pub power: Option<f32>,
    pub battery: Option<i32>,
    pub heading: Option<i32>,
    pub is_resync: bool,
}

impl SparseFrame {
    /// Build from an observation, copying only the flagged fields
    pub fn from_decisions(state: &VehicleState, decisions: &FieldDecisions) -> Self {
        Self {
            timestamp: state.timestamp,
            odometer: state.odometer,
            speed: decisions.speed.then_some(state.speed),
            power: decisions.power.then_some(state.power),
            battery: decisions.battery.then_some(state.battery),
            heading: decisions.heading.then_some(state.heading),
            is_resync: decisions.is_resync,
        }
    }

    /// Self-sufficient frame: every field present, `is_resync = true`
    pub fn resync(state: &VehicleState) -> Self {
        Self::from_decisions(state, &FieldDecisions::resync())
    }

    pub fn is_present(&self, field: Field) -> bool {
        match field {
            Field::Speed => self.speed.is_some(),
            Field::Power => self.power.is_some(),
            Field::Battery => self.battery.is_some(),
            Field::Heading => self.heading.is_some(),
        }
    }

    /// Value of a field if it was transmitted
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Speed => self.speed.map(f64::from),
            Field::Power => self.power.map(f64::from),
            Field::Battery => self.battery.map(f64::from),
            Field::Heading => self.heading.map(f64::from),
        }
    }

    pub fn present_count(&self) -> usize {
        Field::ALL.iter().filter(|f| self.is_present(**f)).count()
    }

    /// First field violating the resync invariant, if any
    pub fn missing_for_resync(&self) -> Option<Field> {
        if !self.is_resync {
            return None;
        }
        Field::ALL.into_iter().find(|f| !self.is_present(*f))
    }
}
