//! Protobuf message mirroring `proto/telemetry.proto`

use contracts::SparseFrame;

/// Wire representation of a `SparseFrame`
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct WireFrame {
    #[prost(uint64, tag = "1")]
    pub timestamp: u64,

    #[prost(float, tag = "2")]
    pub odometer: f32,

    #[prost(float, optional, tag = "3")]
    pub vehicle_speed: Option<f32>,

    #[prost(float, optional, tag = "4")]
    pub power_kw: Option<f32>,

    #[prost(int32, optional, tag = "5")]
    pub battery_level: Option<i32>,

    #[prost(int32, optional, tag = "6")]
    pub heading: Option<i32>,

    #[prost(bool, tag = "7")]
    pub is_resync: bool,
}

impl From<&SparseFrame> for WireFrame {
    fn from(frame: &SparseFrame) -> Self {
        Self {
            timestamp: frame.timestamp,
            odometer: frame.odometer,
            vehicle_speed: frame.speed,
            power_kw: frame.power,
            battery_level: frame.battery,
            heading: frame.heading,
            is_resync: frame.is_resync,
        }
    }
}

impl From<WireFrame> for SparseFrame {
    fn from(wire: WireFrame) -> Self {
        Self {
            timestamp: wire.timestamp,
            odometer: wire.odometer,
            speed: wire.vehicle_speed,
            power: wire.power_kw,
            battery: wire.battery_level,
            heading: wire.heading,
            is_resync: wire.is_resync,
        }
    }
}
