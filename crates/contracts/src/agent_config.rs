//! AgentConfig - Config Loader output
//!
//! Describes one agent instance: which vehicle it serves, predictor tuning,
//! where it uploads, how it paces and drains, where it buffers and reads.
//! Every field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use crate::{Field, Vin};

/// Complete agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AgentConfig {
    /// Vehicle identity
    #[validate(nested)]
    pub vehicle: VehicleConfig,

    /// Predictive compression tuning
    #[validate(nested)]
    pub predictor: PredictorConfig,

    /// Cloud endpoint
    #[validate(nested)]
    pub uplink: UplinkConfig,

    /// Pacing, drain and reporting
    #[validate(nested)]
    pub forwarder: ForwarderConfig,

    /// Offline buffer location
    #[validate(nested)]
    pub storage: StorageConfig,

    /// Raw record source
    #[validate(nested)]
    pub source: SourceConfig,
}

/// Vehicle identity
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct VehicleConfig {
    /// 17-character VIN, validated on parse
    pub vin: Vin,
}

/// Predictor configuration
///
/// Thresholds are absolute, in each signal's own unit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PredictorConfig {
    /// Exponential smoothing factor
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub alpha: f64,

    /// mph
    #[validate(range(min = 0.0))]
    pub speed_threshold: f64,

    /// kW
    #[validate(range(min = 0.0))]
    pub power_threshold: f64,

    /// Percent
    #[validate(range(min = 0.0))]
    pub battery_threshold: f64,

    /// Degrees
    #[validate(range(min = 0.0))]
    pub heading_threshold: f64,

    /// Seconds between forced resync frames (monotonic clock)
    #[validate(range(exclusive_min = 0.0))]
    pub resync_interval_secs: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            speed_threshold: 2.0,
            power_threshold: 5.0,
            battery_threshold: 0.5,
            heading_threshold: 5.0,
            resync_interval_secs: 30.0,
        }
    }
}

impl PredictorConfig {
    /// Threshold for a filtered field
    pub fn threshold(&self, field: Field) -> f64 {
        match field {
            Field::Speed => self.speed_threshold,
            Field::Power => self.power_threshold,
            Field::Battery => self.battery_threshold,
            Field::Heading => self.heading_threshold,
        }
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs_f64(self.resync_interval_secs)
    }
}

/// Uplink (HTTP endpoint) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UplinkConfig {
    /// Ingestion server host
    #[validate(length(min = 1))]
    pub server_host: String,

    /// Ingestion server port (`SERVER_PORT`)
    #[validate(range(min = 1))]
    pub server_port: u16,

    /// Upload route
    #[validate(length(min = 1))]
    pub path: String,

    /// Hard per-request timeout in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub timeout_secs: f64,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            server_host: "localhost".to_string(),
            server_port: 8001,
            path: "/upload".to_string(),
            timeout_secs: 5.0,
        }
    }
}

impl UplinkConfig {
    /// Full upload URL
    pub fn endpoint_url(&self) -> String {
        let path = self.path.trim_start_matches('/');
        format!("http://{}:{}/{}", self.server_host, self.server_port, path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

/// Forwarder configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Delay after each successfully drained row (ms)
    pub drain_inter_send_delay_ms: u64,

    /// Real-time pacing between source records (ms, simulation only)
    pub frame_pacing_delay_ms: u64,

    /// Emit compression stats every N admitted frames
    #[validate(range(min = 1))]
    pub stats_interval: u64,

    /// Initial connectivity state
    pub start_online: bool,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            drain_inter_send_delay_ms: 100,
            frame_pacing_delay_ms: 300,
            stats_interval: 50,
            start_online: true,
        }
    }
}

impl ForwarderConfig {
    pub fn drain_inter_send_delay(&self) -> Duration {
        Duration::from_millis(self.drain_inter_send_delay_ms)
    }

    pub fn frame_pacing_delay(&self) -> Duration {
        Duration::from_millis(self.frame_pacing_delay_ms)
    }
}

/// Offline buffer storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the per-vehicle buffer files
    pub data_dir: PathBuf,

    /// File name prefix; the VIN and `.db` are appended
    #[validate(length(min = 1))]
    pub file_prefix: String,

    /// Oldest-first eviction cap (unset = unbounded)
    #[validate(range(min = 1))]
    pub max_rows: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            file_prefix: "offline_buffer".to_string(),
            max_rows: None,
        }
    }
}

impl StorageConfig {
    /// Buffer file for a vehicle, unique per VIN
    pub fn buffer_path(&self, vin: &Vin) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.db", self.file_prefix, vin.as_str()))
    }
}

/// Raw record source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SourceConfig {
    /// JSONL path; `{vin}` is replaced with the vehicle's VIN
    #[validate(length(min = 1))]
    pub path_template: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path_template: "data/vehicle_logs/tesla_log_{vin}.jsonl".to_string(),
        }
    }
}

impl SourceConfig {
    /// Resolve the template for a vehicle
    pub fn path(&self, vin: &Vin) -> PathBuf {
        Path::new(&self.path_template.replace("{vin}", vin.as_str())).to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = AgentConfig::default();
        assert_eq!(config.predictor.alpha, 0.3);
        assert_eq!(config.predictor.threshold(Field::Speed), 2.0);
        assert_eq!(config.predictor.threshold(Field::Power), 5.0);
        assert_eq!(config.predictor.threshold(Field::Battery), 0.5);
        assert_eq!(config.predictor.threshold(Field::Heading), 5.0);
        assert_eq!(config.predictor.resync_interval(), Duration::from_secs(30));
        assert_eq!(config.uplink.timeout(), Duration::from_secs(5));
        assert_eq!(config.uplink.server_port, 8001);
        assert_eq!(
            config.forwarder.drain_inter_send_delay(),
            Duration::from_millis(100)
        );
        assert_eq!(
            config.forwarder.frame_pacing_delay(),
            Duration::from_millis(300)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_url() {
        let uplink = UplinkConfig {
            server_host: "10.0.0.2".into(),
            server_port: 9000,
            path: "upload".into(),
            ..Default::default()
        };
        assert_eq!(uplink.endpoint_url(), "http://10.0.0.2:9000/upload");
        assert_eq!(
            UplinkConfig::default().endpoint_url(),
            "http://localhost:8001/upload"
        );
    }

    #[test]
    fn test_paths_are_unique_per_vin() {
        let storage = StorageConfig::default();
        let a: Vin = "5YJ3E1EA1KF000001".parse().unwrap();
        let b: Vin = "5YJ3E1EA2KF000002".parse().unwrap();
        assert_ne!(storage.buffer_path(&a), storage.buffer_path(&b));
        assert!(storage
            .buffer_path(&a)
            .to_string_lossy()
            .ends_with("offline_buffer_5YJ3E1EA1KF000001.db"));

        let source = SourceConfig::default();
        assert_eq!(
            source.path(&b),
            PathBuf::from("data/vehicle_logs/tesla_log_5YJ3E1EA2KF000002.jsonl")
        );
    }

    #[test]
    fn test_range_validation() {
        let mut config = AgentConfig::default();
        config.predictor.alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.predictor.speed_threshold = -1.0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.storage.max_rows = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{ "predictor": { "alpha": 0.5 } }"#).unwrap();
        assert_eq!(config.predictor.alpha, 0.5);
        assert_eq!(config.predictor.speed_threshold, 2.0);
        assert_eq!(config.vehicle.vin, Vin::default());
    }
}
