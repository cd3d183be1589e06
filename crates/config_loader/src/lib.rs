//! # Config Loader
//!
//! Loads the agent configuration.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Layer environment overrides (`SERVER_PORT`, `VEHICLE_VIN`) on top
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("agent.toml")).unwrap();
//! println!("Uploading to {}", config.uplink.endpoint_url());
//! ```

mod env;
mod parser;
mod validator;

pub use contracts::AgentConfig;
pub use env::{apply_env_overrides, apply_process_env, SERVER_PORT_VAR, VEHICLE_VIN_VAR};
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::{info, instrument};

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    #[instrument(name = "config_load", skip_all, fields(path = %path.display()))]
    pub fn load_from_path(path: &Path) -> Result<AgentConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let config = Self::load_from_str(&content, format)?;
        info!(vin = %config.vehicle.vin, "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<AgentConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// File (or defaults) then process environment, validated once more
    ///
    /// CLI flags go on top of the result and must be re-checked with
    /// [`ConfigLoader::validate`].
    pub fn resolve(path: Option<&Path>) -> Result<AgentConfig, ContractError> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => AgentConfig::default(),
        };
        apply_process_env(&mut config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Run every validation rule against an assembled config
    pub fn validate(config: &AgentConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize config to TOML string
    pub fn to_toml(config: &AgentConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize config to JSON string
    pub fn to_json(config: &AgentConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<AgentConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
