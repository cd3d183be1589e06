//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_agent;
pub use validate::run_validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config_loader::{AgentConfig, ConfigLoader};
use contracts::Vin;
use tracing::info;

/// CLI values layered over file and environment
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub vin: Option<Vin>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub start_offline: bool,
    pub no_pacing: bool,
}

/// defaults < config file < environment < CLI
pub(crate) fn resolve_config(path: Option<&Path>, overrides: Overrides) -> Result<AgentConfig> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {}", path.display());
        }
    }

    let mut config = ConfigLoader::resolve(path).with_context(|| match path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Invalid configuration from environment".to_string(),
    })?;

    apply_overrides(&mut config, overrides);
    ConfigLoader::validate(&config).context("Invalid command-line override")?;
    Ok(config)
}

fn apply_overrides(config: &mut AgentConfig, overrides: Overrides) {
    if let Some(vin) = overrides.vin {
        config.vehicle.vin = vin;
    }
    if let Some(host) = overrides.server_host {
        info!(host = %host, "Overriding server host from CLI");
        config.uplink.server_host = host;
    }
    if let Some(port) = overrides.server_port {
        config.uplink.server_port = port;
    }
    if let Some(dir) = overrides.data_dir {
        config.storage.data_dir = dir;
    }
    if overrides.start_offline {
        config.forwarder.start_online = false;
    }
    if overrides.no_pacing {
        config.forwarder.frame_pacing_delay_ms = 0;
    }
}
