//! Environment overrides
//!
//! Applied after the config file and before CLI flags.

use contracts::{AgentConfig, ContractError, Vin};
use tracing::debug;

/// Upload server port
pub const SERVER_PORT_VAR: &str = "SERVER_PORT";

/// Vehicle identity
pub const VEHICLE_VIN_VAR: &str = "VEHICLE_VIN";

/// Apply overrides from the process environment
pub fn apply_process_env(config: &mut AgentConfig) -> Result<(), ContractError> {
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup
///
/// Empty values are treated as unset. A malformed value is an error rather
/// than a silent fallback to the file value.
pub fn apply_env_overrides<F>(config: &mut AgentConfig, lookup: F) -> Result<(), ContractError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get(SERVER_PORT_VAR) {
        let port: u16 = port.trim().parse().map_err(|_| {
            ContractError::config_validation(
                SERVER_PORT_VAR,
                format!("expected a port number, got '{port}'"),
            )
        })?;
        debug!(port, "Server port from environment");
        config.uplink.server_port = port;
    }

    if let Some(vin) = get(VEHICLE_VIN_VAR) {
        let vin = Vin::new(vin.trim()).map_err(|e| {
            ContractError::config_validation(VEHICLE_VIN_VAR, e.to_string())
        })?;
        debug!(vin = %vin, "VIN from environment");
        config.vehicle.vin = vin;
    }

    Ok(())
}
