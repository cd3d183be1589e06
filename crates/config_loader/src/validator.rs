//! Config validation
//!
//! Rules:
//! - declarative field ranges (`#[validate]` on the config types)
//! - thresholds are finite, durations convert to `Duration`
//! - the uplink host is a bare host name and the upload path is absolute
//! - the source template names a file

use std::borrow::Cow;
use std::time::Duration;

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{AgentConfig, ContractError, Field};

/// Validate an agent config
///
/// Returns the first violation found, or Ok(()).
pub fn validate(config: &AgentConfig) -> Result<(), ContractError> {
    validate_declared_ranges(config)?;
    validate_predictor(config)?;
    validate_uplink(config)?;
    validate_source(config)?;
    Ok(())
}

fn validate_declared_ranges(config: &AgentConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_violation(&errors, String::new())
            .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Dotted path and message of the first failing rule, in key order
fn first_violation(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut keys: Vec<&Cow<'static, str>> = errors.errors().keys().collect();
    keys.sort();

    for key in keys {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        match errors.errors().get(key)? {
            ValidationErrorsKind::Field(list) => {
                if let Some(error) = list.first() {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("violates '{}' rule", error.code),
                    };
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                if let Some(found) = first_violation(nested, path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    if let Some(found) = first_violation(nested, format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn validate_predictor(config: &AgentConfig) -> Result<(), ContractError> {
    let predictor = &config.predictor;

    // NaN slips through range rules
    if !(predictor.alpha > 0.0 && predictor.alpha <= 1.0) {
        return Err(ContractError::config_validation(
            "predictor.alpha",
            format!("alpha must be in (0, 1], got {}", predictor.alpha),
        ));
    }

    for field in Field::ALL {
        let threshold = predictor.threshold(field);
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ContractError::config_validation(
                format!("predictor.{}_threshold", field.name()),
                format!("threshold must be a finite value >= 0, got {threshold}"),
            ));
        }
    }

    if !is_positive_duration(predictor.resync_interval_secs) {
        return Err(ContractError::config_validation(
            "predictor.resync_interval_secs",
            format!(
                "resync interval must be a representable duration > 0, got {}",
                predictor.resync_interval_secs
            ),
        ));
    }

    Ok(())
}

fn validate_uplink(config: &AgentConfig) -> Result<(), ContractError> {
    let uplink = &config.uplink;

    if uplink.server_host.contains("://")
        || uplink.server_host.contains('/')
        || uplink.server_host.chars().any(char::is_whitespace)
    {
        return Err(ContractError::config_validation(
            "uplink.server_host",
            format!(
                "expected a bare host name, got '{}' (scheme and path are implied)",
                uplink.server_host
            ),
        ));
    }

    if !uplink.path.starts_with('/') {
        return Err(ContractError::config_validation(
            "uplink.path",
            format!("path must start with '/', got '{}'", uplink.path),
        ));
    }

    if !is_positive_duration(uplink.timeout_secs) {
        return Err(ContractError::config_validation(
            "uplink.timeout_secs",
            format!(
                "timeout must be a representable duration > 0, got {}",
                uplink.timeout_secs
            ),
        ));
    }

    Ok(())
}

/// Seconds that convert to a non-zero `Duration` without panicking
fn is_positive_duration(secs: f64) -> bool {
    secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()
}

fn validate_source(config: &AgentConfig) -> Result<(), ContractError> {
    let template = config.source.path_template.trim();
    if template.is_empty() || template.ends_with('/') {
        return Err(ContractError::config_validation(
            "source.path_template",
            format!("template must name a file, got '{}'", config.source.path_template),
        ));
    }
    Ok(())
}
