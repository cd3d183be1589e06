//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::{AgentConfig, ConfigLoader};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    vin: String,
    endpoint: String,
    alpha: f64,
    resync_interval_secs: f64,
    max_buffer_rows: Option<u64>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            summary: Some(ConfigSummary {
                vin: config.vehicle.vin.to_string(),
                endpoint: config.uplink.endpoint_url(),
                alpha: config.predictor.alpha,
                resync_interval_secs: config.predictor.resync_interval_secs,
                max_buffer_rows: config.storage.max_rows,
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Non-fatal issues worth a look
fn collect_warnings(config: &AgentConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.vehicle.vin.as_str() == contracts::DEFAULT_VIN {
        warnings.push("vehicle.vin is the built-in default VIN".to_string());
    }

    if config.predictor.resync_interval_secs <= config.uplink.timeout_secs {
        warnings.push(format!(
            "predictor.resync_interval_secs ({}) is not longer than uplink.timeout_secs ({})",
            config.predictor.resync_interval_secs, config.uplink.timeout_secs
        ));
    }

    if contracts::Field::ALL
        .iter()
        .all(|f| config.predictor.threshold(*f) == 0.0)
    {
        warnings.push("all thresholds are 0: every field is always transmitted".to_string());
    }

    if config.storage.max_rows.is_some() {
        warnings.push(
            "storage.max_rows is set: the oldest buffered frames are evicted when it is reached"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  VIN: {}", summary.vin);
            println!("  Endpoint: {}", summary.endpoint);
            println!("  Alpha: {}", summary.alpha);
            println!("  Resync interval: {}s", summary.resync_interval_secs);
            match summary.max_buffer_rows {
                Some(rows) => println!("  Buffer cap: {rows} rows"),
                None => println!("  Buffer cap: unbounded"),
            }
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
