//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::AgentConfig;
use contracts::{Field, FrameStore};
use serde::Serialize;
use std::path::Path;
use store::SqliteBuffer;
use tracing::info;

use super::{resolve_config, Overrides};
use crate::cli::InfoArgs;

/// Resolved configuration for JSON output
#[derive(Serialize)]
struct AgentInfo {
    vin: String,
    endpoint: String,
    timeout_secs: f64,
    buffer_file: String,
    /// `None` when no buffer file exists yet
    buffered_rows: Option<u64>,
    source_file: String,
    predictor: PredictorInfo,
}

#[derive(Serialize)]
struct PredictorInfo {
    alpha: f64,
    resync_interval_secs: f64,
    thresholds: Vec<ThresholdInfo>,
}

#[derive(Serialize)]
struct ThresholdInfo {
    field: &'static str,
    threshold: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = resolve_config(
        args.config.as_deref(),
        Overrides {
            vin: args.vin.clone(),
            data_dir: args.data_dir.clone(),
            ..Default::default()
        },
    )?;
    info!(vin = %config.vehicle.vin, "Loading agent info");

    let agent_info = build_agent_info(&config)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&agent_info).context("Failed to serialize agent info")?;
        println!("{json}");
    } else {
        print_agent_info(&agent_info);
    }

    Ok(())
}

fn build_agent_info(config: &AgentConfig) -> Result<AgentInfo> {
    let vin = &config.vehicle.vin;
    let buffer_path = config.storage.buffer_path(vin);

    Ok(AgentInfo {
        vin: vin.to_string(),
        endpoint: config.uplink.endpoint_url(),
        timeout_secs: config.uplink.timeout_secs,
        buffered_rows: count_buffered(&buffer_path)?,
        buffer_file: buffer_path.display().to_string(),
        source_file: config.source.path(vin).display().to_string(),
        predictor: PredictorInfo {
            alpha: config.predictor.alpha,
            resync_interval_secs: config.predictor.resync_interval_secs,
            thresholds: Field::ALL
                .iter()
                .map(|f| ThresholdInfo {
                    field: f.wire_name(),
                    threshold: config.predictor.threshold(*f),
                })
                .collect(),
        },
    })
}

/// Row count of an existing buffer; never creates the file
fn count_buffered(path: &Path) -> Result<Option<u64>> {
    if !path.exists() {
        return Ok(None);
    }
    let buffer = SqliteBuffer::open(path, None)
        .with_context(|| format!("Failed to open offline buffer {}", path.display()))?;
    let rows = buffer
        .len()
        .with_context(|| format!("Failed to count rows in {}", path.display()))?;
    Ok(Some(rows))
}

fn print_agent_info(info: &AgentInfo) {
    println!("Telemetry Agent ({})\n", info.vin);
    println!("Uplink");
    println!("   ├─ Endpoint: {}", info.endpoint);
    println!("   └─ Timeout: {}s", info.timeout_secs);

    println!("\nStorage");
    println!("   ├─ Buffer: {}", info.buffer_file);
    match info.buffered_rows {
        Some(rows) => println!("   └─ Buffered rows: {rows}"),
        None => println!("   └─ Buffered rows: 0 (no buffer file yet)"),
    }

    println!("\nSource");
    println!("   └─ {}", info.source_file);

    println!("\nPredictor");
    println!("   ├─ Alpha: {}", info.predictor.alpha);
    println!("   ├─ Resync: every {}s", info.predictor.resync_interval_secs);
    let last = info.predictor.thresholds.len().saturating_sub(1);
    for (i, t) in info.predictor.thresholds.iter().enumerate() {
        let prefix = if i == last { "└─" } else { "├─" };
        println!("   {prefix} θ {}: {}", t.field, t.threshold);
    }
    println!();
}
