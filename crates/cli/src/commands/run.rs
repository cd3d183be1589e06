//! Default command: run the agent for one vehicle.

use anyhow::{Context, Result};
use contracts::Connectivity;
use forwarder::{Forwarder, ForwarderReport, HttpUplink};
use ingestion::JsonlSource;
use predictor::Predictor;
use store::SqliteBuffer;
use tracing::{info, warn};

use super::{resolve_config, Overrides};
use crate::cli::RunArgs;
use crate::console;

/// Execute the agent until the source is exhausted or a shutdown signal arrives
pub async fn run_agent(args: &RunArgs) -> Result<()> {
    let config = resolve_config(
        args.config.as_deref(),
        Overrides {
            vin: args.vin.clone(),
            server_host: args.server_host.clone(),
            server_port: args.server_port,
            data_dir: args.data_dir.clone(),
            start_offline: args.start_offline,
            no_pacing: args.no_pacing,
        },
    )?;
    let vin = config.vehicle.vin.clone();

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let buffer_path = config.storage.buffer_path(&vin);
    let store = SqliteBuffer::open(&buffer_path, config.storage.max_rows)
        .with_context(|| format!("Failed to open offline buffer {}", buffer_path.display()))?;

    let source_path = args.source.clone().unwrap_or_else(|| config.source.path(&vin));
    let source = JsonlSource::open(&source_path)
        .with_context(|| format!("Failed to open record source {}", source_path.display()))?;

    let uplink = HttpUplink::new(&config.uplink, vin.clone()).context("Failed to build HTTP uplink")?;

    info!(
        vin = %vin,
        server = %uplink.url(),
        buffer = %buffer_path.display(),
        source = %source_path.display(),
        start_online = config.forwarder.start_online,
        "Telemetry agent starting"
    );

    let connectivity = Connectivity::new(config.forwarder.start_online);
    observability::record_connectivity(connectivity.is_online());
    if !args.no_console {
        console::spawn(connectivity.clone(), vin.clone());
    }

    let predictor = Predictor::new(config.predictor.clone());
    let mut forwarder = Forwarder::new(
        vin,
        config.forwarder.clone(),
        predictor,
        uplink,
        store,
        connectivity,
    );

    let report = forwarder
        .run_until(source, async {
            shutdown_signal().await;
            warn!("Received shutdown signal, finishing the current frame");
        })
        .await;

    print_report(&report);
    info!("Telemetry agent finished");
    Ok(())
}

/// Ctrl+C or SIGTERM; never resolves if no handler can be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_report(report: &ForwarderReport) {
    let counters = &report.counters;
    let remaining = report
        .rows_remaining
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("\n=== Run Summary ({}) ===\n", report.vin);
    println!("Records read:     {}", counters.frames_read);
    println!("Parse errors:     {}", counters.parse_errors);
    println!("Live uploads:     {} ok, {} failed", counters.live_posts, counters.live_failures);
    println!("Buffered:         {} ({} errors)", counters.buffered, counters.buffer_errors);
    println!("Drained:          {} ({} aborted passes)", counters.drained, counters.drain_failures);
    println!("Undecodable rows: {}", counters.decode_errors);
    println!("Rows remaining:   {remaining}");
    println!(
        "Compression:      {} frames, {} transmitted, {} skipped ({:.1}%)",
        report.compression.total,
        report.compression.transmitted,
        report.compression.skipped,
        report.compression_ratio()
    );
    println!("Upload latency:   {} ms", report.upload_latency_ms);
    if report.degraded {
        println!("\nLink ended degraded: remaining rows drain on the next online run.");
    }
    println!();
}
