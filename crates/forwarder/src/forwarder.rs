//! Forwarder state machine.
//!
//! One sequential task per vehicle. For each frame:
//! - offline: admit, then buffer a resync frame
//! - online and degraded: drain the buffer first; if the drain aborts the
//!   frame is buffered so it cannot overtake older rows
//! - online: admit, encode, post; on failure buffer a resync frame

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    Connectivity, ForwarderConfig, FrameStore, RawFrame, SourceParseError, SparseFrame, Uplink,
    VehicleState, Vin,
};
use observability::{BufferReason, RunningStats, UploadKind};
use predictor::{Clock, MonotonicClock, Predictor};
use tracing::{debug, error, info, instrument, warn};

use crate::fill::LastKnown;
use crate::metrics::ForwarderMetrics;
use crate::report::ForwarderReport;

/// Result of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Rows uploaded and removed
    pub uploaded: u64,
    /// Rows skipped because their payload did not decode
    pub decode_errors: u64,
    /// True if an upload (or a buffer operation) stopped the pass early
    pub aborted: bool,
}

impl DrainOutcome {
    pub fn is_clean(&self) -> bool {
        !self.aborted
    }
}

/// Store-and-forward orchestrator
pub struct Forwarder<U, S, C = MonotonicClock> {
    vin: Vin,
    config: ForwarderConfig,
    predictor: Predictor<C>,
    uplink: U,
    store: S,
    connectivity: Connectivity,
    last_known: LastKnown,
    /// Set by any buffering or uplink failure, cleared by a clean drain pass
    degraded: bool,
    last_online: Option<bool>,
    latency: RunningStats,
    metrics: Arc<ForwarderMetrics>,
}

impl<U: Uplink, S: FrameStore, C: Clock> Forwarder<U, S, C> {
    /// Create a forwarder.
    ///
    /// Rows already in the store (previous crash or offline shutdown) put the
    /// forwarder in degraded mode so they drain at the first online frame.
    pub fn new(
        vin: Vin,
        config: ForwarderConfig,
        predictor: Predictor<C>,
        uplink: U,
        store: S,
        connectivity: Connectivity,
    ) -> Self {
        let degraded = match store.len() {
            Ok(0) => false,
            Ok(rows) => {
                info!(vin = %vin, rows, "Buffered rows found at startup, will drain when online");
                observability::record_buffer_depth(rows);
                true
            }
            Err(e) => {
                error!(vin = %vin, error = %e, "[BUFFER ERROR] cannot count buffered rows");
                observability::record_buffer_error("count");
                true
            }
        };

        Self {
            vin,
            config,
            predictor,
            uplink,
            store,
            connectivity,
            last_known: LastKnown::default(),
            degraded,
            last_online: None,
            latency: RunningStats::default(),
            metrics: Arc::new(ForwarderMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<ForwarderMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn predictor(&self) -> &Predictor<C> {
        &self.predictor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn uplink(&self) -> &U {
        &self.uplink
    }

    /// Consume the source until it is exhausted, then run the final drain.
    ///
    /// Nothing here is fatal: parse, uplink, buffer and decode errors are
    /// logged and counted.
    pub async fn run<I>(&mut self, source: I) -> ForwarderReport
    where
        I: IntoIterator<Item = Result<RawFrame, SourceParseError>>,
    {
        self.run_until(source, std::future::pending()).await
    }

    /// Like [`Forwarder::run`], but stops early once `shutdown` resolves.
    ///
    /// `shutdown` is only observed between frames and during pacing, so a
    /// frame or drain step in flight always completes (a row is never
    /// uploaded without being removed). Stopping early skips the final drain.
    #[instrument(name = "forwarder_run", skip_all, fields(vin = %self.vin))]
    pub async fn run_until<I, F>(&mut self, source: I, shutdown: F) -> ForwarderReport
    where
        I: IntoIterator<Item = Result<RawFrame, SourceParseError>>,
        F: Future<Output = ()>,
    {
        info!(
            uplink = self.uplink.name(),
            degraded = self.degraded,
            "Forwarder started"
        );

        tokio::pin!(shutdown);
        let pacing = self.config.frame_pacing_delay();
        let mut interrupted = false;

        for item in source {
            if shutdown_requested(shutdown.as_mut()).await {
                interrupted = true;
                break;
            }

            self.metrics.inc_frames_read();
            match item {
                Ok(raw) => {
                    self.process(raw).await;
                    if !pacing.is_zero() {
                        tokio::select! {
                            _ = tokio::time::sleep(pacing) => {}
                            _ = shutdown.as_mut() => {
                                interrupted = true;
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "[PARSE ERROR] record dropped");
                    self.metrics.inc_parse_errors();
                }
            }
        }

        if interrupted {
            warn!(
                rows_remaining = ?self.rows_remaining(),
                "Shutdown requested, stopping at frame boundary"
            );
            self.log_stats();
            return self.report();
        }

        self.finish().await
    }

    /// Route one raw frame
    pub async fn process(&mut self, raw: RawFrame) {
        let state = self.last_known.fill(&raw);
        let online = self.observe_connectivity();

        if !online {
            // Predictor state still advances; the sparse frame is discarded.
            self.admit(&state);
            self.buffer(&state, BufferReason::Offline);
            return;
        }

        let drained_clean = if self.degraded {
            self.drain_pass().await.is_clean()
        } else {
            true
        };

        let frame = self.admit(&state);
        if !drained_clean {
            self.buffer(&state, BufferReason::DrainAborted);
            return;
        }

        let payload = codec::encode(&frame);
        let started = Instant::now();
        let result = self.uplink.post(&payload).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.latency.push(latency_ms);
        observability::record_upload(UploadKind::Live, result.is_ok(), latency_ms);

        match result {
            Ok(()) => {
                self.metrics.inc_live_posts();
                debug!(
                    timestamp = frame.timestamp,
                    fields = frame.present_count(),
                    resync = frame.is_resync,
                    bytes = payload.len(),
                    "Frame uploaded"
                );
            }
            Err(e) => {
                error!(timestamp = frame.timestamp, error = %e, "[UPLOAD ERROR] buffering frame");
                self.metrics.inc_live_failures();
                self.buffer(&state, BufferReason::UploadFailed);
            }
        }
    }

    /// Upload buffered rows in ascending id order until exhausted or one
    /// upload fails. A clean pass clears degraded mode.
    #[instrument(name = "forwarder_drain", skip(self), fields(vin = %self.vin))]
    pub async fn drain_pass(&mut self) -> DrainOutcome {
        let delay = self.config.drain_inter_send_delay();
        let mut outcome = DrainOutcome::default();

        for row in self.store.scan() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    error!(error = %e, "[BUFFER ERROR] drain scan failed");
                    self.metrics.inc_buffer_errors();
                    observability::record_buffer_error("scan");
                    outcome.aborted = true;
                    break;
                }
            };

            if let Err(e) = codec::decode(&row.payload) {
                error!(id = row.id, timestamp = row.timestamp, error = %e, "[DECODE ERROR] row skipped");
                self.metrics.inc_decode_errors();
                observability::record_decode_error();
                outcome.decode_errors += 1;
                continue;
            }

            let started = Instant::now();
            let result = self.uplink.post(&row.payload).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            self.latency.push(latency_ms);
            observability::record_upload(UploadKind::Drain, result.is_ok(), latency_ms);

            if let Err(e) = result {
                warn!(id = row.id, timestamp = row.timestamp, error = %e, "[UPLOAD ERROR] drain aborted");
                self.metrics.inc_drain_failures();
                outcome.aborted = true;
                break;
            }

            if let Err(e) = self.store.remove(row.id) {
                // Uploaded but still stored; the next pass sends it again.
                error!(id = row.id, error = %e, "[BUFFER ERROR] remove after upload failed");
                self.metrics.inc_buffer_errors();
                observability::record_buffer_error("remove");
                outcome.aborted = true;
                break;
            }

            outcome.uploaded += 1;
            self.metrics.inc_drained();
            debug!(id = row.id, timestamp = row.timestamp, "Buffered frame uploaded");

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if outcome.is_clean() {
            self.degraded = false;
        }

        observability::record_drain_pass(outcome.uploaded, outcome.is_clean());
        self.record_depth();
        info!(
            uploaded = outcome.uploaded,
            decode_errors = outcome.decode_errors,
            aborted = outcome.aborted,
            "Drain pass finished"
        );

        outcome
    }

    /// Final drain (if online with rows left), stats and report
    async fn finish(&mut self) -> ForwarderReport {
        let rows = self.rows_remaining();
        if self.observe_connectivity() && rows.is_some_and(|n| n > 0) {
            info!(rows = rows.unwrap_or_default(), "Source exhausted, final drain");
            self.drain_pass().await;
        }

        self.log_stats();
        let report = self.report();
        info!(
            frames_read = report.counters.frames_read,
            live_posts = report.counters.live_posts,
            buffered = report.counters.buffered,
            drained = report.counters.drained,
            rows_remaining = ?report.rows_remaining,
            "Forwarder finished"
        );
        report
    }

    /// Snapshot of everything counted so far
    pub fn report(&self) -> ForwarderReport {
        let rows_remaining = self.rows_remaining();
        ForwarderReport {
            vin: self.vin.to_string(),
            counters: self.metrics.snapshot(),
            rows_remaining,
            degraded: self.degraded || rows_remaining.is_some_and(|n| n > 0),
            compression: self.predictor.stats(),
            upload_latency_ms: self.latency.summary(),
        }
    }

    fn admit(&mut self, state: &VehicleState) -> SparseFrame {
        let admission = self.predictor.admit(state);

        let stats = self.predictor.stats();
        if stats.total % self.config.stats_interval.max(1) == 0 {
            self.log_stats();
        }

        admission.frame
    }

    /// Persist a self-sufficient resync frame for this observation
    fn buffer(&mut self, state: &VehicleState, reason: BufferReason) {
        self.degraded = true;

        let payload = codec::encode(&SparseFrame::resync(state));
        match self.store.append(state.timestamp, &payload) {
            Ok(id) => {
                self.metrics.inc_buffered();
                observability::record_buffered(reason);
                debug!(id, timestamp = state.timestamp, reason = reason.as_str(), "Frame buffered");
            }
            Err(e) => {
                error!(timestamp = state.timestamp, error = %e, "[BUFFER ERROR] frame lost");
                self.metrics.inc_buffer_errors();
                observability::record_buffer_error("append");
            }
        }
    }

    /// Read the connectivity flag once, logging transitions
    fn observe_connectivity(&mut self) -> bool {
        let online = self.connectivity.is_online();
        if self.last_online != Some(online) {
            if self.last_online.is_some() {
                info!(online, "Connectivity changed");
            }
            observability::record_connectivity(online);
            self.last_online = Some(online);
        }
        online
    }

    fn rows_remaining(&self) -> Option<u64> {
        match self.store.len() {
            Ok(rows) => Some(rows),
            Err(e) => {
                error!(error = %e, "[BUFFER ERROR] cannot count buffered rows");
                None
            }
        }
    }

    fn record_depth(&self) {
        if let Ok(rows) = self.store.len() {
            observability::record_buffer_depth(rows);
        }
    }

    fn log_stats(&self) {
        let stats = self.predictor.stats();
        observability::record_compression(stats.total, stats.transmitted, stats.skipped);
        info!(
            total = stats.total,
            transmitted = stats.transmitted,
            skipped = stats.skipped,
            compression_ratio = %format!("{:.1}%", stats.compression_ratio()),
            "[STATS]"
        );
    }
}

/// Non-blocking check of a pinned shutdown future
async fn shutdown_requested<F: Future<Output = ()>>(shutdown: Pin<&mut F>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown => true,
        _ = std::future::ready(()) => false,
    }
}
