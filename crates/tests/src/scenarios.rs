//! Scenario tests: one forwarder, scripted connectivity and uplink health.

use std::io::Cursor;
use std::time::Duration;

use contracts::{Connectivity, Field, FrameStore, PredictorConfig};
use forwarder::{Forwarder, HttpUplink};
use ingestion::JsonlSource;
use predictor::{ManualClock, Predictor};
use store::SqliteBuffer;

use crate::support::*;

#[tokio::test]
async fn test_offline_burst_drains_before_live_frame() {
    let mut h = Harness::new(false);

    for ts in [1000, 1100, 1200, 1300, 1400] {
        h.forwarder.process(frame(ts, 30.0)).await;
    }
    assert_eq!(h.uplink.attempts(), 0);
    assert_eq!(h.forwarder.store().len().unwrap(), 5);

    h.link.set_online(true);
    h.forwarder.process(frame(1500, 30.0)).await;

    let frames = h.uplink.frames();
    let timestamps: Vec<u64> = frames.iter().map(|f| f.timestamp).collect();
    assert_eq!(timestamps, vec![1000, 1100, 1200, 1300, 1400, 1500]);
    assert!(frames[..5].iter().all(|f| f.is_resync));
    assert!(!frames[5].is_resync);
    assert_eq!(h.forwarder.store().len().unwrap(), 0);
    assert!(!h.forwarder.is_degraded());
}

#[tokio::test]
async fn test_uplink_failure_buffers_then_drains() {
    let mut h = Harness::new(true);

    h.uplink.set_failing(true);
    h.forwarder.process(frame(2000, 30.0)).await;

    let rows: Vec<_> = h.forwarder.store().scan().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, 2000);
    let buffered = codec::decode(&rows[0].payload).unwrap();
    assert!(buffered.is_resync);
    assert!(h.forwarder.is_degraded());

    h.uplink.set_failing(false);
    h.forwarder.process(frame(2100, 30.0)).await;

    let frames = h.uplink.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!((frames[0].timestamp, frames[0].is_resync), (2000, true));
    assert_eq!(frames[1].timestamp, 2100);
    assert_eq!(h.forwarder.store().len().unwrap(), 0);
    assert!(!h.forwarder.is_degraded());
}

#[tokio::test]
async fn test_threshold_filtering_on_speed() {
    let mut h = Harness::new(true);

    for (i, speed) in [10.0, 10.5, 11.0, 13.0, 13.1].into_iter().enumerate() {
        h.tick(frame(i as u64 * 1000, speed)).await;
    }

    let carried: Vec<bool> = h
        .uplink
        .frames()
        .iter()
        .map(|f| f.is_present(Field::Speed))
        .collect();
    assert_eq!(carried, vec![true, false, false, true, false]);
    assert!(h.uplink.frames().iter().all(|f| !f.is_resync));
}

#[tokio::test]
async fn test_forced_resync_with_static_signal() {
    let config = PredictorConfig {
        resync_interval_secs: 30.0,
        ..PredictorConfig::default()
    };
    let mut h = Harness::with_predictor(true, config);

    for second in 0..35u64 {
        h.tick(frame(second * 1000, 42.0)).await;
    }

    let frames = h.uplink.frames();
    assert_eq!(frames.len(), 35);

    let resyncs: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_resync)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(resyncs, vec![30]);
    assert_eq!(frames[30].present_count(), 4);

    // First observation carries every field; afterwards only the resync does
    assert_eq!(frames[0].present_count(), 4);
    assert!(frames[1..30].iter().all(|f| f.present_count() == 0));
    assert!(frames[31..].iter().all(|f| f.present_count() == 0));
}

#[tokio::test]
async fn test_malformed_line_is_dropped() {
    let input = concat!(
        "{\"timestamp\": 1000, \"odometer\": \n",
        "{\"timestamp\": 1100, \"odometer\": 15000.5, \"speed\": 30.0, \"power\": 12.0, \"battery\": 80, \"heading\": 90}\n",
    );
    let source = JsonlSource::from_reader("s5", Cursor::new(input));
    let mut h = Harness::new(true);

    let report = h.forwarder.run(source).await;

    assert_eq!(report.counters.frames_read, 2);
    assert_eq!(report.counters.parse_errors, 1);
    assert_eq!(report.counters.live_posts, 1);
    let frames = h.uplink.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].timestamp, 1100);
}

#[tokio::test]
async fn test_non_utf8_line_is_dropped_and_stream_continues() {
    let mut input = b"{\"timestamp\": 1000, \"odometer\": 15000.5, \"speed\": 30.0}\n".to_vec();
    input.extend_from_slice(b"\xff\xfe garbage\n");
    input.extend_from_slice(b"{\"timestamp\": 1100, \"odometer\": 15000.6, \"speed\": 30.0}\n");
    input.extend_from_slice(b"{\"timestamp\": 1200, \"odometer\": 15000.7, \"speed\": 30.0}\n");
    let source = JsonlSource::from_reader("s5-bytes", Cursor::new(input));
    let mut h = Harness::new(true);

    let report = h.forwarder.run(source).await;

    assert_eq!(report.counters.frames_read, 4);
    assert_eq!(report.counters.parse_errors, 1);
    let timestamps: Vec<u64> = h.uplink.frames().iter().map(|f| f.timestamp).collect();
    assert_eq!(timestamps, vec![1000, 1100, 1200]);
}

#[tokio::test]
async fn test_vehicles_sharing_a_directory_stay_isolated() {
    let server = RecordingServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = storage_in(&dir);

    let mut agents = Vec::new();
    for id in [VIN_A, VIN_B] {
        let vin = vin(id);
        let path = storage.buffer_path(&vin);
        let store = SqliteBuffer::open(&path, None).unwrap();
        let uplink = HttpUplink::with_url(&server.url, vin.clone(), Duration::from_secs(2)).unwrap();
        let link = Connectivity::new(false);
        let predictor = Predictor::with_clock(PredictorConfig::default(), ManualClock::new());
        let forwarder = Forwarder::new(vin, fast_config(false), predictor, uplink, store, link.clone());
        agents.push((forwarder, link, path));
    }

    assert_ne!(agents[0].2, agents[1].2);

    for ts in [1000, 1100, 1200] {
        agents[0].0.process(frame(ts, 30.0)).await;
    }
    for ts in [5000, 5100] {
        agents[1].0.process(frame(ts, 50.0)).await;
    }

    // A reconnects and drains; B's rows stay put
    agents[0].1.set_online(true);
    agents[0].0.process(frame(1300, 30.0)).await;

    assert_eq!(agents[0].0.store().len().unwrap(), 0);
    assert_eq!(agents[1].0.store().len().unwrap(), 2);

    let posts = server.posts();
    assert_eq!(posts.len(), 4);
    assert!(posts.iter().all(|p| p.vin.as_deref() == Some(VIN_A)));
    assert!(posts.iter().all(|p| p.compressed.as_deref() == Some("true")));
    assert!(posts
        .iter()
        .all(|p| p.content_type.as_deref() == Some("application/octet-stream")));

    agents[1].1.set_online(true);
    agents[1].0.process(frame(5200, 50.0)).await;

    let posts = server.posts();
    let from_b: Vec<u64> = posts
        .iter()
        .filter(|p| p.vin.as_deref() == Some(VIN_B))
        .map(|p| codec::decode(&p.body).unwrap().timestamp)
        .collect();
    assert_eq!(from_b.len(), 3);
    assert!(from_b.contains(&5000) && from_b.contains(&5100) && from_b.contains(&5200));
    assert_eq!(agents[1].0.store().len().unwrap(), 0);
}
