//! Whole-pipeline properties: what must hold for any input stream.

use contracts::{Connectivity, Field, FrameStore, PredictorConfig, RawFrame};
use forwarder::{Forwarder, MockUplink};
use predictor::{ManualClock, Predictor, Reconstructor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use store::SqliteBuffer;

use crate::support::*;

/// Bounded random walk around a cruising vehicle
fn random_drive(seed: u64, len: usize) -> Vec<RawFrame> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (mut speed, mut power, mut battery, mut heading) = (45.0f32, 20.0f32, 80i32, 180i32);
    let mut odometer = 15_000.0f32;

    (0..len)
        .map(|i| {
            speed = (speed + rng.random_range(-3.0f32..3.0)).clamp(0.0, 90.0);
            power = (power + rng.random_range(-8.0f32..8.0)).clamp(-50.0, 150.0);
            if rng.random_range(0u32..10) == 0 {
                battery = (battery - 1).max(0);
            }
            heading = (heading + rng.random_range(-7i32..=7)).clamp(0, 359);
            odometer += speed / 3600.0;

            RawFrame {
                timestamp: 1_700_000_000_000 + i as u64 * 1000,
                odometer,
                speed: Some(speed),
                power: Some(power),
                battery: Some(battery),
                heading: Some(heading),
            }
        })
        .collect()
}

#[tokio::test]
async fn test_offline_frame_survives_restart() {
    let mut h = Harness::new(false);
    h.forwarder.process(frame(1000, 31.5)).await;
    h.forwarder.process(frame(1100, 32.0)).await;

    // Crash: the forwarder and its connection go away, the file stays
    let Harness {
        forwarder,
        buffer_path,
        dir: _dir,
        ..
    } = h;
    drop(forwarder);

    let reopened = SqliteBuffer::open(&buffer_path, None).unwrap();
    let rows: Vec<_> = reopened.scan().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);

    let first = codec::decode(&rows[0].payload).unwrap();
    assert_eq!(first.timestamp, 1000);
    assert_eq!(first.odometer, 15_000.5);
    assert!(first.is_resync);
    assert_eq!(first.speed, Some(31.5));
    assert_eq!(first.battery, Some(80));

    // The next agent starts degraded and drains at its first online frame
    let uplink = MockUplink::new();
    let predictor = Predictor::with_clock(PredictorConfig::default(), ManualClock::new());
    let mut forwarder = Forwarder::new(
        vin(VIN_A),
        fast_config(true),
        predictor,
        uplink.clone(),
        reopened,
        Connectivity::new(true),
    );
    assert!(forwarder.is_degraded());

    forwarder.process(frame(1200, 33.0)).await;
    let timestamps: Vec<u64> = uplink.frames().iter().map(|f| f.timestamp).collect();
    assert_eq!(timestamps, vec![1000, 1100, 1200]);
    assert_eq!(forwarder.store().len().unwrap(), 0);
}

#[tokio::test]
async fn test_server_reconstruction_tracks_the_stream() {
    let config = PredictorConfig::default();
    let mut h = Harness::with_predictor(true, config.clone());
    let mut reconstructor = Reconstructor::new(&config);

    for raw in random_drive(7, 200) {
        let before: Vec<Option<f64>> = Field::ALL
            .iter()
            .map(|f| h.forwarder.predictor().estimate(*f))
            .collect();
        h.tick(raw).await;

        let sent = h.uplink.frames().pop().unwrap();
        let rebuilt = reconstructor.apply(&sent);
        assert_eq!(rebuilt.timestamp, raw.timestamp);
        assert_eq!(rebuilt.odometer, raw.odometer);

        for (i, field) in Field::ALL.iter().enumerate() {
            let actual = match field {
                Field::Speed => raw.speed.unwrap() as f64,
                Field::Power => raw.power.unwrap() as f64,
                Field::Battery => raw.battery.unwrap() as f64,
                Field::Heading => raw.heading.unwrap() as f64,
            };

            if sent.is_resync || sent.is_present(*field) {
                assert_eq!(rebuilt.value(*field), actual, "{field:?} at {}", raw.timestamp);
            } else {
                let edge = before[i].unwrap();
                assert!(
                    (actual - edge).abs() <= config.threshold(*field),
                    "{field:?} at {} skipped outside threshold",
                    raw.timestamp
                );
            }
        }
    }

    assert!(h.uplink.frames().iter().filter(|f| f.is_resync).count() >= 6);
}

#[tokio::test]
async fn test_transmitted_plus_skipped_is_total() {
    let mut h = Harness::new(true);
    let len = 200;

    for raw in random_drive(11, len) {
        h.tick(raw).await;
    }

    let stats = h.forwarder.predictor().stats();
    assert_eq!(stats.total, len as u64);
    assert_eq!(stats.total, stats.transmitted + stats.skipped);

    // One resync per 30 frames at 1 Hz at the very least
    let floor = (len as f64 / 30.0).floor() as u64;
    assert!(stats.transmitted >= floor);

    let report = h.forwarder.report();
    assert_eq!(report.compression, stats);
}

#[tokio::test]
async fn test_buffered_frames_arrive_in_order_before_live() {
    let mut h = Harness::new(true);

    h.link.set_online(false);
    for ts in [100, 200, 300] {
        h.forwarder.process(frame(ts, 30.0)).await;
    }

    // Reconnect, but the first drain upload fails: the pass aborts and the
    // live frame joins the back of the buffer.
    h.link.set_online(true);
    h.uplink.fail_next(1);
    h.forwarder.process(frame(400, 30.0)).await;
    assert_eq!(h.uplink.post_count(), 0);
    assert_eq!(h.forwarder.store().len().unwrap(), 4);

    h.forwarder.process(frame(500, 30.0)).await;

    let frames = h.uplink.frames();
    let timestamps: Vec<u64> = frames.iter().map(|f| f.timestamp).collect();
    assert_eq!(timestamps, vec![100, 200, 300, 400, 500]);
    assert!(frames[..4].iter().all(|f| f.is_resync));
    assert_eq!(h.forwarder.store().len().unwrap(), 0);
}

#[tokio::test]
async fn test_each_buffered_frame_is_posted_once() {
    let mut h = Harness::new(false);
    let buffered = 7u64;

    for i in 0..buffered {
        h.forwarder.process(frame(1000 + i * 100, 30.0)).await;
    }
    assert_eq!(h.forwarder.store().len().unwrap(), buffered);

    h.link.set_online(true);
    h.forwarder.process(frame(9000, 30.0)).await;
    // A second online frame finds nothing left to drain
    h.forwarder.process(frame(9100, 30.0)).await;

    assert_eq!(h.uplink.attempts() as u64, buffered + 2);
    assert_eq!(h.forwarder.metrics().snapshot().drained, buffered);
    assert_eq!(h.forwarder.store().len().unwrap(), 0);
}

#[tokio::test]
async fn test_resync_cadence_at_one_hertz() {
    let mut h = Harness::new(true);

    for second in 0..95u64 {
        h.tick(frame(second * 1000, 55.0)).await;
    }

    let frames = h.uplink.frames();
    let resyncs: Vec<u64> = frames
        .iter()
        .filter(|f| f.is_resync)
        .map(|f| f.timestamp / 1000)
        .collect();
    assert_eq!(resyncs, vec![30, 60, 90]);

    assert!(frames
        .iter()
        .skip(1)
        .filter(|f| !f.is_resync)
        .all(|f| f.present_count() == 0));
}
