//! Shared fixtures: a forwarder wired to a mock uplink, a file-backed buffer
//! and a manual clock, plus a recording HTTP server.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{
    Connectivity, ForwarderConfig, PredictorConfig, RawFrame, StorageConfig, Vin,
};
use forwarder::{Forwarder, MockUplink};
use predictor::{ManualClock, Predictor};
use store::SqliteBuffer;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const VIN_A: &str = "5YJ3E1EA1KF000001";
pub const VIN_B: &str = "5YJ3E1EA2KF000002";

pub type TestForwarder<U = MockUplink> = Forwarder<U, SqliteBuffer, ManualClock>;

pub fn vin(s: &str) -> Vin {
    Vin::new(s).unwrap()
}

/// No pacing and no drain delay
pub fn fast_config(start_online: bool) -> ForwarderConfig {
    ForwarderConfig {
        drain_inter_send_delay_ms: 0,
        frame_pacing_delay_ms: 0,
        stats_interval: 50,
        start_online,
    }
}

/// Fully populated record
pub fn frame(timestamp: u64, speed: f32) -> RawFrame {
    RawFrame {
        timestamp,
        odometer: 15_000.5,
        speed: Some(speed),
        power: Some(12.0),
        battery: Some(80),
        heading: Some(90),
    }
}

pub fn storage_in(dir: &TempDir) -> StorageConfig {
    StorageConfig {
        data_dir: dir.path().to_path_buf(),
        ..StorageConfig::default()
    }
}

/// One agent instance with handles the test keeps
pub struct Harness {
    pub forwarder: TestForwarder,
    pub uplink: MockUplink,
    pub link: Connectivity,
    pub clock: ManualClock,
    pub buffer_path: PathBuf,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(online: bool) -> Self {
        Self::with_predictor(online, PredictorConfig::default())
    }

    pub fn with_predictor(online: bool, predictor: PredictorConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let vin = vin(VIN_A);
        let buffer_path = storage_in(&dir).buffer_path(&vin);
        let store = SqliteBuffer::open(&buffer_path, None).unwrap();

        let uplink = MockUplink::new();
        let link = Connectivity::new(online);
        let clock = ManualClock::new();
        let predictor = Predictor::with_clock(predictor, clock.clone());

        let forwarder = Forwarder::new(
            vin,
            fast_config(online),
            predictor,
            uplink.clone(),
            store,
            link.clone(),
        );

        Self {
            forwarder,
            uplink,
            link,
            clock,
            buffer_path,
            dir,
        }
    }

    /// Process a frame, then let one second of monotonic time pass
    pub async fn tick(&mut self, raw: RawFrame) {
        self.forwarder.process(raw).await;
        self.clock.advance(Duration::from_secs(1));
    }
}

/// One POST as seen by the recording server
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub vin: Option<String>,
    pub content_type: Option<String>,
    pub compressed: Option<String>,
    pub body: Vec<u8>,
}

/// Minimal HTTP/1.1 endpoint answering 200 to everything
pub struct RecordingServer {
    pub url: String,
    posts: Arc<Mutex<Vec<RecordedPost>>>,
}

impl RecordingServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/upload", listener.local_addr().unwrap());
        let posts = Arc::new(Mutex::new(Vec::new()));

        let recorder = Arc::clone(&posts);
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let recorder = Arc::clone(&recorder);
                tokio::spawn(serve_one(socket, recorder));
            }
        });

        Self { url, posts }
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().unwrap().clone()
    }
}

/// Read one request, record it, then answer. Recording first means a
/// client that saw the 200 also sees its post in `posts()`.
async fn serve_one(mut socket: TcpStream, recorder: Arc<Mutex<Vec<RecordedPost>>>) -> Option<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let (head_end, length) = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_head_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let length = header(&head, "content-length")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            break (end, length);
        }
    };

    while buf.len() < head_end + 4 + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let post = RecordedPost {
        vin: header(&head, "x-vehicle-vin"),
        content_type: header(&head, "content-type"),
        compressed: header(&head, "x-compressed"),
        body: buf[head_end + 4..head_end + 4 + length].to_vec(),
    };

    recorder.lock().unwrap().push(post);

    let response = "HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
    socket.write_all(response.as_bytes()).await.ok()
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn header(head: &str, name: &str) -> Option<String> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}
