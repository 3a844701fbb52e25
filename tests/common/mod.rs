//! Shared utilities for integration tests.

#![allow(dead_code)]

use serde_json::{Map, Value};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing_subscriber::fmt::MakeWriter;

use trace_logger::config::{LogFormat, LoggingConfig, ProjectConfig};
use trace_logger::LoggerBuilder;

pub const TRACE_ID: &str = "0af7651916cd43dd8448eb211c80319c";
pub const SPAN_ID: &str = "b7ad6b7169203331";
pub const TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

pub const GCP_FIELDS: [&str; 3] = [
    "logging.googleapis.com/trace",
    "logging.googleapis.com/spanId",
    "logging.googleapis.com/trace_sampled",
];

/// How the mock metadata server answers.
#[derive(Clone)]
pub struct MetadataBehavior {
    pub status: u16,
    pub body: &'static str,
    pub delay: Duration,
}

impl MetadataBehavior {
    pub fn project(body: &'static str) -> Self {
        Self {
            status: 200,
            body,
            delay: Duration::ZERO,
        }
    }
}

/// A running mock metadata server.
pub struct MockMetadata {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockMetadata {
    pub fn url(&self) -> String {
        format!("http://{}/computeMetadata/v1/project/project-id", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Resolver config pointing at this server, with an env var nobody sets.
    pub fn project_config(&self, timeout_ms: u64) -> ProjectConfig {
        ProjectConfig {
            env_var: "TRACE_LOGGER_TEST_PROJECT_NEVER_SET".to_string(),
            metadata_url: self.url(),
            timeout_ms,
            ..ProjectConfig::default()
        }
    }
}

/// Start a mock metadata server on an ephemeral port.
pub async fn start_metadata_server(behavior: MetadataBehavior) -> MockMetadata {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let server_hits = hits.clone();
    let server_requests = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let behavior = behavior.clone();
                    let hits = server_hits.clone();
                    let requests = server_requests.clone();
                    tokio::spawn(async move {
                        let request = read_request_head(&mut socket).await;
                        hits.fetch_add(1, Ordering::SeqCst);
                        requests.lock().unwrap().push(request);

                        tokio::time::sleep(behavior.delay).await;
                        let status_text = match behavior.status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            behavior.body.len(),
                            behavior.body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockMetadata {
        addr,
        hits,
        requests,
    }
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// In-memory log sink.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Every line parsed as a JSON object.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Records whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<Map<String, Value>> {
        self.records()
            .into_iter()
            .filter(|r| r.get("message") == Some(&Value::from(message)))
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install a JSON subscriber for the current thread.
///
/// Tests using this must run on a current-thread runtime so every task logs
/// on the thread holding the guard.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    capture_logs_at("info")
}

/// Like [`capture_logs`] with an explicit filter directive.
pub fn capture_logs_at(level: &str) -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = LoggerBuilder::new(LoggingConfig {
        level: level.to_string(),
        format: LogFormat::Json,
        environment: "test".to_string(),
    })
    .build_with_writer(logs.clone())
    .unwrap();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

/// Assert that a record carries none of the trace-derived fields.
pub fn assert_no_trace_fields(record: &Map<String, Value>) {
    for key in ["traceId", "spanId"].iter().chain(GCP_FIELDS.iter()) {
        assert!(!record.contains_key(*key), "unexpected {key} in {record:?}");
    }
}
