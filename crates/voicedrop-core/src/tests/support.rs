#![allow(clippy::unwrap_used)]

use crate::{
    CaptureDevice, CoreError, CoreResult, EncodingProfile, UploadOutcome, Uploader,
    permission::ConsentPrompt,
};

use std::{
    fs::File,
    io::BufWriter,
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
};
use error_location::ErrorLocation;
use hound::{WavSpec, WavWriter};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    sync::Notify,
};

pub(crate) const INGEST_PATH: &str = "/tasks/create/";

/// What a [`SilentDevice`] was asked to do.
#[derive(Default)]
pub(crate) struct DeviceProbe {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub artifacts: Mutex<Vec<PathBuf>>,
}

impl DeviceProbe {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn last_artifact(&self) -> Option<PathBuf> {
        self.artifacts.lock().unwrap().last().cloned()
    }
}

/// Capture device that "records" a fixed stretch of silence.
pub(crate) struct SilentDevice {
    probe: Arc<DeviceProbe>,
    seconds: u32,
    fail_open: bool,
    write_file: bool,
    spec: Option<WavSpec>,
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl SilentDevice {
    pub fn new(probe: Arc<DeviceProbe>, seconds: u32) -> Self {
        Self {
            probe,
            seconds,
            fail_open: false,
            write_file: true,
            spec: None,
            writer: None,
        }
    }

    /// A device with no usable input.
    pub fn unavailable(probe: Arc<DeviceProbe>) -> Self {
        Self {
            fail_open: true,
            ..Self::new(probe, 0)
        }
    }

    /// A device that reports success but never creates the artifact.
    pub fn without_file(probe: Arc<DeviceProbe>) -> Self {
        Self {
            write_file: false,
            ..Self::new(probe, 0)
        }
    }
}

impl CaptureDevice for SilentDevice {
    #[track_caller]
    fn open(&mut self, profile: &EncodingProfile) -> CoreResult<()> {
        if self.fail_open {
            return Err(CoreError::DeviceUnavailable {
                reason: "No microphone found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        self.spec = Some(profile.wav_spec());
        Ok(())
    }

    #[track_caller]
    fn record_to(&mut self, artifact: &Path) -> CoreResult<()> {
        let spec = self.spec.ok_or(CoreError::NotArmed {
            location: ErrorLocation::from(Location::caller()),
        })?;
        if self.write_file {
            let writer =
                WavWriter::create(artifact, spec).map_err(|e| CoreError::ArtifactWriteError {
                    reason: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            self.writer = Some(writer);
        }
        self.probe
            .artifacts
            .lock()
            .unwrap()
            .push(artifact.to_path_buf());
        Ok(())
    }

    #[track_caller]
    fn finalize(&mut self) -> CoreResult<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let rate = self.spec.map(|s| s.sample_rate).unwrap_or_default();
        for _ in 0..(rate * self.seconds) {
            writer
                .write_sample(0i16)
                .map_err(|e| CoreError::ArtifactWriteError {
                    reason: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }
        writer
            .finalize()
            .map_err(|e| CoreError::ArtifactWriteError {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn close(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        self.spec = None;
    }
}

/// Uploader replaying scripted outcomes; the last one repeats.
pub(crate) struct ScriptedUploader {
    outcomes: Vec<UploadOutcome>,
    pub calls: AtomicUsize,
}

impl ScriptedUploader {
    pub fn new(outcome: UploadOutcome) -> Self {
        Self::sequence(vec![outcome])
    }

    pub fn sequence(outcomes: Vec<UploadOutcome>) -> Self {
        Self {
            outcomes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(&self, _body: Vec<u8>, _content_type: &str, _endpoint: &str) -> UploadOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.outcomes.len().saturating_sub(1));
        self.outcomes
            .get(index)
            .cloned()
            .unwrap_or(UploadOutcome::Success)
    }
}

/// Uploader that stays in flight until released.
#[derive(Default)]
pub(crate) struct GatedUploader {
    pub release: Notify,
}

#[async_trait]
impl Uploader for GatedUploader {
    async fn upload(&self, _body: Vec<u8>, _content_type: &str, _endpoint: &str) -> UploadOutcome {
        self.release.notified().await;
        UploadOutcome::Success
    }
}

/// Consent prompt with a canned answer that counts how often it was shown.
pub(crate) struct CountingPrompt {
    answer: bool,
    delay: Duration,
    pub asked: AtomicUsize,
}

impl CountingPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            delay: Duration::ZERO,
            asked: AtomicUsize::new(0),
        }
    }

    /// Simulates a user who takes a while to answer.
    pub fn slow(answer: bool, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::answering(answer)
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl ConsentPrompt for CountingPrompt {
    fn ask(&self) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.answer
    }
}

/// One multipart part as seen by the ingestion server.
#[derive(Debug, Clone)]
pub(crate) struct ReceivedPart {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Clone)]
struct IngestState {
    status: StatusCode,
    reply: &'static str,
    requests: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
}

async fn ingest(
    State(state): State<IngestState>,
    mut multipart: Multipart,
) -> (StatusCode, &'static str) {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.requests.lock().unwrap().push(parts);
    (state.status, state.reply)
}

/// Ingestion endpoint running in-process.
pub(crate) struct IngestServer {
    pub endpoint: String,
    requests: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
}

impl IngestServer {
    /// Starts a server answering every upload with `status` and `reply`.
    pub async fn start(status: StatusCode, reply: &'static str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().route(INGEST_PATH, post(ingest)).with_state(IngestState {
            status,
            reply,
            requests: Arc::clone(&requests),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            endpoint: format!("http://{}{}", addr, INGEST_PATH),
            requests,
        }
    }

    /// Parts of every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<Vec<ReceivedPart>> {
        self.requests.lock().unwrap().clone()
    }
}

/// An http endpoint on a port nothing listens on.
pub(crate) async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, INGEST_PATH)
}

/// An endpoint that reads one full request, then answers with `status_line`
/// and a `Content-Length` of 100 but only three body bytes before closing.
pub(crate) async fn truncated_response_endpoint(status_line: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        read_request(&mut socket).await;
        let reply = format!("{}\r\nContent-Length: 100\r\n\r\nabc", status_line);
        let _ = socket.write_all(reply.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{}{}", addr, INGEST_PATH)
}

/// Consumes request headers and a `Content-Length` body.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut received = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => received.extend_from_slice(&chunk[..n]),
        }
    };

    let headers = String::from_utf8_lossy(&received[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while received.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => received.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Upload client that ignores proxy settings from the environment.
pub(crate) fn direct_client() -> crate::UploadClient {
    crate::UploadClient::with_http_client(reqwest::Client::builder().no_proxy().build().unwrap())
}
