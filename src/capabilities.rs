//! Capability interfaces supplied by the host
//!
//! The dispatch core never talks to devices, speech engines or the network
//! directly. Each collaborator is a trait with a small error enum, and this
//! module also carries the host implementations used by the binary.

use chrono::{DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Failures reported by a speech recognizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechInputError {
    /// No recognizer is available on this host
    #[error("speech recognition is not supported")]
    Unsupported,
    /// Listening finished without any speech
    #[error("no-speech")]
    NoSpeech,
    /// The recognizer failed
    #[error("{0}")]
    Recognition(String),
    /// The input source has ended and will yield no more utterances
    #[error("input closed")]
    Closed,
}

/// Failures reported by a speech synthesizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutputError {
    #[error("synthesis failed: {0}")]
    Synthesis(String),
}

/// Failures reported by a network fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("resource not found")]
    NotFound,
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
}

/// Failures reported by a camera device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("camera requires a secure context")]
    InsecureContext,
}

/// Handle to an open camera stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CameraHandle(Uuid);

impl CameraHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for CameraHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Yields one recognized utterance per call
pub trait SpeechInput: Send {
    fn listen(&mut self) -> Result<String, SpeechInputError>;
}

/// Speaks text, fire-and-forget
pub trait SpeechOutput: Send {
    fn speak(&mut self, text: &str) -> Result<(), SpeechOutputError>;
}

/// Media playback
///
/// Track completion is reported back through
/// [`OrchestratorHandle::track_ended`](crate::OrchestratorHandle::track_ended).
pub trait AudioPlayback: Send {
    fn play(&mut self, locator: &str);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
}

/// JSON-over-HTTP GET
pub trait NetworkFetch: Send {
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Camera access
pub trait CameraDevice: Send {
    fn open(&mut self) -> Result<CameraHandle, CameraError>;
    fn close(&mut self, handle: CameraHandle);
}

/// Wall clock and periodic tick source
pub trait Clock: Send {
    fn now(&self) -> DateTime<Local>;

    /// A receiver that yields once per `period` until dropped
    fn ticker(&self, period: Duration) -> Receiver<Instant>;
}

// === Host implementations ===

/// Reads one utterance per line from any buffered reader (stdin in the binary)
pub struct LineSpeechInput<R> {
    reader: R,
}

impl<R: BufRead + Send> LineSpeechInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send> SpeechInput for LineSpeechInput<R> {
    fn listen(&mut self) -> Result<String, SpeechInputError> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Err(SpeechInputError::Closed),
            Ok(_) if line.trim().is_empty() => Err(SpeechInputError::NoSpeech),
            Ok(_) => Ok(line.trim().to_string()),
            Err(e) => Err(SpeechInputError::Recognition(e.to_string())),
        }
    }
}

/// Prints spoken text to stdout
#[derive(Default)]
pub struct ConsoleSpeechOutput;

impl SpeechOutput for ConsoleSpeechOutput {
    fn speak(&mut self, text: &str) -> Result<(), SpeechOutputError> {
        println!("assistant: {}", text);
        Ok(())
    }
}

/// Playback that only records what it was asked to do
#[derive(Default)]
pub struct LoggingPlayback;

impl AudioPlayback for LoggingPlayback {
    fn play(&mut self, locator: &str) {
        info!("Playback: play {}", locator);
    }

    fn pause(&mut self) {
        info!("Playback: pause");
    }

    fn resume(&mut self) {
        info!("Playback: resume");
    }

    fn stop(&mut self) {
        info!("Playback: stop");
    }

    fn set_volume(&mut self, volume: f32) {
        info!("Playback: volume {:.1}", volume);
    }
}

/// Blocking HTTP fetch backed by reqwest
pub struct HttpFetch {
    client: reqwest::blocking::Client,
}

impl HttpFetch {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl NetworkFetch for HttpFetch {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(classify_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {}", status)));
        }

        response.json::<Value>().map_err(classify_reqwest_error)
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Camera for hosts without video capture
#[derive(Default)]
pub struct UnavailableCamera;

impl CameraDevice for UnavailableCamera {
    fn open(&mut self) -> Result<CameraHandle, CameraError> {
        warn!("No camera device available");
        Err(CameraError::PermissionDenied)
    }

    fn close(&mut self, _handle: CameraHandle) {}
}

/// Local time and real periodic ticks
#[derive(Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn ticker(&self, period: Duration) -> Receiver<Instant> {
        crossbeam_channel::tick(period)
    }
}

/// Clock whose ticks are fired by hand
///
/// Clones share the same tick source, so a test can keep one clone and hand
/// another to the orchestrator.
#[derive(Clone)]
pub struct ManualClock {
    now: DateTime<Local>,
    current: Arc<Mutex<Option<Sender<Instant>>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now,
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Fire one tick on the most recently created ticker
    ///
    /// Returns false when no ticker is live.
    pub fn tick(&self) -> bool {
        let guard = self.current.lock();
        match guard.as_ref() {
            Some(tx) => tx.send(Instant::now()).is_ok(),
            None => false,
        }
    }

    /// Fire `count` ticks, stopping early if the ticker goes away
    pub fn advance(&self, count: u32) -> u32 {
        let mut fired = 0;
        for _ in 0..count {
            if !self.tick() {
                break;
            }
            fired += 1;
        }
        fired
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now
    }

    fn ticker(&self, _period: Duration) -> Receiver<Instant> {
        let (tx, rx) = unbounded();
        *self.current.lock() = Some(tx);
        rx
    }
}
