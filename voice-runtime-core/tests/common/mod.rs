#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use voice_runtime_core::{
    AudioBuffer, AudioBufferCallback, AudioFormat, CaptureProvider, ChannelDelegate, CorrelationTags, DeviceInfo,
    RuntimeParts, SpeechEngine, SpeechOptions, TranscriptionBackend, VoiceError, VoiceEvent, VoiceRuntime,
    VoiceRuntimeConfig,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const TEST_RATE: u32 = 8000;

pub fn tags() -> CorrelationTags {
    CorrelationTags::for_speaker("12").with_exercise("4", "pato", "inicial", 1)
}

/// Microphone that delivers one second of a constant amplitude per start.
pub struct ScriptedProvider {
    amplitudes: VecDeque<f32>,
    pub starts: Arc<AtomicUsize>,
    pub overlaps: Arc<AtomicUsize>,
    active: Arc<AtomicBool>,
}

impl ScriptedProvider {
    pub fn new(amplitudes: Vec<f32>) -> Self {
        Self {
            amplitudes: amplitudes.into(),
            starts: Arc::new(AtomicUsize::new(0)),
            overlaps: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl CaptureProvider for ScriptedProvider {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), VoiceError> {
        if self.active.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        let amplitude = self.amplitudes.pop_front().unwrap_or(0.0);
        callback(&vec![amplitude; TEST_RATE as usize], TEST_RATE as f64, 1);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), VoiceError> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::default_input()
    }
}

/// One scripted recognizer answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(&'static str),
    Silence,
    Hang,
    Fail(VoiceError),
    /// The first sample of the buffer, formatted with one decimal.
    Echo,
}

pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    pub calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranscriptionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn transcribe(&self, audio: &AudioBuffer, _language: &str) -> Result<String, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().pop_front().unwrap_or(Reply::Silence);
        match reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Silence => Err(VoiceError::NoSpeechDetected),
            Reply::Hang => std::future::pending().await,
            Reply::Fail(e) => Err(e),
            Reply::Echo => Ok(format!("{:.1}", audio.samples.first().copied().unwrap_or(0.0))),
        }
    }
}

/// Speech engine that records what it was asked to say.
pub struct RecordingEngine {
    name: &'static str,
    fails: bool,
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingEngine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fails: false,
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fails: true,
            ..Self::new(name)
        }
    }
}

#[async_trait]
impl SpeechEngine for RecordingEngine {
    fn name(&self) -> &str {
        self.name
    }

    async fn probe(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, _options: &SpeechOptions) -> Result<(), VoiceError> {
        self.spoken.lock().push(text.to_string());
        if self.fails {
            Err(VoiceError::ServiceUnavailable("offline".into()))
        } else {
            Ok(())
        }
    }
}

pub struct Harness {
    pub runtime: VoiceRuntime,
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub starts: Arc<AtomicUsize>,
    pub overlaps: Arc<AtomicUsize>,
    pub backend: Arc<ScriptedBackend>,
    pub events: UnboundedReceiver<VoiceEvent>,
    pub root: TempDir,
}

impl Harness {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn captures(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

pub fn test_config(root: &TempDir) -> VoiceRuntimeConfig {
    let mut config = VoiceRuntimeConfig::default();
    config.recording = AudioFormat {
        sample_rate: TEST_RATE,
        channels: 1,
        bit_depth: 16,
    };
    config.recording_duration = Duration::from_millis(100);
    config.audio_root = root.path().to_path_buf();
    config.device.acquire_timeout = Duration::from_millis(50);
    config
}

pub async fn harness(replies: Vec<Reply>) -> Harness {
    harness_with(replies, Vec::new(), |_| {}).await
}

pub async fn harness_with(
    replies: Vec<Reply>,
    amplitudes: Vec<f32>,
    adjust: impl FnOnce(&mut VoiceRuntimeConfig),
) -> Harness {
    init_logging();
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(&root);
    adjust(&mut config);

    let provider = ScriptedProvider::new(amplitudes);
    let starts = Arc::clone(&provider.starts);
    let overlaps = Arc::clone(&provider.overlaps);
    let backend = Arc::new(ScriptedBackend::new(replies));
    let engine = RecordingEngine::new("recording");
    let spoken = Arc::clone(&engine.spoken);
    let (delegate, events) = ChannelDelegate::new();

    let runtime = VoiceRuntime::start(RuntimeParts {
        config,
        provider: Box::new(provider),
        transcription: backend.clone(),
        engines: vec![Arc::new(engine)],
        delegate: Some(Arc::new(delegate)),
        artifact_sink: None,
    })
    .await
    .unwrap();

    Harness {
        runtime,
        spoken,
        starts,
        overlaps,
        backend,
        events,
        root,
    }
}
