use std::sync::Arc;

use crate::dialog::frustration::FrustrationMonitor;
use crate::dialog::retry::RetryEngine;
use crate::models::config::VoiceRuntimeConfig;
use crate::models::error::VoiceError;
use crate::runtime::arbiter::DeviceArbiter;
use crate::runtime::idle::IdleMonitor;
use crate::runtime::recognizer::Recognizer;
use crate::runtime::synthesizer::Synthesizer;
use crate::session::capture::CaptureSession;
use crate::traits::artifact_sink::ArtifactSink;
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::speech_engine::SpeechEngine;
use crate::traits::transcription::TranscriptionBackend;
use crate::traits::voice_delegate::VoiceDelegate;

/// Everything a runtime is assembled from.
pub struct RuntimeParts {
    pub config: VoiceRuntimeConfig,
    pub provider: Box<dyn CaptureProvider>,
    pub transcription: Arc<dyn TranscriptionBackend>,
    /// Synthesis chain, highest priority first.
    pub engines: Vec<Arc<dyn SpeechEngine>>,
    pub delegate: Option<Arc<dyn VoiceDelegate>>,
    pub artifact_sink: Option<Arc<dyn ArtifactSink>>,
}

/// Fully wired voice runtime for one user session.
pub struct VoiceRuntime {
    config: VoiceRuntimeConfig,
    synthesizer: Arc<Synthesizer>,
    capture: Arc<CaptureSession>,
    retry: RetryEngine,
    frustration: FrustrationMonitor,
    idle: Option<IdleMonitor>,
}

impl VoiceRuntime {
    /// Validate the configuration, probe the synthesis chain and wire the
    /// components together. Must be called inside a tokio runtime.
    pub async fn start(parts: RuntimeParts) -> Result<Self, VoiceError> {
        let RuntimeParts {
            config,
            provider,
            transcription,
            engines,
            delegate,
            artifact_sink,
        } = parts;
        config.validate().map_err(VoiceError::ConfigurationFailed)?;
        if engines.is_empty() {
            return Err(VoiceError::ConfigurationFailed("no speech engines configured".into()));
        }

        let arbiter = Arc::new(DeviceArbiter::new(provider.device_info()));
        let recognizer = Arc::new(Recognizer::new(transcription, config.recognizer.clone()));

        let mut synthesizer = Synthesizer::initialize(engines, config.synthesizer.clone()).await;
        let mut capture = CaptureSession::new(arbiter, provider, recognizer, &config);
        if let Some(ref delegate) = delegate {
            synthesizer.set_delegate(Arc::clone(delegate));
            capture.set_delegate(Arc::clone(delegate));
        }
        if let Some(sink) = artifact_sink {
            capture.set_artifact_sink(sink);
        }

        let synthesizer = Arc::new(synthesizer);
        let capture = Arc::new(capture);
        let mut retry = RetryEngine::new(Arc::clone(&synthesizer), Arc::clone(&capture), &config);
        if let Some(delegate) = delegate {
            retry.set_delegate(delegate);
        }

        let idle = config.idle_timeout.map(IdleMonitor::start);
        let frustration = FrustrationMonitor::new(config.frustration.clone());

        log::info!(
            "Voice runtime ready: language {}, audio root {}",
            config.language,
            config.audio_root.display()
        );
        Ok(Self {
            config,
            synthesizer,
            capture,
            retry,
            frustration,
            idle,
        })
    }

    pub fn config(&self) -> &VoiceRuntimeConfig {
        &self.config
    }

    pub fn synthesizer(&self) -> &Arc<Synthesizer> {
        &self.synthesizer
    }

    pub fn capture(&self) -> &Arc<CaptureSession> {
        &self.capture
    }

    pub fn retry(&self) -> &RetryEngine {
        &self.retry
    }

    pub fn frustration(&self) -> &FrustrationMonitor {
        &self.frustration
    }

    pub fn idle(&self) -> Option<&IdleMonitor> {
        self.idle.as_ref()
    }

    /// Record user activity for the idle monitor.
    pub fn touch(&self) {
        if let Some(ref idle) = self.idle {
            idle.touch();
        }
    }

    pub fn stop_speaking(&self) {
        self.synthesizer.stop();
    }
}
