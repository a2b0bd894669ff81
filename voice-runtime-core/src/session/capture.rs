use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::artifact::CaptureArtifact;
use crate::models::audio_models::{AudioBuffer, AudioFormat};
use crate::models::capture::{CaptureRequest, CaptureResult};
use crate::models::config::VoiceRuntimeConfig;
use crate::models::error::VoiceError;
use crate::processing::resampler::Resampler;
use crate::processing::wav_format;
use crate::runtime::arbiter::DeviceArbiter;
use crate::runtime::recognizer::Recognizer;
use crate::storage::artifact_store::ArtifactStore;
use crate::traits::artifact_sink::ArtifactSink;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureProvider};
use crate::traits::voice_delegate::VoiceDelegate;

type SharedProvider = Arc<Mutex<Box<dyn CaptureProvider>>>;

/// Stops the provider if the recording future is dropped mid-capture.
struct RecordingGuard {
    provider: SharedProvider,
    armed: bool,
}

impl RecordingGuard {
    fn finish(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Err(e) = self.provider.lock().stop() {
            log::warn!("Failed to stop capture provider: {}", e);
        }
    }
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One capture cycle: record a fixed duration, persist, recognize.
///
/// ```text
/// acquire lease → [Provider] → callback → downmix/resample → buffer → release lease
///                                                               │
///                                         persist (WAV + sidecar) → recognize
/// ```
///
/// Recognition always runs on the exact buffer that was persisted.
pub struct CaptureSession {
    arbiter: Arc<DeviceArbiter>,
    provider: SharedProvider,
    recognizer: Arc<Recognizer>,
    store: ArtifactStore,
    language: String,
    acquire_timeout: Duration,
    recognize_timeout: Duration,
    delegate: Option<Arc<dyn VoiceDelegate>>,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl CaptureSession {
    pub fn new(
        arbiter: Arc<DeviceArbiter>,
        provider: Box<dyn CaptureProvider>,
        recognizer: Arc<Recognizer>,
        config: &VoiceRuntimeConfig,
    ) -> Self {
        Self {
            arbiter,
            provider: Arc::new(Mutex::new(provider)),
            recognizer,
            store: ArtifactStore::new(config.write_metadata_sidecar),
            language: config.language.clone(),
            acquire_timeout: config.device.acquire_timeout,
            recognize_timeout: config.recognizer.timeout,
            delegate: None,
            sink: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn VoiceDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn set_artifact_sink(&mut self, sink: Arc<dyn ArtifactSink>) {
        self.sink = Some(sink);
    }

    pub fn arbiter(&self) -> &Arc<DeviceArbiter> {
        &self.arbiter
    }

    /// Record `request.duration` of audio, persist it, then recognize it.
    ///
    /// A busy or failing device is reported inside the result as
    /// `DeviceUnavailable`. Only storage failures are returned as `Err`.
    pub async fn record_and_recognize(&self, request: &CaptureRequest) -> Result<CaptureResult, VoiceError> {
        request.format.validate().map_err(VoiceError::ConfigurationFailed)?;

        let mut lease = match self.arbiter.acquire(self.acquire_timeout).await {
            Ok(lease) => lease,
            Err(e) => {
                log::warn!("Capture skipped: {}", e);
                return Ok(self.unavailable(request.format));
            }
        };

        let recorded = self.record(request).await;
        lease.release();
        let buffer = match recorded {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("Capture failed: {}", e);
                return Ok(self.unavailable(request.format));
            }
        };

        let levels = Resampler::levels(&buffer.samples);
        let buffer = Arc::new(buffer);

        let (file_path, metadata) = {
            let store = self.store.clone();
            let root = request.destination.clone();
            let tags = request.tags.clone();
            let persisted = Arc::clone(&buffer);
            let now = chrono::Local::now().naive_local();
            tokio::task::spawn_blocking(move || store.persist(&root, &tags, &persisted, levels, now))
                .await
                .map_err(|e| VoiceError::StorageError(format!("persist task failed: {}", e)))??
        };
        log::info!("Audio saved: {}", file_path.display());

        let recognition = self
            .recognizer
            .recognize(Arc::clone(&buffer), &self.language, self.recognize_timeout)
            .await;
        let (recognized_text, recognition_error) = match recognition {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e)),
        };

        // An abandoned recognizer task may still hold a reference.
        let samples = Arc::try_unwrap(buffer).unwrap_or_else(|shared| (*shared).clone());
        let result = CaptureResult {
            audio_file_path: Some(file_path.clone()),
            samples,
            levels,
            recognized_text: recognized_text.clone(),
            recognition_error,
        };

        if let Some(ref sink) = self.sink {
            sink.artifact_ready(&CaptureArtifact {
                file_path,
                recognized_text,
                metadata,
            });
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_result(&result);
        }
        Ok(result)
    }

    fn unavailable(&self, format: AudioFormat) -> CaptureResult {
        let result = CaptureResult::device_unavailable(format);
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_result(&result);
        }
        result
    }

    /// Capture exactly `request.duration` into a fresh buffer.
    async fn record(&self, request: &CaptureRequest) -> Result<AudioBuffer, VoiceError> {
        let format = request.format;
        let expected = format.samples_for(request.duration);
        let collected = Arc::new(Mutex::new(Vec::<f32>::with_capacity(expected)));

        let resampler = Resampler::new(format.sample_rate as f64);
        let target_channels = format.channels;
        let sink = Arc::clone(&collected);
        let callback: AudioBufferCallback = Arc::new(move |samples: &[f32], sample_rate: f64, channels: u16| {
            let mono = if channels > 1 {
                wav_format::downmix_to_mono(samples, channels as usize)
            } else {
                samples.to_vec()
            };
            let resampled = resampler.resample(&mono, sample_rate);
            let frames = if target_channels == 2 {
                Resampler::interleave(&resampled, &resampled)
            } else {
                resampled
            };
            sink.lock().extend_from_slice(&frames);
        });

        {
            let mut provider = self.provider.lock();
            if !provider.is_available() {
                return Err(VoiceError::DeviceUnavailable);
            }
            provider.start(callback)?;
        }
        let guard = RecordingGuard {
            provider: Arc::clone(&self.provider),
            armed: true,
        };

        tokio::time::sleep(request.duration).await;
        guard.finish();

        let mut samples = std::mem::take(&mut *collected.lock());
        if samples.len() < expected {
            log::debug!("Padding capture: {} of {} samples", samples.len(), expected);
        }
        samples.resize(expected, 0.0);
        Ok(AudioBuffer::new(samples, format))
    }
}
