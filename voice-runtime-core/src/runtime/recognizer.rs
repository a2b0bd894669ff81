use std::sync::Arc;
use std::time::Duration;

use crate::models::audio_models::AudioBuffer;
use crate::models::config::RecognizerPolicy;
use crate::models::error::VoiceError;
use crate::runtime::watchdog::bounded_try;
use crate::traits::transcription::TranscriptionBackend;

/// Converts a captured buffer into text through a remote backend, never
/// waiting longer than the caller's timeout.
pub struct Recognizer {
    backend: Arc<dyn TranscriptionBackend>,
    policy: RecognizerPolicy,
}

impl Recognizer {
    pub fn new(backend: Arc<dyn TranscriptionBackend>, policy: RecognizerPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &RecognizerPolicy {
        &self.policy
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Transcribe `audio`.
    ///
    /// Each backend call runs on its own task and is abandoned once `timeout`
    /// elapses. `ServiceUnavailable` is retried up to `service_retries` times
    /// within the same overall deadline. An empty transcript is reported as
    /// `NoSpeechDetected`.
    pub async fn recognize(
        &self,
        audio: Arc<AudioBuffer>,
        language: &str,
        timeout: Duration,
    ) -> Result<String, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::NoSpeechDetected);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut retries_left = self.policy.service_retries;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(VoiceError::TimedOut);
            }

            let backend = Arc::clone(&self.backend);
            let buffer = Arc::clone(&audio);
            let language_owned = language.to_string();
            let call = async move { backend.transcribe(&buffer, &language_owned).await };

            match bounded_try("recognizer", remaining, call).await {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        return Err(VoiceError::NoSpeechDetected);
                    }
                    log::info!("Recognized: {}", text);
                    return Ok(text.to_string());
                }
                Err(VoiceError::ServiceUnavailable(reason)) if retries_left > 0 => {
                    retries_left -= 1;
                    log::warn!(
                        "{} unavailable ({}), retrying ({} left)",
                        self.backend.name(),
                        reason,
                        retries_left
                    );
                    let pause = self
                        .policy
                        .service_backoff
                        .min(deadline.saturating_duration_since(tokio::time::Instant::now()));
                    tokio::time::sleep(pause).await;
                }
                Err(e) => {
                    log::debug!("Recognition failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}
