use async_trait::async_trait;

use crate::models::audio_models::AudioBuffer;
use crate::models::error::VoiceError;

/// A remote (or local) speech-to-text service.
///
/// Implementations classify their failures into `NoSpeechDetected`,
/// `AmbiguousAudio` or `ServiceUnavailable`. The recognizer adds the
/// timeout; backends must not assume they are cancelled when it fires.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn transcribe(&self, audio: &AudioBuffer, language: &str) -> Result<String, VoiceError>;
}
