//! OpenAI-compatible speech-to-text (`POST {base}/audio/transcriptions`).
//!
//! Works with OpenAI Whisper and any service exposing the same multipart
//! endpoint. The recording is uploaded as 16-bit WAV; the JSON `text` field
//! is the transcript.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use voice_runtime_core::processing::wav_format::encode_wav;
use voice_runtime_core::{AudioBuffer, AudioFormat, TranscriptionBackend, VoiceError};

use crate::http;

const SERVICE: &str = "speech-to-text";

#[derive(Debug, Clone)]
pub struct HttpTranscriptionConfig {
    /// Base URL without the endpoint path, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Per-request transport timeout. The recognizer's own deadline still applies.
    pub request_timeout: Duration,
}

impl HttpTranscriptionConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: "whisper-1".into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Build from `STT_BASE_URL`, `STT_API_KEY` (or `OPENAI_API_KEY`) and `STT_MODEL`.
    pub fn from_env() -> Result<Self, VoiceError> {
        let base_url =
            std::env::var("STT_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("STT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                VoiceError::ConfigurationFailed("speech-to-text requires STT_API_KEY or OPENAI_API_KEY".into())
            })?;
        let mut config = Self::new(base_url, api_key);
        if let Ok(model) = std::env::var("STT_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

pub struct HttpTranscriptionBackend {
    config: HttpTranscriptionConfig,
    client: Client,
}

impl HttpTranscriptionBackend {
    pub fn new(config: HttpTranscriptionConfig) -> Result<Self, VoiceError> {
        let client = http::client(config.request_timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpTranscriptionConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TranscriptionBackend for HttpTranscriptionBackend {
    fn name(&self) -> &str {
        "http-stt"
    }

    async fn transcribe(&self, audio: &AudioBuffer, language: &str) -> Result<String, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::NoSpeechDetected);
        }

        let format = AudioFormat {
            bit_depth: 16,
            ..audio.format
        };
        let wav = encode_wav(&audio.samples, &format);
        let part = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoiceError::ConfigurationFailed(e.to_string()))?;
        let language_code = language.split(['-', '_']).next().unwrap_or(language);
        let form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("language", language_code.to_string());

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| http::classify_transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http::classify_status(SERVICE, status, &body));
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            log::warn!("Malformed {} response: {}", SERVICE, e);
            VoiceError::ServiceUnavailable(format!("malformed {} response", SERVICE))
        })?;

        let text = parsed.text.trim();
        if text.is_empty() {
            return Err(VoiceError::NoSpeechDetected);
        }
        log::debug!("Transcribed {:.1}s of audio: {}", audio.duration().as_secs_f32(), text);
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve, Canned};

    fn tone() -> AudioBuffer {
        let format = AudioFormat {
            sample_rate: 16000,
            channels: 1,
            bit_depth: 24,
        };
        let samples = (0..1600).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
        AudioBuffer::new(samples, format)
    }

    fn backend(base: &str) -> HttpTranscriptionBackend {
        HttpTranscriptionBackend::new(HttpTranscriptionConfig::new(format!("{}/v1/", base), "sk-test")).unwrap()
    }

    #[tokio::test]
    async fn uploads_wav_and_returns_trimmed_text() {
        let (base, seen) = serve(vec![Canned::json(200, r#"{"text":"  me llamo Ana "}"#)]).await;

        let text = backend(&base).transcribe(&tone(), "es-ES").await.unwrap();
        assert_eq!(text, "me llamo Ana");

        let requests = seen.lock().clone();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.head.starts_with("POST /v1/audio/transcriptions "));
        assert!(request.head.to_ascii_lowercase().contains("authorization: bearer sk-test"));

        let body = request.body_text();
        assert!(body.contains("filename=\"audio.wav\""));
        assert!(body.contains("whisper-1"));
        assert!(body.contains("name=\"language\"\r\n\r\nes"));

        // 16-bit PCM regardless of the recording depth.
        let riff = request.body.windows(4).position(|w| w == b"RIFF").unwrap();
        let bits = u16::from_le_bytes([request.body[riff + 34], request.body[riff + 35]]);
        assert_eq!(bits, 16);
    }

    #[tokio::test]
    async fn empty_transcript_is_no_speech() {
        let (base, _) = serve(vec![Canned::json(200, r#"{"text":"   "}"#)]).await;
        assert_eq!(
            backend(&base).transcribe(&tone(), "es-ES").await,
            Err(VoiceError::NoSpeechDetected)
        );
    }

    #[tokio::test]
    async fn statuses_are_classified() {
        let (base, _) = serve(vec![
            Canned::json(503, r#"{"error":"overloaded"}"#),
            Canned::json(400, r#"{"error":"bad audio"}"#),
            Canned::json(200, "not json"),
        ])
        .await;
        let stt = backend(&base);

        assert!(matches!(
            stt.transcribe(&tone(), "es").await,
            Err(VoiceError::ServiceUnavailable(_))
        ));
        assert_eq!(stt.transcribe(&tone(), "es").await, Err(VoiceError::AmbiguousAudio));
        assert!(matches!(
            stt.transcribe(&tone(), "es").await,
            Err(VoiceError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        assert!(matches!(
            backend(&base).transcribe(&tone(), "es").await,
            Err(VoiceError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn empty_buffer_never_reaches_the_service() {
        let (base, seen) = serve(vec![Canned::json(200, r#"{"text":"hola"}"#)]).await;
        let empty = AudioBuffer::new(Vec::new(), AudioFormat::default());
        assert_eq!(
            backend(&base).transcribe(&empty, "es").await,
            Err(VoiceError::NoSpeechDetected)
        );
        assert!(seen.lock().is_empty());
    }
}
