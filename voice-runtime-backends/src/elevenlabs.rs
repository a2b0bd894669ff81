//! Premium voice through the ElevenLabs text-to-speech API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use voice_runtime_core::{SpeechEngine, SpeechOptions, VoiceError};

use crate::http;
use crate::player::AudioPlayer;

const SERVICE: &str = "elevenlabs";

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    /// Without a key the engine reports itself unavailable.
    pub api_key: Option<String>,
    pub voice_id: String,
    pub model_id: String,
    pub base_url: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub request_timeout: Duration,
}

impl ElevenLabsConfig {
    /// Defaults, with `ELEVENLABS_API_KEY` and `ELEVENLABS_VOICE_ID` from the environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            voice_id: std::env::var("ELEVENLABS_VOICE_ID").unwrap_or_else(|_| defaults.voice_id.clone()),
            ..defaults
        }
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_id: "pNInz6obpgDQGcFmaJgB".into(),
            model_id: "eleven_multilingual_v2".into(),
            base_url: "https://api.elevenlabs.io/v1".into(),
            stability: 0.5,
            similarity_boost: 0.75,
            request_timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabsEngine {
    config: ElevenLabsConfig,
    client: Client,
    player: Arc<AudioPlayer>,
}

impl ElevenLabsEngine {
    pub fn new(config: ElevenLabsConfig, player: Arc<AudioPlayer>) -> Result<Self, VoiceError> {
        let client = http::client(config.request_timeout)?;
        Ok(Self { config, client, player })
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, VoiceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| VoiceError::ServiceUnavailable("ElevenLabs API key not set".into()))?;

        let url = format!(
            "{}/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        );
        let request = SynthesisRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        let response = self
            .client
            .post(url)
            .query(&[("output_format", "mp3_44100_128")])
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await
            .map_err(|e| http::classify_transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("{} returned {}: {}", SERVICE, status, body.trim());
            return Err(VoiceError::ServiceUnavailable(format!("{} returned {}", SERVICE, status)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| http::classify_transport(SERVICE, e))?;
        if audio.is_empty() {
            return Err(VoiceError::ServiceUnavailable(format!("{} returned no audio", SERVICE)));
        }
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechEngine for ElevenLabsEngine {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn probe(&self) -> bool {
        self.config.api_key.is_some() && self.player.is_available()
    }

    async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), VoiceError> {
        let generation = self.player.generation();
        let voice_id = options.voice.as_deref().unwrap_or(&self.config.voice_id);
        let audio = self.synthesize(text, voice_id).await?;
        self.player.play_bytes(generation, &audio, "mp3", options.rate).await
    }

    fn stop(&self) {
        self.player.stop();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::player::PlayerKind;
    use crate::test_support::{script, serve, Canned};

    fn engine(base: String, player: AudioPlayer, key: Option<&str>) -> ElevenLabsEngine {
        let config = ElevenLabsConfig {
            api_key: key.map(str::to_string),
            base_url: base,
            ..Default::default()
        };
        ElevenLabsEngine::new(config, Arc::new(player)).unwrap()
    }

    #[tokio::test]
    async fn posts_json_and_plays_the_mp3() {
        let (base, seen) = serve(vec![Canned::audio(b"ID3mp3")]).await;
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("log");
        let player = script(dir.path(), "mpg123", &format!("cat \"$2\" > {}", log.display()));
        let tts = engine(
            base,
            AudioPlayer::with_programs(Some((PlayerKind::Mpg123, player)), None),
            Some("xi-test"),
        );

        assert!(tts.probe().await);
        tts.speak("¡Muy bien!", &SpeechOptions::default()).await.unwrap();
        assert_eq!(std::fs::read(&log).unwrap(), b"ID3mp3");

        let request = seen.lock()[0].clone();
        assert!(request
            .head
            .starts_with("POST /text-to-speech/pNInz6obpgDQGcFmaJgB?output_format=mp3_44100_128 "));
        assert!(request.head.to_ascii_lowercase().contains("xi-api-key: xi-test"));

        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["text"], "¡Muy bien!");
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert_eq!(body["voice_settings"]["stability"], 0.5);
        assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);
    }

    #[tokio::test]
    async fn quota_errors_fail_the_call() {
        let (base, _) = serve(vec![Canned::json(401, r#"{"detail":"quota_exceeded"}"#)]).await;
        let dir = tempfile::tempdir().unwrap();
        let player = script(dir.path(), "mpg123", "exit 0");
        let tts = engine(
            base,
            AudioPlayer::with_programs(Some((PlayerKind::Mpg123, player)), None),
            Some("xi-test"),
        );

        assert!(matches!(
            tts.speak("hola", &SpeechOptions::default()).await,
            Err(VoiceError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn probe_needs_key_and_player() {
        let dir = tempfile::tempdir().unwrap();
        let player = script(dir.path(), "mpg123", "exit 0");
        let with_player = || AudioPlayer::with_programs(Some((PlayerKind::Mpg123, player.clone())), None);

        assert!(!engine("http://127.0.0.1:9".into(), with_player(), None).probe().await);
        assert!(!engine("http://127.0.0.1:9".into(), AudioPlayer::with_programs(None, None), Some("k"))
            .probe()
            .await);
        assert!(engine("http://127.0.0.1:9".into(), with_player(), Some("k")).probe().await);
    }
}
