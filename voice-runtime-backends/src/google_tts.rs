//! Mid-tier voice through the Google Translate speech endpoint.
//!
//! No key required. The endpoint rejects long inputs, so text is split into
//! chunks of at most `MAX_CHUNK_CHARS` characters at word boundaries and the
//! returned MP3 segments are concatenated before playback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use voice_runtime_core::{SpeechEngine, SpeechOptions, VoiceError};

use crate::http;
use crate::player::AudioPlayer;

const SERVICE: &str = "google-tts";

pub const MAX_CHUNK_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com".into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

pub struct GoogleTtsEngine {
    config: GoogleTtsConfig,
    client: Client,
    player: Arc<AudioPlayer>,
}

impl GoogleTtsEngine {
    pub fn new(config: GoogleTtsConfig, player: Arc<AudioPlayer>) -> Result<Self, VoiceError> {
        let client = http::client(config.request_timeout)?;
        Ok(Self { config, client, player })
    }

    async fn fetch(&self, text: &str, language: &str) -> Result<Vec<u8>, VoiceError> {
        let url = format!("{}/translate_tts", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[("ie", "UTF-8"), ("client", "tw-ob"), ("tl", language), ("q", text)])
            .send()
            .await
            .map_err(|e| http::classify_transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("{} returned {}", SERVICE, status);
            return Err(VoiceError::ServiceUnavailable(format!("{} returned {}", SERVICE, status)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| http::classify_transport(SERVICE, e))?;
        Ok(bytes.to_vec())
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Breaks at whitespace; a single word longer than `max_chars` is cut.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let cut = word.char_indices().nth(max_chars).map(|(i, _)| i).unwrap_or(word.len());
            let rest = word.split_off(cut);
            chunks.push(word);
            word = rest;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechEngine for GoogleTtsEngine {
    fn name(&self) -> &str {
        "google-tts"
    }

    async fn probe(&self) -> bool {
        if !self.player.is_available() {
            return false;
        }
        match self.fetch("ok", "es").await {
            Ok(audio) => !audio.is_empty(),
            Err(e) => {
                log::info!("Google TTS probe failed: {}", e);
                false
            }
        }
    }

    async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), VoiceError> {
        let generation = self.player.generation();
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Ok(());
        }

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.fetch(chunk, options.language_code()).await?);
        }
        if audio.is_empty() {
            return Err(VoiceError::ServiceUnavailable(format!("{} returned no audio", SERVICE)));
        }
        self.player.play_bytes(generation, &audio, "mp3", options.rate).await
    }

    fn stop(&self) {
        self.player.stop();
    }
}
