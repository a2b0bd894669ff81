//! Concrete backends for `voice-runtime-core`.
//!
//! Plugs real services into the core's traits:
//!
//! ```text
//! voice-runtime-backends (this crate)
//! ├── http_transcription  ← OpenAI-compatible speech-to-text (TranscriptionBackend)
//! ├── elevenlabs          ← premium cloud voice (SpeechEngine)
//! ├── google_tts          ← translate endpoint voice (SpeechEngine)
//! ├── espeak              ← offline voice (SpeechEngine)
//! ├── player              ← mpg123/ffplay/play with optional sox tempo stage
//! └── cpal_input          ← default microphone (CaptureProvider, feature "cpal")
//! ```
//!
//! `default_engines` assembles the usual fallback chain; the console engine
//! from the core crate is always last.

use std::sync::Arc;

use voice_runtime_core::{ConsoleEngine, SpeechEngine};

#[cfg(feature = "cpal")]
pub mod cpal_input;
pub mod elevenlabs;
pub mod espeak;
pub mod google_tts;
pub mod http;
pub mod http_transcription;
pub mod player;
pub mod process;

#[cfg(feature = "cpal")]
pub use cpal_input::CpalMicrophone;
pub use elevenlabs::{ElevenLabsConfig, ElevenLabsEngine};
pub use espeak::EspeakEngine;
pub use google_tts::{GoogleTtsConfig, GoogleTtsEngine};
pub use http_transcription::{HttpTranscriptionBackend, HttpTranscriptionConfig};
pub use player::{AudioPlayer, PlayerKind};

/// ElevenLabs, Google, espeak, console: highest priority first.
///
/// ElevenLabs is only included when an API key is configured.
pub fn default_engines() -> Vec<Arc<dyn SpeechEngine>> {
    let player = Arc::new(AudioPlayer::detect());
    let mut engines: Vec<Arc<dyn SpeechEngine>> = Vec::new();

    let eleven = ElevenLabsConfig::from_env();
    if eleven.api_key.is_some() {
        match ElevenLabsEngine::new(eleven, Arc::clone(&player)) {
            Ok(engine) => engines.push(Arc::new(engine)),
            Err(e) => log::warn!("ElevenLabs disabled: {}", e),
        }
    }
    match GoogleTtsEngine::new(GoogleTtsConfig::default(), Arc::clone(&player)) {
        Ok(engine) => engines.push(Arc::new(engine)),
        Err(e) => log::warn!("Google TTS disabled: {}", e),
    }
    engines.push(Arc::new(EspeakEngine::detect()));
    engines.push(Arc::new(ConsoleEngine));
    engines
}
