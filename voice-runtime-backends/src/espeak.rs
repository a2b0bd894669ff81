use std::path::PathBuf;

use async_trait::async_trait;

use voice_runtime_core::{SpeechEngine, SpeechOptions, VoiceError};

use crate::process::{find_program, run_until_stopped, StopSignal};

/// espeak words per minute at rate 1.0.
pub const BASE_WORDS_PER_MINUTE: f32 = 150.0;

/// Offline synthesis through the `espeak` (or `espeak-ng`) binary.
pub struct EspeakEngine {
    program: Option<PathBuf>,
    stop: StopSignal,
}

impl EspeakEngine {
    pub fn detect() -> Self {
        let program = find_program("espeak").or_else(|| find_program("espeak-ng"));
        Self::with_program(program)
    }

    pub fn with_program(program: Option<PathBuf>) -> Self {
        Self {
            program,
            stop: StopSignal::new(),
        }
    }

    fn arguments(text: &str, options: &SpeechOptions) -> Vec<String> {
        let voice = options
            .voice
            .clone()
            .unwrap_or_else(|| options.language_code().to_string());
        let words_per_minute = (BASE_WORDS_PER_MINUTE * options.rate).round() as u32;
        vec![
            "-v".into(),
            voice,
            "-s".into(),
            words_per_minute.to_string(),
            text.to_string(),
        ]
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak"
    }

    async fn probe(&self) -> bool {
        self.program.is_some()
    }

    async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), VoiceError> {
        let generation = self.stop.generation();
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| VoiceError::ServiceUnavailable("espeak not installed".into()))?;
        run_until_stopped(program, Self::arguments(text, options), &self.stop, generation).await
    }

    fn stop(&self) {
        self.stop.stop();
    }
}
