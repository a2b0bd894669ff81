use serde::{Deserialize, Serialize};

/// Availability record for one synthesis engine.
///
/// Written during startup probing and on per-call failure. An engine that
/// becomes unavailable stays so until it is explicitly re-probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub name: String,
    pub available: bool,
    pub last_failure_reason: Option<String>,
    pub consecutive_failures: u32,
}

impl EngineStatus {
    pub fn probed(name: &str, available: bool) -> Self {
        Self {
            name: name.to_string(),
            available,
            last_failure_reason: if available {
                None
            } else {
                Some("probe failed".into())
            },
            consecutive_failures: 0,
        }
    }
}

/// The engine that produced audible output for a `speak` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineUsed {
    /// Position in the priority chain (0 = highest priority).
    pub index: usize,
    pub name: String,
}

/// Per-call synthesis options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOptions {
    /// BCP-47 language tag, e.g. `es-ES`.
    pub language: String,
    /// Tempo factor: 0.5 (slow) to 2.0 (fast). 1.0 leaves audio untouched.
    pub rate: f32,
    pub voice: Option<String>,
}

impl SpeechOptions {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate.clamp(0.5, 2.0);
        self
    }

    /// Two-letter language prefix (`es` for `es-ES`).
    pub fn language_code(&self) -> &str {
        self.language.split(['-', '_']).next().unwrap_or("es")
    }

    pub fn is_default_rate(&self) -> bool {
        (self.rate - 1.0).abs() < f32::EPSILON
    }
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language: "es-ES".into(),
            rate: 1.0,
            voice: None,
        }
    }
}
