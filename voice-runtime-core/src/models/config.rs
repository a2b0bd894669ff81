use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::AudioFormat;
use super::error::VoiceError;

/// Serialize `Duration` as integer milliseconds in configuration files.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
        }
    }
}

/// Device arbitration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicePolicy {
    /// How long a capture waits for the device before reporting it busy.
    #[serde(with = "millis")]
    pub acquire_timeout: Duration,
}

impl Default for DevicePolicy {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(2),
        }
    }
}

/// Recognizer watchdog and retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerPolicy {
    #[serde(with = "millis")]
    pub timeout: Duration,
    /// Extra attempts after a `ServiceUnavailable` answer.
    pub service_retries: u32,
    #[serde(with = "millis")]
    pub service_backoff: Duration,
}

impl Default for RecognizerPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            service_retries: 2,
            service_backoff: Duration::from_millis(300),
        }
    }
}

/// Synthesizer probing and fallback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerPolicy {
    #[serde(with = "millis")]
    pub probe_timeout: Duration,
    /// Upper bound for a single engine call, playback included.
    #[serde(with = "millis")]
    pub engine_timeout: Duration,
    /// Consecutive call failures after which an engine is marked unavailable.
    /// Zero keeps failing engines in the chain forever.
    pub failure_limit: u32,
    pub default_rate: f32,
}

impl Default for SynthesizerPolicy {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            engine_timeout: Duration::from_secs(30),
            failure_limit: 3,
            default_rate: 1.0,
        }
    }
}

/// Bounded-retry settings for one Ask call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, no-input and invalid answers combined.
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub pause_between_attempts: Duration,
    /// Watchdog for the validator. `None` trusts the validator to return.
    #[serde(with = "millis::option")]
    pub validation_timeout: Option<Duration>,
    /// Narrow "continue or stop?" question on a final silent attempt.
    pub exit_check_prompt: String,
    /// Spoken after an exit intent is detected.
    pub exit_acknowledgement: Option<String>,
    /// Spoken after the last invalid answer.
    pub exhausted_message: Option<String>,
    /// "Speak up" prompts between silent attempts of a listen-only capture.
    pub listen_prompts: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pause_between_attempts: Duration::from_millis(200),
            validation_timeout: Some(Duration::from_secs(15)),
            exit_check_prompt: "No logro escucharte. ¿Quieres intentar otra vez o mejor lo dejamos?"
                .into(),
            exit_acknowledgement: Some("Entiendo. Podemos parar cuando quieras.".into()),
            exhausted_message: Some("Descansemos un momento, está bien.".into()),
            listen_prompts: vec![
                "Te escucho, habla con claridad.".into(),
                "No te escuché. Acércate más al micrófono.".into(),
                "Última oportunidad. Habla fuerte y claro.".into(),
            ],
        }
    }
}

/// Thresholds for accepting a "close enough" utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub max_attempts: u32,
    /// Listen-only captures per evaluation attempt.
    pub listen_attempts: u32,
    /// Verdicts at or above this confidence are final.
    pub accept_threshold: f32,
    /// On the last attempt, verdicts at or above this are accepted as correct.
    pub lenient_threshold: f32,
    pub unclear_prompt: String,
    /// Spoken when an attempt heard nothing and another attempt remains.
    pub silent_prompt: String,
    pub lenient_feedback: String,
    pub no_input_feedback: String,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            listen_attempts: 2,
            accept_threshold: 0.7,
            lenient_threshold: 0.5,
            unclear_prompt: "Hmm, no estoy seguro. Intenta decirlo más claro.".into(),
            silent_prompt: "No te escuché. Vamos a intentar una vez más.".into(),
            lenient_feedback: "¡Buen esfuerzo! Lo hiciste bien".into(),
            no_input_feedback: "No logré escucharte bien, pero está bien. Sigamos.".into(),
        }
    }
}

/// Frustration detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrustrationPolicy {
    pub window: usize,
    pub supportive_message: String,
    pub continue_question: String,
    pub encouragement: Option<String>,
}

impl Default for FrustrationPolicy {
    fn default() -> Self {
        Self {
            window: 3,
            supportive_message: "Descansemos un momento, está bien.".into(),
            continue_question: "¿Quieres seguir o prefieres descansar?".into(),
            encouragement: Some("¡Muy bien! Sigamos entonces. Tú puedes.".into()),
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceRuntimeConfig {
    /// Recognition and synthesis language (default: `es-ES`).
    pub language: String,
    pub recording: AudioFormat,
    #[serde(with = "millis")]
    pub recording_duration: Duration,
    /// Root directory for captured audio; one sub-directory per speaker.
    pub audio_root: PathBuf,
    pub write_metadata_sidecar: bool,
    pub device: DevicePolicy,
    pub recognizer: RecognizerPolicy,
    pub synthesizer: SynthesizerPolicy,
    pub retry: RetryPolicy,
    pub confidence: ConfidencePolicy,
    pub frustration: FrustrationPolicy,
    /// Session idle timeout. `None` disables the idle monitor.
    #[serde(with = "millis::option")]
    pub idle_timeout: Option<Duration>,
}

impl VoiceRuntimeConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.recording.validate()?;
        if self.language.trim().is_empty() {
            return Err("language must not be empty".into());
        }
        if self.recording_duration.is_zero() {
            return Err("recording duration must be positive".into());
        }
        if self.retry.max_attempts == 0 {
            return Err("max attempts must be at least 1".into());
        }
        if self.confidence.max_attempts == 0 || self.confidence.listen_attempts == 0 {
            return Err("confidence max attempts must be at least 1".into());
        }
        if self.confidence.lenient_threshold > self.confidence.accept_threshold {
            return Err("lenient threshold cannot exceed accept threshold".into());
        }
        if self.frustration.window == 0 {
            return Err("frustration window must be at least 1".into());
        }
        if self.recognizer.timeout.is_zero() || self.synthesizer.engine_timeout.is_zero() {
            return Err("timeouts must be positive".into());
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file. Missing fields keep
    /// their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, VoiceError> {
        let json = fs::read_to_string(path)
            .map_err(|e| VoiceError::ConfigurationFailed(format!("failed to read config: {}", e)))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| VoiceError::ConfigurationFailed(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(VoiceError::ConfigurationFailed)?;
        Ok(config)
    }
}

impl Default for VoiceRuntimeConfig {
    fn default() -> Self {
        Self {
            language: "es-ES".into(),
            recording: AudioFormat::default(),
            recording_duration: Duration::from_secs(5),
            audio_root: PathBuf::from("audio_registros"),
            write_metadata_sidecar: true,
            device: DevicePolicy::default(),
            recognizer: RecognizerPolicy::default(),
            synthesizer: SynthesizerPolicy::default(),
            retry: RetryPolicy::default(),
            confidence: ConfidencePolicy::default(),
            frustration: FrustrationPolicy::default(),
            idle_timeout: None,
        }
    }
}
