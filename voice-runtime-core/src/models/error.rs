use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors and expected failure outcomes of the voice runtime.
///
/// The first group is the runtime taxonomy (device, recognition, synthesis).
/// Backends classify their raw failures into these variants so callers never
/// see transport-level errors. The last group are hard errors that propagate
/// to the orchestrator.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceError {
    #[error("capture device busy")]
    Busy,

    #[error("capture device unavailable")]
    DeviceUnavailable,

    #[error("no speech detected")]
    NoSpeechDetected,

    #[error("audio could not be understood")]
    AmbiguousAudio,

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("timed out")]
    TimedOut,

    #[error("all synthesis engines failed")]
    AllEnginesFailed,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("device error: {0}")]
    DeviceError(String),
}

impl VoiceError {
    /// Recognition outcomes that mean "the user gave no usable input".
    pub fn is_no_input(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable | Self::NoSpeechDetected | Self::AmbiguousAudio
        )
    }

    /// Transient infrastructure failures worth a bounded local retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}
