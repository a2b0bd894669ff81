use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::{AudioBuffer, AudioFormat, AudioLevels};
use super::error::VoiceError;

/// Identifiers that tie a recording to a speaker, exercise and session.
///
/// Free-text fields are sanitized before they become path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationTags {
    pub speaker_id: String,
    pub exercise_id: Option<String>,
    pub exercise_name: Option<String>,
    pub level: Option<String>,
    pub session_number: Option<u32>,
}

impl CorrelationTags {
    pub fn for_speaker(speaker_id: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            ..Default::default()
        }
    }

    pub fn with_exercise(
        mut self,
        exercise_id: impl Into<String>,
        exercise_name: impl Into<String>,
        level: impl Into<String>,
        session_number: u32,
    ) -> Self {
        self.exercise_id = Some(exercise_id.into());
        self.exercise_name = Some(exercise_name.into());
        self.level = Some(level.into());
        self.session_number = Some(session_number);
        self
    }
}

/// A single capture order. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub duration: Duration,
    pub format: AudioFormat,
    /// Root directory; the file lands in a per-speaker directory below it.
    pub destination: PathBuf,
    pub tags: CorrelationTags,
}

impl CaptureRequest {
    pub fn new(duration: Duration, destination: impl Into<PathBuf>, tags: CorrelationTags) -> Self {
        Self {
            duration,
            format: AudioFormat::default(),
            destination: destination.into(),
            tags,
        }
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }
}

/// Outcome of one `record_and_recognize` call.
///
/// `recognized_text` is derived only from `samples`, which were captured
/// under a single device lease.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub audio_file_path: Option<PathBuf>,
    pub samples: AudioBuffer,
    pub levels: AudioLevels,
    pub recognized_text: Option<String>,
    pub recognition_error: Option<VoiceError>,
}

impl CaptureResult {
    /// Result for a capture that never got the device.
    pub fn device_unavailable(format: AudioFormat) -> Self {
        Self {
            audio_file_path: None,
            samples: AudioBuffer::new(Vec::new(), format),
            levels: AudioLevels::default(),
            recognized_text: None,
            recognition_error: Some(VoiceError::DeviceUnavailable),
        }
    }

    /// Trimmed transcript, or `None` when nothing usable was heard.
    pub fn transcript(&self) -> Option<&str> {
        self.recognized_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn device_was_unavailable(&self) -> bool {
        matches!(self.recognition_error, Some(VoiceError::DeviceUnavailable))
    }
}
