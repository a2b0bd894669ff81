use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::{AudioFormat, AudioLevels};
use super::capture::CorrelationTags;

/// A finished recording handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureArtifact {
    pub file_path: PathBuf,
    pub recognized_text: Option<String>,
    pub metadata: ArtifactMetadata,
}

/// Metadata stored alongside a recording as a JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub created_at: String,
    pub format: AudioFormat,
    pub levels: AudioLevels,
    pub tags: CorrelationTags,
}

impl ArtifactMetadata {
    pub fn new(
        duration_secs: f64,
        file_path: &str,
        checksum: &str,
        format: AudioFormat,
        levels: AudioLevels,
        tags: CorrelationTags,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            format,
            levels,
            tags,
        }
    }
}
