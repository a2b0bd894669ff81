use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::models::artifact::ArtifactMetadata;
use crate::models::audio_models::{AudioBuffer, AudioLevels};
use crate::models::capture::CorrelationTags;
use crate::models::error::VoiceError;
use crate::storage::metadata::write_metadata;
use crate::storage::naming::artifact_path;
use crate::storage::wav_writer::WavFileWriter;

/// Persists captured buffers under the per-speaker naming convention.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    write_sidecar: bool,
}

impl ArtifactStore {
    pub fn new(write_sidecar: bool) -> Self {
        Self { write_sidecar }
    }

    /// Write `buffer` below `root` and return its final path and metadata.
    pub fn persist(
        &self,
        root: &std::path::Path,
        tags: &CorrelationTags,
        buffer: &AudioBuffer,
        levels: AudioLevels,
        now: NaiveDateTime,
    ) -> Result<(PathBuf, ArtifactMetadata), VoiceError> {
        let path = artifact_path(root, tags, now);
        let mut writer = WavFileWriter::new(path.clone());
        let checksum = writer.write(buffer)?;

        let metadata = ArtifactMetadata::new(
            buffer.duration().as_secs_f64(),
            &path.to_string_lossy(),
            &checksum,
            buffer.format,
            levels,
            tags.clone(),
        );
        if self.write_sidecar {
            write_metadata(&metadata, &path)?;
        }

        log::debug!(
            "Persisted {} bytes to {}",
            writer.bytes_written(),
            path.display()
        );
        Ok((path, metadata))
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new(true)
    }
}
