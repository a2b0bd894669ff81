use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::models::audio_models::AudioBuffer;
use crate::models::error::VoiceError;
use crate::processing::wav_format;

/// Writes a captured buffer as a PCM WAV file.
///
/// ```text
/// [44-byte WAV header]
/// [little-endian PCM data at the buffer's bit depth]
/// ```
pub struct WavFileWriter {
    file_path: PathBuf,
    bytes_written: u64,
}

impl WavFileWriter {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            bytes_written: 0,
        }
    }

    /// Create parent directories, write the whole file, flush it, and return
    /// the SHA-256 checksum of what was written.
    pub fn write(&mut self, buffer: &AudioBuffer) -> Result<String, VoiceError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| VoiceError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let wav = wav_format::encode_wav(&buffer.samples, &buffer.format);

        let mut file = File::create(&self.file_path)
            .map_err(|e| VoiceError::StorageError(format!("failed to create file: {}", e)))?;
        file.write_all(&wav)
            .map_err(|e| VoiceError::StorageError(format!("write failed: {}", e)))?;
        file.sync_all()
            .map_err(|e| VoiceError::StorageError(format!("flush failed: {}", e)))?;

        self.bytes_written = wav.len() as u64;
        Ok(hex_encode(&Sha256::digest(&wav)))
    }

    /// Total bytes written (including WAV header).
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
