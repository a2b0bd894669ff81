use std::time::Duration;

use serde::{Deserialize, Serialize};

/// PCM layout of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = interleaved stereo).
    pub channels: u16,
    /// Bit depth of the persisted PCM. Valid values: 16, 24, 32.
    pub bit_depth: u16,
}

impl AudioFormat {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }

    /// Number of interleaved samples covering `duration`.
    pub fn samples_for(&self, duration: Duration) -> usize {
        let frames = (duration.as_secs_f64() * self.sample_rate as f64).round() as usize;
        frames * self.channels as usize
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            bit_depth: 16,
        }
    }
}

/// Owned in-memory recording: interleaved f32 samples in `[-1.0, 1.0]`.
///
/// The same buffer is persisted and handed to the recognizer; it is never
/// re-captured.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub format: AudioFormat,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, format: AudioFormat) -> Self {
        Self { samples, format }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.format.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.format.sample_rate as f64)
    }
}

/// Transport type for an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioTransportType {
    BuiltIn,
    Bluetooth,
    Usb,
    Virtual,
    Unknown,
}

/// Description of the capture device, probed once when the runtime is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
    pub transport_type: Option<AudioTransportType>,
}

impl DeviceInfo {
    pub fn default_input() -> Self {
        Self {
            id: "default-mic".into(),
            name: "Default Microphone".into(),
            is_default: true,
            transport_type: None,
        }
    }
}

/// Real-time level metering (RMS and peak, 0.0–1.0) of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioLevels {
    pub rms: f32,
    pub peak: f32,
}
