use std::sync::Arc;

use crate::models::audio_models::DeviceInfo;
use crate::models::error::VoiceError;

/// Callback invoked when an audio buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of channels (1 = mono, 2 = stereo interleaved).
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], f64, u16) + Send + Sync + 'static>;

/// Interface for platform-specific microphone backends.
///
/// Implementations deliver buffers on their own audio thread. The runtime
/// only calls `start`/`stop` while it holds the device lease.
pub trait CaptureProvider: Send + Sync {
    /// Whether the capture device is currently available.
    fn is_available(&self) -> bool;

    /// Start capturing audio, delivering buffers via `callback`.
    ///
    /// The callback fires on a dedicated audio thread; keep processing minimal.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), VoiceError>;

    /// Stop capturing and release the hardware.
    fn stop(&mut self) -> Result<(), VoiceError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> DeviceInfo;
}
