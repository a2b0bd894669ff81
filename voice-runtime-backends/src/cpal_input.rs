//! Microphone capture through cpal.
//!
//! cpal streams are not `Send` on every host, so the stream is built, played
//! and dropped on a dedicated capture thread. Samples are delivered as
//! interleaved f32 at the device's native rate and channel count; the core
//! resamples and downmixes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream};
use parking_lot::Mutex;

use voice_runtime_core::{AudioBufferCallback, CaptureProvider, DeviceInfo, VoiceError};

pub struct CpalMicrophone {
    device_name: Option<String>,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalMicrophone {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self {
            device_name: None,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
        }
    }

    /// Capture from the input device named `name`.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            ..Self::default_device()
        }
    }

    /// Names of all input devices on the default host.
    pub fn list_devices() -> Result<Vec<String>, VoiceError> {
        let devices = cpal::default_host()
            .input_devices()
            .map_err(|e| VoiceError::DeviceError(format!("failed to enumerate inputs: {}", e)))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

impl CaptureProvider for CpalMicrophone {
    fn is_available(&self) -> bool {
        find_device(self.device_name.as_deref()).is_ok()
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), VoiceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(VoiceError::ConfigurationFailed("mic capture already running".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let device_name = self.device_name.clone();
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("cpal-mic-capture".into())
            .spawn(move || {
                match open_stream(device_name.as_deref(), callback) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        while running.load(Ordering::SeqCst) {
                            thread::sleep(Duration::from_millis(10));
                        }
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                VoiceError::DeviceError(format!("failed to spawn mic thread: {}", e))
            })?;

        let started = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(VoiceError::DeviceError("mic thread exited early".into())));
        if let Err(e) = started {
            let _ = handle.join();
            return Err(e);
        }

        *self.capture_handle.lock() = Some(handle);
        log::debug!("Microphone capture started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), VoiceError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        match &self.device_name {
            Some(name) => DeviceInfo {
                id: name.clone(),
                name: name.clone(),
                is_default: false,
                transport_type: None,
            },
            None => DeviceInfo::default_input(),
        }
    }
}

fn find_device(name: Option<&str>) -> Result<Device, VoiceError> {
    let host = cpal::default_host();
    match name {
        None => host.default_input_device().ok_or(VoiceError::DeviceUnavailable),
        Some(name) => host
            .input_devices()
            .map_err(|e| VoiceError::DeviceError(format!("failed to enumerate inputs: {}", e)))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or(VoiceError::DeviceUnavailable),
    }
}

/// Build and start an input stream in the device's default configuration.
fn open_stream(name: Option<&str>, callback: AudioBufferCallback) -> Result<Stream, VoiceError> {
    let device = find_device(name)?;
    let supported = device
        .default_input_config()
        .map_err(|e| VoiceError::DeviceError(format!("no input config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0 as f64;
    let channels = config.channels;

    log::info!(
        "Using input device {} ({} Hz, {} ch, {:?})",
        device.name().unwrap_or_else(|_| "unknown".into()),
        config.sample_rate.0,
        channels,
        sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| callback(data, sample_rate, channels),
            on_stream_error,
            None,
        ),
        SampleFormat::I16 => {
            let mut scratch = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| s as f32 / 32768.0));
                    callback(&scratch, sample_rate, channels);
                },
                on_stream_error,
                None,
            )
        }
        SampleFormat::U16 => {
            let mut scratch = Vec::new();
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0));
                    callback(&scratch, sample_rate, channels);
                },
                on_stream_error,
                None,
            )
        }
        other => {
            return Err(VoiceError::DeviceError(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| VoiceError::DeviceError(format!("failed to build input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| VoiceError::DeviceError(format!("failed to start input stream: {}", e)))?;
    Ok(stream)
}

fn on_stream_error(error: cpal::StreamError) {
    log::error!("Microphone stream error: {}", error);
}
