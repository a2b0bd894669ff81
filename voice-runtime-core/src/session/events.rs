use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::capture::CaptureResult;
use crate::models::engine_status::EngineUsed;
use crate::models::error::VoiceError;
use crate::traits::voice_delegate::VoiceDelegate;

/// Presentation events, serializable for a UI bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceEvent {
    SynthesisStarted {
        text: String,
    },
    SynthesisEnded {
        engine: Option<EngineUsed>,
    },
    Listening {
        attempt: u32,
        max_attempts: u32,
    },
    CaptureResult {
        audio_file_path: Option<PathBuf>,
        recognized_text: Option<String>,
        error: Option<VoiceError>,
    },
}

/// `VoiceDelegate` that forwards every callback into an unbounded channel.
///
/// Sending never blocks; events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelDelegate {
    tx: mpsc::UnboundedSender<VoiceEvent>,
}

impl ChannelDelegate {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<VoiceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: VoiceEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("Voice event dropped: no receiver");
        }
    }
}

impl VoiceDelegate for ChannelDelegate {
    fn on_synthesis_started(&self, text: &str) {
        self.emit(VoiceEvent::SynthesisStarted { text: text.to_string() });
    }

    fn on_synthesis_ended(&self, engine: Option<&EngineUsed>) {
        self.emit(VoiceEvent::SynthesisEnded { engine: engine.cloned() });
    }

    fn on_listening(&self, attempt: u32, max_attempts: u32) {
        self.emit(VoiceEvent::Listening { attempt, max_attempts });
    }

    fn on_capture_result(&self, result: &CaptureResult) {
        self.emit(VoiceEvent::CaptureResult {
            audio_file_path: result.audio_file_path.clone(),
            recognized_text: result.recognized_text.clone(),
            error: result.recognition_error.clone(),
        });
    }
}
