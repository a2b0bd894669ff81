use crate::models::capture::CaptureResult;
use crate::models::engine_status::EngineUsed;

/// Notifications for the presentation layer.
///
/// Calls are fire-and-forget from the runtime's task; implementations must
/// return immediately and marshal to their own thread if needed.
pub trait VoiceDelegate: Send + Sync {
    /// Called before the synthesizer starts speaking `text`.
    fn on_synthesis_started(&self, text: &str);

    /// Called after speaking finished. `None` means output degraded to text.
    fn on_synthesis_ended(&self, engine: Option<&EngineUsed>);

    /// Called before each capture with the 1-based attempt number.
    fn on_listening(&self, attempt: u32, max_attempts: u32);

    /// Called when a capture result (file and transcript) is available.
    fn on_capture_result(&self, result: &CaptureResult);
}
