use async_trait::async_trait;

use crate::models::engine_status::SpeechOptions;
use crate::models::error::VoiceError;

/// One tier of the synthesis fallback chain.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Stable engine name used in logs and `EngineStatus`.
    fn name(&self) -> &str;

    /// Whether the engine is reachable at all (binary installed, API key set).
    ///
    /// Called once at startup and on explicit re-probe; the result is cached.
    async fn probe(&self) -> bool;

    /// Speak `text` and return once playback has finished.
    ///
    /// An `Err` advances the chain to the next engine.
    async fn speak(&self, text: &str, options: &SpeechOptions) -> Result<(), VoiceError>;

    /// Interrupt playback in progress. Engines without a playback handle
    /// ignore this.
    fn stop(&self) {}
}
