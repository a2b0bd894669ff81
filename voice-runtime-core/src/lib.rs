//! # voice-runtime-core
//!
//! Platform-agnostic voice interaction runtime.
//!
//! Serializes access to the capture device, records fixed-duration
//! utterances, persists them, recognizes them with a time-bounded remote
//! backend, speaks through a tiered fallback chain of synthesis engines and
//! drives bounded-retry dialogue with frustration detection. Concrete
//! backends (HTTP recognition, cloud and offline synthesis, microphones)
//! implement the traits in `traits/` and plug into `VoiceRuntime`.
//!
//! ## Architecture
//!
//! ```text
//! voice-runtime-core (this crate)
//! ├── traits/       ← CaptureProvider, TranscriptionBackend, SpeechEngine, Validator, VoiceDelegate
//! ├── models/       ← VoiceError, VoiceRuntimeConfig, CaptureRequest/Result, RetryOutcome, AskState
//! ├── processing/   ← Resampler, RingBuffer, WAV encoding
//! ├── runtime/      ← DeviceArbiter, Recognizer, Synthesizer, IdleMonitor, bounded-call watchdog
//! ├── session/      ← CaptureSession, VoiceRuntime, ChannelDelegate
//! ├── dialog/       ← RetryEngine, FrustrationMonitor, keyword interpreters
//! └── storage/      ← WAV writer, artifact naming, metadata sidecar
//! ```

pub mod dialog;
pub mod models;
pub mod processing;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use dialog::frustration::{DialogHistory, FrustrationMonitor};
pub use dialog::interpreters::{KeywordExitDetector, KeywordYesNo};
pub use dialog::retry::{Question, RetryEngine};
pub use models::artifact::{ArtifactMetadata, CaptureArtifact};
pub use models::audio_models::{AudioBuffer, AudioFormat, AudioLevels, AudioTransportType, DeviceInfo};
pub use models::capture::{CaptureRequest, CaptureResult, CorrelationTags};
pub use models::config::{
    ConfidencePolicy, DevicePolicy, FrustrationPolicy, RecognizerPolicy, RetryPolicy, SynthesizerPolicy,
    VoiceRuntimeConfig,
};
pub use models::engine_status::{EngineStatus, EngineUsed, SpeechOptions};
pub use models::error::VoiceError;
pub use models::outcome::{AbandonReason, DeviationDecision, RetryOutcome, UtteranceEvaluation};
pub use models::state::AskState;
pub use processing::ring_buffer::RingBuffer;
pub use runtime::arbiter::{DeviceArbiter, DeviceLease};
pub use runtime::idle::IdleMonitor;
pub use runtime::recognizer::Recognizer;
pub use runtime::synthesizer::{ConsoleEngine, EngineRegistry, Synthesizer};
pub use session::capture::CaptureSession;
pub use session::events::{ChannelDelegate, VoiceEvent};
pub use session::voice_runtime::{RuntimeParts, VoiceRuntime};
pub use storage::artifact_store::ArtifactStore;
pub use traits::artifact_sink::ArtifactSink;
pub use traits::capture_provider::{AudioBufferCallback, CaptureProvider};
pub use traits::interpreter::{ExitIntent, MatchVerdict, Validator, WordMatcher};
pub use traits::speech_engine::SpeechEngine;
pub use traits::transcription::TranscriptionBackend;
pub use traits::voice_delegate::VoiceDelegate;
