pub mod artifact_sink;
pub mod capture_provider;
pub mod interpreter;
pub mod speech_engine;
pub mod transcription;
pub mod voice_delegate;
