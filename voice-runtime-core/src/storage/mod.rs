pub mod artifact_store;
pub mod metadata;
pub mod naming;
pub mod wav_writer;
