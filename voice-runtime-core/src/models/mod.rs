pub mod artifact;
pub mod audio_models;
pub mod capture;
pub mod config;
pub mod engine_status;
pub mod error;
pub mod outcome;
pub mod state;
