pub mod capture;
pub mod events;
pub mod voice_runtime;
