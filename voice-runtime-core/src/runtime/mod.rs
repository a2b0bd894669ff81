pub mod arbiter;
pub mod idle;
pub mod recognizer;
pub mod synthesizer;
pub mod watchdog;
