pub mod resampler;
pub mod ring_buffer;
pub mod wav_format;
