//! WAV file format utilities.
//!
//! Generates standard 44-byte RIFF WAV headers and converts f32 samples to
//! little-endian integer PCM.

use crate::models::audio_models::AudioFormat;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(format: &AudioFormat, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = format.sample_rate * format.channels as u32 * format.bit_depth as u32 / 8;
    let block_align = format.channels * format.bit_depth / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&format.bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Convert f32 samples `[-1.0, 1.0]` to little-endian PCM at `bit_depth`.
///
/// Clamps out-of-range values. Unsupported depths fall back to 16-bit.
pub fn encode_pcm(samples: &[f32], bit_depth: u16) -> Vec<u8> {
    let bytes_per_sample = match bit_depth {
        24 => 3,
        32 => 4,
        _ => 2,
    };
    let mut data = Vec::with_capacity(samples.len() * bytes_per_sample);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        match bit_depth {
            24 => {
                let value = (clamped as f64 * 8_388_607.0) as i32;
                data.extend_from_slice(&value.to_le_bytes()[0..3]);
            }
            32 => {
                let value = (clamped as f64 * i32::MAX as f64) as i32;
                data.extend_from_slice(&value.to_le_bytes());
            }
            _ => {
                let value = (clamped * i16::MAX as f32) as i16;
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
    data
}

/// Complete in-memory WAV file: header followed by PCM data.
pub fn encode_wav(samples: &[f32], format: &AudioFormat) -> Vec<u8> {
    let pcm = encode_pcm(samples, format.bit_depth);
    let header = generate_wav_header(format, pcm.len() as u32);
    let mut wav = Vec::with_capacity(WAV_HEADER_SIZE + pcm.len());
    wav.extend_from_slice(&header);
    wav.extend_from_slice(&pcm);
    wav
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += samples[frame * channels + ch];
        }
        mono.push(sum * scale);
    }
    mono
}
