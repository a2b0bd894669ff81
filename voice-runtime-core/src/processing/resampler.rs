use crate::models::audio_models::AudioLevels;

/// Pure-math conversion of microphone buffers to the requested format.
///
/// All operations work on `&[f32]` buffers with no platform dependencies.
#[derive(Debug, Clone)]
pub struct Resampler {
    pub target_sample_rate: f64,
}

impl Resampler {
    pub fn new(target_sample_rate: f64) -> Self {
        Self { target_sample_rate }
    }

    /// Linear interpolation resampling for mono audio.
    ///
    /// Returns input unchanged if rates match, and nothing for a source rate
    /// that is not positive.
    pub fn resample(&self, samples: &[f32], source_sample_rate: f64) -> Vec<f32> {
        if (source_sample_rate - self.target_sample_rate).abs() < 0.01 || samples.is_empty() {
            return samples.to_vec();
        }

        let ratio = self.target_sample_rate / source_sample_rate;
        if !ratio.is_finite() || ratio <= 0.0 {
            log::warn!("Dropping {} samples with invalid rate {}", samples.len(), source_sample_rate);
            return Vec::new();
        }
        let output_count = (samples.len() as f64 * ratio) as usize;
        if output_count == 0 {
            return Vec::new();
        }

        let mut output = vec![0.0f32; output_count];
        for (i, sample) in output.iter_mut().enumerate() {
            let source_index = i as f64 / ratio;
            let index = source_index as usize;
            let fraction = (source_index - index as f64) as f32;

            if index + 1 < samples.len() {
                *sample = samples[index] * (1.0 - fraction) + samples[index + 1] * fraction;
            } else if index < samples.len() {
                *sample = samples[index];
            }
        }
        output
    }

    /// Interleave two mono channels into stereo `[L0, R0, L1, R1, ...]`.
    pub fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
        let frame_count = left.len().max(right.len());
        let mut stereo = vec![0.0f32; frame_count * 2];
        for i in 0..frame_count {
            stereo[i * 2] = left.get(i).copied().unwrap_or(0.0);
            stereo[i * 2 + 1] = right.get(i).copied().unwrap_or(0.0);
        }
        stereo
    }

    /// RMS level (0.0–1.0) of a buffer.
    pub fn rms_level(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
        (sum_sq / samples.len() as f32).sqrt().min(1.0)
    }

    /// Peak absolute level (0.0–1.0) of a buffer.
    pub fn peak_level(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs())).min(1.0)
    }

    pub fn levels(samples: &[f32]) -> AudioLevels {
        AudioLevels {
            rms: Self::rms_level(samples),
            peak: Self::peak_level(samples),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn same_rate_is_passthrough() {
        let r = Resampler::new(44100.0);
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(r.resample(&samples, 44100.0), samples);
    }

    #[test]
    fn downsample_halves_length() {
        let r = Resampler::new(24000.0);
        let samples: Vec<f32> = (0..480).map(|i| i as f32 / 480.0).collect();
        let out = r.resample(&samples, 48000.0);
        assert_eq!(out.len(), 240);
        assert_relative_eq!(out[10], samples[20], epsilon = 1e-6);
    }

    #[test]
    fn invalid_source_rate_yields_nothing() {
        let r = Resampler::new(16000.0);
        let samples = vec![0.5f32; 64];
        assert!(r.resample(&samples, 0.0).is_empty());
        assert!(r.resample(&samples, -8000.0).is_empty());
        assert!(r.resample(&samples, f64::NAN).is_empty());
    }

    #[test]
    fn upsample_interpolates() {
        let r = Resampler::new(2.0);
        let out = r.resample(&[0.0, 1.0], 1.0);
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn interleave_pads_shorter_channel() {
        let stereo = Resampler::interleave(&[1.0, 2.0], &[3.0]);
        assert_eq!(stereo, vec![1.0, 3.0, 2.0, 0.0]);
    }

    #[test]
    fn levels_of_constant_signal() {
        let levels = Resampler::levels(&[0.5, -0.5, 0.5, -0.5]);
        assert_relative_eq!(levels.rms, 0.5, epsilon = 1e-6);
        assert_relative_eq!(levels.peak, 0.5, epsilon = 1e-6);
        assert_eq!(Resampler::rms_level(&[]), 0.0);
    }
}
