//! Sample rate conversion
//!
//! Decoded inputs arrive at whatever rate they were recorded at; the
//! renderer needs them all at the context rate. Linear interpolation is
//! used; output length is `ceil(len * target / source)` unless the caller
//! asks for an exact length.

/// Number of output samples produced for `source_len` input samples
pub fn resampled_len(source_len: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == 0 {
        return 0;
    }
    let numerator = source_len as u64 * target_rate as u64;
    numerator.div_ceil(source_rate as u64) as usize
}

/// Linear interpolation resampling of one channel
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    let target_len = resampled_len(samples.len(), source_rate, target_rate);
    resample_linear_to_len(samples, source_rate, target_rate, target_len)
}

/// Resample every channel to exactly `target_len` samples
pub fn resample_channels_to_len(
    channels: &[Vec<f32>],
    source_rate: u32,
    target_rate: u32,
    target_len: usize,
) -> Vec<Vec<f32>> {
    channels
        .iter()
        .map(|channel| resample_linear_to_len(channel, source_rate, target_rate, target_len))
        .collect()
}

/// Linear interpolation producing exactly `target_len` samples
///
/// Positions past the end of the source hold the last sample, so a length
/// one frame longer than the natural one pads rather than extrapolates.
pub fn resample_linear_to_len(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
    target_len: usize,
) -> Vec<f32> {
    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return vec![0.0; target_len];
    }
    if source_rate == target_rate && samples.len() == target_len {
        return samples.to_vec();
    }

    let source_len = samples.len();
    let step = source_rate as f64 / target_rate as f64;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        // Map output index to source position
        let src_pos = i as f64 * step;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            samples[source_len - 1]
        };

        output.push(sample);
    }

    output
}
