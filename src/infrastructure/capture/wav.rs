//! PCM helpers for finalized captures: downmix, resample and WAV output

use std::path::Path;

use rubato::{FftFixedIn, Resampler};

use crate::application::ports::CaptureError;

/// Average interleaved channels into one
pub fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Convert float samples in -1.0..=1.0 to i16
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

/// Resample mono audio from `source_rate` to `target_rate`
pub fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Result<Vec<i16>, CaptureError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024,
        2,
        1,
    )
    .map_err(|e| CaptureError::FinalizeFailed(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());
        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        // Last chunk is zero-padded to a full frame
        chunk.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| CaptureError::FinalizeFailed(format!("Resampling failed: {}", e)))?;

        output.extend(resampled[0].iter().map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16));
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}

/// Write mono 16-bit PCM to `path`
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| {
        CaptureError::FinalizeFailed(format!("Failed to create {}: {}", path.display(), e))
    })?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| CaptureError::FinalizeFailed(format!("Failed to write sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| CaptureError::FinalizeFailed(format!("Failed to finalize WAV: {}", e)))
}
