//! 16-bit mono WAV export

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::Waveform;
use crate::error::RenderError;

/// One sample as symmetric 16-bit PCM; out-of-range input is clipped
fn pcm_sample(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Write a waveform as a 16-bit mono WAV file
pub fn write_wav(path: &Path, wave: &Waveform) -> Result<(), RenderError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: wave.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &wave.samples {
        writer.write_sample(pcm_sample(sample))?;
    }
    writer.finalize()?;

    log::info!(
        "Wrote {} ({} samples, {:.2}s)",
        path.display(),
        wave.len(),
        wave.duration_secs()
    );
    Ok(())
}
