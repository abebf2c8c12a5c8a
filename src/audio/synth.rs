//! Offline synthesis of the collision track

use std::f64::consts::PI;

use super::{Waveform, samples_for};
use crate::settings::AudioConfig;

/// Hann-windowed sine burst
///
/// `floor(sample_rate * duration)` samples; a one-sample window is 1.0.
pub fn tick_envelope(sample_rate: u32, freq: f32, duration: f64) -> Waveform {
    // Guard against 441.00000000000006-style products flooring a sample short
    let len = (sample_rate as f64 * duration + 1e-9).floor().max(0.0) as usize;
    let freq = freq as f64;
    let sr = sample_rate as f64;
    let samples = (0..len)
        .map(|i| {
            let window = if len > 1 {
                0.5 - 0.5 * (2.0 * PI * i as f64 / (len - 1) as f64).cos()
            } else {
                1.0
            };
            ((2.0 * PI * freq * i as f64 / sr).sin() * window) as f32
        })
        .collect();
    Waveform {
        samples,
        sample_rate,
    }
}

/// Renders collision timestamps into a full-length track
#[derive(Debug, Clone)]
pub struct AudioSynthesizer {
    envelope: Waveform,
}

impl AudioSynthesizer {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            envelope: tick_envelope(config.sample_rate, config.tick_freq, config.tick_duration),
        }
    }

    pub fn with_envelope(envelope: Waveform) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &Waveform {
        &self.envelope
    }

    pub fn sample_rate(&self) -> u32 {
        self.envelope.sample_rate
    }

    /// Overlay one envelope per timestamp onto a silent buffer
    ///
    /// The buffer holds `round(sample_rate * duration) + envelope_len`
    /// samples. Overlaps add; the sum is clipped to [-1, 1]. Starts are
    /// applied in sorted order so the result does not depend on the order
    /// of `timestamps`.
    pub fn synthesize<I>(&self, timestamps: I, duration: f64) -> Waveform
    where
        I: IntoIterator<Item = f64>,
    {
        let sample_rate = self.sample_rate();
        let len = samples_for(duration, sample_rate) + self.envelope.len();
        let mut track = Waveform::silence(len, sample_rate);

        let mut starts: Vec<usize> = timestamps
            .into_iter()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|t| samples_for(t, sample_rate))
            .collect();
        starts.sort_unstable();

        for start in &starts {
            let Some(dest) = track.samples.get_mut(*start..) else {
                continue;
            };
            for (out, env) in dest.iter_mut().zip(&self.envelope.samples) {
                *out += env;
            }
        }

        for s in &mut track.samples {
            *s = s.clamp(-1.0, 1.0);
        }

        log::debug!(
            "Synthesized {} ticks into {} samples ({:.2}s)",
            starts.len(),
            track.len(),
            track.duration_secs()
        );
        track
    }
}
