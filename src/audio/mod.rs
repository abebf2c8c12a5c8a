//! Audio: tick envelope, offline synthesis, live cues and WAV export
//!
//! Live cues go through the [`LiveCue`] trait so the host decides how (or
//! whether) to play them. Device output sits behind the `playback` feature.

pub mod cue;
pub mod mixer;
#[cfg(feature = "playback")]
pub mod playback;
pub mod synth;
pub mod wav;

pub use cue::{ChannelCue, LiveCue, NoCue};
pub use mixer::CueMixer;
#[cfg(feature = "playback")]
pub use playback::{CuePlayer, play_cues};
pub use synth::{AudioSynthesizer, tick_envelope};
pub use wav::write_wav;

/// Mono samples at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; len],
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    /// Trim or zero-pad to exactly `len` samples
    pub fn fit_to(&mut self, len: usize) {
        self.samples.resize(len, 0.0);
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0, |acc, s| acc.max(s.abs()))
    }
}

/// Samples covering `seconds` at `sample_rate`, rounded to the nearest sample
pub fn samples_for(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).round().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_trims_and_pads() {
        let mut wave = Waveform {
            samples: vec![0.5; 10],
            sample_rate: 100,
        };
        wave.fit_to(4);
        assert_eq!(wave.samples, vec![0.5; 4]);
        wave.fit_to(6);
        assert_eq!(wave.samples, vec![0.5, 0.5, 0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_samples_for_rounds() {
        assert_eq!(samples_for(1.0, 44_100), 44_100);
        assert_eq!(samples_for(1.0 / 60.0, 44_100), 735);
        assert_eq!(samples_for(0.0, 44_100), 0);
    }

    #[test]
    fn test_silence() {
        let wave = Waveform::silence(3, 8000);
        assert!(wave.is_silent());
        assert_eq!(wave.peak(), 0.0);
        assert!((wave.duration_secs() - 3.0 / 8000.0).abs() < 1e-12);
    }
}
