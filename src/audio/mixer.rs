//! Real-time mixing of overlapping tick cues

use super::Waveform;

/// Ticks started while this many are still sounding drop the oldest
pub const MAX_VOICES: usize = 32;

/// Plays one envelope per trigger, summing overlaps sample by sample
#[derive(Debug, Clone)]
pub struct CueMixer {
    envelope: Vec<f32>,
    /// Playhead of every sounding tick, oldest first
    voices: Vec<usize>,
    max_voices: usize,
}

impl CueMixer {
    pub fn new(envelope: Waveform, max_voices: usize) -> Self {
        Self {
            envelope: envelope.samples,
            voices: Vec::new(),
            max_voices: max_voices.max(1),
        }
    }

    /// Start a tick on the next sample
    pub fn trigger(&mut self) {
        if self.envelope.is_empty() {
            return;
        }
        if self.voices.len() == self.max_voices {
            self.voices.remove(0);
        }
        self.voices.push(0);
    }

    /// Ticks still sounding
    pub fn active(&self) -> usize {
        self.voices.len()
    }

    pub fn next_sample(&mut self) -> f32 {
        let mut sum = 0.0;
        for pos in &mut self.voices {
            sum += self.envelope[*pos];
            *pos += 1;
        }
        let len = self.envelope.len();
        self.voices.retain(|&pos| pos < len);
        sum.clamp(-1.0, 1.0)
    }

    /// Fill interleaved output, writing the same sample to every channel
    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        for frame in out.chunks_mut(channels.max(1)) {
            frame.fill(self.next_sample());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tick_envelope;

    fn ramp(len: usize) -> Waveform {
        Waveform {
            samples: (1..=len).map(|i| i as f32 / 10.0).collect(),
            sample_rate: 1000,
        }
    }

    #[test]
    fn test_idle_mixer_is_silent() {
        let mut mixer = CueMixer::new(ramp(3), 4);
        let mut out = [1.0; 8];
        mixer.fill(&mut out, 2);
        assert_eq!(out, [0.0; 8]);
    }

    #[test]
    fn test_single_cue_plays_the_envelope_once() {
        let envelope = tick_envelope(44_100, 500.0, 0.01);
        let mut mixer = CueMixer::new(envelope.clone(), 4);
        mixer.trigger();
        let played: Vec<f32> = (0..envelope.len() + 5).map(|_| mixer.next_sample()).collect();
        assert_eq!(&played[..envelope.len()], envelope.samples.as_slice());
        assert!(played[envelope.len()..].iter().all(|&s| s == 0.0));
        assert_eq!(mixer.active(), 0);
    }

    #[test]
    fn test_overlapping_cues_add_and_clip() {
        let mut mixer = CueMixer::new(ramp(10), 4);
        mixer.trigger();
        assert!((mixer.next_sample() - 0.1).abs() < 1e-6);
        mixer.trigger();
        // Second voice at its first sample, first at its second
        assert!((mixer.next_sample() - 0.3).abs() < 1e-6);
        assert_eq!(mixer.active(), 2);
        for _ in 0..5 {
            mixer.next_sample();
        }
        // 0.8 + 0.7 sums past full scale
        assert_eq!(mixer.next_sample(), 1.0);
    }

    #[test]
    fn test_voice_limit_drops_the_oldest() {
        let mut mixer = CueMixer::new(ramp(10), 2);
        mixer.trigger();
        mixer.next_sample();
        mixer.trigger();
        mixer.trigger();
        assert_eq!(mixer.active(), 2);
        // Both remaining voices start fresh: 0.1 + 0.1
        assert!((mixer.next_sample() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_stereo_frames_share_the_sample() {
        let mut mixer = CueMixer::new(ramp(2), 1);
        mixer.trigger();
        let mut out = [0.0; 6];
        mixer.fill(&mut out, 2);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_envelope_never_sounds() {
        let mut mixer = CueMixer::new(Waveform::silence(0, 44_100), 4);
        mixer.trigger();
        assert_eq!(mixer.active(), 0);
        assert_eq!(mixer.next_sample(), 0.0);
    }
}
