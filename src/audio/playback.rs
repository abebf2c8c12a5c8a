//! Live cue playback on the default output device
//!
//! The consumer thread owns the stream; each received cue starts one tick
//! envelope in a shared [`CueMixer`] that the device callback drains.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

use super::mixer::{CueMixer, MAX_VOICES};
use super::synth::tick_envelope;
use crate::error::CueError;
use crate::settings::AudioConfig;
use crate::sim::CollisionEvent;

fn device_error(err: impl std::fmt::Display) -> CueError {
    CueError::Device(err.to_string())
}

/// An open output stream playing ticks on demand
pub struct CuePlayer {
    _stream: Stream,
    mixer: Arc<Mutex<CueMixer>>,
    tail: Duration,
}

impl CuePlayer {
    /// Open the default device; the envelope is built at the device's rate
    pub fn open(config: &AudioConfig) -> Result<Self, CueError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| CueError::Device("no audio output device".into()))?;
        let supported = device.default_output_config().map_err(device_error)?;

        let rate = supported.sample_rate().0;
        let envelope = tick_envelope(rate, config.tick_freq, config.tick_duration);
        let tail = Duration::from_secs_f64(envelope.duration_secs());
        let mixer = Arc::new(Mutex::new(CueMixer::new(envelope, MAX_VOICES)));

        let format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();
        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, Arc::clone(&mixer)),
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, Arc::clone(&mixer)),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, Arc::clone(&mixer)),
            other => Err(CueError::Device(format!("unsupported sample format {other:?}"))),
        }?;
        stream.play().map_err(device_error)?;

        log::info!(
            "Live cues on the default device: {} Hz, {} channel(s)",
            rate,
            stream_config.channels
        );
        Ok(Self {
            _stream: stream,
            mixer,
            tail,
        })
    }

    pub fn play(&self) {
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.trigger();
        }
    }

    /// How long the last tick keeps sounding
    pub fn tail(&self) -> Duration {
        self.tail
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mixer: Arc<Mutex<CueMixer>>,
) -> Result<Stream, CueError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels).max(1);
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let Ok(mut mixer) = mixer.lock() else {
                    data.fill(T::EQUILIBRIUM);
                    return;
                };
                for frame in data.chunks_mut(channels) {
                    frame.fill(T::from_sample(mixer.next_sample()));
                }
            },
            |err| log::warn!("Live cue stream error: {err}"),
            None,
        )
        .map_err(device_error)
}

/// Play a tick for every cue until the sender hangs up; returns the cue count
///
/// Without a usable device the cues are still drained so the simulation
/// never sees a full queue.
pub fn play_cues(cues: Receiver<CollisionEvent>, config: &AudioConfig) -> u64 {
    let player = match CuePlayer::open(config) {
        Ok(player) => Some(player),
        Err(e) => {
            log::warn!("Live playback unavailable: {e}");
            None
        }
    };

    let mut count = 0;
    for event in cues {
        count += 1;
        if let Some(player) = &player {
            player.play();
        }
        log::trace!("cue: ball {} at {:.3}s", event.ball.0, event.timestamp);
    }

    if let Some(player) = player {
        thread::sleep(player.tail());
    }
    count
}
