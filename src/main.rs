//! Galton Board entry point
//!
//! Builds a config from a profile, an optional JSON file and CLI overrides,
//! then runs the pipeline and prints the run summary as JSON.
//!
//! ```bash
//! # Canonical run: 200 balls, live cues, synthesized track, mp4 output
//! galton-board --output galton.mp4
//!
//! # Short preview, keeping the PNG frames
//! galton-board --profile showcase --keep-frames
//!
//! # Frames and WAV only, no encoder needed
//! galton-board --no-video --balls 20 --seed 42
//! ```

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use galton_board::audio::ChannelCue;
use galton_board::media::{FfmpegEncoder, MediaEncoder};
use galton_board::settings::AudioConfig;
use galton_board::sim::CollisionEvent;
use galton_board::{BoardConfig, Pipeline, PipelineOptions, Profile};

/// Live cues queued before new ones are dropped
const CUE_QUEUE: usize = 256;

/// Galton board simulator rendered to video with collision audio
#[derive(Parser, Debug)]
#[command(name = "galton-board")]
#[command(version, about)]
struct Cli {
    /// JSON config file; fields it omits keep the profile's values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting profile: hybrid, showcase, silent or live-only
    #[arg(long, default_value = "hybrid", value_parser = parse_profile)]
    profile: Profile,

    /// Spawn jitter seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of balls to drop
    #[arg(long)]
    balls: Option<u32>,

    /// Number of peg rows
    #[arg(long)]
    levels: Option<u32>,

    /// Output video path (the WAV track is written beside it)
    #[arg(short, long, default_value = "galton_board.mp4")]
    output: PathBuf,

    /// Frame directory (default: <output stem>_frames)
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Keep PNG frames after encoding
    #[arg(long)]
    keep_frames: bool,

    /// Stop after this many ticks
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_ticks: Option<u64>,

    /// Skip encoding; leave frames and the WAV track on disk
    #[arg(long)]
    no_video: bool,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn parse_profile(s: &str) -> Result<Profile, String> {
    Profile::from_str(s).ok_or_else(|| format!("unknown profile `{s}`"))
}

impl Cli {
    fn board_config(&self) -> Result<BoardConfig> {
        let base = BoardConfig::from_profile(self.profile);
        let mut config = match &self.config {
            Some(path) => BoardConfig::load_over(base, path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => base,
        };

        if let Some(seed) = self.seed {
            config.spawn.seed = seed;
        }
        if let Some(balls) = self.balls {
            config.spawn.ball_count = balls;
        }
        if let Some(levels) = self.levels {
            config.layout.levels = levels;
        }
        config.validate().context("Invalid board configuration")?;
        Ok(config)
    }
}

#[cfg(feature = "playback")]
fn consume_cues(cues: Receiver<CollisionEvent>, audio: AudioConfig) -> u64 {
    galton_board::audio::play_cues(cues, &audio)
}

#[cfg(not(feature = "playback"))]
fn consume_cues(cues: Receiver<CollisionEvent>, _audio: AudioConfig) -> u64 {
    log::warn!("Built without the `playback` feature; live cues are counted, not played");
    let mut count = 0u64;
    for event in cues {
        count += 1;
        log::trace!("cue: ball {} at {:.3}s", event.ball.0, event.timestamp);
    }
    count
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.board_config()?;

    if cli.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    log::info!("Galton Board starting (profile {})", cli.profile.as_str());

    // Locate the encoder before simulating so a missing ffmpeg fails fast
    let mut encoder = if cli.no_video {
        None
    } else {
        Some(FfmpegEncoder::locate(&config.encoder).context("Cannot encode video")?)
    };

    let options = PipelineOptions {
        output: cli.output.clone(),
        frames_dir: cli.frames_dir.clone(),
        keep_frames: cli.keep_frames,
        max_ticks: cli.max_ticks,
    };
    let mut pipeline = Pipeline::new(config.clone(), options);

    let consumer = if config.audio.mode.live_cues() {
        let (cue, rx) = ChannelCue::bounded(CUE_QUEUE);
        pipeline = pipeline.with_cue(Box::new(cue));
        let audio = config.audio.clone();
        Some(thread::spawn(move || consume_cues(rx, audio)))
    } else {
        None
    };

    let stop = pipeline.stop_signal();
    ctrlc::set_handler(move || {
        log::warn!("Interrupted; finishing with the frames recorded so far");
        stop.stop();
    })
    .context("Failed to install the Ctrl-C handler")?;

    let report = pipeline
        .run(encoder.as_mut().map(|e| e as &mut dyn MediaEncoder))
        .context("Run failed")?;

    // The cue sender was dropped with the pipeline, which ends the consumer
    if let Some(handle) = consumer {
        match handle.join() {
            Ok(count) => log::info!("Delivered {} live cue(s)", count),
            Err(_) => log::warn!("Live cue consumer panicked"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    Ok(())
}
