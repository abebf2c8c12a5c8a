//! The full run: config in, artifact out
//!
//! Owns the tick loop. Each tick is simulated, rendered and captured before
//! the next begins; audio synthesis and muxing run once after the loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::audio::{AudioSynthesizer, LiveCue, NoCue};
use crate::error::RenderError;
use crate::media::{Artifact, MediaAssembler, MediaEncoder};
use crate::recorder::FrameRecorder;
use crate::renderer::BoardRenderer;
use crate::settings::BoardConfig;
use crate::sim::{CollisionLog, SimulationState, Termination, tick};

/// Cooperative cancellation flag, checked once per tick
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Output and loop controls that are not part of the board itself
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Video path; the WAV track is written next to it
    pub output: PathBuf,
    /// Where frames go; defaults to `<output stem>_frames` beside the output
    pub frames_dir: Option<PathBuf>,
    pub keep_frames: bool,
    /// Hard cap on executed ticks
    pub max_ticks: Option<u64>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("galton_board.mp4"),
            frames_dir: None,
            keep_frames: false,
            max_ticks: None,
        }
    }
}

impl PipelineOptions {
    pub fn frames_dir(&self) -> PathBuf {
        if let Some(dir) = &self.frames_dir {
            return dir.clone();
        }
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "galton_board".to_string());
        let parent = self.output.parent().unwrap_or(Path::new(""));
        parent.join(format!("{stem}_frames"))
    }
}

/// Headline numbers of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub balls_spawned: u32,
    pub collision_events: usize,
    pub duration_secs: f64,
    pub termination: Termination,
    /// Balls resting in each bin, left to right
    pub bin_counts: Vec<u32>,
    /// Balls that left the board past its edges
    pub escaped: u32,
}

impl RunSummary {
    fn from_state(state: &SimulationState, termination: Termination) -> Self {
        Self {
            ticks: state.ticks(),
            balls_spawned: state.spawner.spawned(),
            collision_events: state.collisions.len(),
            duration_secs: state.elapsed(),
            termination,
            bin_counts: state.bin_counts(),
            escaped: state.escaped(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub artifact: Artifact,
    pub collisions: CollisionLog,
}

pub struct Pipeline {
    config: BoardConfig,
    options: PipelineOptions,
    stop: StopSignal,
    cue: Box<dyn LiveCue>,
}

impl Pipeline {
    pub fn new(config: BoardConfig, options: PipelineOptions) -> Self {
        Self {
            config,
            options,
            stop: StopSignal::new(),
            cue: Box::new(NoCue),
        }
    }

    /// Receive live cues during the run
    pub fn with_cue(mut self, cue: Box<dyn LiveCue>) -> Self {
        self.cue = cue;
        self
    }

    /// Handle for stopping the run from elsewhere
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Simulate, capture and assemble
    ///
    /// Without an encoder the frames and WAV track are left on disk and no
    /// video is produced.
    pub fn run(self, encoder: Option<&mut dyn MediaEncoder>) -> Result<RunReport, RenderError> {
        let Pipeline {
            config,
            options,
            stop,
            cue,
        } = self;

        let mut state = SimulationState::new(&config, cue)?;
        log::info!(
            "Starting run: {} balls, {} levels, {}x{} @ {} fps, seed {:#x}",
            config.spawn.ball_count,
            config.layout.levels,
            config.canvas.width,
            config.canvas.height,
            config.canvas.fps,
            config.spawn.seed
        );

        let mut renderer = BoardRenderer::new(config.canvas.width, config.canvas.height, &state.world);
        let mut recorder = FrameRecorder::new(options.frames_dir())?;
        let progress_every = u64::from(config.canvas.fps) * 5;

        let termination = loop {
            if stop.is_stopped() {
                break Termination::Stopped;
            }
            let report = tick(&mut state);
            recorder.record(report.tick, renderer.render(&state.world))?;

            if report.tick % progress_every == 0 && report.tick > 0 {
                log::debug!(
                    "t={:.1}s: {}/{} balls, {} events",
                    state.elapsed(),
                    state.spawner.spawned(),
                    state.spawner.total(),
                    state.collisions.len()
                );
            }

            if let Some(reason) = report.termination {
                break reason;
            }
            if options.max_ticks.is_some_and(|max| state.ticks() >= max) {
                break Termination::TickLimit;
            }
        };

        let summary = RunSummary::from_state(&state, termination);
        log::info!(
            "Run finished ({}): {} ticks, {:.2}s, {} balls, {} audible collisions",
            summary.termination,
            summary.ticks,
            summary.duration_secs,
            summary.balls_spawned,
            summary.collision_events
        );
        log::info!("Bin counts: {:?}", summary.bin_counts);
        if summary.escaped > 0 {
            log::warn!("{} ball(s) left the board", summary.escaped);
        }
        if state.classifier.cue_failures() > 0 {
            log::warn!("{} live cue(s) were dropped", state.classifier.cue_failures());
        }

        if recorder.is_empty() {
            log::info!("Stopped before the first tick; nothing to assemble");
            recorder.cleanup()?;
            return Ok(RunReport {
                summary,
                artifact: Artifact::default(),
                collisions: state.collisions,
            });
        }

        let track = config.audio.mode.offline_track().then(|| {
            AudioSynthesizer::new(&config.audio)
                .synthesize(state.collisions.timestamps(), state.elapsed())
        });

        let assembler = MediaAssembler::new(config.canvas.fps, config.audio.sample_rate);
        let artifact = assembler.assemble(&recorder, track, &options.output, encoder)?;

        if let Some(video) = &artifact.video {
            log::info!("Wrote {}", video.display());
            if !options.keep_frames {
                recorder.cleanup()?;
            }
        }

        Ok(RunReport {
            summary,
            artifact,
            collisions: state.collisions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frames_dir_sits_beside_output() {
        let options = PipelineOptions {
            output: PathBuf::from("out/run.mp4"),
            ..PipelineOptions::default()
        };
        assert_eq!(options.frames_dir(), PathBuf::from("out/run_frames"));

        let options = PipelineOptions {
            frames_dir: Some(PathBuf::from("/tmp/x")),
            ..options
        };
        assert_eq!(options.frames_dir(), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_stop_signal_is_shared() {
        let signal = StopSignal::new();
        let handle = signal.clone();
        assert!(!signal.is_stopped());
        handle.stop();
        assert!(signal.is_stopped());
    }

    #[test]
    fn test_summary_serializes() {
        let summary = RunSummary {
            ticks: 3,
            balls_spawned: 1,
            collision_events: 2,
            duration_secs: 0.05,
            termination: Termination::Timeout,
            bin_counts: vec![0, 1, 0],
            escaped: 0,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"termination\":\"timeout\""));
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
