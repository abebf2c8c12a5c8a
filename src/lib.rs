//! Galton Board - a deterministic bean machine rendered to video
//!
//! Core modules:
//! - `sim`: Deterministic simulation (layout, physics, spawning, collision classification)
//! - `renderer`: CPU rasterizer that turns world state into frames
//! - `recorder`: Ordered frame capture
//! - `audio`: Tick envelope, offline synthesis, live cues and WAV export
//! - `media`: Muxing frames and audio through an external encoder
//! - `pipeline`: The full run, from config to artifact
//! - `settings`: Board configuration and profiles

pub mod audio;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod recorder;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, CueError, RenderError};
pub use pipeline::{Pipeline, PipelineOptions, RunReport, RunSummary, StopSignal};
pub use settings::{AudioMode, BoardConfig, Profile};

/// Default configuration constants
pub mod consts {
    /// Canvas resolution in pixels
    pub const SCREEN_WIDTH: u32 = 512;
    pub const SCREEN_HEIGHT: u32 = 768;
    /// Capture and playback frame rate
    pub const FPS: u32 = 60;

    /// Number of peg rows
    pub const LEVELS: u32 = 10;
    /// Ball radius as a fraction of the canvas width
    pub const BALL_SIZE: f32 = 0.01;
    /// Peg radius as a fraction of the canvas width
    pub const PEG_SIZE: f32 = 0.005;
    /// Capsule radius of the floor and bin separators
    pub const FLOOR_THICKNESS: f32 = 5.0;
    /// Separators and floor are raised by this many pixels
    pub const VISUAL_OFFSET: f32 = 10.0;

    pub const BALL_COUNT: u32 = 200;
    /// Seconds between drops
    pub const DROP_INTERVAL: f64 = 0.25;
    /// Horizontal spawn jitter (± pixels)
    pub const SPAWN_RANGE: f32 = 2.0;

    /// Gravity in pixels/s² (screen space, +y is down)
    pub const GRAVITY: [f32; 2] = [0.0, 900.0];
    /// Fraction of velocity kept per second
    pub const SPACE_DAMPING: f32 = 0.99;
    pub const FRICTION: f32 = 10.0;
    pub const BALL_MASS: f32 = 10.0;
    pub const BALL_ELASTICITY: f32 = 0.0;
    pub const PEG_ELASTICITY: f32 = 0.0;
    pub const SEGMENT_ELASTICITY: f32 = 0.0;
    /// Solver iterations per sub-step
    pub const SOLVER_ITERATIONS: u32 = 30;
    /// Physics sub-steps per frame
    pub const SUBSTEPS: u32 = 3;

    /// Minimum |vy| (pixels/s) for a contact to be audible
    pub const VELOCITY_THRESHOLD: f32 = 50.0;

    pub const SAMPLE_RATE: u32 = 44_100;
    pub const TICK_SOUND_FREQ: f32 = 500.0;
    /// Tick envelope length in seconds
    pub const TICK_SOUND_DURATION: f64 = 0.01;

    /// Per-axis speed below which a ball counts as settled
    pub const SETTLE_EPSILON: f32 = 0.1;
    /// Seconds after the last spawn before the run is cut off
    pub const SETTLE_TIMEOUT: f64 = 10.0;
}
