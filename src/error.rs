//! Error types
//!
//! Configuration errors are raised before any body exists. Resource errors
//! abort the run rather than leave a half-written artifact behind.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid board parameters
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("level count must be at least 1 (got {0})")]
    InvalidLevels(u32),

    #[error("canvas must be non-empty (got {width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("frame rate must be at least 1")]
    InvalidFrameRate,

    #[error("sub-step count must be at least 1")]
    InvalidSubsteps,

    #[error("solver iteration count must be at least 1")]
    InvalidIterations,

    #[error("sample rate must be at least 1 Hz")]
    InvalidSampleRate,

    #[error("{name} radius resolves to {radius} pixels; must be at least 1")]
    RadiusTooSmall { name: &'static str, radius: f32 },

    #[error("peg diameter {diameter} does not fit horizontal spacing {spacing}")]
    PegTooLarge { diameter: f32, spacing: f32 },

    #[error("a full row holds {0} peg(s); the staggered lattice needs at least 2")]
    TooFewPegs(u32),

    #[error("{field} must be finite and non-negative (got {value})")]
    InvalidValue { field: &'static str, value: f64 },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while producing frames, audio or the final artifact
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write frame {tick}: {source}")]
    Frame {
        tick: u64,
        source: image::ImageError,
    },

    #[error("frame for tick {got} recorded out of order (expected tick {expected})")]
    FrameGap { expected: u64, got: u64 },

    #[error("failed to write audio track: {0}")]
    Wav(#[from] hound::Error),

    #[error("media encoder `{0}` not found")]
    EncoderNotFound(String),

    #[error("media encoder exited with {status}: {stderr}")]
    EncoderFailed { status: String, stderr: String },

    #[error("no frames were captured; nothing to assemble")]
    NoFrames,
}

impl RenderError {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Live cue delivery failures; never fatal
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CueError {
    #[error("cue queue is full")]
    Busy,

    #[error("cue consumer has gone away")]
    Disconnected,

    #[error("audio device: {0}")]
    Device(String),
}
