//! Board configuration and profiles
//!
//! A run is fully described by one `BoardConfig`. Profiles are named
//! starting points that tweak the defaults; a JSON file can override any
//! field on top of that.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Named configuration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Live cues while simulating plus an offline track in the artifact
    #[default]
    Hybrid,
    /// Ten slow drops, useful for previews
    Showcase,
    /// Light, low-friction balls with a random sideways kick and no sound
    Silent,
    /// Live cues only; the artifact has no audio track
    LiveOnly,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Hybrid => "hybrid",
            Profile::Showcase => "showcase",
            Profile::Silent => "silent",
            Profile::LiveOnly => "live-only",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hybrid" | "default" => Some(Profile::Hybrid),
            "showcase" | "short" => Some(Profile::Showcase),
            "silent" => Some(Profile::Silent),
            "live-only" | "live" => Some(Profile::LiveOnly),
            _ => None,
        }
    }

    /// Apply this profile's overrides to a config
    pub fn apply(&self, config: &mut BoardConfig) {
        match self {
            Profile::Hybrid => {
                config.audio.mode = AudioMode::Hybrid;
            }
            Profile::Showcase => {
                config.spawn.ball_count = 10;
                config.spawn.drop_interval = 0.5;
                config.audio.mode = AudioMode::Hybrid;
            }
            Profile::Silent => {
                config.physics.ball_mass = 1.0;
                config.physics.friction = 0.6;
                config.spawn.impulse_scale = 5.0;
                config.audio.mode = AudioMode::Silent;
            }
            Profile::LiveOnly => {
                config.audio.mode = AudioMode::Live;
            }
        }
    }
}

/// Which audio outputs a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AudioMode {
    /// No cues, no track
    Silent,
    /// Cues during simulation only
    Live,
    /// Synthesized track only
    Offline,
    /// Both
    #[default]
    Hybrid,
}

impl AudioMode {
    pub fn live_cues(&self) -> bool {
        matches!(self, AudioMode::Live | AudioMode::Hybrid)
    }

    pub fn offline_track(&self) -> bool {
        matches!(self, AudioMode::Offline | AudioMode::Hybrid)
    }
}

/// Output canvas and capture rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            fps: FPS,
        }
    }
}

/// Peg lattice and bin geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub levels: u32,
    /// Peg radius as a fraction of canvas width
    pub peg_size: f32,
    /// Ball radius as a fraction of canvas width
    pub ball_size: f32,
    pub floor_thickness: f32,
    pub visual_offset: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            levels: LEVELS,
            peg_size: PEG_SIZE,
            ball_size: BALL_SIZE,
            floor_thickness: FLOOR_THICKNESS,
            visual_offset: VISUAL_OFFSET,
        }
    }
}

/// Rigid-body constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 2],
    pub damping: f32,
    pub friction: f32,
    pub ball_mass: f32,
    pub ball_elasticity: f32,
    pub peg_elasticity: f32,
    pub wall_elasticity: f32,
    pub iterations: u32,
    pub substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            damping: SPACE_DAMPING,
            friction: FRICTION,
            ball_mass: BALL_MASS,
            ball_elasticity: BALL_ELASTICITY,
            peg_elasticity: PEG_ELASTICITY,
            wall_elasticity: SEGMENT_ELASTICITY,
            iterations: SOLVER_ITERATIONS,
            substeps: SUBSTEPS,
        }
    }
}

/// Ball release schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub ball_count: u32,
    /// Seconds between drops
    pub drop_interval: f64,
    /// Horizontal jitter (± pixels) around the canvas center
    pub spawn_range: f32,
    /// Random sideways impulse on spawn, in multiples of ball radius (0 = off)
    pub impulse_scale: f32,
    /// RNG seed for jitter and impulses
    pub seed: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            ball_count: BALL_COUNT,
            drop_interval: DROP_INTERVAL,
            spawn_range: SPAWN_RANGE,
            impulse_scale: 0.0,
            seed: 0x6A17_0B0A,
        }
    }
}

/// Collision sounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub mode: AudioMode,
    pub sample_rate: u32,
    pub tick_freq: f32,
    /// Tick envelope length in seconds
    pub tick_duration: f64,
    /// Minimum |vy| for a contact to be audible
    pub velocity_threshold: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mode: AudioMode::Hybrid,
            sample_rate: SAMPLE_RATE,
            tick_freq: TICK_SOUND_FREQ,
            tick_duration: TICK_SOUND_DURATION,
            velocity_threshold: VELOCITY_THRESHOLD,
        }
    }
}

/// When to stop the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    pub settle_epsilon: f32,
    /// Seconds after the last spawn
    pub settle_timeout: f64,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            settle_epsilon: SETTLE_EPSILON,
            settle_timeout: SETTLE_TIMEOUT,
        }
    }
}

/// External encoder invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Program name or path
    pub program: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Complete, immutable description of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub canvas: CanvasConfig,
    pub layout: LayoutConfig,
    pub physics: PhysicsConfig,
    pub spawn: SpawnConfig,
    pub audio: AudioConfig,
    pub termination: TerminationConfig,
    pub encoder: EncoderConfig,
}

/// Overlay `patch` onto `base`, recursing into objects
fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    use serde_json::Value;
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_json(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

impl BoardConfig {
    /// Defaults with a profile applied
    pub fn from_profile(profile: Profile) -> Self {
        let mut config = Self::default();
        profile.apply(&mut config);
        config
    }

    /// Load a (possibly partial) JSON config; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_over(Self::default(), path)
    }

    /// Load a JSON config on top of `base`; fields the file omits keep `base`'s values
    pub fn load_over(base: Self, path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: serde_json::Value = serde_json::from_str(&json)?;
        let mut value = serde_json::to_value(base)?;
        merge_json(&mut value, overrides);
        let config: Self = serde_json::from_value(value)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed tick length in seconds
    pub fn dt(&self) -> f64 {
        1.0 / self.canvas.fps as f64
    }

    pub fn width(&self) -> f32 {
        self.canvas.width as f32
    }

    pub fn height(&self) -> f32 {
        self.canvas.height as f32
    }

    /// Ball radius in whole pixels
    pub fn ball_radius(&self) -> f32 {
        (self.width() * self.layout.ball_size).floor()
    }

    /// Peg radius in whole pixels
    pub fn peg_radius(&self) -> f32 {
        (self.width() * self.layout.peg_size).floor()
    }

    /// Check everything that does not depend on lattice geometry
    pub fn validate(&self) -> Result<(), ConfigError> {
        let CanvasConfig { width, height, fps } = self.canvas;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyCanvas { width, height });
        }
        if fps == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.layout.levels == 0 {
            return Err(ConfigError::InvalidLevels(self.layout.levels));
        }
        if self.physics.substeps == 0 {
            return Err(ConfigError::InvalidSubsteps);
        }
        if self.physics.iterations == 0 {
            return Err(ConfigError::InvalidIterations);
        }
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if self.ball_radius() < 1.0 {
            return Err(ConfigError::RadiusTooSmall {
                name: "ball",
                radius: self.ball_radius(),
            });
        }
        if self.peg_radius() < 1.0 {
            return Err(ConfigError::RadiusTooSmall {
                name: "peg",
                radius: self.peg_radius(),
            });
        }

        let non_negative = [
            ("spawn.drop_interval", self.spawn.drop_interval),
            ("spawn.spawn_range", self.spawn.spawn_range as f64),
            ("spawn.impulse_scale", self.spawn.impulse_scale as f64),
            ("physics.ball_mass", self.physics.ball_mass as f64),
            ("physics.friction", self.physics.friction as f64),
            ("physics.damping", self.physics.damping as f64),
            ("physics.ball_elasticity", self.physics.ball_elasticity as f64),
            ("physics.peg_elasticity", self.physics.peg_elasticity as f64),
            ("physics.wall_elasticity", self.physics.wall_elasticity as f64),
            ("layout.floor_thickness", self.layout.floor_thickness as f64),
            ("audio.tick_duration", self.audio.tick_duration),
            ("audio.tick_freq", self.audio.tick_freq as f64),
            ("audio.velocity_threshold", self.audio.velocity_threshold as f64),
            ("termination.settle_epsilon", self.termination.settle_epsilon as f64),
            ("termination.settle_timeout", self.termination.settle_timeout),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        if self.physics.ball_mass <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "physics.ball_mass",
                value: self.physics.ball_mass as f64,
            });
        }
        if self.physics.damping > 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "physics.damping",
                value: self.physics.damping as f64,
            });
        }
        Ok(())
    }
}
