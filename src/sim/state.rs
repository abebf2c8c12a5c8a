//! Simulation state
//!
//! Everything the tick loop mutates lives in one explicit object: the
//! physics world and the schedule, clock, classifier and log that drive it.

use super::body::BodyFactory;
use super::classify::{CollisionClassifier, CollisionLog};
use super::clock::{SimClock, Stepper};
use super::layout::BoardLayout;
use super::spawner::Spawner;
use super::termination::TerminationMonitor;
use super::world::World;
use crate::audio::{LiveCue, NoCue};
use crate::error::ConfigError;
use crate::settings::BoardConfig;

#[derive(Debug)]
pub struct SimulationState {
    pub config: BoardConfig,
    pub layout: BoardLayout,
    pub world: World,
    pub factory: BodyFactory,
    pub spawner: Spawner,
    pub clock: SimClock,
    pub stepper: Stepper,
    pub classifier: CollisionClassifier,
    pub collisions: CollisionLog,
    pub monitor: TerminationMonitor,
}

impl SimulationState {
    /// Validate the config, build the board and populate the world
    ///
    /// `cue` only receives events when the audio mode enables live cues.
    pub fn new(config: &BoardConfig, cue: Box<dyn LiveCue>) -> Result<Self, ConfigError> {
        let layout = BoardLayout::generate(config)?;

        let mut world = World::new(&config.physics);
        let factory = BodyFactory::from_config(config);
        factory.populate(&mut world, &layout);

        let cue: Box<dyn LiveCue> = if config.audio.mode.live_cues() {
            cue
        } else {
            Box::new(NoCue)
        };

        Ok(Self {
            config: config.clone(),
            spawner: Spawner::new(config, layout.spawn_point),
            layout,
            world,
            factory,
            clock: SimClock::new(config.canvas.fps),
            stepper: Stepper::new(config.physics.substeps),
            classifier: CollisionClassifier::new(config.audio.velocity_threshold, cue),
            collisions: CollisionLog::new(),
            monitor: TerminationMonitor::new(&config.termination),
        })
    }

    /// Ticks executed so far
    pub fn ticks(&self) -> u64 {
        self.clock.tick()
    }

    /// Simulation seconds covered by the executed ticks
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Balls that left the board past its edges
    pub fn escaped(&self) -> u32 {
        self.world
            .balls()
            .iter()
            .filter(|b| !self.layout.in_play(b.pos))
            .count() as u32
    }

    /// Balls per landing bin, left to right
    pub fn bin_counts(&self) -> Vec<u32> {
        let mut counts = vec![0; self.layout.bin_count()];
        for ball in self.world.balls() {
            if let Some(bin) = self.layout.bin_of(ball.pos) {
                counts[bin] += 1;
            }
        }
        counts
    }
}
