//! Fixed-step simulation clock and sub-stepping driver

use super::world::{ContactBegin, World};

/// Tick counter at a fixed frame rate
///
/// Time is always derived from the integer tick count so it never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    fps: u32,
    tick: u64,
}

impl SimClock {
    pub fn new(fps: u32) -> Self {
        Self { fps, tick: 0 }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Index of the tick about to run (equals ticks executed so far)
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Seconds elapsed at the start of the current tick
    pub fn elapsed(&self) -> f64 {
        self.tick as f64 / self.fps as f64
    }

    /// Seconds elapsed once `fraction` of the current tick has run
    pub fn time_within_tick(&self, fraction: f64) -> f64 {
        (self.tick as f64 + fraction) / self.fps as f64
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }
}

/// A contact stamped with the simulation time of the sub-step that found it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedContact {
    pub timestamp: f64,
    pub contact: ContactBegin,
}

/// Splits each tick into equal physics sub-steps
#[derive(Debug, Clone, Copy)]
pub struct Stepper {
    substeps: u32,
}

impl Stepper {
    pub fn new(substeps: u32) -> Self {
        Self {
            substeps: substeps.max(1),
        }
    }

    pub fn substeps(&self) -> u32 {
        self.substeps
    }

    /// Run one tick's worth of sub-steps without advancing the clock
    ///
    /// Contacts are stamped with the end time of their sub-step, so every
    /// timestamp lies within the tick.
    pub fn step(&self, world: &mut World, clock: &SimClock) -> Vec<TimedContact> {
        let sub_dt = clock.dt() / self.substeps as f64;
        let mut contacts = Vec::new();
        for k in 0..self.substeps {
            let timestamp = clock.time_within_tick((k + 1) as f64 / self.substeps as f64);
            contacts.extend(
                world
                    .step(sub_dt as f32)
                    .into_iter()
                    .map(|contact| TimedContact { timestamp, contact }),
            );
        }
        contacts
    }
}
