//! Ball release schedule
//!
//! Time accumulates every tick; once a full drop interval has built up a
//! single ball is released and the interval is subtracted, keeping the
//! remainder so the long-run cadence does not drift.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{BallId, BodyFactory};
use super::world::World;
use crate::settings::BoardConfig;

/// Absorbs rounding in the accumulated tick time
const INTERVAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Pcg32,
    total: u32,
    drop_interval: f64,
    origin: Vec2,
    spawn_range: f32,
    impulse_range: f32,
    spawned: u32,
    since_last_spawn: f64,
    last_spawn: Option<f64>,
}

impl Spawner {
    pub fn new(config: &BoardConfig, origin: Vec2) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(config.spawn.seed),
            total: config.spawn.ball_count,
            drop_interval: config.spawn.drop_interval,
            origin,
            spawn_range: config.spawn.spawn_range,
            impulse_range: config.ball_radius() * config.spawn.impulse_scale,
            spawned: 0,
            since_last_spawn: 0.0,
            last_spawn: None,
        }
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_exhausted(&self) -> bool {
        self.spawned >= self.total
    }

    /// Simulation time of the most recent release
    pub fn last_spawn(&self) -> Option<f64> {
        self.last_spawn
    }

    /// Advance the schedule by one tick; `now` is the tick's start time
    pub fn update(
        &mut self,
        dt: f64,
        now: f64,
        world: &mut World,
        factory: &BodyFactory,
    ) -> Option<BallId> {
        self.since_last_spawn += dt;
        if self.is_exhausted() || self.since_last_spawn + INTERVAL_TOLERANCE < self.drop_interval {
            return None;
        }

        let jitter = self.rng.random_range(-self.spawn_range..=self.spawn_range);
        let id = factory.create_ball(world, self.origin + Vec2::new(jitter, 0.0));
        if self.impulse_range > 0.0 {
            let push = self.rng.random_range(-self.impulse_range..=self.impulse_range);
            world.apply_impulse(id, Vec2::new(push, 0.0));
        }

        self.spawned += 1;
        self.since_last_spawn -= self.drop_interval;
        self.last_spawn = Some(now);
        log::debug!(
            "Spawned ball {} of {} at t={:.3}s (jitter {:+.2})",
            self.spawned,
            self.total,
            now,
            jitter
        );
        Some(id)
    }
}
