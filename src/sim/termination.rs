//! Run termination
//!
//! A run ends on whichever comes first: every ball spawned and at rest, or
//! `settle_timeout` seconds of simulation time since the last release.
//! Balls that left the board are out of play and never hold up settling.

use serde::{Deserialize, Serialize};

use super::layout::BoardLayout;
use super::spawner::Spawner;
use super::world::World;
use crate::settings::TerminationConfig;

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// All balls released and at rest
    Settled,
    /// Too long since the last release
    Timeout,
    /// External stop request
    Stopped,
    /// Hard tick cap reached
    TickLimit,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Settled => "settled",
            Termination::Timeout => "timeout",
            Termination::Stopped => "stopped",
            Termination::TickLimit => "tick-limit",
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TerminationMonitor {
    settle_epsilon: f32,
    settle_timeout: f64,
}

impl TerminationMonitor {
    pub fn new(config: &TerminationConfig) -> Self {
        Self {
            settle_epsilon: config.settle_epsilon,
            settle_timeout: config.settle_timeout,
        }
    }

    /// Check after a tick; `now` is the simulation time at the end of it
    pub fn check(
        &self,
        world: &World,
        layout: &BoardLayout,
        spawner: &Spawner,
        now: f64,
    ) -> Option<Termination> {
        if spawner.is_exhausted() && world.all_settled(self.settle_epsilon, |p| layout.in_play(p)) {
            return Some(Termination::Settled);
        }
        match spawner.last_spawn() {
            Some(last) if now - last >= self.settle_timeout => Some(Termination::Timeout),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BoardConfig;
    use crate::sim::body::BodyFactory;
    use glam::Vec2;

    fn monitor(timeout: f64) -> TerminationMonitor {
        TerminationMonitor::new(&TerminationConfig {
            settle_epsilon: 0.1,
            settle_timeout: timeout,
        })
    }

    fn layout() -> BoardLayout {
        BoardLayout::generate(&BoardConfig::default()).unwrap()
    }

    fn spawner(total: u32) -> (Spawner, World, BodyFactory) {
        let mut config = BoardConfig::default();
        config.spawn.ball_count = total;
        config.spawn.drop_interval = 0.0;
        (
            Spawner::new(&config, Vec2::new(256.0, 20.0)),
            World::new(&config.physics),
            BodyFactory::from_config(&config),
        )
    }

    #[test]
    fn test_empty_run_is_settled_immediately() {
        let (spawner, world, _) = spawner(0);
        assert_eq!(
            monitor(10.0).check(&world, &layout(), &spawner, 1.0 / 60.0),
            Some(Termination::Settled)
        );
    }

    #[test]
    fn test_moving_ball_keeps_running_until_timeout() {
        let (mut spawner, mut world, factory) = spawner(1);
        let id = spawner.update(1.0 / 60.0, 0.0, &mut world, &factory).unwrap();
        world.apply_impulse(id, Vec2::new(0.0, 100.0));

        let monitor = monitor(2.0);
        assert_eq!(monitor.check(&world, &layout(), &spawner, 1.0), None);
        assert_eq!(
            monitor.check(&world, &layout(), &spawner, 2.0),
            Some(Termination::Timeout)
        );
    }

    #[test]
    fn test_resting_balls_settle_once_all_spawned() {
        let (mut spawner, mut world, factory) = spawner(2);
        spawner.update(1.0 / 60.0, 0.0, &mut world, &factory);
        // One of two released: not done even though nothing moves
        assert_eq!(monitor(10.0).check(&world, &layout(), &spawner, 0.1), None);
        spawner.update(1.0 / 60.0, 1.0 / 60.0, &mut world, &factory);
        assert_eq!(
            monitor(10.0).check(&world, &layout(), &spawner, 0.1),
            Some(Termination::Settled)
        );
    }

    #[test]
    fn test_escaped_ball_does_not_block_settling() {
        let (mut spawner, mut world, factory) = spawner(1);
        spawner.update(1.0 / 60.0, 0.0, &mut world, &factory);

        // Slipped past the right edge and still falling
        let escaped = factory.create_ball(&mut world, Vec2::new(600.0, 700.0));
        world.apply_impulse(escaped, Vec2::new(0.0, 5_000.0));
        assert!(!world.all_settled(0.1, |_| true));
        assert_eq!(
            monitor(10.0).check(&world, &layout(), &spawner, 0.1),
            Some(Termination::Settled)
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Termination::TickLimit.to_string(), "tick-limit");
        assert_eq!(
            serde_json::to_string(&Termination::Settled).unwrap(),
            "\"settled\""
        );
    }
}
