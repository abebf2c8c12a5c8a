//! Rigid bodies and the factory that builds them
//!
//! Pegs and walls are static; balls are the only dynamic bodies. The factory
//! stamps the configured surface properties onto every body and registers it
//! with the world, so it takes part from the next step on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::layout::BoardLayout;
use super::world::World;
use crate::settings::BoardConfig;

/// Stable identity of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PegId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallId(pub u32);

/// Surface properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub friction: f32,
    pub elasticity: f32,
}

/// A static circular obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peg {
    pub id: PegId,
    pub pos: Vec2,
    pub radius: f32,
    pub material: Material,
}

/// A static capsule: floor or bin separator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: WallId,
    pub a: Vec2,
    pub b: Vec2,
    pub thickness: f32,
    pub material: Material,
}

/// A dynamic ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub angular_vel: f32,
    pub radius: f32,
    pub mass: f32,
    /// Moment of inertia about the center
    pub moment: f32,
    pub material: Material,
}

impl Ball {
    pub fn new(id: BallId, pos: Vec2, radius: f32, mass: f32, material: Material) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            angle: 0.0,
            angular_vel: 0.0,
            radius,
            mass,
            moment: moment_for_disc(mass, radius),
            material,
        }
    }

    /// Both velocity components below `epsilon`
    pub fn is_settled(&self, epsilon: f32) -> bool {
        self.vel.x.abs() < epsilon && self.vel.y.abs() < epsilon
    }
}

/// Moment of inertia of a solid disc
#[inline]
pub fn moment_for_disc(mass: f32, radius: f32) -> f32 {
    mass * radius * radius / 2.0
}

/// Builds bodies with the configured sizes and materials
#[derive(Debug, Clone)]
pub struct BodyFactory {
    peg_radius: f32,
    ball_radius: f32,
    ball_mass: f32,
    peg_material: Material,
    wall_material: Material,
    ball_material: Material,
}

impl BodyFactory {
    pub fn from_config(config: &BoardConfig) -> Self {
        let physics = &config.physics;
        Self {
            peg_radius: config.peg_radius(),
            ball_radius: config.ball_radius(),
            ball_mass: physics.ball_mass,
            peg_material: Material {
                friction: physics.friction,
                elasticity: physics.peg_elasticity,
            },
            wall_material: Material {
                friction: physics.friction,
                elasticity: physics.wall_elasticity,
            },
            ball_material: Material {
                friction: physics.friction,
                elasticity: physics.ball_elasticity,
            },
        }
    }

    pub fn ball_radius(&self) -> f32 {
        self.ball_radius
    }

    pub fn create_peg(&self, world: &mut World, position: Vec2) -> PegId {
        world.add_peg(position, self.peg_radius, self.peg_material)
    }

    pub fn create_wall(&self, world: &mut World, a: Vec2, b: Vec2, thickness: f32) -> WallId {
        world.add_wall(a, b, thickness, self.wall_material)
    }

    pub fn create_ball(&self, world: &mut World, position: Vec2) -> BallId {
        world.add_ball(position, self.ball_radius, self.ball_mass, self.ball_material)
    }

    /// Register every static body of a layout
    pub fn populate(&self, world: &mut World, layout: &BoardLayout) {
        for &pos in &layout.pegs {
            self.create_peg(world, pos);
        }
        for wall in &layout.walls {
            self.create_wall(world, wall.a, wall.b, wall.thickness);
        }
        log::info!(
            "Board populated: {} pegs, {} walls",
            world.pegs().len(),
            world.walls().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disc_moment() {
        assert_eq!(moment_for_disc(10.0, 5.0), 125.0);
    }

    #[test]
    fn test_factory_applies_config() {
        let mut config = BoardConfig::default();
        config.physics.friction = 0.6;
        config.physics.peg_elasticity = 0.25;
        let factory = BodyFactory::from_config(&config);
        let mut world = World::new(&config.physics);

        let peg = factory.create_peg(&mut world, Vec2::new(10.0, 20.0));
        let ball = factory.create_ball(&mut world, Vec2::new(30.0, 5.0));

        let peg = &world.pegs()[peg.0 as usize];
        assert_eq!(peg.radius, 2.0);
        assert_eq!(peg.material.friction, 0.6);
        assert_eq!(peg.material.elasticity, 0.25);

        let ball = world.ball(ball).unwrap();
        assert_eq!(ball.radius, 5.0);
        assert_eq!(ball.mass, config.physics.ball_mass);
        assert_eq!(ball.moment, moment_for_disc(ball.mass, 5.0));
        assert_eq!(ball.material.elasticity, 0.0);
        assert_eq!(ball.vel, Vec2::ZERO);
    }

    #[test]
    fn test_populate_registers_layout() {
        let config = BoardConfig::default();
        let layout = BoardLayout::generate(&config).unwrap();
        let mut world = World::new(&config.physics);
        BodyFactory::from_config(&config).populate(&mut world, &layout);
        assert_eq!(world.pegs().len(), layout.pegs.len());
        assert_eq!(world.walls().len(), layout.walls.len());
        assert!(world.balls().is_empty());
    }

    #[test]
    fn test_settled_checks_both_axes() {
        let mut ball = Ball::new(
            BallId(0),
            Vec2::ZERO,
            5.0,
            1.0,
            Material {
                friction: 1.0,
                elasticity: 0.0,
            },
        );
        assert!(ball.is_settled(0.1));
        ball.vel = Vec2::new(0.05, 0.2);
        assert!(!ball.is_settled(0.1));
        ball.vel = Vec2::new(-0.2, 0.0);
        assert!(!ball.is_settled(0.1));
    }
}
