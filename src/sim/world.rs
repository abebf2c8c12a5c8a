//! Rigid-body world
//!
//! Pegs, walls and balls are mirrored into a `rapier2d` physics set. Balls
//! carry `COLLISION_EVENTS`, and every `Started` event is turned into a
//! [`ContactBegin`] stamped with the ball velocity from before the step, so
//! the solver's response never leaks into the report.
//!
//! Screen space: +y is down, so gravity is positive y.

use crossbeam::channel::{Receiver, unbounded};
use glam::Vec2;
use rapier2d::na as nalgebra;
use rapier2d::prelude::{
    ActiveEvents, BroadPhase, CCDSolver, ChannelEventCollector, CoefficientCombineRule,
    ColliderBuilder, ColliderSet, CollisionEvent as PhysicsEvent, ContactForceEvent,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SharedShape, point, vector,
};
use serde::{Deserialize, Serialize};

use super::body::{Ball, BallId, Material, Peg, PegId, Wall, WallId};
use crate::settings::PhysicsConfig;

/// What a ball touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Obstacle {
    Peg(PegId),
    Wall(WallId),
    /// Another ball, always with a higher id than the reporting one
    Ball(BallId),
}

impl Obstacle {
    pub fn is_ball(&self) -> bool {
        matches!(self, Obstacle::Ball(_))
    }

    /// Packed into collider user data: kind in the high word, id in the low
    fn to_user_data(self) -> u128 {
        let (kind, id) = match self {
            Obstacle::Peg(id) => (1u128, id.0),
            Obstacle::Wall(id) => (2, id.0),
            Obstacle::Ball(id) => (3, id.0),
        };
        (kind << 32) | u128::from(id)
    }

    fn from_user_data(data: u128) -> Option<Self> {
        let id = (data & 0xFFFF_FFFF) as u32;
        match data >> 32 {
            1 => Some(Obstacle::Peg(PegId(id))),
            2 => Some(Obstacle::Wall(WallId(id))),
            3 => Some(Obstacle::Ball(BallId(id))),
            _ => None,
        }
    }
}

/// Order a touching pair as (ball, obstacle); two balls put the lower id first
fn contact_key(a: Obstacle, b: Obstacle) -> Option<(BallId, Obstacle)> {
    match (a, b) {
        (Obstacle::Ball(x), Obstacle::Ball(y)) => Some((x.min(y), Obstacle::Ball(x.max(y)))),
        (Obstacle::Ball(ball), other) | (other, Obstacle::Ball(ball)) => Some((ball, other)),
        _ => None,
    }
}

/// A ball started touching an obstacle during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactBegin {
    pub ball: BallId,
    pub obstacle: Obstacle,
    /// Ball velocity going into the contact, before the solver resolved it
    pub velocity: Vec2,
}

/// Linear damping coefficient that keeps `damping` of the velocity per second
fn damping_coefficient(damping: f32) -> f32 {
    if damping > 0.0 { -damping.ln() } else { 1.0e6 }
}

/// Every body on the board plus the physics pipeline that moves them
pub struct World {
    pegs: Vec<Peg>,
    walls: Vec<Wall>,
    balls: Vec<Ball>,
    ball_handles: Vec<RigidBodyHandle>,
    gravity: rapier2d::math::Vector<f32>,
    linear_damping: f32,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    events: ChannelEventCollector,
    collision_events: Receiver<PhysicsEvent>,
    _force_events: Receiver<ContactForceEvent>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("pegs", &self.pegs.len())
            .field("walls", &self.walls.len())
            .field("balls", &self.balls.len())
            .field("iterations", &self.params.max_velocity_iterations)
            .finish_non_exhaustive()
    }
}

impl World {
    pub fn new(physics: &PhysicsConfig) -> Self {
        let (collision_send, collision_events) = unbounded();
        let (force_send, force_events) = unbounded();

        let mut params = IntegrationParameters::default();
        params.max_velocity_iterations = physics.iterations.max(1) as usize;

        Self {
            pegs: Vec::new(),
            walls: Vec::new(),
            balls: Vec::new(),
            ball_handles: Vec::new(),
            gravity: vector![physics.gravity[0], physics.gravity[1]],
            linear_damping: damping_coefficient(physics.damping),
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            events: ChannelEventCollector::new(collision_send, force_send),
            collision_events,
            _force_events: force_events,
        }
    }

    /// Surface properties combine by product, whichever pair touches
    fn collider(shape: SharedShape, material: Material, tag: Obstacle) -> ColliderBuilder {
        ColliderBuilder::new(shape)
            .friction(material.friction)
            .restitution(material.elasticity)
            .friction_combine_rule(CoefficientCombineRule::Multiply)
            .restitution_combine_rule(CoefficientCombineRule::Multiply)
            .user_data(tag.to_user_data())
    }

    pub fn add_peg(&mut self, pos: Vec2, radius: f32, material: Material) -> PegId {
        let id = PegId(self.pegs.len() as u32);
        let body = RigidBodyBuilder::fixed()
            .translation(vector![pos.x, pos.y])
            .build();
        let handle = self.bodies.insert(body);
        let collider = Self::collider(SharedShape::ball(radius), material, Obstacle::Peg(id));
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        self.pegs.push(Peg {
            id,
            pos,
            radius,
            material,
        });
        id
    }

    pub fn add_wall(&mut self, a: Vec2, b: Vec2, thickness: f32, material: Material) -> WallId {
        let id = WallId(self.walls.len() as u32);
        let handle = self.bodies.insert(RigidBodyBuilder::fixed().build());
        let shape = SharedShape::capsule(point![a.x, a.y], point![b.x, b.y], thickness);
        let collider = Self::collider(shape, material, Obstacle::Wall(id));
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        self.walls.push(Wall {
            id,
            a,
            b,
            thickness,
            material,
        });
        id
    }

    pub fn add_ball(&mut self, pos: Vec2, radius: f32, mass: f32, material: Material) -> BallId {
        let id = BallId(self.balls.len() as u32);
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![pos.x, pos.y])
            .linear_damping(self.linear_damping)
            .angular_damping(self.linear_damping)
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);
        let collider = Self::collider(SharedShape::ball(radius), material, Obstacle::Ball(id))
            .mass(mass)
            .active_events(ActiveEvents::COLLISION_EVENTS);
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        self.balls.push(Ball::new(id, pos, radius, mass, material));
        self.ball_handles.push(handle);
        id
    }

    /// Instantaneous change of momentum at the ball's center
    pub fn apply_impulse(&mut self, id: BallId, impulse: Vec2) {
        let index = id.0 as usize;
        let (Some(ball), Some(&handle)) = (self.balls.get_mut(index), self.ball_handles.get(index))
        else {
            return;
        };
        ball.vel += impulse / ball.mass;
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(vector![ball.vel.x, ball.vel.y], true);
        }
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.0 as usize)
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn pegs(&self) -> &[Peg] {
        &self.pegs
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    /// Every ball accepted by `in_play` is slower than `epsilon` on both axes
    pub fn all_settled(&self, epsilon: f32, in_play: impl Fn(Vec2) -> bool) -> bool {
        self.balls
            .iter()
            .filter(|b| in_play(b.pos))
            .all(|b| b.is_settled(epsilon))
    }

    /// Advance the world by `dt` seconds, returning contacts that began
    pub fn step(&mut self, dt: f32) -> Vec<ContactBegin> {
        if dt <= 0.0 {
            return Vec::new();
        }

        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &self.events,
        );

        // Ball state still holds the pre-step velocities here
        let begins = self.drain_begins();
        self.sync_balls();
        begins
    }

    fn drain_begins(&self) -> Vec<ContactBegin> {
        let mut begins: Vec<ContactBegin> = Vec::new();
        while let Ok(event) = self.collision_events.try_recv() {
            if !event.started() {
                continue;
            }
            let tag = |handle| {
                self.colliders
                    .get(handle)
                    .and_then(|c| Obstacle::from_user_data(c.user_data))
            };
            let (Some(a), Some(b)) = (tag(event.collider1()), tag(event.collider2())) else {
                continue;
            };
            let Some((ball, obstacle)) = contact_key(a, b) else {
                continue;
            };
            let Some(state) = self.balls.get(ball.0 as usize) else {
                continue;
            };
            begins.push(ContactBegin {
                ball,
                obstacle,
                velocity: state.vel,
            });
        }

        begins.sort_by(|x, y| (x.ball, x.obstacle).cmp(&(y.ball, y.obstacle)));
        begins.dedup_by_key(|c| (c.ball, c.obstacle));
        begins
    }

    fn sync_balls(&mut self) {
        for (ball, &handle) in self.balls.iter_mut().zip(&self.ball_handles) {
            let Some(body) = self.bodies.get(handle) else {
                continue;
            };
            let pos = body.translation();
            let vel = body.linvel();
            ball.pos = Vec2::new(pos.x, pos.y);
            ball.vel = Vec2::new(vel.x, vel.y);
            ball.angle = body.rotation().angle();
            ball.angular_vel = body.angvel();
        }
    }
}
