//! Deterministic simulation module
//!
//! Board geometry, physics and the run schedule live here. This module must
//! be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body ID)
//! - No rendering, file or device dependencies

pub mod body;
pub mod classify;
pub mod clock;
pub mod layout;
pub mod sdf;
pub mod spawner;
pub mod state;
pub mod termination;
pub mod tick;
pub mod world;

pub use body::{Ball, BallId, BodyFactory, Material, Peg, PegId, Wall, WallId};
pub use classify::{CollisionClassifier, CollisionEvent, CollisionLog};
pub use clock::{SimClock, Stepper, TimedContact};
pub use layout::{BoardLayout, Lattice, WallSegment};
pub use sdf::{closest_point_on_segment, coverage, sd_capsule, sd_circle};
pub use spawner::Spawner;
pub use state::SimulationState;
pub use termination::{Termination, TerminationMonitor};
pub use tick::{TickReport, tick};
pub use world::{ContactBegin, Obstacle, World};
