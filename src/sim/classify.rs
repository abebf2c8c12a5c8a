//! Collision classification
//!
//! Turns contact-begin reports into audible collision events. Only
//! ball/peg and ball/wall contacts are candidates; the predicate reads the
//! ball's vertical speed going into the contact. Classification is purely an
//! observer and never feeds back into the physics.

use serde::{Deserialize, Serialize};

use super::body::BallId;
use super::world::{ContactBegin, Obstacle};
use crate::audio::LiveCue;

/// An audible collision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Simulation time in seconds
    pub timestamp: f64,
    pub ball: BallId,
    pub obstacle: Obstacle,
}

/// Append-only record of audible collisions, in detection order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionLog {
    events: Vec<CollisionEvent>,
}

impl CollisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CollisionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.events.iter().map(|e| e.timestamp)
    }
}

/// Decides which contacts are audible and fires live cues for them
pub struct CollisionClassifier {
    velocity_threshold: f32,
    cue: Box<dyn LiveCue>,
    cue_failures: u64,
}

impl std::fmt::Debug for CollisionClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionClassifier")
            .field("velocity_threshold", &self.velocity_threshold)
            .field("cue_failures", &self.cue_failures)
            .finish_non_exhaustive()
    }
}

impl CollisionClassifier {
    pub fn new(velocity_threshold: f32, cue: Box<dyn LiveCue>) -> Self {
        Self {
            velocity_threshold,
            cue,
            cue_failures: 0,
        }
    }

    /// Audibility predicate
    pub fn is_audible(&self, contact: &ContactBegin) -> bool {
        !contact.obstacle.is_ball() && contact.velocity.y.abs() > self.velocity_threshold
    }

    /// Classify one contact, logging it and firing the cue when audible
    pub fn classify(
        &mut self,
        contact: &ContactBegin,
        timestamp: f64,
        log: &mut CollisionLog,
    ) -> Option<CollisionEvent> {
        if !self.is_audible(contact) {
            return None;
        }

        let event = CollisionEvent {
            timestamp,
            ball: contact.ball,
            obstacle: contact.obstacle,
        };
        log.push(event);

        if let Err(e) = self.cue.fire(&event) {
            self.cue_failures += 1;
            log::warn!("Live cue dropped at {:.3}s: {}", timestamp, e);
        }
        Some(event)
    }

    /// Cues that could not be delivered
    pub fn cue_failures(&self) -> u64 {
        self.cue_failures
    }
}
