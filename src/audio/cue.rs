//! Best-effort live cues
//!
//! A cue is fired the moment an audible collision is classified. Delivery
//! never blocks the simulation and failures never end a run: the caller logs
//! and moves on.

use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use crate::error::CueError;
use crate::sim::CollisionEvent;

/// Something that can play (or forward) a tick right now
pub trait LiveCue: Send {
    fn fire(&mut self, event: &CollisionEvent) -> Result<(), CueError>;
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCue;

impl LiveCue for NoCue {
    fn fire(&mut self, _event: &CollisionEvent) -> Result<(), CueError> {
        Ok(())
    }
}

/// Forwards cues to a consumer thread over a bounded queue
#[derive(Debug, Clone)]
pub struct ChannelCue {
    tx: SyncSender<CollisionEvent>,
}

impl ChannelCue {
    /// Create the sender half plus the receiver the consumer drains
    pub fn bounded(capacity: usize) -> (Self, Receiver<CollisionEvent>) {
        let (tx, rx) = sync_channel(capacity);
        (Self { tx }, rx)
    }
}

impl LiveCue for ChannelCue {
    fn fire(&mut self, event: &CollisionEvent) -> Result<(), CueError> {
        self.tx.try_send(*event).map_err(|e| match e {
            TrySendError::Full(_) => CueError::Busy,
            TrySendError::Disconnected(_) => CueError::Disconnected,
        })
    }
}
