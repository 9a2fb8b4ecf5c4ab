//! Gameplay events for the analytics collaborator
//!
//! The simulation only emits; it never reads anything back. Sinks are
//! fire-and-forget and any transport failure stays on the sink's side.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::state::{BallId, Hand};

/// A discrete gameplay event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    SessionStarted,
    SessionEnded {
        attempts: u32,
        score: u32,
    },
    /// A ball was picked up
    Grab {
        ball: BallId,
        hand: Hand,
    },
    /// A ball left a controller with throw velocity
    ShotAttempt {
        ball: BallId,
        position: Vec3,
        attempts: u32,
        speed: f32,
    },
    /// A ball fell through the hoop
    Score {
        ball: BallId,
        position: Vec3,
        score: u32,
        attempts: u32,
        speed: f32,
    },
}

impl GameEvent {
    /// Analytics event name
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::SessionStarted => "sessionStarted",
            GameEvent::SessionEnded { .. } => "sessionEnded",
            GameEvent::Grab { .. } => "grab",
            GameEvent::ShotAttempt { .. } => "shotAttempt",
            GameEvent::Score { .. } => "score",
        }
    }
}

/// Receiver for gameplay events
pub trait EventSink {
    fn emit(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventSink for F {
    fn emit(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Writes every event to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Score {
                score, attempts, ..
            } => log::info!("Score! {score}/{attempts}"),
            GameEvent::Grab { .. } => log::debug!("{event:?}"),
            _ => log::info!("{event:?}"),
        }
    }
}

/// Keeps every event in memory (tests, replays, JSON dumps)
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<GameEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &GameEvent) {
        self.events.push(event.clone());
    }
}
