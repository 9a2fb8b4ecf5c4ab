//! Frame-driven simulation module
//!
//! All gameplay logic lives here. This module must stay host-agnostic:
//! - One `tick` per rendered frame, Δt clamped at the boundary
//! - Stable iteration order (balls by id, hands Left then Right)
//! - No rendering, XR session or analytics transport dependencies

pub mod bot;
pub mod collision;
pub mod grab;
pub mod hoop;
pub mod rack;
pub mod scoring;
pub mod state;
pub mod tick;

pub use bot::ThrowBot;
pub use collision::{Contact, bounce_off, resolve_ground};
pub use grab::{Throw, grab, nearest_grabbable, release};
pub use hoop::Hoop;
pub use rack::{Rack, Socket};
pub use scoring::{check_score, in_scoring_region};
pub use state::{
    Ball, BallId, Controller, ControllerState, Frame, GameState, Hand, Pose, SessionPhase, Stats,
};
pub use tick::{Court, FrameInput, Game, InputEvent, step_ball, tick};
