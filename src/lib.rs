//! Hoop Shot - arcade basketball physics for WebXR hosts
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (ball flight, contacts, grab/throw, scoring)
//! - `tuning`: Data-driven physics and geometry constants
//! - `analytics`: Discrete gameplay events and the sinks that receive them
//! - `platform`: Host glue (wasm-bindgen bindings for the browser)

pub mod analytics;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use analytics::{EventSink, GameEvent, LogSink, RecordingSink};
pub use tuning::{Tuning, TuningError};

use glam::{Quat, Vec3};

/// Default tuning constants (SI units: meters, seconds)
pub mod consts {
    /// Largest frame step the integrator accepts
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Gravity along +Y (negative = down)
    pub const GRAVITY: f32 = -9.81;

    /// Ball defaults (regulation size 7 is ~0.12 m radius)
    pub const BALL_RADIUS: f32 = 0.12;
    pub const GROUND_BOUNCE: f32 = 0.6;
    pub const GROUND_FRICTION: f32 = 0.9;
    /// Push-out margin after a contact so the next frame starts clear
    pub const CONTACT_EPSILON: f32 = 0.001;

    /// Hoop: rim center sits at regulation height, 2.6 m in front of the player
    pub const RIM_CENTER: [f32; 3] = [0.0, 3.05, -2.6];
    pub const RIM_RADIUS: f32 = 0.23;
    pub const RIM_TUBE_THICKNESS: f32 = 0.02;
    pub const RIM_BOUNCE: f32 = 0.6;
    pub const RIM_FRICTION: f32 = 0.1;

    /// Backboard face plane (faces +Z, toward the player)
    pub const BACKBOARD_CENTER: [f32; 3] = [0.0, 3.35, -2.98];
    pub const BACKBOARD_HALF_WIDTH: f32 = 0.9;
    pub const BACKBOARD_HALF_HEIGHT: f32 = 0.525;
    pub const BACKBOARD_THICKNESS: f32 = 0.05;
    pub const BACKBOARD_BOUNCE: f32 = 0.7;

    /// Scoring band just below the rim
    pub const SCORING_RADIUS: f32 = 0.18;
    pub const SCORING_TOP_OFFSET: f32 = 0.05;
    pub const SCORING_BAND_HEIGHT: f32 = 0.3;

    /// Ball rack beside the player
    pub const RACK_POSITION: [f32; 3] = [1.2, 0.0, -0.8];
    pub const RACK_YAW: f32 = -std::f32::consts::FRAC_PI_2;
    pub const RACK_LENGTH: f32 = 1.2;
    pub const RACK_DEPTH: f32 = 0.4;
    pub const RACK_HEIGHT: f32 = 1.0;
    pub const RACK_MARGIN: f32 = 0.3;
    pub const RACK_BOUNCE: f32 = 0.5;
    pub const RACK_COLUMNS: u32 = 4;
    pub const SHELF_HEIGHTS: [f32; 2] = [0.35, 0.75];
    pub const SHELF_BOUNCE: f32 = 0.2;
    pub const SHELF_FRICTION: f32 = 0.7;
    pub const SHELF_SNAP_TOLERANCE: f32 = 0.05;

    /// Grab and throw
    pub const GRAB_DISTANCE: f32 = 0.3;
    pub const GRIP_OFFSET: [f32; 3] = [0.0, -0.05, -0.12];
    pub const THROW_MULTIPLIER: f32 = 1.5;
    pub const MIN_THROW_UP_VELOCITY: f32 = 1.0;

    /// Free balls past this horizontal distance go back to the rack
    pub const OUT_OF_PLAY_RADIUS: f32 = 15.0;
}

/// Distance between two points ignoring height
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Rotation about +Y by `yaw` radians
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

/// Clamp a host-supplied frame step into `[0, max]` (non-finite becomes 0)
#[inline]
pub fn clamp_dt(dt: f32, max: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max) } else { 0.0 }
}
