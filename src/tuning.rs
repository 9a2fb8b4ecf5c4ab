//! Data-driven physics and geometry constants
//!
//! Loaded once at startup and treated as immutable for the session. Partial
//! JSON files override only the fields they name.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Error loading a tuning file
#[derive(Debug)]
pub enum TuningError {
    /// The JSON could not be parsed
    Parse(serde_json::Error),
    /// The values parsed but are out of range
    Invalid(String),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "failed to parse tuning: {e}"),
            TuningError::Invalid(msg) => write!(f, "invalid tuning: {msg}"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

/// Ball flight and ground contact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BallTuning {
    pub radius: f32,
    pub gravity: f32,
    pub ground_bounce: f32,
    pub ground_friction: f32,
    pub max_frame_dt: f32,
    pub contact_epsilon: f32,
    pub out_of_play_radius: f32,
}

impl Default for BallTuning {
    fn default() -> Self {
        Self {
            radius: BALL_RADIUS,
            gravity: GRAVITY,
            ground_bounce: GROUND_BOUNCE,
            ground_friction: GROUND_FRICTION,
            max_frame_dt: MAX_FRAME_DT,
            contact_epsilon: CONTACT_EPSILON,
            out_of_play_radius: OUT_OF_PLAY_RADIUS,
        }
    }
}

/// Rim, backboard and scoring band
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoopTuning {
    pub rim_center: Vec3,
    pub rim_radius: f32,
    pub tube_thickness: f32,
    pub rim_bounce: f32,
    pub rim_friction: f32,
    pub backboard_center: Vec3,
    pub backboard_half_width: f32,
    pub backboard_half_height: f32,
    pub backboard_thickness: f32,
    pub backboard_bounce: f32,
    pub scoring_radius: f32,
    pub scoring_top_offset: f32,
    pub scoring_band_height: f32,
}

impl Default for HoopTuning {
    fn default() -> Self {
        Self {
            rim_center: Vec3::from_array(RIM_CENTER),
            rim_radius: RIM_RADIUS,
            tube_thickness: RIM_TUBE_THICKNESS,
            rim_bounce: RIM_BOUNCE,
            rim_friction: RIM_FRICTION,
            backboard_center: Vec3::from_array(BACKBOARD_CENTER),
            backboard_half_width: BACKBOARD_HALF_WIDTH,
            backboard_half_height: BACKBOARD_HALF_HEIGHT,
            backboard_thickness: BACKBOARD_THICKNESS,
            backboard_bounce: BACKBOARD_BOUNCE,
            scoring_radius: SCORING_RADIUS,
            scoring_top_offset: SCORING_TOP_OFFSET,
            scoring_band_height: SCORING_BAND_HEIGHT,
        }
    }
}

/// Ball rack transform, shell and shelves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RackTuning {
    pub position: Vec3,
    /// Rotation about +Y (radians)
    pub yaw: f32,
    pub length: f32,
    pub depth: f32,
    pub height: f32,
    pub margin: f32,
    pub bounce: f32,
    /// Sockets per shelf
    pub columns: u32,
    /// One shelf per socket row, bottom to top
    pub shelf_heights: Vec<f32>,
    pub shelf_bounce: f32,
    pub shelf_friction: f32,
    pub shelf_snap_tolerance: f32,
}

impl Default for RackTuning {
    fn default() -> Self {
        Self {
            position: Vec3::from_array(RACK_POSITION),
            yaw: RACK_YAW,
            length: RACK_LENGTH,
            depth: RACK_DEPTH,
            height: RACK_HEIGHT,
            margin: RACK_MARGIN,
            bounce: RACK_BOUNCE,
            columns: RACK_COLUMNS,
            shelf_heights: SHELF_HEIGHTS.to_vec(),
            shelf_bounce: SHELF_BOUNCE,
            shelf_friction: SHELF_FRICTION,
            shelf_snap_tolerance: SHELF_SNAP_TOLERANCE,
        }
    }
}

/// Controller grab and throw
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThrowTuning {
    pub grab_distance: f32,
    /// Ball center in controller-local space while held
    pub grip_offset: Vec3,
    pub throw_multiplier: f32,
    pub min_up_velocity: f32,
}

impl Default for ThrowTuning {
    fn default() -> Self {
        Self {
            grab_distance: GRAB_DISTANCE,
            grip_offset: Vec3::from_array(GRIP_OFFSET),
            throw_multiplier: THROW_MULTIPLIER,
            min_up_velocity: MIN_THROW_UP_VELOCITY,
        }
    }
}

/// Every named constant the simulation reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    pub ball: BallTuning,
    pub hoop: HoopTuning,
    pub rack: RackTuning,
    pub throw: ThrowTuning,
}

fn check_positive(name: &str, v: f32) -> Result<(), String> {
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("{name} must be finite and > 0"));
    }
    Ok(())
}

fn check_unit(name: &str, v: f32) -> Result<(), String> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(format!("{name} must be within [0, 1]"));
    }
    Ok(())
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning file and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate().map_err(TuningError::Invalid)?;
        log::info!(
            "Loaded tuning: {} shelves x {} columns, grab distance {}",
            tuning.rack.shelf_heights.len(),
            tuning.rack.columns,
            tuning.throw.grab_distance
        );
        Ok(tuning)
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys; serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), String> {
        let b = &self.ball;
        check_positive("ball.radius", b.radius)?;
        if !b.gravity.is_finite() || b.gravity >= 0.0 {
            return Err("ball.gravity must be finite and < 0".to_string());
        }
        check_unit("ball.groundBounce", b.ground_bounce)?;
        check_unit("ball.groundFriction", b.ground_friction)?;
        check_positive("ball.maxFrameDt", b.max_frame_dt)?;
        check_positive("ball.contactEpsilon", b.contact_epsilon)?;
        check_positive("ball.outOfPlayRadius", b.out_of_play_radius)?;

        let h = &self.hoop;
        if !h.rim_center.is_finite() || !h.backboard_center.is_finite() {
            return Err("hoop positions must be finite".to_string());
        }
        check_positive("hoop.rimRadius", h.rim_radius)?;
        check_positive("hoop.tubeThickness", h.tube_thickness)?;
        check_unit("hoop.rimBounce", h.rim_bounce)?;
        check_unit("hoop.rimFriction", h.rim_friction)?;
        check_positive("hoop.backboardHalfWidth", h.backboard_half_width)?;
        check_positive("hoop.backboardHalfHeight", h.backboard_half_height)?;
        check_positive("hoop.backboardThickness", h.backboard_thickness)?;
        check_unit("hoop.backboardBounce", h.backboard_bounce)?;
        check_positive("hoop.scoringRadius", h.scoring_radius)?;
        check_positive("hoop.scoringBandHeight", h.scoring_band_height)?;
        if !h.scoring_top_offset.is_finite() || h.scoring_top_offset < 0.0 {
            return Err("hoop.scoringTopOffset must be finite and >= 0".to_string());
        }

        let r = &self.rack;
        if !r.position.is_finite() || !r.yaw.is_finite() {
            return Err("rack transform must be finite".to_string());
        }
        check_positive("rack.length", r.length)?;
        check_positive("rack.depth", r.depth)?;
        check_positive("rack.height", r.height)?;
        if !r.margin.is_finite() || r.margin < 0.0 {
            return Err("rack.margin must be finite and >= 0".to_string());
        }
        check_unit("rack.bounce", r.bounce)?;
        check_unit("rack.shelfBounce", r.shelf_bounce)?;
        check_unit("rack.shelfFriction", r.shelf_friction)?;
        check_positive("rack.shelfSnapTolerance", r.shelf_snap_tolerance)?;
        if r.columns == 0 {
            return Err("rack.columns must be > 0".to_string());
        }
        if r.shelf_heights.is_empty() {
            return Err("rack.shelfHeights must not be empty".to_string());
        }
        for &shelf in &r.shelf_heights {
            if !shelf.is_finite() || shelf < 0.0 || shelf + 2.0 * b.radius > r.height {
                return Err(format!(
                    "rack shelf at {shelf} does not fit a ball below the rack top ({})",
                    r.height
                ));
            }
        }
        if r.length / (r.columns as f32) < 2.0 * b.radius {
            return Err("rack.length is too short for rack.columns balls".to_string());
        }
        if r.depth < 2.0 * b.radius {
            return Err("rack.depth is too shallow for a ball".to_string());
        }

        let t = &self.throw;
        check_positive("throw.grabDistance", t.grab_distance)?;
        if !t.grip_offset.is_finite() {
            return Err("throw.gripOffset must be finite".to_string());
        }
        check_positive("throw.throwMultiplier", t.throw_multiplier)?;
        if !t.min_up_velocity.is_finite() {
            return Err("throw.minUpVelocity must be finite".to_string());
        }
        Ok(())
    }
}
