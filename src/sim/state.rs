//! Game state and core simulation types
//!
//! Everything the frame loop mutates lives here. Geometry (hoop, rack) is
//! immutable after construction and lives in its own modules.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable ball index, assigned at creation and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(pub u32);

/// Which hand a controller is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    /// WebXR `handedness` string
    pub fn from_handedness(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Hand::Left),
            "right" => Some(Hand::Right),
            _ => None,
        }
    }
}

/// Frame that drives a ball's transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// Free: gravity and contacts apply
    World,
    /// Held: pose follows the controller, integration suspended
    Controller(Hand),
}

/// A basketball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub frame: Frame,
    /// Cleared only by release
    pub has_scored: bool,
    /// Resting in its rack socket
    pub is_seated: bool,
    /// Socket this ball spawns in and returns to
    pub socket: usize,
}

impl Ball {
    pub fn new(id: BallId, socket: usize, position: Vec3) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            frame: Frame::World,
            has_scored: false,
            is_seated: true,
            socket,
        }
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        matches!(self.frame, Frame::Controller(_))
    }

    pub fn holder(&self) -> Option<Hand> {
        match self.frame {
            Frame::Controller(hand) => Some(hand),
            Frame::World => None,
        }
    }

    /// Put the ball back in its socket at rest
    pub fn reseat(&mut self, socket_position: Vec3) {
        self.position = socket_position;
        self.velocity = Vec3::ZERO;
        self.frame = Frame::World;
        self.has_scored = false;
        self.is_seated = true;
    }
}

/// Controller interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    /// Not tracked by the host
    Disconnected,
    /// Tracked, hand empty
    Idle,
    /// Tracked, holding a ball
    Grabbing(BallId),
}

/// A world-space pose sampled from the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Transform a controller-local point into world space
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// A tracked VR controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    pub hand: Hand,
    pub pose: Pose,
    /// Finite-difference world velocity from the last sample
    pub velocity: Vec3,
    pub state: ControllerState,
    /// Previous sampled position (None until the first sample)
    last_position: Option<Vec3>,
    /// Time since `last_position` was taken
    elapsed: f32,
}

impl Controller {
    pub fn new(hand: Hand) -> Self {
        Self {
            hand,
            pose: Pose::default(),
            velocity: Vec3::ZERO,
            state: ControllerState::Disconnected,
            last_position: None,
            elapsed: 0.0,
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        !matches!(self.state, ControllerState::Disconnected)
    }

    pub fn grabbed_ball(&self) -> Option<BallId> {
        match self.state {
            ControllerState::Grabbing(id) => Some(id),
            _ => None,
        }
    }

    /// Record a new pose and derive velocity since the previous one
    ///
    /// Frames without a pose must go through `skip` so the next sample
    /// divides by the real time span. A zero-length span keeps the last
    /// velocity and the previous reference position.
    pub fn sample(&mut self, pose: Pose, dt: f32) {
        self.pose = pose;
        self.elapsed += dt.max(0.0);
        match self.last_position {
            Some(last) => {
                if self.elapsed > 0.0 {
                    self.velocity = (pose.position - last) / self.elapsed;
                    self.last_position = Some(pose.position);
                    self.elapsed = 0.0;
                }
            }
            None => {
                self.velocity = Vec3::ZERO;
                self.last_position = Some(pose.position);
                self.elapsed = 0.0;
            }
        }
    }

    /// A frame passed without a pose
    pub fn skip(&mut self, dt: f32) {
        if self.last_position.is_some() {
            self.elapsed += dt.max(0.0);
        }
    }

    /// Forget the last sample so the next velocity starts from rest
    pub fn reset_tracking(&mut self) {
        self.last_position = None;
        self.elapsed = 0.0;
        self.velocity = Vec3::ZERO;
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No XR session; frames are ignored
    Idle,
    /// XR session running
    Running,
}

/// Running shot tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub attempts: u32,
    pub score: u32,
}

impl Stats {
    /// Made shots per attempt, 0 when nothing has been thrown
    pub fn accuracy(&self) -> f32 {
        if self.attempts == 0 {
            0.0
        } else {
            self.score as f32 / self.attempts as f32
        }
    }
}

/// Complete mutable game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: SessionPhase,
    /// Sorted by id; index == id
    pub balls: Vec<Ball>,
    /// Indexed by `Hand::index`
    pub controllers: [Controller; 2],
    pub stats: Stats,
    /// Seconds of simulated session time
    pub time: f32,
}

impl GameState {
    /// One ball per socket position
    pub fn new(socket_positions: &[Vec3]) -> Self {
        let balls = socket_positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| Ball::new(BallId(i as u32), i, pos))
            .collect();
        Self {
            phase: SessionPhase::Idle,
            balls,
            controllers: [Controller::new(Hand::Left), Controller::new(Hand::Right)],
            stats: Stats::default(),
            time: 0.0,
        }
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.0 as usize)
    }

    pub fn ball_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(id.0 as usize)
    }

    #[inline]
    pub fn controller(&self, hand: Hand) -> &Controller {
        &self.controllers[hand.index()]
    }

    #[inline]
    pub fn controller_mut(&mut self, hand: Hand) -> &mut Controller {
        &mut self.controllers[hand.index()]
    }
}
