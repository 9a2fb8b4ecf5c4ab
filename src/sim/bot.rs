//! Demo thrower: plays the game with one controller
//!
//! Reaches for a resting ball, carries it to a release point, then throws it
//! along a trajectory that lands at the rim center. Aim and flight time get
//! seeded noise so runs are varied but reproducible.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{ControllerState, GameState, Hand, Pose};
use super::tick::{FrameInput, InputEvent};
use crate::tuning::Tuning;

/// Where the bot holds the ball before throwing
pub const RELEASE_POINT: Vec3 = Vec3::new(0.2, 1.6, -0.3);
/// Frames spent carrying the ball to the release point
const CARRY_FRAMES: u32 = 20;
/// Seconds to watch a shot before reaching again
const WATCH_SECONDS: f32 = 2.0;
/// Balls moving faster than this are not picked up
const REST_SPEED: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BotPhase {
    Reach,
    Carry { from: Vec3, frame: u32 },
    Aim,
    Watch { remaining: f32 },
}

/// Seeded auto-thrower producing one `FrameInput` per frame
#[derive(Debug, Clone)]
pub struct ThrowBot {
    rng: Pcg32,
    hand: Hand,
    phase: BotPhase,
    pose: Pose,
    /// Max aim error in meters (0 = perfect)
    pub spread: f32,
    /// Flight time range in seconds
    pub flight_time: (f32, f32),
}

impl ThrowBot {
    pub fn new(seed: u64, spread: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            hand: Hand::Right,
            phase: BotPhase::Reach,
            pose: Pose::at(RELEASE_POINT),
            spread,
            flight_time: (1.0, 1.2),
        }
    }

    /// Decide this frame's controller pose and input events
    pub fn next_input(&mut self, state: &GameState, tuning: &Tuning, dt: f32) -> FrameInput {
        let mut input = FrameInput::new(dt);
        let controller = state.controller(self.hand);
        if controller.state == ControllerState::Disconnected {
            input.events.push(InputEvent::Connected(self.hand));
        }

        match self.phase {
            BotPhase::Reach => {
                let target = state
                    .balls
                    .iter()
                    .filter(|b| !b.is_held() && b.velocity.length() < REST_SPEED)
                    .min_by_key(|b| (!b.is_seated, b.id));
                if let Some(ball) = target {
                    self.pose = Pose::at(ball.position);
                    input.events.push(InputEvent::SelectStart(self.hand));
                    self.phase = BotPhase::Carry {
                        from: ball.position,
                        frame: 0,
                    };
                }
            }
            BotPhase::Carry { from, frame } => {
                if controller.grabbed_ball().is_none() {
                    // Grab missed (ball moved or got taken)
                    self.phase = BotPhase::Reach;
                } else {
                    let frame = frame + 1;
                    let t = (frame as f32 / CARRY_FRAMES as f32).min(1.0);
                    self.pose = Pose::at(from.lerp(RELEASE_POINT, t));
                    self.phase = if frame >= CARRY_FRAMES {
                        BotPhase::Aim
                    } else {
                        BotPhase::Carry { from, frame }
                    };
                }
            }
            BotPhase::Aim => {
                let velocity = self.launch_velocity(state, tuning, dt);
                let hand_speed = velocity / tuning.throw.throw_multiplier;
                self.pose = Pose::at(RELEASE_POINT + hand_speed * dt);
                input.events.push(InputEvent::SelectEnd(self.hand));
                self.phase = BotPhase::Watch {
                    remaining: WATCH_SECONDS,
                };
            }
            BotPhase::Watch { remaining } => {
                let remaining = remaining - dt;
                self.phase = if remaining <= 0.0 {
                    BotPhase::Reach
                } else {
                    BotPhase::Watch { remaining }
                };
            }
        }

        input.poses[self.hand.index()] = Some(self.pose);
        input
    }

    /// Ball velocity that reaches the (jittered) rim center after a whole
    /// number of frames, matching the integrator's discrete steps
    fn launch_velocity(&mut self, state: &GameState, tuning: &Tuning, dt: f32) -> Vec3 {
        let mut target = tuning.hoop.rim_center;
        if self.spread > 0.0 {
            target.x += self.rng.random_range(-self.spread..=self.spread);
            target.z += self.rng.random_range(-self.spread..=self.spread);
        }
        let (lo, hi) = self.flight_time;
        let flight = if hi > lo {
            self.rng.random_range(lo..=hi)
        } else {
            lo
        };

        let dt = dt.max(1e-3);
        let steps = (flight / dt).round().max(1.0);
        let multiplier = tuning.throw.throw_multiplier;
        let gravity = Vec3::new(0.0, tuning.ball.gravity, 0.0);
        // Semi-implicit Euler after n steps: p0 + v0*n*dt + g*dt²*n(n+1)/2
        let drop = gravity * dt * dt * steps * (steps + 1.0) / 2.0;

        // The release frame also moves the hand by v0/multiplier*dt
        let grip = tuning.throw.grip_offset;
        let n_dt = steps * dt;
        let start = RELEASE_POINT + grip;
        let velocity = (target - start - drop) / (n_dt + dt / multiplier);
        log::debug!(
            "Bot throw at {:?}, {} frames, ball {:?}",
            target,
            steps,
            state.controller(self.hand).grabbed_ball()
        );
        velocity
    }
}
