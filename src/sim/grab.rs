//! Controller grab / release binding
//!
//! Grabbing switches a ball's frame from `World` to `Controller(hand)`;
//! releasing switches it back and hands the ball the controller's velocity.
//! Both sides of the binding (ball frame, controller state) change together.

use glam::Vec3;

use super::state::{Ball, BallId, ControllerState, Frame, GameState, Hand};
use crate::tuning::ThrowTuning;

/// A ball leaving a controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throw {
    pub ball: BallId,
    pub hand: Hand,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Throw {
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Nearest free ball within `max_distance` of `point`
pub fn nearest_grabbable(balls: &[Ball], point: Vec3, max_distance: f32) -> Option<BallId> {
    balls
        .iter()
        .filter(|b| !b.is_held())
        .map(|b| (b.id, b.position.distance(point)))
        .filter(|&(_, d)| d <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Try to pick up the nearest ball with `hand`
///
/// No-op (None) when the controller is disconnected, already holding a ball,
/// or nothing is in reach.
pub fn grab(state: &mut GameState, hand: Hand, tuning: &ThrowTuning) -> Option<BallId> {
    let controller = state.controller(hand);
    if controller.state != ControllerState::Idle {
        return None;
    }
    let pose = controller.pose;
    let id = nearest_grabbable(&state.balls, pose.position, tuning.grab_distance)?;

    let ball = state.ball_mut(id)?;
    ball.frame = Frame::Controller(hand);
    ball.is_seated = false;
    ball.velocity = Vec3::ZERO;
    ball.position = pose.transform_point(tuning.grip_offset);

    state.controller_mut(hand).state = ControllerState::Grabbing(id);
    log::debug!("{hand:?} grabbed ball {}", id.0);
    Some(id)
}

/// Throw the held ball; None when the hand is empty
pub fn release(state: &mut GameState, hand: Hand, tuning: &ThrowTuning) -> Option<Throw> {
    let controller = state.controller(hand);
    let id = controller.grabbed_ball()?;
    let pose = controller.pose;
    let mut velocity = controller.velocity * tuning.throw_multiplier;
    velocity.y = velocity.y.max(tuning.min_up_velocity);

    let ball = state.ball_mut(id)?;
    ball.frame = Frame::World;
    ball.position = pose.transform_point(tuning.grip_offset);
    ball.velocity = velocity;
    ball.has_scored = false;
    let position = ball.position;

    state.controller_mut(hand).state = ControllerState::Idle;
    state.stats.attempts += 1;

    Some(Throw {
        ball: id,
        hand,
        position,
        velocity,
    })
}

/// Let go without throwing (controller lost): the ball falls from rest
pub fn drop_held(state: &mut GameState, hand: Hand, tuning: &ThrowTuning) -> Option<BallId> {
    let controller = state.controller(hand);
    let id = controller.grabbed_ball()?;
    let pose = controller.pose;

    let ball = state.ball_mut(id)?;
    ball.frame = Frame::World;
    ball.position = pose.transform_point(tuning.grip_offset);
    ball.velocity = Vec3::ZERO;

    state.controller_mut(hand).state = ControllerState::Idle;
    Some(id)
}

/// Snap every held ball to its controller's grip point
pub fn follow_controllers(state: &mut GameState, grip_offset: Vec3) {
    let poses = [
        state.controller(Hand::Left).pose,
        state.controller(Hand::Right).pose,
    ];
    for ball in &mut state.balls {
        if let Frame::Controller(hand) = ball.frame {
            ball.position = poses[hand.index()].transform_point(grip_offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Pose;

    fn state_with_balls(positions: &[Vec3]) -> GameState {
        let mut state = GameState::new(positions);
        for hand in Hand::ALL {
            state.controller_mut(hand).state = ControllerState::Idle;
        }
        state
    }

    fn place(state: &mut GameState, hand: Hand, position: Vec3, dt: f32) {
        state.controller_mut(hand).sample(Pose::at(position), dt);
    }

    #[test]
    fn test_grab_picks_nearest_in_reach() {
        let mut state = state_with_balls(&[
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.1, 1.0, 0.0),
            Vec3::new(5.0, 1.0, 0.0),
        ]);
        place(&mut state, Hand::Right, Vec3::new(0.12, 1.0, 0.0), 0.016);
        let tuning = ThrowTuning::default();
        assert_eq!(grab(&mut state, Hand::Right, &tuning), Some(BallId(1)));
        let ball = state.ball(BallId(1)).unwrap();
        assert!(ball.is_held());
        assert!(!ball.is_seated);
        assert_eq!(ball.velocity, Vec3::ZERO);
        assert_eq!(
            state.controller(Hand::Right).state,
            ControllerState::Grabbing(BallId(1))
        );
    }

    #[test]
    fn test_grab_out_of_reach_is_noop() {
        let mut state = state_with_balls(&[Vec3::new(0.0, 1.0, 0.0)]);
        place(&mut state, Hand::Left, Vec3::new(2.0, 1.0, 0.0), 0.016);
        assert_eq!(grab(&mut state, Hand::Left, &ThrowTuning::default()), None);
        assert_eq!(state.controller(Hand::Left).state, ControllerState::Idle);
        assert!(!state.balls[0].is_held());
    }

    #[test]
    fn test_second_hand_cannot_take_held_ball() {
        let mut state = state_with_balls(&[Vec3::new(0.0, 1.0, 0.0)]);
        let tuning = ThrowTuning::default();
        place(&mut state, Hand::Left, Vec3::new(0.0, 1.0, 0.05), 0.016);
        place(&mut state, Hand::Right, Vec3::new(0.0, 1.0, -0.05), 0.016);
        assert_eq!(grab(&mut state, Hand::Left, &tuning), Some(BallId(0)));
        assert_eq!(grab(&mut state, Hand::Right, &tuning), None);
        assert_eq!(state.balls[0].holder(), Some(Hand::Left));
    }

    #[test]
    fn test_release_throws_with_scaled_velocity() {
        let mut state = state_with_balls(&[Vec3::new(0.0, 1.0, 0.0)]);
        let tuning = ThrowTuning {
            throw_multiplier: 1.5,
            ..ThrowTuning::default()
        };
        place(&mut state, Hand::Right, Vec3::new(0.0, 1.0, 0.0), 0.1);
        grab(&mut state, Hand::Right, &tuning).unwrap();
        state.balls[0].has_scored = true;
        place(&mut state, Hand::Right, Vec3::new(0.0, 1.0, -0.3), 0.1);

        let throw = release(&mut state, Hand::Right, &tuning).unwrap();
        let ball = &state.balls[0];
        assert!((ball.velocity.z + 4.5).abs() < 1e-4);
        assert!(!ball.has_scored);
        assert!(!ball.is_held());
        assert_eq!(state.stats.attempts, 1);
        assert_eq!(throw.velocity, ball.velocity);
        assert_eq!(state.controller(Hand::Right).state, ControllerState::Idle);
    }

    #[test]
    fn test_release_lifts_flat_throw() {
        let mut state = state_with_balls(&[Vec3::new(0.0, 1.0, 0.0)]);
        let tuning = ThrowTuning::default();
        place(&mut state, Hand::Right, Vec3::new(0.0, 1.0, 0.0), 0.1);
        grab(&mut state, Hand::Right, &tuning).unwrap();
        place(&mut state, Hand::Right, Vec3::new(0.0, 0.9, -0.2), 0.1);
        let throw = release(&mut state, Hand::Right, &tuning).unwrap();
        assert_eq!(throw.velocity.y, tuning.min_up_velocity);
    }

    #[test]
    fn test_release_with_empty_hand_is_noop() {
        let mut state = state_with_balls(&[Vec3::new(0.0, 1.0, 0.0)]);
        assert!(release(&mut state, Hand::Left, &ThrowTuning::default()).is_none());
        assert_eq!(state.stats.attempts, 0);
    }

    #[test]
    fn test_held_ball_follows_grip_point() {
        let mut state = state_with_balls(&[Vec3::new(0.0, 1.0, 0.0)]);
        let tuning = ThrowTuning::default();
        place(&mut state, Hand::Left, Vec3::new(0.0, 1.0, 0.0), 0.016);
        grab(&mut state, Hand::Left, &tuning).unwrap();
        place(&mut state, Hand::Left, Vec3::new(0.5, 1.5, 0.0), 0.016);
        follow_controllers(&mut state, tuning.grip_offset);
        let expected = Vec3::new(0.5, 1.5, 0.0) + tuning.grip_offset;
        assert!((state.balls[0].position - expected).length() < 1e-6);
    }

    #[test]
    fn test_drop_does_not_count_attempt() {
        let mut state = state_with_balls(&[Vec3::new(0.0, 1.0, 0.0)]);
        let tuning = ThrowTuning::default();
        place(&mut state, Hand::Left, Vec3::new(0.0, 1.0, 0.0), 0.016);
        grab(&mut state, Hand::Left, &tuning).unwrap();
        assert_eq!(drop_held(&mut state, Hand::Left, &tuning), Some(BallId(0)));
        assert_eq!(state.balls[0].velocity, Vec3::ZERO);
        assert!(!state.balls[0].is_held());
        assert_eq!(state.stats.attempts, 0);
    }
}
