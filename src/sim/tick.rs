//! Per-frame simulation step
//!
//! One call per rendered frame. Order within a frame:
//! 1. Controller connect/disconnect events
//! 2. Controller pose sampling (velocity by finite difference)
//! 3. Select start/end events (grab / throw)
//! 4. Held balls follow their grip point
//! 5. Free balls: gravity, integration, ground, hoop, rack
//! 6. Scoring

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::grab::{self, Throw};
use super::hoop::Hoop;
use super::rack::Rack;
use super::scoring::check_score;
use super::state::{Ball, ControllerState, GameState, Hand, Pose, SessionPhase};
use crate::analytics::{EventSink, GameEvent};
use crate::tuning::{BallTuning, Tuning};
use crate::{clamp_dt, horizontal_distance};

/// Discrete input from the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Connected(Hand),
    Disconnected(Hand),
    /// Trigger pressed
    SelectStart(Hand),
    /// Trigger released
    SelectEnd(Hand),
}

/// Everything the host hands over for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Seconds since the previous frame (clamped before use)
    pub dt: f32,
    /// World pose per hand, indexed by `Hand::index`
    pub poses: [Option<Pose>; 2],
    /// Input events since the previous frame, in arrival order
    pub events: Vec<InputEvent>,
}

impl FrameInput {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            ..Default::default()
        }
    }

    pub fn with_pose(mut self, hand: Hand, pose: Pose) -> Self {
        self.poses[hand.index()] = Some(pose);
        self
    }

    pub fn with_event(mut self, event: InputEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// Static geometry the balls collide with
#[derive(Debug, Clone)]
pub struct Court {
    pub hoop: Hoop,
    pub rack: Rack,
}

impl Court {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            hoop: Hoop::from_tuning(&tuning.hoop),
            rack: Rack::from_tuning(
                &tuning.rack,
                tuning.ball.radius,
                tuning.ball.contact_epsilon,
            ),
        }
    }
}

/// Surfaces a ball touched in one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Touches {
    pub ground: bool,
    pub backboard: bool,
    pub rim: bool,
    pub rack: bool,
}

/// Advance one free ball by `dt` (already clamped)
///
/// Held balls are left untouched.
pub fn step_ball(ball: &mut Ball, dt: f32, court: &Court, tuning: &BallTuning) -> Touches {
    let mut touches = Touches::default();
    if ball.is_held() {
        return touches;
    }

    let r = tuning.radius;
    let eps = tuning.contact_epsilon;

    // Semi-implicit Euler: velocity first
    ball.velocity.y += tuning.gravity * dt;
    ball.position += ball.velocity * dt;

    touches.ground = super::collision::resolve_ground(
        &mut ball.position,
        &mut ball.velocity,
        r,
        tuning.ground_bounce,
        tuning.ground_friction,
    );

    let (board, rim) = court
        .hoop
        .resolve(&mut ball.position, &mut ball.velocity, r, eps);
    touches.backboard = board;
    touches.rim = rim;

    let rack = court
        .rack
        .resolve(&mut ball.position, &mut ball.velocity, r, eps);
    touches.rack = rack.wall || rack.shelf;

    touches
}

fn apply_connection(state: &mut GameState, event: InputEvent, tuning: &Tuning) {
    match event {
        InputEvent::Connected(hand) => {
            let controller = state.controller_mut(hand);
            if controller.state == ControllerState::Disconnected {
                controller.state = ControllerState::Idle;
                controller.reset_tracking();
                log::info!("{hand:?} controller connected");
            }
        }
        InputEvent::Disconnected(hand) => {
            if let Some(id) = grab::drop_held(state, hand, &tuning.throw) {
                log::debug!("{hand:?} controller lost while holding ball {}", id.0);
            }
            let controller = state.controller_mut(hand);
            controller.state = ControllerState::Disconnected;
            controller.reset_tracking();
            log::info!("{hand:?} controller disconnected");
        }
        _ => {}
    }
}

fn apply_select(
    state: &mut GameState,
    event: InputEvent,
    tuning: &Tuning,
    sink: &mut impl EventSink,
) {
    match event {
        InputEvent::SelectStart(hand) => {
            if let Some(ball) = grab::grab(state, hand, &tuning.throw) {
                sink.emit(&GameEvent::Grab { ball, hand });
            }
        }
        InputEvent::SelectEnd(hand) => {
            if let Some(throw) = grab::release(state, hand, &tuning.throw) {
                emit_attempt(state, &throw, sink);
            }
        }
        _ => {}
    }
}

fn emit_attempt(state: &GameState, throw: &Throw, sink: &mut impl EventSink) {
    sink.emit(&GameEvent::ShotAttempt {
        ball: throw.ball,
        position: throw.position,
        attempts: state.stats.attempts,
        speed: throw.speed(),
    });
}

/// Advance the game by one rendered frame
pub fn tick(
    state: &mut GameState,
    court: &Court,
    tuning: &Tuning,
    input: &FrameInput,
    sink: &mut impl EventSink,
) {
    if state.phase != SessionPhase::Running {
        return;
    }

    let dt = clamp_dt(input.dt, tuning.ball.max_frame_dt);
    state.time += dt;

    for &event in &input.events {
        apply_connection(state, event, tuning);
    }

    for hand in Hand::ALL {
        let controller = state.controller_mut(hand);
        if !controller.is_connected() {
            continue;
        }
        match input.poses[hand.index()] {
            Some(pose) => controller.sample(pose, dt),
            None => controller.skip(dt),
        }
    }

    for &event in &input.events {
        apply_select(state, event, tuning, sink);
    }

    grab::follow_controllers(state, tuning.throw.grip_offset);

    for ball in &mut state.balls {
        let touches = step_ball(ball, dt, court, &tuning.ball);
        if touches.backboard {
            log::debug!("Ball {} hit the backboard", ball.id.0);
        }

        if !ball.is_held()
            && horizontal_distance(ball.position, Vec3::ZERO) > tuning.ball.out_of_play_radius
        {
            if let Some(socket) = court.rack.socket_position(ball.socket) {
                log::debug!("Ball {} out of play, back to socket {}", ball.id.0, ball.socket);
                ball.reseat(socket);
            }
        }
    }

    for i in 0..state.balls.len() {
        if check_score(&court.hoop, &mut state.balls[i]) {
            state.stats.score += 1;
            let ball = &state.balls[i];
            sink.emit(&GameEvent::Score {
                ball: ball.id,
                position: ball.position,
                score: state.stats.score,
                attempts: state.stats.attempts,
                speed: ball.velocity.length(),
            });
        }
    }
}

/// Game loop owner: state, geometry, tuning and the analytics sink
pub struct Game<S: EventSink> {
    state: GameState,
    court: Court,
    tuning: Tuning,
    sink: S,
}

impl<S: EventSink> Game<S> {
    pub fn new(tuning: Tuning, sink: S) -> Self {
        let court = Court::from_tuning(&tuning);
        let state = GameState::new(&court.rack.socket_positions());
        Self {
            state,
            court,
            tuning,
            sink,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn court(&self) -> &Court {
        &self.court
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == SessionPhase::Running
    }

    /// XR session started; frames are simulated from now on
    pub fn begin_session(&mut self) {
        if self.is_running() {
            return;
        }
        self.state.phase = SessionPhase::Running;
        for controller in &mut self.state.controllers {
            controller.reset_tracking();
        }
        log::info!("Session started with {} balls", self.state.balls.len());
        self.sink.emit(&GameEvent::SessionStarted);
    }

    /// XR session ended; held balls are dropped and further frames are ignored
    pub fn end_session(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state.phase = SessionPhase::Idle;
        for hand in Hand::ALL {
            if let Some(id) = grab::drop_held(&mut self.state, hand, &self.tuning.throw) {
                log::debug!("Session ended while {hand:?} held ball {}", id.0);
            }
        }
        let stats = self.state.stats;
        log::info!(
            "Session ended: {}/{} ({:.0}%)",
            stats.score,
            stats.attempts,
            stats.accuracy() * 100.0
        );
        self.sink.emit(&GameEvent::SessionEnded {
            attempts: stats.attempts,
            score: stats.score,
        });
    }

    pub fn tick(&mut self, input: &FrameInput) {
        tick(
            &mut self.state,
            &self.court,
            &self.tuning,
            input,
            &mut self.sink,
        );
    }

    /// Return every free ball to its socket; held balls stay in hand
    pub fn reset_rack(&mut self) {
        for ball in &mut self.state.balls {
            if ball.is_held() {
                continue;
            }
            if let Some(socket) = self.court.rack.socket_position(ball.socket) {
                ball.reseat(socket);
            }
        }
        log::info!("Rack reset");
    }

    /// JSON snapshot of the mutable state for the host
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::RecordingSink;
    use crate::consts::*;
    use crate::sim::state::{BallId, Frame};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn running_game() -> Game<RecordingSink> {
        let mut game = Game::new(Tuning::default(), RecordingSink::new());
        game.begin_session();
        game.tick(
            &FrameInput::new(DT)
                .with_event(InputEvent::Connected(Hand::Left))
                .with_event(InputEvent::Connected(Hand::Right)),
        );
        game.sink_mut().clear();
        game
    }

    fn free_ball(position: Vec3, velocity: Vec3) -> Ball {
        let mut ball = Ball::new(BallId(0), 0, position);
        ball.is_seated = false;
        ball.velocity = velocity;
        ball
    }

    #[test]
    fn test_frames_ignored_outside_session() {
        let mut game = Game::new(Tuning::default(), RecordingSink::new());
        let before = game.state().balls[0].position;
        game.state.balls[0].position.y = 2.0;
        game.tick(&FrameInput::new(DT));
        assert_eq!(game.state().balls[0].position.y, 2.0);
        assert_eq!(game.state().time, 0.0);
        assert_ne!(before.y, 2.0);
    }

    #[test]
    fn test_session_events() {
        let mut game = Game::new(Tuning::default(), RecordingSink::new());
        game.begin_session();
        game.begin_session();
        game.end_session();
        game.end_session();
        assert_eq!(game.sink().count("sessionStarted"), 1);
        assert_eq!(game.sink().count("sessionEnded"), 1);
        assert!(!game.is_running());
    }

    #[test]
    fn test_free_fall_uses_semi_implicit_euler() {
        let court = Court::from_tuning(&Tuning::default());
        let tuning = BallTuning::default();
        let mut ball = free_ball(Vec3::new(-3.0, 5.0, 3.0), Vec3::ZERO);
        step_ball(&mut ball, 0.1, &court, &tuning);
        assert!((ball.velocity.y - GRAVITY * 0.1).abs() < 1e-6);
        assert!((ball.position.y - (5.0 + GRAVITY * 0.01)).abs() < 1e-6);
    }

    #[test]
    fn test_ground_scenario() {
        let court = Court::from_tuning(&Tuning::default());
        let tuning = BallTuning::default();
        let mut ball = free_ball(
            Vec3::new(-3.0, BALL_RADIUS - 0.01, 3.0),
            Vec3::new(0.0, -2.0, 0.0),
        );
        let touches = step_ball(&mut ball, 0.0, &court, &tuning);
        assert!(touches.ground);
        assert_eq!(ball.position.y, BALL_RADIUS);
        assert!((ball.velocity.y - 2.0 * GROUND_BOUNCE).abs() < 1e-6);
    }

    #[test]
    fn test_held_ball_is_not_integrated() {
        let court = Court::from_tuning(&Tuning::default());
        let mut ball = free_ball(Vec3::new(0.0, 1.5, 0.0), Vec3::new(1.0, 2.0, 3.0));
        ball.frame = Frame::Controller(Hand::Left);
        let touches = step_ball(&mut ball, 0.05, &court, &BallTuning::default());
        assert_eq!(touches, Touches::default());
        assert_eq!(ball.velocity, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ball.position, Vec3::new(0.0, 1.5, 0.0));
    }

    #[test]
    fn test_scoring_scenario_fires_once() {
        let mut game = running_game();
        game.state.balls[0].position = Vec3::new(0.0, 2.85, -2.6);
        game.state.balls[0].velocity = Vec3::new(0.0, -1.0, 0.0);
        game.state.balls[0].is_seated = false;
        game.tick(&FrameInput::new(0.0));
        assert!(game.state().balls[0].has_scored);
        assert_eq!(game.sink().count("score"), 1);
        for _ in 0..5 {
            game.state.balls[0].position = Vec3::new(0.0, 2.85, -2.6);
            game.state.balls[0].velocity = Vec3::new(0.0, -1.0, 0.0);
            game.tick(&FrameInput::new(0.0));
        }
        assert_eq!(game.sink().count("score"), 1);
        assert_eq!(game.state().stats.score, 1);
    }

    #[test]
    fn test_grab_and_throw_scenario() {
        let mut game = running_game();
        let target = game.state().balls[3].position;

        game.tick(
            &FrameInput::new(0.1)
                .with_pose(Hand::Right, Pose::at(target))
                .with_event(InputEvent::SelectStart(Hand::Right)),
        );
        assert_eq!(game.state().balls[3].holder(), Some(Hand::Right));
        assert_eq!(game.sink().count("grab"), 1);

        game.tick(&FrameInput::new(0.1).with_pose(Hand::Right, Pose::at(target)));
        let thrown_from = target + Vec3::new(0.0, 0.0, -0.3);
        game.tick(
            &FrameInput::new(0.1)
                .with_pose(Hand::Right, Pose::at(thrown_from))
                .with_event(InputEvent::SelectEnd(Hand::Right)),
        );

        let ball = &game.state().balls[3];
        assert!(!ball.is_held());
        assert!(!ball.has_scored);
        // Throw velocity (0, min_up, -4.5) after one integration step
        assert!((ball.velocity.z + 4.5).abs() < 1e-3);
        assert_eq!(game.state().stats.attempts, 1);
        match &game.sink().events[..] {
            [GameEvent::Grab { .. }, GameEvent::ShotAttempt { attempts, speed, .. }] => {
                assert_eq!(*attempts, 1);
                assert!(*speed > 4.5);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_frame_without_pose_spans_two_steps() {
        let mut game = running_game();
        let target = game.state().balls[0].position;
        game.tick(
            &FrameInput::new(0.1)
                .with_pose(Hand::Right, Pose::at(target))
                .with_event(InputEvent::SelectStart(Hand::Right)),
        );
        assert!(game.state().balls[0].is_held());

        let hand = Vec3::new(-2.0, 1.5, 0.0);
        game.tick(&FrameInput::new(0.1).with_pose(Hand::Right, Pose::at(hand)));
        game.tick(&FrameInput::new(0.1));
        game.tick(
            &FrameInput::new(0.1)
                .with_pose(Hand::Right, Pose::at(hand + Vec3::new(0.0, 0.0, -0.6)))
                .with_event(InputEvent::SelectEnd(Hand::Right)),
        );

        let controller = game.state().controller(Hand::Right);
        assert!((controller.velocity - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-4);
        assert!((game.state().balls[0].velocity.z + 4.5).abs() < 1e-3);
    }

    #[test]
    fn test_restarted_session_tracks_from_rest() {
        let mut game = running_game();
        let hand = Vec3::new(-2.0, 1.5, 0.0);
        game.tick(&FrameInput::new(DT).with_pose(Hand::Left, Pose::at(hand)));
        game.end_session();
        game.begin_session();
        let moved = Pose::at(hand + Vec3::new(0.0, 0.0, -2.0));
        game.tick(&FrameInput::new(0.016).with_pose(Hand::Left, moved));
        assert_eq!(game.state().controller(Hand::Left).velocity, Vec3::ZERO);
    }

    #[test]
    fn test_end_session_drops_held_ball() {
        let mut game = running_game();
        let target = game.state().balls[0].position;
        game.tick(
            &FrameInput::new(DT)
                .with_pose(Hand::Left, Pose::at(target))
                .with_event(InputEvent::SelectStart(Hand::Left)),
        );
        assert!(game.state().balls[0].is_held());
        game.end_session();
        assert_eq!(game.state().balls[0].frame, Frame::World);
        assert_eq!(game.state().controller(Hand::Left).state, ControllerState::Idle);
        assert_eq!(game.state().stats.attempts, 0);
    }

    #[test]
    fn test_disconnect_drops_held_ball() {
        let mut game = running_game();
        let target = game.state().balls[0].position;
        game.tick(
            &FrameInput::new(DT)
                .with_pose(Hand::Left, Pose::at(target))
                .with_event(InputEvent::SelectStart(Hand::Left)),
        );
        assert!(game.state().balls[0].is_held());
        game.tick(&FrameInput::new(DT).with_event(InputEvent::Disconnected(Hand::Left)));
        assert!(!game.state().balls[0].is_held());
        assert_eq!(
            game.state().controller(Hand::Left).state,
            ControllerState::Disconnected
        );
        assert_eq!(game.state().stats.attempts, 0);
    }

    #[test]
    fn test_disconnected_controller_cannot_grab() {
        let mut game = running_game();
        game.tick(&FrameInput::new(DT).with_event(InputEvent::Disconnected(Hand::Right)));
        let target = game.state().balls[0].position;
        game.tick(
            &FrameInput::new(DT)
                .with_pose(Hand::Right, Pose::at(target))
                .with_event(InputEvent::SelectStart(Hand::Right)),
        );
        assert!(!game.state().balls[0].is_held());
    }

    #[test]
    fn test_seated_balls_stay_on_their_shelves() {
        let mut game = running_game();
        let start: Vec<Vec3> = game.state().balls.iter().map(|b| b.position).collect();
        for _ in 0..600 {
            game.tick(&FrameInput::new(DT));
        }
        for (ball, start) in game.state().balls.iter().zip(start) {
            assert!((ball.position - start).length() < 0.02, "ball {} drifted", ball.id.0);
        }
    }

    #[test]
    fn test_reset_rack_returns_free_balls() {
        let mut game = running_game();
        game.state.balls[2].position = Vec3::new(0.0, 0.12, -1.0);
        game.state.balls[2].is_seated = false;
        game.state.balls[2].has_scored = true;
        game.reset_rack();
        let ball = &game.state().balls[2];
        assert_eq!(Some(ball.position), game.court().rack.socket_position(2));
        assert!(ball.is_seated);
        assert!(!ball.has_scored);
    }

    #[test]
    fn test_out_of_play_ball_returns_to_socket() {
        let mut game = running_game();
        game.state.balls[1].position = Vec3::new(40.0, 0.12, 0.0);
        game.state.balls[1].is_seated = false;
        game.tick(&FrameInput::new(DT));
        let ball = &game.state().balls[1];
        assert!(ball.is_seated);
        assert!((ball.position - game.court().rack.socket_position(1).unwrap()).length() < 1e-6);
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut game = running_game();
        game.state.balls[0].position = Vec3::new(-3.0, 5.0, 3.0);
        game.state.balls[0].velocity = Vec3::ZERO;
        game.state.balls[0].is_seated = false;
        game.tick(&FrameInput::new(2.0));
        let v = game.state().balls[0].velocity.y;
        assert!((v - GRAVITY * MAX_FRAME_DT).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_free_ball_never_below_floor(
            x in -4.0f32..4.0, y in -1.0f32..5.0, z in -4.0f32..2.0,
            vx in -10.0f32..10.0, vy in -20.0f32..20.0, vz in -10.0f32..10.0,
            dt in 0.0f32..0.1,
        ) {
            let court = Court::from_tuning(&Tuning::default());
            let tuning = BallTuning::default();
            let mut ball = free_ball(Vec3::new(x, y, z), Vec3::new(vx, vy, vz));
            step_ball(&mut ball, dt, &court, &tuning);
            prop_assert!(ball.position.y >= tuning.radius);
        }

        #[test]
        fn prop_held_ball_velocity_untouched(
            vx in -10.0f32..10.0, vy in -10.0f32..10.0, vz in -10.0f32..10.0,
            frames in 1usize..30,
        ) {
            let mut game = running_game();
            let target = game.state().balls[0].position;
            game.tick(
                &FrameInput::new(DT)
                    .with_pose(Hand::Left, Pose::at(target))
                    .with_event(InputEvent::SelectStart(Hand::Left)),
            );
            game.state.balls[0].velocity = Vec3::new(vx, vy, vz);
            for i in 0..frames {
                let pose = Pose::at(target + Vec3::new(0.0, i as f32 * 0.01, 0.0));
                game.tick(&FrameInput::new(DT).with_pose(Hand::Left, pose));
            }
            prop_assert!(game.state().balls[0].is_held());
            prop_assert_eq!(game.state().balls[0].velocity, Vec3::new(vx, vy, vz));
        }

        #[test]
        fn prop_rim_contact_loses_normal_speed(
            angle in 0.0f32..std::f32::consts::PI,
            lift in -0.12f32..0.12,
            out in -0.12f32..0.12,
            speed in 0.5f32..10.0,
        ) {
            let hoop = Hoop::default();
            // Front half of the rim, away from the backboard
            let dir = Vec3::new(angle.cos(), 0.0, angle.sin());
            let pos = hoop.rim_center + dir * (hoop.rim_radius + out) + Vec3::new(0.0, lift, 0.0);
            let contact = hoop.rim_contact(pos, BALL_RADIUS);
            prop_assume!(contact.is_some());
            let contact = contact.unwrap();
            let vel = -contact.normal * speed;

            let mut p = pos;
            let mut v = vel;
            let (_, rim) = hoop.resolve(&mut p, &mut v, BALL_RADIUS, CONTACT_EPSILON);
            prop_assert!(rim);
            prop_assert!(v.dot(contact.normal).abs() < vel.dot(contact.normal).abs());
        }

        #[test]
        fn prop_two_hands_never_share_a_ball(
            lx in -0.2f32..0.2, lz in -0.2f32..0.2,
            rx in -0.2f32..0.2, rz in -0.2f32..0.2,
            socket in 0usize..8,
        ) {
            let mut game = running_game();
            let target = game.state().balls[socket].position;
            game.tick(
                &FrameInput::new(DT)
                    .with_pose(Hand::Left, Pose::at(target + Vec3::new(lx, 0.0, lz)))
                    .with_pose(Hand::Right, Pose::at(target + Vec3::new(rx, 0.0, rz)))
                    .with_event(InputEvent::SelectStart(Hand::Left))
                    .with_event(InputEvent::SelectStart(Hand::Right)),
            );
            let left = game.state().controller(Hand::Left).grabbed_ball();
            let right = game.state().controller(Hand::Right).grabbed_ball();
            if let (Some(l), Some(r)) = (left, right) {
                prop_assert_ne!(l, r);
            }
            for ball in &game.state().balls {
                if let Some(hand) = ball.holder() {
                    prop_assert_eq!(game.state().controller(hand).grabbed_ball(), Some(ball.id));
                }
            }
        }
    }
}
