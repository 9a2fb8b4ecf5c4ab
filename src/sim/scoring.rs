//! Made-shot detection
//!
//! A shot counts when the ball falls through a short cylinder just below the
//! rim. Each ball latches `has_scored` on its first qualifying frame and stays
//! latched until it is thrown again.

use glam::Vec3;

use super::hoop::Hoop;
use super::state::Ball;
use crate::horizontal_distance;

/// Is a ball at `position` moving with `velocity` inside the scoring band,
/// heading down?
pub fn in_scoring_region(hoop: &Hoop, position: Vec3, velocity: Vec3) -> bool {
    if velocity.y >= 0.0 {
        return false;
    }
    let (top, bottom) = hoop.scoring_band();
    if position.y > top || position.y < bottom {
        return false;
    }
    horizontal_distance(position, hoop.rim_center) <= hoop.scoring_radius
}

/// Latch a made shot; returns true only on the frame the latch closes
pub fn check_score(hoop: &Hoop, ball: &mut Ball) -> bool {
    if ball.has_scored || ball.is_held() {
        return false;
    }
    if in_scoring_region(hoop, ball.position, ball.velocity) {
        ball.has_scored = true;
        return true;
    }
    false
}
