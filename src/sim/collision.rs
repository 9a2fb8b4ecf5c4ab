//! Contact primitives shared by every collider
//!
//! Each collider answers "is the ball touching me, and along which normal";
//! the response (push-out + impulse) is the same shape everywhere.

use glam::Vec3;

/// Result of a contact test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit surface normal pointing toward the ball center
    pub normal: Vec3,
    /// Overlap depth along `normal` (>= 0)
    pub penetration: f32,
}

impl Contact {
    pub fn new(normal: Vec3, penetration: f32) -> Self {
        Self {
            normal,
            penetration,
        }
    }
}

/// Split `velocity` into (normal, tangential) components about unit `normal`
#[inline]
pub fn decompose(velocity: Vec3, normal: Vec3) -> (Vec3, Vec3) {
    let v_n = normal * velocity.dot(normal);
    (v_n, velocity - v_n)
}

/// Impulse response off a surface
///
/// The normal component is reflected and scaled by `bounce`; the tangential
/// component keeps `1 - friction` of itself. Separating velocities are left
/// alone so a ball already leaving the surface is not pulled back.
pub fn bounce_off(velocity: Vec3, normal: Vec3, bounce: f32, friction: f32) -> Vec3 {
    let (v_n, v_t) = decompose(velocity, normal);
    if velocity.dot(normal) >= 0.0 {
        return velocity;
    }
    v_t * (1.0 - friction) - v_n * bounce
}

/// Floor contact at y = 0
///
/// Returns true when the ball touched the ground this step.
pub fn resolve_ground(
    position: &mut Vec3,
    velocity: &mut Vec3,
    radius: f32,
    bounce: f32,
    friction: f32,
) -> bool {
    if position.y > radius {
        return false;
    }
    position.y = radius;
    velocity.y *= -bounce;
    velocity.x *= friction;
    velocity.z *= friction;
    true
}
