//! Hoop geometry: rim torus, backboard plane, scoring band
//!
//! The rim is a torus lying flat around `rim_center`: a circle of radius
//! `rim_radius` swept by a tube of radius `tube_thickness`. The backboard is
//! an axis-aligned slab whose front face looks down +Z toward the player.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::{Contact, bounce_off};
use crate::horizontal_distance;
use crate::tuning::HoopTuning;

/// Immutable hoop geometry and surface coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hoop {
    pub rim_center: Vec3,
    pub rim_radius: f32,
    pub tube_thickness: f32,
    pub rim_bounce: f32,
    pub rim_friction: f32,
    /// Center of the backboard's front face
    pub backboard_center: Vec3,
    pub backboard_half_width: f32,
    pub backboard_half_height: f32,
    pub backboard_thickness: f32,
    pub backboard_bounce: f32,
    pub scoring_radius: f32,
    pub scoring_top_offset: f32,
    pub scoring_band_height: f32,
}

impl Hoop {
    pub fn from_tuning(t: &HoopTuning) -> Self {
        Self {
            rim_center: t.rim_center,
            rim_radius: t.rim_radius,
            tube_thickness: t.tube_thickness,
            rim_bounce: t.rim_bounce,
            rim_friction: t.rim_friction,
            backboard_center: t.backboard_center,
            backboard_half_width: t.backboard_half_width,
            backboard_half_height: t.backboard_half_height,
            backboard_thickness: t.backboard_thickness,
            backboard_bounce: t.backboard_bounce,
            scoring_radius: t.scoring_radius,
            scoring_top_offset: t.scoring_top_offset,
            scoring_band_height: t.scoring_band_height,
        }
    }

    /// Z of the backboard's front face
    #[inline]
    pub fn backboard_face_z(&self) -> f32 {
        self.backboard_center.z
    }

    /// Top and bottom Y of the scoring band
    pub fn scoring_band(&self) -> (f32, f32) {
        let top = self.rim_center.y - self.scoring_top_offset;
        (top, top - self.scoring_band_height)
    }

    /// Nearest point on the rim's center circle to `p`
    ///
    /// Directly on the axis every point is equally near; +X is picked so the
    /// result stays deterministic.
    pub fn nearest_rim_point(&self, p: Vec3) -> Vec3 {
        let offset = Vec3::new(p.x - self.rim_center.x, 0.0, p.z - self.rim_center.z);
        let dir = offset.normalize_or_zero();
        let dir = if dir == Vec3::ZERO { Vec3::X } else { dir };
        self.rim_center + dir * self.rim_radius
    }

    /// Rim (torus) contact test
    pub fn rim_contact(&self, position: Vec3, ball_radius: f32) -> Option<Contact> {
        let horizontal = horizontal_distance(position, self.rim_center);
        // Offset from the tube's center circle, in the plane through the axis
        let radial = horizontal - self.rim_radius;
        let vertical = position.y - self.rim_center.y;
        let dist = (radial * radial + vertical * vertical).sqrt();
        let reach = self.tube_thickness + ball_radius;
        if dist >= reach {
            return None;
        }

        let to_ball = position - self.nearest_rim_point(position);
        let normal = if dist > 1e-6 {
            to_ball / dist
        } else {
            // Ball center on the tube circle: push straight up
            Vec3::Y
        };
        Some(Contact::new(normal, reach - dist))
    }

    /// Backboard contact test
    ///
    /// Only balls moving toward the board (-Z) whose leading edge has reached
    /// the face, inside the board's lateral bounds and not already behind
    /// the slab, are reported.
    pub fn backboard_contact(
        &self,
        position: Vec3,
        velocity: Vec3,
        ball_radius: f32,
    ) -> Option<Contact> {
        let c = self.backboard_center;
        if (position.x - c.x).abs() > self.backboard_half_width
            || (position.y - c.y).abs() > self.backboard_half_height
        {
            return None;
        }
        if velocity.z >= 0.0 {
            return None;
        }
        let face = self.backboard_face_z();
        let leading_edge = position.z - ball_radius;
        if leading_edge > face {
            return None;
        }
        // Entirely behind the slab: the ball went around, not through
        if position.z + ball_radius < face - self.backboard_thickness {
            return None;
        }
        Some(Contact::new(Vec3::Z, face - leading_edge))
    }

    /// Resolve backboard then rim contacts against one free ball
    ///
    /// Returns which surfaces were touched as (backboard, rim).
    pub fn resolve(
        &self,
        position: &mut Vec3,
        velocity: &mut Vec3,
        ball_radius: f32,
        epsilon: f32,
    ) -> (bool, bool) {
        let mut hit_board = false;
        if self
            .backboard_contact(*position, *velocity, ball_radius)
            .is_some()
        {
            velocity.z *= -self.backboard_bounce;
            position.z = self.backboard_face_z() + ball_radius + epsilon;
            hit_board = true;
        }

        let mut hit_rim = false;
        if let Some(contact) = self.rim_contact(*position, ball_radius) {
            *position += contact.normal * (contact.penetration + epsilon);
            *velocity = bounce_off(
                *velocity,
                contact.normal,
                self.rim_bounce,
                self.rim_friction,
            );
            hit_rim = true;
        }

        (hit_board, hit_rim)
    }
}

impl Default for Hoop {
    fn default() -> Self {
        Self::from_tuning(&HoopTuning::default())
    }
}
