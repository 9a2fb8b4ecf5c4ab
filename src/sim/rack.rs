//! Ball rack: an open-front shelf unit the balls spawn in
//!
//! All contact math runs in rack-local space, where the rack is axis aligned:
//! - X runs along the rack's length (side walls at ±length/2)
//! - Y is up (floor at 0, top at `height`)
//! - Z runs through its depth; the back wall is at -depth/2 and +Z is open
//!
//! World vectors are rotated in by the inverse yaw and results rotated back.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::tuning::RackTuning;
use crate::yaw_rotation;

/// A socket where a ball spawns and seats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    pub row: u32,
    pub column: u32,
    /// Ball center in rack-local space
    pub local_offset: Vec3,
}

/// Surfaces touched during one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RackHits {
    pub wall: bool,
    pub shelf: bool,
}

/// Immutable rack geometry and surface coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rack {
    pub position: Vec3,
    pub yaw: f32,
    pub length: f32,
    pub depth: f32,
    pub height: f32,
    /// Broad-phase slack around the rack's box
    pub margin: f32,
    pub bounce: f32,
    /// Shelf top surfaces, bottom to top
    pub shelf_heights: Vec<f32>,
    pub shelf_bounce: f32,
    pub shelf_friction: f32,
    pub shelf_snap_tolerance: f32,
    pub sockets: Vec<Socket>,
    rotation: Quat,
    inverse: Quat,
}

impl Rack {
    /// Build the rack and lay out one socket per (shelf, column)
    pub fn from_tuning(t: &RackTuning, ball_radius: f32, epsilon: f32) -> Self {
        let rotation = yaw_rotation(t.yaw);
        let spacing = t.length / t.columns as f32;
        let sockets = t
            .shelf_heights
            .iter()
            .enumerate()
            .flat_map(|(row, &shelf)| {
                (0..t.columns).map(move |column| Socket {
                    row: row as u32,
                    column,
                    local_offset: Vec3::new(
                        -t.length / 2.0 + spacing * (column as f32 + 0.5),
                        shelf + ball_radius + epsilon,
                        0.0,
                    ),
                })
            })
            .collect();

        Self {
            position: t.position,
            yaw: t.yaw,
            length: t.length,
            depth: t.depth,
            height: t.height,
            margin: t.margin,
            bounce: t.bounce,
            shelf_heights: t.shelf_heights.clone(),
            shelf_bounce: t.shelf_bounce,
            shelf_friction: t.shelf_friction,
            shelf_snap_tolerance: t.shelf_snap_tolerance,
            sockets,
            rotation,
            inverse: rotation.inverse(),
        }
    }

    /// The rack only yaws, so heights pass through unrotated and exact
    #[inline]
    pub fn to_local_point(&self, world: Vec3) -> Vec3 {
        let mut local = self.to_local_dir(world - self.position);
        local.y = world.y - self.position.y;
        local
    }

    #[inline]
    pub fn to_world_point(&self, local: Vec3) -> Vec3 {
        let mut world = self.position + self.to_world_dir(local);
        world.y = self.position.y + local.y;
        world
    }

    #[inline]
    fn to_local_dir(&self, world: Vec3) -> Vec3 {
        let mut local = self.inverse * world;
        local.y = world.y;
        local
    }

    #[inline]
    fn to_world_dir(&self, local: Vec3) -> Vec3 {
        let mut world = self.rotation * local;
        world.y = local.y;
        world
    }

    /// World spawn position of a socket
    pub fn socket_position(&self, index: usize) -> Option<Vec3> {
        self.sockets
            .get(index)
            .map(|s| self.to_world_point(s.local_offset))
    }

    pub fn socket_positions(&self) -> Vec<Vec3> {
        self.sockets
            .iter()
            .map(|s| self.to_world_point(s.local_offset))
            .collect()
    }

    /// Cheap early-out: is the local point near the rack at all?
    fn near(&self, p: Vec3) -> bool {
        p.x.abs() <= self.length / 2.0 + self.margin
            && p.z.abs() <= self.depth / 2.0 + self.margin
            && p.y >= -self.margin
            && p.y <= self.height + self.margin
    }

    /// Highest shelf at or below the ball center whose footprint contains it
    fn shelf_below(&self, p: Vec3) -> Option<f32> {
        let half_len = self.length / 2.0;
        let half_depth = self.depth / 2.0;
        if p.x.abs() > half_len || p.z.abs() > half_depth {
            return None;
        }
        self.shelf_heights
            .iter()
            .copied()
            .filter(|&shelf| p.y >= shelf)
            .max_by(f32::total_cmp)
    }

    /// Resolve walls and shelves against one free ball
    pub fn resolve(
        &self,
        position: &mut Vec3,
        velocity: &mut Vec3,
        radius: f32,
        epsilon: f32,
    ) -> RackHits {
        let mut p = self.to_local_point(*position);
        if !self.near(p) {
            return RackHits::default();
        }
        let mut v = self.to_local_dir(*velocity);
        let mut hits = RackHits::default();

        let half_len = self.length / 2.0;
        let half_depth = self.depth / 2.0;
        let inside_height = p.y <= self.height + radius;
        let inside_depth = p.z.abs() <= half_depth + radius;
        let inside_length = p.x.abs() <= half_len + radius;

        // Side walls
        if inside_height && inside_depth {
            if p.x - radius < -half_len && p.x > -half_len - radius && v.x < 0.0 {
                p.x = -half_len + radius;
                v.x *= -self.bounce;
                hits.wall = true;
            } else if p.x + radius > half_len && p.x < half_len + radius && v.x > 0.0 {
                p.x = half_len - radius;
                v.x *= -self.bounce;
                hits.wall = true;
            }
        }

        // Back wall (the +Z side is open)
        if inside_height
            && inside_length
            && p.z - radius < -half_depth
            && p.z > -half_depth - radius
            && v.z < 0.0
        {
            p.z = -half_depth + radius;
            v.z *= -self.bounce;
            hits.wall = true;
        }

        // Shelves
        if let Some(shelf) = self.shelf_below(p) {
            let gap = p.y - radius - shelf;
            if v.y <= 0.0 && gap <= self.shelf_snap_tolerance {
                p.y = shelf + radius + epsilon;
                v.y *= -self.shelf_bounce;
                v.x *= self.shelf_friction;
                v.z *= self.shelf_friction;
                hits.shelf = true;
            }
        }

        if hits.wall || hits.shelf {
            *position = self.to_world_point(p);
            *velocity = self.to_world_dir(v);
        }
        hits
    }
}

impl Default for Rack {
    fn default() -> Self {
        Self::from_tuning(
            &RackTuning::default(),
            crate::consts::BALL_RADIUS,
            crate::consts::CONTACT_EPSILON,
        )
    }
}
