//! Collision detection and response for boxes and circles
//!
//! Everything reduces to two primitive tests: point-in-axis-aligned-box and
//! circle-circle overlap. Rotated bars are covered by their segment colliders
//! (see `geometry::rect_colliders`); the reflection normal is then taken from
//! the bar's own local frame so angled bars bounce off their true surface.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Arena, Obstacle, rect_colliders};

/// A hit-circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at the contact, pointing away from the surface
    pub normal: Vec2,
    /// Penetration depth along `normal` (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Is `p` inside the axis-aligned box `center ± half` grown by `inflate`?
#[inline]
pub fn point_in_aabb(p: Vec2, center: Vec2, half: Vec2, inflate: f32) -> bool {
    let d = (p - center).abs();
    d.x <= half.x + inflate && d.y <= half.y + inflate
}

/// Is `point` inside a `width` x `height` rectangle rotated by `rotation_deg`?
///
/// Multiples of 90° use one box; other angles test each overlapping segment.
pub fn point_in_rect(point: Vec2, center: Vec2, width: f32, height: f32, rotation_deg: f32) -> bool {
    rect_colliders(width, height, rotation_deg)
        .iter()
        .any(|c| point_in_aabb(point, center + c.offset, c.half, 0.0))
}

/// Do two hit-circles overlap?
#[inline]
pub fn circles_overlap(a: Circle, b: Circle) -> bool {
    let reach = a.radius + b.radius;
    a.center.distance_squared(b.center) < reach * reach
}

/// Does a circle of `radius` at `p` touch any of the obstacle's colliders?
pub fn touches_obstacle(p: Vec2, radius: f32, obstacle: &Obstacle) -> bool {
    obstacle
        .world_colliders()
        .any(|(center, half)| point_in_aabb(p, center, half, radius))
}

/// Check a projectile of `radius` at `pos` (previously at `prev`) against an
/// obstacle.
///
/// The normal is the face of the obstacle's local rectangle with the least
/// penetration, except that if `prev` was outside along exactly one local
/// axis, that axis wins (the projectile came through that face).
pub fn obstacle_collision(pos: Vec2, prev: Vec2, radius: f32, obstacle: &Obstacle) -> CollisionResult {
    if !touches_obstacle(pos, radius, obstacle) {
        return CollisionResult::miss();
    }

    let extent = obstacle.half_extents + Vec2::splat(obstacle.pad + radius);
    let local = obstacle.to_local(pos);
    let local_prev = obstacle.to_local(prev);

    let pen = extent - local.abs();
    let was_outside_x = local_prev.x.abs() >= extent.x;
    let was_outside_y = local_prev.y.abs() >= extent.y;

    let use_x = match (was_outside_x, was_outside_y) {
        (true, false) => true,
        (false, true) => false,
        _ => pen.x < pen.y,
    };

    let (local_normal, penetration) = if use_x {
        (Vec2::new(sign_or_from(local.x, local_prev.x), 0.0), pen.x)
    } else {
        (Vec2::new(0.0, sign_or_from(local.y, local_prev.y)), pen.y)
    };

    CollisionResult {
        hit: true,
        normal: obstacle.to_world_dir(local_normal),
        penetration: penetration.max(0.0),
    }
}

/// Side of the axis the point is on, falling back to where it came from
#[inline]
fn sign_or_from(value: f32, prev: f32) -> f32 {
    if value.abs() > f32::EPSILON {
        value.signum()
    } else if prev.abs() > f32::EPSILON {
        prev.signum()
    } else {
        1.0
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Keep a point inside the arena, bouncing its velocity off any edge it
/// crossed.
///
/// Each crossed edge flips the matching velocity component so it points back
/// inward and clamps the position onto that edge. Returns whether any edge was
/// crossed.
pub fn arena_reflect(arena: &Arena, pos: &mut Vec2, vel: &mut Vec2) -> bool {
    let mut hit = false;

    if pos.x < arena.left {
        pos.x = arena.left;
        vel.x = vel.x.abs();
        hit = true;
    } else if pos.x > arena.right {
        pos.x = arena.right;
        vel.x = -vel.x.abs();
        hit = true;
    }

    if pos.y < arena.top {
        pos.y = arena.top;
        vel.y = vel.y.abs();
        hit = true;
    } else if pos.y > arena.bottom {
        pos.y = arena.bottom;
        vel.y = -vel.y.abs();
        hit = true;
    }

    hit
}
