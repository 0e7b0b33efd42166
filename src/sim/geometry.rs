//! Arena and obstacle geometry
//!
//! Obstacles are thin "bamboo" bars. Axis-aligned bars get one rectangle
//! collider; bars at any other angle are approximated by a row of overlapping
//! axis-aligned squares laid along the bar, so every hit-test stays a plain
//! box test.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Rectangle the projectile centre is confined to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::from_size(ARENA_WIDTH, ARENA_HEIGHT, ARENA_INSET)
    }
}

impl Arena {
    /// Bounds for a `width` x `height` play field with walls `inset` thick
    pub fn from_size(width: f32, height: f32, inset: f32) -> Self {
        Self {
            left: inset,
            right: width - inset,
            top: inset,
            bottom: height - inset,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.left, self.right), p.y.clamp(self.top, self.bottom))
    }
}

/// An axis-aligned box collider, positioned relative to its obstacle's centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub offset: Vec2,
    pub half: Vec2,
}

/// Build the colliders for a `width` x `height` bar rotated by `angle_deg`.
///
/// Multiples of 90° produce a single box (width/height swapped at 90/270).
/// Anything else becomes `ceil(length / SEGMENT_SPACING)` squares of side
/// `thickness + SEGMENT_OVERLAP`, which is always larger than the spacing so
/// neighbouring squares overlap.
pub fn rect_colliders(width: f32, height: f32, angle_deg: f32) -> Vec<Collider> {
    if is_axis_aligned(angle_deg) {
        let half = if is_quarter_turn(angle_deg) {
            Vec2::new(height, width) * 0.5
        } else {
            Vec2::new(width, height) * 0.5
        };
        return vec![Collider {
            offset: Vec2::ZERO,
            half,
        }];
    }

    let (length, thickness, axis) = bar_frame(width, height, angle_deg);
    let count = (length / SEGMENT_SPACING).ceil().max(1.0) as usize;
    let half = Vec2::splat((thickness + SEGMENT_OVERLAP) * 0.5);

    (0..count)
        .map(|i| {
            let t = (i as f32 + 0.5) / count as f32 - 0.5;
            Collider {
                offset: axis * (t * length),
                half,
            }
        })
        .collect()
}

/// `angle % 90 == 0`
#[inline]
pub fn is_axis_aligned(angle_deg: f32) -> bool {
    angle_deg.rem_euclid(90.0).abs() < 1e-3 || (90.0 - angle_deg.rem_euclid(90.0)).abs() < 1e-3
}

#[inline]
fn is_quarter_turn(angle_deg: f32) -> bool {
    (angle_deg.rem_euclid(180.0) - 90.0).abs() < 1e-3
}

/// Length, thickness and unit long axis of a rotated bar.
///
/// A bar taller than it is wide is drawn vertical first, then `angle_deg` is
/// added on top. Both sizes are capped at `MAX_BAR_LENGTH`.
fn bar_frame(width: f32, height: f32, angle_deg: f32) -> (f32, f32, Vec2) {
    let base = if height > width { 90.0 } else { 0.0 };
    let total = (base + angle_deg).to_radians();
    let length = width.max(height).min(MAX_BAR_LENGTH);
    let thickness = width.min(height).min(MAX_BAR_LENGTH);
    (length, thickness, Vec2::new(total.cos(), total.sin()))
}

/// Sinusoidal back-and-forth motion of a moving obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub base: Vec2,
    pub amplitude: Vec2,
    /// Oscillations per second
    pub speed: f32,
    /// Phase offset in cycles (0..1)
    pub phase: f32,
}

impl Motion {
    /// `base + amplitude * sin(2π·(speed·t + phase))`
    pub fn center_at(&self, t: f32) -> Vec2 {
        self.base + self.amplitude * (TAU * (self.speed * t + self.phase)).sin()
    }
}

/// A solid, reflective obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec2,
    /// Unit vector along the obstacle's local x axis
    pub axis: Vec2,
    /// Half size in the local frame (x along `axis`)
    pub half_extents: Vec2,
    /// How far the colliders reach past `half_extents`
    pub pad: f32,
    pub colliders: Vec<Collider>,
    pub motion: Option<Motion>,
}

impl Obstacle {
    /// A static bar centred at `center`
    pub fn new(center: Vec2, width: f32, height: f32, angle_deg: f32) -> Self {
        let colliders = rect_colliders(width, height, angle_deg);
        if is_axis_aligned(angle_deg) {
            Self {
                center,
                axis: Vec2::X,
                half_extents: colliders[0].half,
                pad: 0.0,
                colliders,
                motion: None,
            }
        } else {
            let (length, thickness, axis) = bar_frame(width, height, angle_deg);
            Self {
                center,
                axis,
                half_extents: Vec2::new(length, thickness) * 0.5,
                pad: SEGMENT_OVERLAP * 0.5,
                colliders,
                motion: None,
            }
        }
    }

    /// An axis-aligned bar oscillating around `base`.
    ///
    /// The hitbox is never thinner than `MIN_MOVING_THICKNESS` so fast bolts
    /// cannot slip through it.
    pub fn moving(base: Vec2, width: f32, height: f32, motion: Motion) -> Self {
        let length = width.max(height);
        let thickness = (length * BAMBOO_ASPECT).max(MIN_MOVING_THICKNESS);
        let (w, h) = if height > width {
            (thickness, length)
        } else {
            (length, thickness)
        };
        let mut obstacle = Self::new(base, w, h, 0.0);
        obstacle.motion = Some(motion);
        obstacle.center = motion.center_at(0.0);
        obstacle
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// Move to where the obstacle is at level time `t`
    pub fn update(&mut self, t: f32) {
        if let Some(motion) = self.motion {
            self.center = motion.center_at(t);
        }
    }

    /// Unit vector perpendicular to `axis`
    #[inline]
    pub fn perp(&self) -> Vec2 {
        self.axis.perp()
    }

    /// Express a world point in the obstacle's local frame
    #[inline]
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        let d = p - self.center;
        Vec2::new(d.dot(self.axis), d.dot(self.perp()))
    }

    /// Express a local direction in world space
    #[inline]
    pub fn to_world_dir(&self, v: Vec2) -> Vec2 {
        self.axis * v.x + self.perp() * v.y
    }

    /// World-space boxes this obstacle currently occupies
    pub fn world_colliders(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.colliders
            .iter()
            .map(move |c| (self.center + c.offset, c.half))
    }
}
