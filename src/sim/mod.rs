//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - No randomness
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod geometry;
pub mod projectile;
pub mod registry;
pub mod state;
pub mod tick;
pub mod trajectory;
pub mod world;

pub use collision::{
    Circle, CollisionResult, arena_reflect, circles_overlap, obstacle_collision, point_in_rect,
    reflect_velocity,
};
pub use geometry::{Arena, Motion, Obstacle};
pub use projectile::{ExpireReason, Projectile};
pub use registry::{Hazard, HazardState, HitMode, HitOutcome, Target, TargetRegistry};
pub use state::{GameEvent, GamePhase, GameState, ShotBudget, TimerAction};
pub use tick::{FireCommand, TickInput, fire, select_rebounds, tick};
pub use trajectory::{Shot, ShotTrace, TraceOptions, preview, trace_shot};
pub use world::{HitSource, StepEvent, World};
