//! Ricochet - bolt-and-pandas puzzle game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, collisions, targets, game state)
//! - `level`: Level definitions, JSON packs and the built-in catalog
//! - `validator`: Brute-force solvability checking of levels
//! - `session`: Level progression around a running game state
//! - `profile`: Player preferences handed to each level
//! - `tuning`: Data-driven physics and scoring balance

pub mod level;
pub mod profile;
pub mod session;
pub mod sim;
pub mod tuning;
pub mod validator;

pub use level::{Level, LevelError};
pub use profile::{LauncherSkin, PlayerProfile};
pub use session::GameSession;
pub use tuning::{SimTuning, TuningError};
pub use validator::{ValidationReport, validate};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Play field dimensions
    pub const ARENA_WIDTH: f32 = 1200.0;
    pub const ARENA_HEIGHT: f32 = 650.0;
    /// Drawn wall thickness
    pub const WALL_THICKNESS: f32 = 20.0;
    /// Distance from the field edge to the projectile-centre bounds
    pub const ARENA_INSET: f32 = 35.0;

    /// Launcher base position
    pub const LAUNCHER: Vec2 = Vec2::new(100.0, 630.0);
    /// Muzzle position relative to the launcher base
    pub const MUZZLE_OFFSET: Vec2 = Vec2::new(35.0, -25.0);

    /// Obstacle size when a level omits it
    pub const DEFAULT_OBSTACLE_W: f32 = 20.0;
    pub const DEFAULT_OBSTACLE_H: f32 = 100.0;

    /// Distance between segment colliders along a rotated bar
    pub const SEGMENT_SPACING: f32 = 10.0;
    /// How much wider each segment is than the bar is thick
    pub const SEGMENT_OVERLAP: f32 = 15.0;
    /// Thickness-to-length ratio of the bamboo artwork
    pub const BAMBOO_ASPECT: f32 = 70.0 / 3390.0;
    /// Thinnest hitbox a moving bar may have
    pub const MIN_MOVING_THICKNESS: f32 = 20.0;
    /// Longest a rotated bar can be; anything beyond already spans the arena
    pub const MAX_BAR_LENGTH: f32 = 2.0 * ARENA_WIDTH;
}

/// Where bolts leave the launcher at `base`
#[inline]
pub fn muzzle_position(base: Vec2) -> Vec2 {
    base + consts::MUZZLE_OFFSET
}

/// Unit direction for an angle in degrees, 0° pointing right and positive
/// angles turning clockwise on screen (y grows downward)
#[inline]
pub fn direction_from_degrees(deg: f32) -> Vec2 {
    let rad = deg.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}
