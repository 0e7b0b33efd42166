//! Level definitions
//!
//! Levels are plain records in the same camelCase JSON shape the level editor
//! writes: `ammo`, `pandas`, `obstacles`, `movingObstacles`, `chandeliers`,
//! `lockedAmmo` plus presentation metadata. Optional arrays default to empty.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_OBSTACLE_H, DEFAULT_OBSTACLE_W, LAUNCHER};
use crate::sim::Arena;

/// Errors loading level data
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse level JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level pack contains no levels")]
    Empty,
}

/// A point in level data
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointDef {
    pub x: f32,
    pub y: f32,
}

impl PointDef {
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// A static bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDef {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_w")]
    pub w: f32,
    #[serde(default = "default_h")]
    pub h: f32,
    /// Degrees, clockwise on screen
    #[serde(default)]
    pub angle: f32,
}

impl ObstacleDef {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Width and height, with defaults standing in for missing or bad sizes
    pub fn size(&self) -> (f32, f32) {
        (or_default(self.w, DEFAULT_OBSTACLE_W), or_default(self.h, DEFAULT_OBSTACLE_H))
    }
}

/// A bar sliding back and forth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingObstacleDef {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_w")]
    pub w: f32,
    #[serde(default = "default_h")]
    pub h: f32,
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub move_y: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub offset: f32,
}

impl MovingObstacleDef {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> (f32, f32) {
        (or_default(self.w, DEFAULT_OBSTACLE_W), or_default(self.h, DEFAULT_OBSTACLE_H))
    }
}

fn default_w() -> f32 {
    DEFAULT_OBSTACLE_W
}

fn default_h() -> f32 {
    DEFAULT_OBSTACLE_H
}

fn default_speed() -> f32 {
    1.0
}

#[inline]
fn or_default(value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

/// One level
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Rebound budget for the whole level
    pub ammo: u32,
    #[serde(default)]
    pub pandas: Vec<PointDef>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
    #[serde(default)]
    pub moving_obstacles: Vec<MovingObstacleDef>,
    #[serde(default)]
    pub chandeliers: Vec<PointDef>,
    /// All ammo goes into a single shot
    #[serde(default)]
    pub locked_ammo: bool,
    #[serde(default)]
    pub tutorial: bool,
    #[serde(default)]
    pub challenge_level: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_text: Option<String>,
    /// Projectile bounds, defaults to the standard play field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arena: Option<Arena>,
    /// Launcher base, defaults to the bottom-left corner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launcher: Option<PointDef>,
}

impl Level {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn launcher_pos(&self) -> Vec2 {
        self.launcher.map_or(LAUNCHER, PointDef::to_vec2)
    }

    /// Title and blurb of a challenge level
    pub fn challenge(&self) -> Option<(&str, &str)> {
        if !self.challenge_level {
            return None;
        }
        Some((
            self.challenge_title.as_deref().unwrap_or_default(),
            self.challenge_text.as_deref().unwrap_or_default(),
        ))
    }
}

/// Parse a JSON array of levels
pub fn parse_levels(json: &str) -> Result<Vec<Level>, LevelError> {
    let levels: Vec<Level> = serde_json::from_str(json)?;
    if levels.is_empty() {
        return Err(LevelError::Empty);
    }
    Ok(levels)
}

/// Load a level pack from a JSON file
pub fn load_levels(path: &Path) -> Result<Vec<Level>, LevelError> {
    let contents = std::fs::read_to_string(path)?;
    let levels = parse_levels(&contents)?;
    log::info!("Loaded {} levels from {}", levels.len(), path.display());
    Ok(levels)
}

fn point(x: f32, y: f32) -> PointDef {
    PointDef { x, y }
}

fn bar(x: f32, y: f32, w: f32, h: f32, angle: f32) -> ObstacleDef {
    ObstacleDef { x, y, w, h, angle }
}

/// The levels that ship with the game
pub fn builtin_levels() -> Vec<Level> {
    vec![
        // Open shot
        Level {
            ammo: 3,
            tutorial: true,
            pandas: vec![point(900.0, 300.0)],
            ..Default::default()
        },
        // Wall with a gap at the top, chandelier over the panda
        Level {
            ammo: 3,
            pandas: vec![point(1000.0, 450.0)],
            obstacles: vec![bar(700.0, 420.0, 20.0, 420.0, 0.0)],
            chandeliers: vec![point(1000.0, 120.0)],
            ..Default::default()
        },
        // One shot, twenty ricochets
        Level {
            ammo: 20,
            locked_ammo: true,
            challenge_level: true,
            challenge_title: Some("THE ULTIMATE CHALLENGE".to_string()),
            challenge_text: Some("One shot. 20 ricochets. 4 pandas.\nCan you do it?".to_string()),
            pandas: vec![
                point(135.0, 156.0),
                point(1045.0, 128.0),
                point(804.0, 331.0),
                point(1081.0, 511.0),
            ],
            obstacles: vec![
                bar(394.0, 452.0, 20.0, 110.0, 0.0),
                bar(696.0, 529.0, 20.0, 210.0, 0.0),
                bar(599.0, 223.0, 20.0, 250.0, 0.0),
                bar(324.0, 253.0, 20.0, 160.0, 0.0),
                bar(167.0, 326.0, 20.0, 300.0, 90.0),
                bar(456.0, 501.0, 20.0, 110.0, 90.0),
                bar(894.0, 118.0, 20.0, 200.0, 0.0),
                bar(1081.0, 315.0, 20.0, 200.0, 90.0),
            ],
            ..Default::default()
        },
    ]
}
