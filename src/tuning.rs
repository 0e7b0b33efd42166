//! Data-driven simulation tuning
//!
//! Every balance number the simulator and validator read lives here so a level
//! designer can override them from a JSON file without recompiling.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable naming a JSON tuning file
pub const TUNING_ENV_VAR: &str = "RICOCHET_TUNING";

/// Errors from loading a tuning file
#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tuning value `{name}` must be positive (got {value})")]
    NonPositive { name: &'static str, value: f32 },
}

/// Physics and rules constants for one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimTuning {
    /// Physics substeps per fixed tick
    pub substeps: u32,
    /// Projectile collision radius
    pub projectile_radius: f32,
    /// Drag distance is clamped to this before scaling into speed
    pub max_drag: f32,
    /// Drag-to-speed scale factor
    pub drag_speed_scale: f32,
    /// Hard cap on launch speed (prevents tunneling through thin obstacles)
    pub max_speed: f32,
    /// Shots with a shorter drag are rejected
    pub min_drag: f32,
    /// Projectile is destroyed once it moves slower than this
    pub stop_speed: f32,
    /// Speed kept after each rebound (1.0 = perfectly elastic)
    pub restitution: f32,
    /// Minimum simulated time between two counted rebounds (seconds)
    pub rebound_cooldown: f32,
    /// Flight time after which a projectile is force-expired (seconds)
    pub max_flight_secs: f32,
    /// Target hit-circle radius (larger than the sprite on purpose)
    pub target_radius: f32,
    /// Hazard body hit-circle radius
    pub hazard_radius: f32,
    /// Hazard rope hitbox width
    pub rope_width: f32,
    /// Time for a dropped hazard to reach the floor (seconds)
    pub hazard_fall_secs: f32,
    /// Y coordinate a falling hazard lands on
    pub hazard_floor_y: f32,
    /// Distance at which a falling hazard crushes a target
    pub hazard_crush_distance: f32,
    /// Hazard must have dropped this far before it can crush anything
    pub hazard_arm_drop: f32,
    /// Points for a hit, multiplied by the combo count
    pub points_per_hit: u64,
    /// Delay between the deciding event and level complete/failed (ticks)
    pub outcome_delay_ticks: u32,
    /// Time scale during the final-hit slow motion
    pub slow_motion_scale: f32,
    /// Slow motion duration (ticks)
    pub slow_motion_ticks: u32,
}

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            substeps: 2,
            projectile_radius: 5.0,
            max_drag: 200.0,
            drag_speed_scale: 4.0,
            max_speed: 600.0,
            min_drag: 20.0,
            stop_speed: 50.0,
            restitution: 1.0,
            rebound_cooldown: 0.15,
            max_flight_secs: 30.0,
            target_radius: 45.0,
            hazard_radius: 25.0,
            rope_width: 6.0,
            hazard_fall_secs: 0.8,
            hazard_floor_y: 600.0,
            hazard_crush_distance: 70.0,
            hazard_arm_drop: 50.0,
            points_per_hit: 100,
            outcome_delay_ticks: 60,
            slow_motion_scale: 0.3,
            slow_motion_ticks: 36,
        }
    }
}

impl SimTuning {
    /// Launch speed for a pointer drag of `drag` pixels
    pub fn launch_speed(&self, drag: f32) -> f32 {
        (drag.min(self.max_drag) * self.drag_speed_scale).min(self.max_speed)
    }

    /// Duration of one physics substep for a tick of `dt` seconds
    pub fn substep_dt(&self, dt: f32) -> f32 {
        dt / self.substeps.max(1) as f32
    }

    /// Parse tuning from JSON; omitted fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.check()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load from `RICOCHET_TUNING` if set and valid, otherwise defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(TUNING_ENV_VAR) {
            match Self::from_file(&path) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {path}");
                    return tuning;
                }
                Err(e) => log::warn!("Ignoring tuning file {path}: {e}"),
            }
        }
        Self::default()
    }

    fn check(&self) -> Result<(), TuningError> {
        let positive = [
            ("projectile_radius", self.projectile_radius),
            ("max_speed", self.max_speed),
            ("drag_speed_scale", self.drag_speed_scale),
            ("max_flight_secs", self.max_flight_secs),
            ("target_radius", self.target_radius),
            ("hazard_fall_secs", self.hazard_fall_secs),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(TuningError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_speed_is_capped() {
        let tuning = SimTuning::default();
        assert_eq!(tuning.launch_speed(50.0), 200.0);
        assert_eq!(tuning.launch_speed(150.0), 600.0);
        assert_eq!(tuning.launch_speed(10_000.0), 600.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = SimTuning::from_json(r#"{ "stop_speed": 80.0 }"#).unwrap();
        assert_eq!(tuning.stop_speed, 80.0);
        assert_eq!(tuning.max_speed, SimTuning::default().max_speed);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let err = SimTuning::from_json(r#"{ "max_speed": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::NonPositive { name: "max_speed", .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimTuning::from_file("/nonexistent/tuning.json").unwrap_err();
        assert!(matches!(err, TuningError::Io(_)));
    }

    #[test]
    fn test_substep_dt_never_divides_by_zero() {
        let tuning = SimTuning {
            substeps: 0,
            ..Default::default()
        };
        assert_eq!(tuning.substep_dt(0.01), 0.01);
    }
}
