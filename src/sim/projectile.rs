//! The bolt in flight

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::SimTuning;

/// Why a projectile left play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpireReason {
    /// Rebounded more times than its budget allows
    ReboundLimit,
    /// Slowed below the stop speed
    Stalled,
    /// Flew longer than the flight time cap
    Timeout,
}

/// A fired bolt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Rebounds counted so far
    pub rebounds: u32,
    /// Rebounds allowed before the bolt is spent
    pub max_rebounds: u32,
    /// Seconds since launch (simulation time)
    pub flight_time: f32,
    /// Flight time of the last counted rebound
    pub last_rebound_at: Option<f32>,
}

impl Projectile {
    /// Fire from `origin` along `direction` with a pointer drag of `drag`.
    ///
    /// Returns `None` for a zero direction, a non-finite input, or a drag
    /// shorter than `tuning.min_drag`.
    pub fn launch(
        origin: Vec2,
        direction: Vec2,
        drag: f32,
        max_rebounds: u32,
        tuning: &SimTuning,
    ) -> Option<Self> {
        if !origin.is_finite() || !drag.is_finite() || drag < tuning.min_drag {
            return None;
        }
        let dir = direction.try_normalize()?;
        let speed = tuning.launch_speed(drag);
        if speed <= 0.0 {
            return None;
        }

        Some(Self {
            pos: origin,
            vel: dir * speed,
            radius: tuning.projectile_radius,
            rebounds: 0,
            max_rebounds,
            flight_time: 0.0,
            last_rebound_at: None,
        })
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Rebounds left before the bolt is spent
    #[inline]
    pub fn remaining_rebounds(&self) -> u32 {
        self.max_rebounds.saturating_sub(self.rebounds)
    }

    /// Has the bolt used up its rebound budget?
    #[inline]
    pub fn is_spent(&self) -> bool {
        self.rebounds > self.max_rebounds
    }

    /// Count a rebound unless one was already counted within `cooldown`
    /// seconds of flight time. Returns whether it was counted.
    pub fn register_rebound(&mut self, cooldown: f32) -> bool {
        if self
            .last_rebound_at
            .is_some_and(|last| self.flight_time - last < cooldown)
        {
            return false;
        }
        self.last_rebound_at = Some(self.flight_time);
        self.rebounds += 1;
        true
    }
}
