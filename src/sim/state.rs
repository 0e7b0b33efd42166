//! Game state and core simulation types
//!
//! All state of a level in progress lives here. A fresh `GameState` is built
//! for every level start or restart, so nothing leaks between attempts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::{ExpireReason, Projectile};
use super::world::World;
use crate::level::Level;
use crate::muzzle_position;
use crate::profile::LauncherSkin;
use crate::tuning::SimTuning;

/// Current phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a shot
    Aiming,
    /// A projectile is in the air
    InFlight,
    /// Every target is down
    Complete,
    /// Out of ammo with targets left
    Failed,
}

/// Things the presentation layer reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted {
        level: usize,
        skin: LauncherSkin,
    },
    ProjectileFired {
        origin: Vec2,
        velocity: Vec2,
        rebounds: u32,
    },
    /// Emitted every tick while a projectile flies
    ProjectileMoved {
        pos: Vec2,
        vel: Vec2,
    },
    Rebound {
        pos: Vec2,
        remaining: u32,
    },
    TargetHit {
        target: u32,
        pos: Vec2,
        combo: u32,
        points: u64,
    },
    HazardDropped {
        hazard: u32,
    },
    HazardLanded {
        hazard: u32,
    },
    ProjectileExpired {
        pos: Vec2,
        reason: ExpireReason,
    },
    LevelComplete {
        ammo_remaining: u32,
        score: u64,
    },
    LevelFailed,
}

/// Ammo accounting. Ammo is spent as rebounds: a shot with `selected`
/// rebounds costs `selected` ammo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotBudget {
    pub total: u32,
    pub remaining: u32,
    pub selected: u32,
    /// Every shot uses all remaining ammo
    pub locked: bool,
}

impl ShotBudget {
    pub fn new(total: u32, locked: bool) -> Self {
        Self {
            total,
            remaining: total,
            selected: if locked { total } else { total.min(1) },
            locked,
        }
    }

    pub fn can_fire(&self) -> bool {
        self.selected > 0 && self.remaining >= self.selected
    }

    /// Choose rebounds for the next shot. Rejected when locked or out of
    /// `1..=remaining`.
    pub fn select(&mut self, rebounds: u32) -> bool {
        if self.locked || rebounds == 0 || rebounds > self.remaining {
            return false;
        }
        self.selected = rebounds;
        true
    }

    /// Take the cost of one shot, returning its rebound budget
    pub fn spend(&mut self) -> Option<u32> {
        if !self.can_fire() {
            return None;
        }
        self.remaining -= self.selected;
        Some(self.selected)
    }

    /// Keep the selection affordable after a shot
    pub fn clamp_selection(&mut self) {
        self.selected = if self.remaining == 0 {
            0
        } else if self.locked {
            self.remaining
        } else {
            self.selected.clamp(1, self.remaining)
        };
    }
}

/// Deferred actions, counted in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    LevelComplete,
    LevelFailed,
    RestoreTimeScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub action: TimerAction,
    pub ticks_left: u32,
}

/// Complete state of one level attempt (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Catalog index of the level
    pub level_index: usize,
    pub tuning: SimTuning,
    pub world: World,
    /// Muzzle the projectile leaves from
    pub muzzle: Vec2,
    pub projectile: Option<Projectile>,
    pub budget: ShotBudget,
    pub phase: GamePhase,
    pub score: u64,
    /// Hits by the current shot
    pub combo: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Multiplier on the physics step (slow motion)
    pub time_scale: f32,
    pub timers: Vec<Timer>,
    /// Events since the last `drain_events`
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Start `level` from scratch
    pub fn new(level_index: usize, level: &Level, tuning: &SimTuning, skin: LauncherSkin) -> Self {
        let world = World::from_level(level, tuning);
        log::info!(
            "Level {} start: {} targets, {} obstacles, {} hazards, {} ammo{}",
            level_index + 1,
            world.registry.targets.len(),
            world.obstacles.len(),
            world.registry.hazards.len(),
            level.ammo,
            if level.locked_ammo { " (locked)" } else { "" }
        );

        Self {
            level_index,
            tuning: tuning.clone(),
            world,
            muzzle: muzzle_position(level.launcher_pos()),
            projectile: None,
            budget: ShotBudget::new(level.ammo, level.locked_ammo),
            phase: GamePhase::Aiming,
            score: 0,
            combo: 0,
            time_ticks: 0,
            time_scale: 1.0,
            timers: Vec::new(),
            events: vec![GameEvent::LevelStarted {
                level: level_index,
                skin,
            }],
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Complete | GamePhase::Failed)
    }

    pub fn targets_remaining(&self) -> usize {
        self.world.registry.live_count()
    }

    /// Take the events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Schedule `action` unless it is already pending
    pub fn schedule(&mut self, action: TimerAction, ticks: u32) {
        if self.timers.iter().any(|t| t.action == action) {
            return;
        }
        self.timers.push(Timer {
            action,
            ticks_left: ticks,
        });
    }

    pub fn is_scheduled(&self, action: TimerAction) -> bool {
        self.timers.iter().any(|t| t.action == action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_spend_and_select() {
        let mut budget = ShotBudget::new(3, false);
        assert_eq!(budget.selected, 1);
        assert!(budget.select(2));
        assert_eq!(budget.spend(), Some(2));
        assert_eq!(budget.remaining, 1);

        // Only one left: two is no longer affordable
        assert!(!budget.can_fire());
        budget.clamp_selection();
        assert_eq!(budget.selected, 1);
        assert!(!budget.select(2));
        assert!(!budget.select(0));
        assert_eq!(budget.spend(), Some(1));

        budget.clamp_selection();
        assert_eq!(budget.remaining, 0);
        assert_eq!(budget.spend(), None);
    }

    #[test]
    fn test_locked_budget() {
        let mut budget = ShotBudget::new(20, true);
        assert_eq!(budget.selected, 20);
        assert!(!budget.select(5));
        assert_eq!(budget.spend(), Some(20));
        assert_eq!(budget.remaining, 0);
    }

    #[test]
    fn test_new_state_starts_clean() {
        let level = Level {
            ammo: 3,
            ..Default::default()
        };
        let mut state = GameState::new(4, &level, &SimTuning::default(), LauncherSkin::Mobster);
        assert_eq!(state.phase, GamePhase::Aiming);
        assert_eq!(state.time_scale, 1.0);
        assert!(state.timers.is_empty());
        assert_eq!(state.muzzle, Vec2::new(135.0, 605.0));
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::LevelStarted {
                level: 4,
                skin: LauncherSkin::Mobster
            }]
        );
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_schedule_once() {
        let level = Level::default();
        let mut state = GameState::new(0, &level, &SimTuning::default(), LauncherSkin::Hero);
        state.schedule(TimerAction::LevelFailed, 60);
        state.schedule(TimerAction::LevelFailed, 10);
        assert_eq!(state.timers.len(), 1);
        assert_eq!(state.timers[0].ticks_left, 60);
    }
}
