//! Level progression around a running game
//!
//! `GameSession` owns the level catalog, the player profile and the state of
//! the level being played. Restarting or skipping builds a fresh `GameState`,
//! which drops any projectile, timers and slow motion from the old attempt.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::level::{Level, LevelError};
use crate::profile::PlayerProfile;
use crate::sim::{FireCommand, GameEvent, GamePhase, GameState, TickInput, tick};
use crate::tuning::SimTuning;

pub struct GameSession {
    levels: Vec<Level>,
    pub profile: PlayerProfile,
    pub tuning: SimTuning,
    pub state: GameState,
    /// One-shot commands waiting for the next tick
    input: TickInput,
    accumulator: f32,
}

impl GameSession {
    /// Start at the first level of `levels`
    pub fn new(
        levels: Vec<Level>,
        profile: PlayerProfile,
        tuning: SimTuning,
    ) -> Result<Self, LevelError> {
        let first = levels.first().ok_or(LevelError::Empty)?;
        let state = GameState::new(0, first, &tuning, profile.skin);
        Ok(Self {
            levels,
            profile,
            tuning,
            state,
            input: TickInput::default(),
            accumulator: 0.0,
        })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level_index(&self) -> usize {
        self.state.level_index
    }

    pub fn current_level(&self) -> &Level {
        &self.levels[self.state.level_index]
    }

    /// Queue a shot for the next tick
    pub fn fire(&mut self, command: FireCommand) {
        self.input.fire = Some(command);
    }

    /// Queue a rebound selection for the next tick
    pub fn select_rebounds(&mut self, rebounds: u32) {
        self.input.select_rebounds = Some(rebounds);
    }

    /// Start the current level over
    pub fn restart_level(&mut self) {
        self.load(self.state.level_index);
    }

    /// Jump to level `index` (0-based), clamped to the catalog. Returns the
    /// level actually loaded.
    pub fn skip_to_level(&mut self, index: usize) -> usize {
        let index = index.min(self.levels.len() - 1);
        self.load(index);
        index
    }

    /// Move on after a completed level. False if this was the last one or the
    /// level is not complete.
    pub fn next_level(&mut self) -> bool {
        let next = self.state.level_index + 1;
        if self.state.phase != GamePhase::Complete || next >= self.levels.len() {
            return false;
        }
        self.load(next);
        true
    }

    fn load(&mut self, index: usize) {
        self.state = GameState::new(index, &self.levels[index], &self.tuning, self.profile.skin);
        self.input = TickInput::default();
        self.accumulator = 0.0;
    }

    /// Run as many fixed ticks as `frame_dt` covers and return what happened
    pub fn update(&mut self, frame_dt: f32) -> Vec<GameEvent> {
        let dt = frame_dt.clamp(0.0, 0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = std::mem::take(&mut self.input);
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        self.state.drain_events()
    }
}
