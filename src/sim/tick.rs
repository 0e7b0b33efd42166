//! Fixed timestep simulation tick
//!
//! Core game loop that advances a level deterministically: commands first,
//! then one world step, then the deferred timers.

use glam::Vec2;

use super::projectile::Projectile;
use super::state::{GameEvent, GamePhase, GameState, TimerAction};
use super::world::StepEvent;

/// A shot request from the input layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireCommand {
    pub origin: Vec2,
    pub direction: Vec2,
    pub drag_distance: f32,
}

impl FireCommand {
    /// Shoot from `origin` toward the pointer; the pointer's distance is the
    /// drag
    pub fn toward(origin: Vec2, pointer: Vec2) -> Self {
        Self {
            origin,
            direction: pointer - origin,
            drag_distance: origin.distance(pointer),
        }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Fire a shot
    pub fire: Option<FireCommand>,
    /// Rebounds for the next shot
    pub select_rebounds: Option<u32>,
}

/// Launch a projectile. Returns false (and changes nothing) when the shot is
/// not allowed.
pub fn fire(state: &mut GameState, command: &FireCommand) -> bool {
    if state.phase != GamePhase::Aiming
        || state.projectile.is_some()
        || state.world.registry.is_cleared()
        || !state.budget.can_fire()
    {
        log::debug!("Fire rejected in {:?}", state.phase);
        return false;
    }

    let Some(projectile) = Projectile::launch(
        command.origin,
        command.direction,
        command.drag_distance,
        state.budget.selected,
        &state.tuning,
    ) else {
        log::debug!("Fire rejected: degenerate aim {:?}", command);
        return false;
    };
    let Some(rebounds) = state.budget.spend() else {
        return false;
    };

    state.events.push(GameEvent::ProjectileFired {
        origin: projectile.pos,
        velocity: projectile.vel,
        rebounds,
    });
    state.projectile = Some(projectile);
    state.phase = GamePhase::InFlight;
    true
}

/// Choose the rebound budget of the next shot
pub fn select_rebounds(state: &mut GameState, rebounds: u32) -> bool {
    let accepted = state.budget.select(rebounds);
    if !accepted {
        log::debug!(
            "Rebound selection {} rejected ({} remaining, locked: {})",
            rebounds,
            state.budget.remaining,
            state.budget.locked
        );
    }
    accepted
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.is_finished() {
        return;
    }
    state.time_ticks += 1;

    if let Some(rebounds) = input.select_rebounds {
        select_rebounds(state, rebounds);
    }
    if let Some(command) = &input.fire {
        fire(state, command);
    }

    let scaled_dt = dt * state.time_scale;
    let step = state
        .world
        .advance(&mut state.projectile, scaled_dt, &state.tuning);

    for event in step {
        match event {
            StepEvent::Rebound { pos, remaining } => {
                state.events.push(GameEvent::Rebound { pos, remaining });
            }
            StepEvent::HazardDropped { hazard, .. } => {
                log::debug!("Hazard {} dropped", hazard);
                state.events.push(GameEvent::HazardDropped { hazard });
            }
            StepEvent::TargetHit {
                target,
                removed,
                cleared,
                ..
            } => {
                if removed {
                    on_target_hit(state, target, cleared);
                }
            }
            StepEvent::HazardLanded { hazard } => {
                state.events.push(GameEvent::HazardLanded { hazard });
            }
            StepEvent::ProjectileExpired { pos, reason } => {
                log::debug!("Projectile expired at {:?}: {:?}", pos, reason);
                state.events.push(GameEvent::ProjectileExpired { pos, reason });
                on_projectile_destroyed(state);
            }
        }
    }

    if let Some(p) = &state.projectile {
        state.events.push(GameEvent::ProjectileMoved {
            pos: p.pos,
            vel: p.vel,
        });
    }

    run_timers(state);
}

fn on_target_hit(state: &mut GameState, target: u32, cleared: bool) {
    state.combo += 1;
    let points = state.tuning.points_per_hit * u64::from(state.combo);
    state.score += points;

    let pos = state
        .world
        .registry
        .target(target)
        .map_or(Vec2::ZERO, |t| t.pos);
    state.events.push(GameEvent::TargetHit {
        target,
        pos,
        combo: state.combo,
        points,
    });

    if cleared {
        // Final hit plays out in slow motion
        state.time_scale = state.tuning.slow_motion_scale;
        state.schedule(TimerAction::RestoreTimeScale, state.tuning.slow_motion_ticks);
        state.schedule(TimerAction::LevelComplete, state.tuning.outcome_delay_ticks);
    }
}

fn on_projectile_destroyed(state: &mut GameState) {
    state.combo = 0;
    state.budget.clamp_selection();
    if state.phase == GamePhase::InFlight {
        state.phase = GamePhase::Aiming;
    }

    if state.budget.remaining == 0 && !state.world.registry.is_cleared() {
        state.schedule(TimerAction::LevelFailed, state.tuning.outcome_delay_ticks);
    }
}

fn run_timers(state: &mut GameState) {
    let mut due = Vec::new();
    state.timers.retain_mut(|timer| {
        timer.ticks_left = timer.ticks_left.saturating_sub(1);
        if timer.ticks_left == 0 {
            due.push(timer.action);
            false
        } else {
            true
        }
    });

    for action in due {
        match action {
            TimerAction::RestoreTimeScale => state.time_scale = 1.0,
            TimerAction::LevelComplete => {
                if state.is_finished() {
                    continue;
                }
                state.phase = GamePhase::Complete;
                state.projectile = None;
                state.timers.clear();
                log::info!(
                    "Level {} complete: score {}, {} ammo left",
                    state.level_index + 1,
                    state.score,
                    state.budget.remaining
                );
                state.events.push(GameEvent::LevelComplete {
                    ammo_remaining: state.budget.remaining,
                    score: state.score,
                });
            }
            TimerAction::LevelFailed => {
                if state.is_finished() || state.world.registry.is_cleared() {
                    continue;
                }
                // A hazard still on its way down may yet finish the level
                if state.world.registry.any_falling() {
                    state.schedule(TimerAction::LevelFailed, state.tuning.outcome_delay_ticks);
                    continue;
                }
                state.phase = GamePhase::Failed;
                state.timers.clear();
                log::info!(
                    "Level {} failed: {} targets left",
                    state.level_index + 1,
                    state.targets_remaining()
                );
                state.events.push(GameEvent::LevelFailed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::level::{Level, ObstacleDef, PointDef};
    use crate::profile::LauncherSkin;
    use crate::tuning::SimTuning;

    const MUZZLE: Vec2 = Vec2::new(135.0, 605.0);

    fn start(level: &Level) -> GameState {
        GameState::new(0, level, &SimTuning::default(), LauncherSkin::Hero)
    }

    fn level_with_target(x: f32, y: f32) -> Level {
        Level {
            ammo: 3,
            pandas: vec![PointDef { x, y }],
            ..Default::default()
        }
    }

    fn fire_input(toward: Vec2) -> TickInput {
        TickInput {
            fire: Some(FireCommand {
                origin: MUZZLE,
                direction: toward - MUZZLE,
                drag_distance: 200.0,
            }),
            ..Default::default()
        }
    }

    /// Tick until the phase leaves `InFlight` (or the state finishes)
    fn run_shot(state: &mut GameState, input: &TickInput) -> Vec<GameEvent> {
        tick(state, input, SIM_DT);
        let mut events = state.drain_events();
        for _ in 0..5000 {
            if state.phase != GamePhase::InFlight {
                break;
            }
            tick(state, &TickInput::default(), SIM_DT);
            events.extend(state.drain_events());
        }
        events
    }

    fn run_until_finished(state: &mut GameState) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..1000 {
            if state.is_finished() {
                break;
            }
            tick(state, &TickInput::default(), SIM_DT);
            events.extend(state.drain_events());
        }
        events
    }

    #[test]
    fn test_open_shot_completes_level() {
        let mut state = start(&level_with_target(900.0, 300.0));
        let mut events = run_shot(&mut state, &fire_input(Vec2::new(900.0, 300.0)));
        events.extend(run_until_finished(&mut state));

        assert_eq!(state.phase, GamePhase::Complete);
        assert!(events.contains(&GameEvent::TargetHit {
            target: 0,
            pos: Vec2::new(900.0, 300.0),
            combo: 1,
            points: 100,
        }));
        assert!(events.contains(&GameEvent::LevelComplete {
            ammo_remaining: 2,
            score: 100,
        }));
        assert!(state.projectile.is_none());
    }

    #[test]
    fn test_bank_shot_around_wall() {
        let mut level = level_with_target(1000.0, 200.0);
        level.obstacles.push(ObstacleDef {
            x: 700.0,
            y: 325.0,
            w: 20.0,
            h: 350.0,
            angle: 0.0,
        });
        let mut state = start(&level);

        // Straight at it: the wall is in the way
        let events = run_shot(&mut state, &fire_input(Vec2::new(1000.0, 200.0)));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::TargetHit { .. })));
        assert_eq!(state.budget.remaining, 2);

        // Off the top wall instead
        let mut events = run_shot(&mut state, &fire_input(Vec2::new(1000.0, -130.0)));
        events.extend(run_until_finished(&mut state));
        assert!(events.iter().any(|e| matches!(e, GameEvent::TargetHit { target: 0, .. })));
        assert_eq!(state.phase, GamePhase::Complete);
        assert_eq!(state.budget.remaining, 1);
    }

    #[test]
    fn test_three_misses_fail_level() {
        let mut state = start(&level_with_target(1000.0, 200.0));
        let miss = fire_input(Vec2::new(0.0, 605.0));

        for shot in 0..3 {
            let events = run_shot(&mut state, &miss);
            assert!(
                events.iter().any(|e| matches!(e, GameEvent::ProjectileExpired { .. })),
                "shot {} expired",
                shot
            );
            assert_eq!(state.budget.remaining, 2 - shot);
        }

        assert_eq!(state.budget.remaining, 0);
        assert!(state.is_scheduled(TimerAction::LevelFailed));
        let events = run_until_finished(&mut state);
        assert_eq!(state.phase, GamePhase::Failed);
        assert!(events.contains(&GameEvent::LevelFailed));

        // Nothing more happens once the level is over
        tick(&mut state, &miss, SIM_DT);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_rebound_events_count_down() {
        let mut state = start(&level_with_target(1000.0, 200.0));
        let events = run_shot(&mut state, &fire_input(Vec2::new(0.0, 605.0)));
        let remaining: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Rebound { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(remaining, vec![0, 0]);
    }

    #[test]
    fn test_fire_rejected_while_in_flight() {
        let mut state = start(&level_with_target(1000.0, 200.0));
        let input = fire_input(Vec2::new(0.0, 605.0));

        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.budget.remaining, 2);
        assert_eq!(state.phase, GamePhase::InFlight);

        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.budget.remaining, 2);
    }

    #[test]
    fn test_fire_rejected_for_short_drag() {
        let mut state = start(&level_with_target(1000.0, 200.0));
        let command = FireCommand::toward(MUZZLE, MUZZLE + Vec2::new(10.0, 0.0));
        assert!(!fire(&mut state, &command));
        assert_eq!(state.budget.remaining, 3);
        assert_eq!(state.phase, GamePhase::Aiming);
        assert!(state.drain_events().iter().all(|e| !matches!(e, GameEvent::ProjectileFired { .. })));
    }

    #[test]
    fn test_select_rebounds() {
        let mut state = start(&level_with_target(1000.0, 200.0));
        assert!(!select_rebounds(&mut state, 4));
        assert!(select_rebounds(&mut state, 3));
        assert_eq!(state.budget.selected, 3);

        let mut locked = start(&Level {
            ammo: 20,
            locked_ammo: true,
            ..level_with_target(1000.0, 200.0)
        });
        assert!(!select_rebounds(&mut locked, 1));
        assert_eq!(locked.budget.selected, 20);
    }

    #[test]
    fn test_selection_clamped_after_shot() {
        let mut state = start(&level_with_target(1000.0, 200.0));
        let input = TickInput {
            select_rebounds: Some(2),
            ..fire_input(Vec2::new(0.0, 605.0))
        };
        run_shot(&mut state, &input);
        assert_eq!(state.budget.remaining, 1);
        assert_eq!(state.budget.selected, 1);
    }

    #[test]
    fn test_final_hit_slow_motion() {
        let mut state = start(&level_with_target(900.0, 300.0));
        tick(&mut state, &fire_input(Vec2::new(900.0, 300.0)), SIM_DT);

        let mut ticks = 0;
        while state.time_scale == 1.0 && ticks < 1000 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            ticks += 1;
        }
        assert_eq!(state.time_scale, 0.3);
        for _ in 0..state.tuning.slow_motion_ticks {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.time_scale, 1.0);
        assert!(!state.is_finished(), "outcome delay outlasts slow motion");
    }

    #[test]
    fn test_determinism() {
        let level = level_with_target(1000.0, 200.0);
        let mut a = start(&level);
        let mut b = start(&level);
        let inputs = [
            TickInput::default(),
            fire_input(Vec2::new(700.0, 100.0)),
            TickInput::default(),
        ];

        for _ in 0..300 {
            for input in &inputs {
                tick(&mut a, input, SIM_DT);
                tick(&mut b, input, SIM_DT);
            }
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.drain_events(), b.drain_events());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(48))]

            #[test]
            fn test_shot_always_terminates_inside_arena(
                angle in -180.0f32..180.0,
                drag in 20.0f32..400.0,
                rebounds in 1u32..=3,
            ) {
                let mut level = level_with_target(1000.0, 200.0);
                level.obstacles.push(ObstacleDef { x: 600.0, y: 325.0, w: 20.0, h: 300.0, angle: 30.0 });
                let mut state = start(&level);
                state.budget.select(rebounds);

                let input = TickInput {
                    fire: Some(FireCommand {
                        origin: MUZZLE,
                        direction: crate::direction_from_degrees(angle),
                        drag_distance: drag,
                    }),
                    ..Default::default()
                };
                tick(&mut state, &input, SIM_DT);

                let arena = state.world.arena;
                let limit = (state.tuning.max_flight_secs / SIM_DT) as u32 + 10;
                let mut ticks = 0;
                while state.projectile.is_some() {
                    let p = state.projectile.as_ref().unwrap();
                    prop_assert!(arena.contains(p.pos), "escaped to {:?}", p.pos);
                    prop_assert!(p.rebounds <= p.max_rebounds + 1);
                    prop_assert!(ticks < limit, "never terminated");
                    tick(&mut state, &TickInput::default(), SIM_DT);
                    ticks += 1;
                }
            }

            #[test]
            fn test_locked_full_budget_shot_terminates(
                angle in -180.0f32..180.0,
                drag in 20.0f32..400.0,
            ) {
                // No obstacles and lossless walls: only the rebound limit or
                // the flight timeout can end this shot
                let level = Level {
                    ammo: 20,
                    locked_ammo: true,
                    ..level_with_target(1000.0, 200.0)
                };
                let mut state = start(&level);
                prop_assert_eq!(state.tuning.restitution, 1.0);
                prop_assert_eq!(state.budget.selected, 20);

                let input = TickInput {
                    fire: Some(FireCommand {
                        origin: MUZZLE,
                        direction: crate::direction_from_degrees(angle),
                        drag_distance: drag,
                    }),
                    ..Default::default()
                };
                tick(&mut state, &input, SIM_DT);

                let arena = state.world.arena;
                // Slow motion stretches the flight clock after the last hit
                let limit = (state.tuning.max_flight_secs / SIM_DT) as u32
                    + state.tuning.slow_motion_ticks
                    + 10;
                let mut ticks = 0;
                while let Some(p) = state.projectile.as_ref() {
                    prop_assert!(arena.contains(p.pos), "escaped to {:?}", p.pos);
                    prop_assert!(p.rebounds <= 21);
                    prop_assert!(ticks < limit, "never terminated");
                    tick(&mut state, &TickInput::default(), SIM_DT);
                    ticks += 1;
                }
            }

            #[test]
            fn test_rejected_fire_leaves_ammo(drag in 0.0f32..19.9) {
                let mut state = start(&level_with_target(1000.0, 200.0));
                let command = FireCommand { origin: MUZZLE, direction: Vec2::X, drag_distance: drag };
                prop_assert!(!fire(&mut state, &command));
                prop_assert_eq!(state.budget.remaining, 3);
            }
        }
    }
}
