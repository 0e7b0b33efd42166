//! Level solvability validator
//!
//! Sweeps a grid of launch angles, powers and rebound budgets through the same
//! trajectory simulation the game uses. A target no combination can hit makes
//! the level unsolvable. Otherwise a greedy cover (most targets per shot
//! first) estimates how much ammo a player needs.
//!
//! Each (angle, power) pair is traced once at the largest budget. Since the
//! path up to the n-th rebound does not depend on the budget, a target counts
//! for budget `b` exactly when it died at rebound count `<= b`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::direction_from_degrees;
use crate::level::Level;
use crate::muzzle_position;
use crate::sim::{Shot, TraceOptions, World, trace_shot};
use crate::tuning::SimTuning;

/// The grid to sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub angle_min_deg: f32,
    pub angle_max_deg: f32,
    pub angle_step_deg: f32,
    pub power_min: f32,
    pub power_max: f32,
    pub power_step: f32,
    /// Largest rebound budget tried on unlocked levels
    pub max_budget: u32,
    /// Flight time cap per trial, in ticks
    pub max_ticks: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            angle_min_deg: -80.0,
            angle_max_deg: 80.0,
            angle_step_deg: 2.0,
            power_min: 50.0,
            power_max: 200.0,
            power_step: 10.0,
            max_budget: 5,
            max_ticks: 1200,
        }
    }
}

/// Inclusive range `min..=max` in steps of `step`
fn grid(min: f32, max: f32, step: f32) -> Vec<f32> {
    if step <= 0.0 || max < min {
        return vec![min];
    }
    let count = ((max - min) / step + 1e-4).floor() as u32 + 1;
    (0..count).map(|i| min + i as f32 * step).collect()
}

/// One shot that destroys at least one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSolution {
    pub angle_deg: f32,
    pub power: f32,
    pub rebounds: u32,
    /// Target ids destroyed
    pub hits: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnreachableTarget {
    pub id: u32,
    pub pos: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub solvable: bool,
    pub unreachable_targets: Vec<UnreachableTarget>,
    /// Greedy estimate of ammo needed
    pub estimated_ammo: u32,
    /// Greedy estimate of shots needed
    pub estimated_shots: u32,
    /// Ammo the level gives
    pub ammo: u32,
    pub solutions_found: usize,
    pub best_multi_kill: Option<ShotSolution>,
}

impl ValidationReport {
    /// The greedy estimate needs more ammo than the level gives
    pub fn over_budget(&self) -> bool {
        self.estimated_ammo > self.ammo
    }
}

/// Validate with the default sweep
pub fn validate(level: &Level, tuning: &SimTuning) -> ValidationReport {
    validate_with(level, tuning, &SweepConfig::default())
}

pub fn validate_with(level: &Level, tuning: &SimTuning, sweep: &SweepConfig) -> ValidationReport {
    let world = World::from_level(level, tuning);
    let origin = muzzle_position(level.launcher_pos());
    let target_count = world.registry.targets.len();

    let budgets: Vec<u32> = if level.locked_ammo {
        if level.ammo > 0 { vec![level.ammo] } else { Vec::new() }
    } else {
        (1..=level.ammo.min(sweep.max_budget)).collect()
    };

    let mut solutions = Vec::new();
    let mut hit_counts = vec![0u32; target_count];

    if let Some(&max_budget) = budgets.last() {
        let options = TraceOptions {
            max_ticks: sweep.max_ticks,
            record_path: false,
            stop_when_all_hit: true,
        };

        for angle_deg in grid(sweep.angle_min_deg, sweep.angle_max_deg, sweep.angle_step_deg) {
            for power in grid(sweep.power_min, sweep.power_max, sweep.power_step) {
                let shot = Shot {
                    origin,
                    direction: direction_from_degrees(angle_deg),
                    drag: power,
                    max_rebounds: max_budget,
                };
                let Some(trace) = trace_shot(&world, &shot, tuning, &options) else {
                    continue;
                };

                for &rebounds in &budgets {
                    let hits = trace.hits_within(rebounds);
                    if hits.is_empty() {
                        continue;
                    }
                    for &id in &hits {
                        hit_counts[id as usize] += 1;
                    }
                    solutions.push(ShotSolution {
                        angle_deg,
                        power,
                        rebounds,
                        hits,
                    });
                }
            }
        }
    }

    let unreachable_targets: Vec<UnreachableTarget> = world
        .registry
        .targets
        .iter()
        .filter(|t| hit_counts[t.id as usize] == 0)
        .map(|t| UnreachableTarget { id: t.id, pos: t.pos })
        .collect();

    // Most targets first, cheaper shots breaking ties
    solutions.sort_by(|a, b| b.hits.len().cmp(&a.hits.len()).then(a.rebounds.cmp(&b.rebounds)));
    let (estimated_shots, estimated_ammo) = if unreachable_targets.is_empty() {
        greedy_cover(&solutions, target_count)
    } else {
        (0, 0)
    };

    ValidationReport {
        solvable: unreachable_targets.is_empty(),
        unreachable_targets,
        estimated_ammo,
        estimated_shots,
        ammo: level.ammo,
        solutions_found: solutions.len(),
        best_multi_kill: solutions.iter().find(|s| s.hits.len() > 1).cloned(),
    }
}

/// Pick shots from `sorted` until every target is covered. Returns
/// `(shots, ammo)`.
fn greedy_cover(sorted: &[ShotSolution], target_count: usize) -> (u32, u32) {
    let mut covered = vec![false; target_count];
    let mut remaining = target_count;
    let mut shots = 0;
    let mut ammo = 0;

    for solution in sorted {
        if remaining == 0 {
            break;
        }
        let mut new_kill = false;
        for &id in &solution.hits {
            match covered.get_mut(id as usize) {
                Some(slot) if !*slot => {
                    *slot = true;
                    remaining -= 1;
                    new_kill = true;
                }
                _ => {}
            }
        }
        if new_kill {
            shots += 1;
            ammo += solution.rebounds;
        }
    }

    (shots, ammo)
}

/// Summary over a whole catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogReport {
    pub reports: Vec<ValidationReport>,
    pub passed: usize,
    pub failed: usize,
}

impl CatalogReport {
    pub fn all_solvable(&self) -> bool {
        self.failed == 0
    }
}

pub fn validate_all(levels: &[Level], tuning: &SimTuning, sweep: &SweepConfig) -> CatalogReport {
    let mut catalog = CatalogReport::default();
    for (index, level) in levels.iter().enumerate() {
        let report = validate_with(level, tuning, sweep);
        log_report(index, &report);
        if report.solvable {
            catalog.passed += 1;
        } else {
            catalog.failed += 1;
        }
        catalog.reports.push(report);
    }
    log::info!(
        "Results: {} passed, {} failed out of {} levels",
        catalog.passed,
        catalog.failed,
        levels.len()
    );
    catalog
}

/// Log one level's result
pub fn log_report(index: usize, report: &ValidationReport) {
    log::info!("Level {}: {} ammo", index + 1, report.ammo);

    if !report.solvable {
        log::warn!(
            "Level {} impossible: {} target(s) cannot be hit",
            index + 1,
            report.unreachable_targets.len()
        );
        for target in &report.unreachable_targets {
            log::warn!("  target #{} at ({}, {})", target.id + 1, target.pos.x, target.pos.y);
        }
        return;
    }

    if report.over_budget() {
        log::warn!(
            "Level {} may need {} ammo but only {} given ({} shots)",
            index + 1,
            report.estimated_ammo,
            report.ammo,
            report.estimated_shots
        );
    }
    log::info!(
        "Level {} solvable: {} shot combinations, ~{} shots, ammo {}/{}",
        index + 1,
        report.solutions_found,
        report.estimated_shots,
        report.estimated_ammo,
        report.ammo
    );
    if let Some(best) = &report.best_multi_kill {
        log::info!(
            "  best multi-kill: angle {}°, power {}, {} rebounds -> {} targets",
            best.angle_deg,
            best.power,
            best.rebounds,
            best.hits.len()
        );
    }
}
