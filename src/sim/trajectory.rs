//! Sandboxed shot tracing
//!
//! A trace runs a single shot through a private copy of the world in observe
//! mode: targets are never removed, so the trace records the lowest rebound
//! count at which each target would die. The validator sweeps this function
//! and the aim preview samples its path.

use glam::Vec2;

use super::projectile::{ExpireReason, Projectile};
use super::world::{StepEvent, World};
use crate::consts::SIM_DT;
use crate::tuning::SimTuning;

/// Aim preview horizon (3 seconds)
pub const PREVIEW_MAX_TICKS: u32 = 360;

/// A shot to trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub origin: Vec2,
    pub direction: Vec2,
    pub drag: f32,
    pub max_rebounds: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TraceOptions {
    pub max_ticks: u32,
    /// Keep the projectile position of every tick
    pub record_path: bool,
    /// Stop once every target has been hit and no hazard is still falling
    pub stop_when_all_hit: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            max_ticks: 1200,
            record_path: false,
            stop_when_all_hit: true,
        }
    }
}

/// Everything a traced shot did
#[derive(Debug, Clone, Default)]
pub struct ShotTrace {
    /// Per target id, the rebound count at which it was first hit
    pub kills: Vec<Option<u32>>,
    /// Counted rebounds
    pub rebounds: u32,
    /// Where each counted rebound happened
    pub bounces: Vec<Vec2>,
    /// Projectile positions, one per tick, when recorded
    pub path: Vec<Vec2>,
    pub expired: Option<ExpireReason>,
    pub ticks: u32,
}

impl ShotTrace {
    /// Targets a shot with a rebound budget of `budget` would destroy
    pub fn hits_within(&self, budget: u32) -> Vec<u32> {
        self.kills
            .iter()
            .zip(0u32..)
            .filter_map(|(kill, id)| kill.filter(|&k| k <= budget).map(|_| id))
            .collect()
    }

    pub fn all_hit(&self) -> bool {
        self.kills.iter().all(Option::is_some)
    }
}

/// Trace `shot` through a copy of `world`. `None` if the shot is rejected at
/// launch.
pub fn trace_shot(
    world: &World,
    shot: &Shot,
    tuning: &SimTuning,
    options: &TraceOptions,
) -> Option<ShotTrace> {
    let mut projectile = Some(Projectile::launch(
        shot.origin,
        shot.direction,
        shot.drag,
        shot.max_rebounds,
        tuning,
    )?);
    let mut sandbox = world.observing();
    let mut trace = ShotTrace {
        kills: vec![None; sandbox.registry.targets.len()],
        ..Default::default()
    };
    if options.record_path {
        trace.path.push(shot.origin);
    }

    while trace.ticks < options.max_ticks {
        let events = sandbox.advance(&mut projectile, SIM_DT, tuning);
        trace.ticks += 1;

        for event in events {
            match event {
                StepEvent::Rebound { pos, .. } => {
                    trace.rebounds += 1;
                    trace.bounces.push(pos);
                }
                StepEvent::TargetHit {
                    target, rebounds, ..
                } => {
                    if let Some(kill) = trace.kills.get_mut(target as usize) {
                        *kill = Some(kill.map_or(rebounds, |k| k.min(rebounds)));
                    }
                }
                StepEvent::ProjectileExpired { pos, reason } => {
                    trace.expired = Some(reason);
                    if options.record_path {
                        trace.path.push(pos);
                    }
                }
                StepEvent::HazardDropped { .. } | StepEvent::HazardLanded { .. } => {}
            }
        }

        if let (true, Some(p)) = (options.record_path, projectile.as_ref()) {
            trace.path.push(p.pos);
        }
        // A falling hazard may still crush a target at a lower rebound count
        if options.stop_when_all_hit && trace.all_hit() && !sandbox.registry.any_falling() {
            break;
        }
        if sandbox.is_settled(projectile.as_ref()) {
            break;
        }
    }

    Some(trace)
}

/// Where a shot would go: path and bounce points over the preview horizon
pub fn preview(world: &World, shot: &Shot, tuning: &SimTuning) -> Option<ShotTrace> {
    trace_shot(
        world,
        shot,
        tuning,
        &TraceOptions {
            max_ticks: PREVIEW_MAX_TICKS,
            record_path: true,
            stop_when_all_hit: false,
        },
    )
}
