//! The physical world of a level and its per-tick update
//!
//! One `advance` call is one dispatch step: obstacles move first, then the
//! projectile is integrated in substeps (walls, obstacles, hazards, targets,
//! termination), then falling hazards update. Everything that happened comes
//! back as a list of `StepEvent`s in that order.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Circle, arena_reflect, obstacle_collision, reflect_velocity};
use super::geometry::{Arena, Motion, Obstacle};
use super::projectile::{ExpireReason, Projectile};
use super::registry::{HitMode, TargetRegistry};
use crate::level::Level;
use crate::tuning::SimTuning;

/// What killed a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitSource {
    Projectile,
    Hazard(u32),
}

/// Something that happened during `World::advance`
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A counted rebound
    Rebound { pos: Vec2, remaining: u32 },
    /// A hanging hazard was knocked down
    HazardDropped { hazard: u32, rebounds: u32 },
    /// A live target was hit
    TargetHit {
        target: u32,
        source: HitSource,
        /// Projectile rebounds that led to the kill
        rebounds: u32,
        removed: bool,
        cleared: bool,
    },
    /// A falling hazard reached the floor
    HazardLanded { hazard: u32 },
    /// The projectile left play
    ProjectileExpired { pos: Vec2, reason: ExpireReason },
}

/// Arena, obstacles, targets and hazards of one level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub arena: Arena,
    pub obstacles: Vec<Obstacle>,
    pub registry: TargetRegistry,
    /// Level time driving moving obstacles
    pub time: f32,
}

impl World {
    pub fn from_level(level: &Level, tuning: &SimTuning) -> Self {
        let mut obstacles: Vec<Obstacle> = level
            .obstacles
            .iter()
            .map(|o| {
                let (w, h) = o.size();
                Obstacle::new(o.center(), w, h, o.angle)
            })
            .collect();

        obstacles.extend(level.moving_obstacles.iter().map(|m| {
            let (w, h) = m.size();
            let motion = Motion {
                base: m.center(),
                amplitude: Vec2::new(m.move_x, m.move_y),
                speed: m.speed,
                phase: m.offset,
            };
            Obstacle::moving(m.center(), w, h, motion)
        }));

        let targets: Vec<Vec2> = level.pandas.iter().map(|p| p.to_vec2()).collect();
        let hazards: Vec<Vec2> = level.chandeliers.iter().map(|p| p.to_vec2()).collect();

        Self {
            arena: level.arena.unwrap_or_default(),
            obstacles,
            registry: TargetRegistry::new(&targets, &hazards, tuning),
            time: 0.0,
        }
    }

    /// Same world, but hits leave targets standing
    pub fn observing(&self) -> Self {
        let mut world = self.clone();
        world.registry.mode = HitMode::Observe;
        world
    }

    /// Is anything still moving that could change the outcome?
    pub fn is_settled(&self, projectile: Option<&Projectile>) -> bool {
        projectile.is_none() && !self.registry.any_falling()
    }

    /// Advance the world by `dt`. The projectile is taken out of play when it
    /// expires.
    pub fn advance(
        &mut self,
        projectile: &mut Option<Projectile>,
        dt: f32,
        tuning: &SimTuning,
    ) -> Vec<StepEvent> {
        let mut events = Vec::new();

        self.time += dt;
        for obstacle in &mut self.obstacles {
            obstacle.update(self.time);
        }

        let mut expired = false;
        if let Some(p) = projectile.as_mut() {
            let sub_dt = tuning.substep_dt(dt);
            for _ in 0..tuning.substeps.max(1) {
                if let Some(reason) = self.step_projectile(p, sub_dt, tuning, &mut events) {
                    events.push(StepEvent::ProjectileExpired { pos: p.pos, reason });
                    expired = true;
                    break;
                }
            }
        }
        if expired {
            *projectile = None;
        }

        let report = self.registry.advance_hazards(dt, tuning);
        for crush in report.crushes {
            events.push(StepEvent::TargetHit {
                target: crush.target,
                source: HitSource::Hazard(crush.hazard),
                rebounds: crush.trigger_rebounds,
                removed: crush.outcome.removed,
                cleared: crush.outcome.cleared,
            });
        }
        for hazard in report.landed {
            events.push(StepEvent::HazardLanded { hazard });
        }

        events
    }

    /// One integration substep. Returns why the projectile expired, if it did.
    fn step_projectile(
        &mut self,
        p: &mut Projectile,
        dt: f32,
        tuning: &SimTuning,
        events: &mut Vec<StepEvent>,
    ) -> Option<ExpireReason> {
        let prev = p.pos;
        p.pos += p.vel * dt;
        p.flight_time += dt;

        // All contacts in one substep count as one collision
        let mut contact = arena_reflect(&self.arena, &mut p.pos, &mut p.vel);
        for obstacle in &self.obstacles {
            let hit = obstacle_collision(p.pos, prev, p.radius, obstacle);
            if hit.hit && p.vel.dot(hit.normal) < 0.0 {
                p.vel = reflect_velocity(p.vel, hit.normal);
                p.pos += hit.normal * hit.penetration;
                contact = true;
            }
        }

        if contact {
            p.pos = self.arena.clamp(p.pos);
            p.vel *= tuning.restitution;
            if p.register_rebound(tuning.rebound_cooldown) {
                events.push(StepEvent::Rebound {
                    pos: p.pos,
                    remaining: p.remaining_rebounds(),
                });
                if p.is_spent() {
                    return Some(ExpireReason::ReboundLimit);
                }
            }
        }

        let body = Circle::new(p.pos, p.radius);
        for hazard in self.registry.hazards_touched_by(body) {
            if self.registry.drop_hazard(hazard, p.rebounds) {
                events.push(StepEvent::HazardDropped {
                    hazard,
                    rebounds: p.rebounds,
                });
            }
        }

        for target in self.registry.overlapping(body) {
            let outcome = self.registry.register_hit(target);
            if outcome.removed || self.registry.mode == HitMode::Observe {
                events.push(StepEvent::TargetHit {
                    target,
                    source: HitSource::Projectile,
                    rebounds: p.rebounds,
                    removed: outcome.removed,
                    cleared: outcome.cleared,
                });
            }
        }

        if p.speed() < tuning.stop_speed {
            return Some(ExpireReason::Stalled);
        }
        if p.flight_time >= tuning.max_flight_secs {
            return Some(ExpireReason::Timeout);
        }
        None
    }
}
