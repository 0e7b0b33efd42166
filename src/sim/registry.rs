//! Live targets and chandelier hazards
//!
//! Targets are kept in a stable, id-ordered list and flagged dead rather than
//! removed, so ids stay valid for reporting. A dropped hazard runs its own
//! short fall and crushes targets it passes close to.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Circle, circles_overlap, point_in_aabb};
use crate::tuning::SimTuning;

/// A destructible target ("panda")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub alive: bool,
}

impl Target {
    pub fn hit_circle(&self) -> Circle {
        Circle::new(self.pos, self.radius)
    }
}

/// What registering a hit did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    /// The target was alive and is now dead
    pub removed: bool,
    /// No live targets remain
    pub cleared: bool,
}

/// Whether hits remove targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitMode {
    /// Live play: a hit target is dead for good
    #[default]
    Consume,
    /// Sandbox tracing: hits are reported but targets stay alive
    Observe,
}

/// Lifecycle of a hazard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardState {
    Hanging,
    Falling {
        /// Seconds since the drop
        elapsed: f32,
        /// Projectile rebound count when it was knocked down
        trigger_rebounds: u32,
    },
    Destroyed,
}

/// A chandelier hanging on a rope from the ceiling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    /// Where it hangs
    pub anchor: Vec2,
    /// Current position
    pub pos: Vec2,
    pub radius: f32,
    /// Rope hitbox centre and half size
    pub rope_center: Vec2,
    pub rope_half: Vec2,
    pub state: HazardState,
}

impl Hazard {
    pub fn new(id: u32, anchor: Vec2, tuning: &SimTuning) -> Self {
        // Rope runs from the ceiling down to the chandelier
        let rope_len = (anchor.y - 20.0).max(0.0);
        Self {
            id,
            anchor,
            pos: anchor,
            radius: tuning.hazard_radius,
            rope_center: Vec2::new(anchor.x, anchor.y / 2.0),
            rope_half: Vec2::new(tuning.rope_width, rope_len) * 0.5,
            state: HazardState::Hanging,
        }
    }

    #[inline]
    pub fn is_hanging(&self) -> bool {
        matches!(self.state, HazardState::Hanging)
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        matches!(self.state, HazardState::Falling { .. })
    }

    /// Does `body` touch the chandelier or its rope while it still hangs?
    pub fn touched_by(&self, body: Circle) -> bool {
        self.is_hanging()
            && (circles_overlap(body, Circle::new(self.pos, self.radius))
                || point_in_aabb(body.center, self.rope_center, self.rope_half, body.radius))
    }

    /// Cut the rope. Only the first call has any effect.
    pub fn release(&mut self, trigger_rebounds: u32) -> bool {
        if !self.is_hanging() {
            return false;
        }
        self.state = HazardState::Falling {
            elapsed: 0.0,
            trigger_rebounds,
        };
        true
    }

    /// Advance the fall by `dt`. Returns true on the tick it reaches the
    /// floor; the hazard stays `Falling` until `land` is called.
    fn advance(&mut self, dt: f32, tuning: &SimTuning) -> bool {
        let HazardState::Falling {
            elapsed,
            trigger_rebounds,
        } = self.state
        else {
            return false;
        };

        let elapsed = elapsed + dt;
        let progress = (elapsed / tuning.hazard_fall_secs).min(1.0);
        let drop = tuning.hazard_floor_y - self.anchor.y;
        self.pos.y = self.anchor.y + drop * ease_out_bounce(progress);
        self.state = HazardState::Falling {
            elapsed,
            trigger_rebounds,
        };
        progress >= 1.0
    }

    fn land(&mut self) {
        self.state = HazardState::Destroyed;
    }

    /// Can the hazard crush `target` in its current position?
    fn crushes(&self, target: &Target, tuning: &SimTuning) -> bool {
        self.is_falling()
            && self.pos.y > self.anchor.y + tuning.hazard_arm_drop
            && self.pos.distance(target.pos) < tuning.hazard_crush_distance
    }
}

/// Bouncy landing curve, 0 → 1
fn ease_out_bounce(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

/// A hazard crushing a target during its fall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crush {
    pub hazard: u32,
    pub target: u32,
    pub trigger_rebounds: u32,
    pub outcome: HitOutcome,
}

/// Hazard activity during one update
#[derive(Debug, Clone, Default)]
pub struct HazardReport {
    pub crushes: Vec<Crush>,
    pub landed: Vec<u32>,
}

/// All targets and hazards of a level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetRegistry {
    pub targets: Vec<Target>,
    pub hazards: Vec<Hazard>,
    pub mode: HitMode,
}

impl TargetRegistry {
    pub fn new(targets: &[Vec2], hazards: &[Vec2], tuning: &SimTuning) -> Self {
        Self {
            targets: targets
                .iter()
                .zip(0u32..)
                .map(|(&pos, id)| Target {
                    id,
                    pos,
                    radius: tuning.target_radius,
                    alive: true,
                })
                .collect(),
            hazards: hazards
                .iter()
                .zip(0u32..)
                .map(|(&pos, id)| Hazard::new(id, pos, tuning))
                .collect(),
            mode: HitMode::Consume,
        }
    }

    pub fn live(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().filter(|t| t.alive)
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    pub fn is_cleared(&self) -> bool {
        self.live_count() == 0
    }

    pub fn target(&self, id: u32) -> Option<&Target> {
        self.targets.get(id as usize)
    }

    /// Ids of live targets whose hit-circle overlaps `body`
    pub fn overlapping(&self, body: Circle) -> Vec<u32> {
        self.live()
            .filter(|t| circles_overlap(body, t.hit_circle()))
            .map(|t| t.id)
            .collect()
    }

    /// Kill a target. Hitting a dead (or unknown) target does nothing.
    pub fn register_hit(&mut self, id: u32) -> HitOutcome {
        let removed = match self.mode {
            HitMode::Consume => match self.targets.get_mut(id as usize) {
                Some(target) if target.alive => {
                    target.alive = false;
                    true
                }
                _ => false,
            },
            HitMode::Observe => false,
        };
        HitOutcome {
            removed,
            cleared: self.is_cleared(),
        }
    }

    /// Knock a hazard down; false if it is unknown or already down
    pub fn drop_hazard(&mut self, id: u32, trigger_rebounds: u32) -> bool {
        self.hazards
            .get_mut(id as usize)
            .is_some_and(|h| h.release(trigger_rebounds))
    }

    /// Hanging hazards touched by `body`
    pub fn hazards_touched_by(&self, body: Circle) -> Vec<u32> {
        self.hazards
            .iter()
            .filter(|h| h.touched_by(body))
            .map(|h| h.id)
            .collect()
    }

    pub fn any_falling(&self) -> bool {
        self.hazards.iter().any(Hazard::is_falling)
    }

    /// Advance every falling hazard and let it crush live targets
    pub fn advance_hazards(&mut self, dt: f32, tuning: &SimTuning) -> HazardReport {
        let mut report = HazardReport::default();

        // Crushes are checked at the new position, landing tick included
        for i in 0..self.hazards.len() {
            if !self.hazards[i].is_falling() {
                continue;
            }
            let landed = self.hazards[i].advance(dt, tuning);

            let hazard = &self.hazards[i];
            let trigger_rebounds = match hazard.state {
                HazardState::Falling {
                    trigger_rebounds, ..
                } => trigger_rebounds,
                _ => 0,
            };
            let crushed: Vec<u32> = self
                .live()
                .filter(|t| hazard.crushes(t, tuning))
                .map(|t| t.id)
                .collect();
            let hazard_id = hazard.id;

            for target in crushed {
                let outcome = self.register_hit(target);
                report.crushes.push(Crush {
                    hazard: hazard_id,
                    target,
                    trigger_rebounds,
                    outcome,
                });
            }
            if landed {
                self.hazards[i].land();
                report.landed.push(hazard_id);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(targets: &[Vec2], hazards: &[Vec2]) -> TargetRegistry {
        TargetRegistry::new(targets, hazards, &SimTuning::default())
    }

    #[test]
    fn test_register_hit_removes_exactly_once() {
        let mut reg = registry(&[Vec2::new(900.0, 300.0), Vec2::new(500.0, 200.0)], &[]);

        let first = reg.register_hit(0);
        assert!(first.removed);
        assert!(!first.cleared);

        let again = reg.register_hit(0);
        assert!(!again.removed);
        assert_eq!(reg.live_count(), 1);

        let last = reg.register_hit(1);
        assert!(last.removed && last.cleared);
    }

    #[test]
    fn test_register_hit_unknown_id_is_noop() {
        let mut reg = registry(&[Vec2::new(900.0, 300.0)], &[]);
        let outcome = reg.register_hit(7);
        assert!(!outcome.removed);
        assert_eq!(reg.live_count(), 1);
    }

    #[test]
    fn test_observe_mode_keeps_targets_alive() {
        let mut reg = registry(&[Vec2::new(900.0, 300.0)], &[]);
        reg.mode = HitMode::Observe;
        assert!(!reg.register_hit(0).removed);
        assert_eq!(reg.live_count(), 1);
    }

    #[test]
    fn test_overlapping_uses_generous_radius() {
        let reg = registry(&[Vec2::new(900.0, 300.0)], &[]);
        assert_eq!(reg.overlapping(Circle::new(Vec2::new(940.0, 310.0), 5.0)), vec![0]);
        assert!(reg.overlapping(Circle::new(Vec2::new(960.0, 300.0), 5.0)).is_empty());
    }

    #[test]
    fn test_hazard_touched_by_rope_or_body() {
        let reg = registry(&[], &[Vec2::new(1000.0, 120.0)]);
        let hazard = &reg.hazards[0];
        assert!(hazard.touched_by(Circle::new(Vec2::new(1000.0, 60.0), 5.0)));
        assert!(hazard.touched_by(Circle::new(Vec2::new(1020.0, 125.0), 5.0)));
        assert!(!hazard.touched_by(Circle::new(Vec2::new(1050.0, 60.0), 5.0)));
    }

    #[test]
    fn test_drop_hazard_is_idempotent() {
        let mut reg = registry(&[], &[Vec2::new(1000.0, 120.0)]);
        assert!(reg.drop_hazard(0, 1));
        assert!(!reg.drop_hazard(0, 2));
        assert!(!reg.drop_hazard(5, 0));
        assert!(reg.any_falling());
    }

    #[test]
    fn test_falling_hazard_crushes_target_below_and_lands() {
        let tuning = SimTuning::default();
        let mut reg = registry(
            &[Vec2::new(1000.0, 450.0), Vec2::new(300.0, 450.0)],
            &[Vec2::new(1000.0, 120.0)],
        );
        reg.drop_hazard(0, 1);

        let mut crushes = Vec::new();
        let mut landed = false;
        for _ in 0..200 {
            let report = reg.advance_hazards(1.0 / 120.0, &tuning);
            crushes.extend(report.crushes);
            if !report.landed.is_empty() {
                landed = true;
                break;
            }
        }

        assert!(landed);
        assert_eq!(crushes.len(), 1);
        assert_eq!(crushes[0].target, 0);
        assert_eq!(crushes[0].trigger_rebounds, 1);
        assert!(crushes[0].outcome.removed);
        assert_eq!(reg.hazards[0].state, HazardState::Destroyed);
        assert!(reg.targets[1].alive);
    }

    #[test]
    fn test_hazard_crushes_on_landing_tick() {
        let tuning = SimTuning::default();
        let mut reg = registry(&[Vec2::new(500.0, 580.0)], &[Vec2::new(500.0, 300.0)]);
        reg.drop_hazard(0, 2);

        // One step long enough to finish the whole fall
        let report = reg.advance_hazards(tuning.hazard_fall_secs + 0.5, &tuning);

        assert_eq!(report.landed, vec![0]);
        assert_eq!(report.crushes.len(), 1);
        assert_eq!(report.crushes[0].target, 0);
        assert_eq!(report.crushes[0].trigger_rebounds, 2);
        assert!(report.crushes[0].outcome.cleared);
        assert!(!reg.targets[0].alive);
        assert_eq!(reg.hazards[0].state, HazardState::Destroyed);
        assert!((reg.hazards[0].pos.y - tuning.hazard_floor_y).abs() < 1e-3);
    }

    #[test]
    fn test_ease_out_bounce_spans_unit_interval() {
        assert!(ease_out_bounce(0.0).abs() < 1e-6);
        assert!((ease_out_bounce(1.0) - 1.0).abs() < 1e-4);
        for i in 0..=100 {
            let v = ease_out_bounce(i as f32 / 100.0);
            assert!((0.0..=1.0001).contains(&v));
        }
    }
}
