//! Scripted pilot for headless runs and soak tests
//!
//! Reads the live state and produces one [`TickInput`] per frame: always
//! fire, line up with the most relevant target, and sidestep anything on a
//! collision course.

use glam::Vec2;

use crate::sim::{GamePhase, GameState, PickupKind, TickInput};

#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Horizontal station the pilot drifts back to
    pub home_x: f32,
    /// Seconds of straight-line prediction for threats
    pub look_ahead: f32,
    /// Clearance (beyond both radii) treated as a hit
    pub clearance: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            home_x: 160.0,
            look_ahead: 0.45,
            clearance: 28.0,
        }
    }
}

impl Autopilot {
    pub fn decide(&self, state: &GameState) -> TickInput {
        if state.phase != GamePhase::Playing {
            return TickInput::default();
        }
        let player = &state.player;

        let dodge = self.threat_push(state);
        let (move_x, move_y) = if dodge != Vec2::ZERO {
            let dir = dodge.normalize();
            (dir.x, dir.y)
        } else {
            let target_y = self.target_y(state);
            let dy = (target_y - player.pos.y) / 40.0;
            let dx = (self.home_x - player.pos.x) / 80.0;
            (dx.clamp(-1.0, 1.0), dy.clamp(-1.0, 1.0))
        };

        TickInput {
            move_x,
            move_y,
            fire: true,
            pause: false,
        }
    }

    /// Sum of pushes away from every threat predicted to come close
    fn threat_push(&self, state: &GameState) -> Vec2 {
        let me = state.player.pos;
        let reach = state.player.radius + self.clearance;
        let mut push = Vec2::ZERO;

        let mut consider = |pos: Vec2, vel: Vec2, radius: f32| {
            // Closest approach over the look-ahead window
            let rel = pos - me;
            let speed_sq = vel.length_squared();
            let t = if speed_sq > 0.0 {
                (-rel.dot(vel) / speed_sq).clamp(0.0, self.look_ahead)
            } else {
                0.0
            };
            let closest = rel + vel * t;
            let limit = reach + radius;
            if closest.length_squared() < limit * limit {
                let away = -closest;
                let away = if away.length_squared() < 1e-3 { Vec2::Y } else { away };
                // Prefer vertical escapes; the field is wide
                push += Vec2::new(away.x * 0.3, away.y).normalize_or_zero() / (1.0 + t);
            }
        };

        for bullet in &state.enemy_bullets {
            consider(bullet.pos, bullet.vel, bullet.radius);
        }
        for enemy in &state.enemies {
            consider(enemy.pos, enemy.vel, enemy.radius);
        }
        if let Some(boss) = &state.boss {
            consider(boss.pos, boss.vel, boss.radius);
        }

        // Stay off the walls while dodging
        let height = state.tuning.field_height;
        if push != Vec2::ZERO {
            if me.y < reach * 2.0 {
                push.y = push.y.abs();
            } else if me.y > height - reach * 2.0 {
                push.y = -push.y.abs();
            }
        }
        push
    }

    /// Row to line up on: wounded-player heals first, then boss, then the
    /// closest enemy ahead, then any pickup
    fn target_y(&self, state: &GameState) -> f32 {
        let me = state.player.pos;
        let wants_heal = state.player.hp_fraction() < 0.5;

        let pickup = state
            .pickups
            .iter()
            .filter(|p| p.pos.x > me.x - 20.0)
            .min_by(|a, b| {
                let score = |kind: PickupKind, pos: Vec2| {
                    let bias = if wants_heal && kind == PickupKind::Heal { 0.25 } else { 1.0 };
                    (pos - me).length() * bias
                };
                score(a.kind, a.pos).total_cmp(&score(b.kind, b.pos))
            });
        if let Some(p) = pickup {
            if wants_heal || (p.pos - me).length() < 220.0 {
                return p.pos.y;
            }
        }

        if let Some(boss) = &state.boss {
            return boss.pos.y;
        }

        state
            .enemies
            .iter()
            .filter(|e| e.pos.x > me.x && e.pos.x < state.tuning.field_width)
            .min_by(|a, b| a.pos.x.total_cmp(&b.pos.x))
            .map(|e| e.pos.y)
            .unwrap_or(state.tuning.field_height / 2.0)
    }
}
