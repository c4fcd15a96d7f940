//! Enemy and boss attack patterns
//!
//! Each enemy is assigned exactly one pattern at spawn time. The pattern
//! carries its own state (shots left, shrinking interval, fired flag) and is
//! driven by a cooldown decremented once per frame in [`try_attack`].

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::SessionRng;
use super::state::{Boss, Bullet, Enemy, EnemyKind};
use crate::tuning::Tuning;
use crate::{bearing, from_angle};

/// Pattern tags used by the assignment tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    FixedDir,
    SingleOnce,
    MultiTimes,
    VolleyOnce,
    RadialOnce,
    SnipeMulti,
    None,
}

/// A pattern together with its per-enemy state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attack {
    /// Straight shot against the scroll, re-armed forever
    FixedDir,
    /// One aimed shot, then silent
    SingleOnce,
    /// `remaining` aimed shots at shrinking intervals
    MultiTimes { remaining: u32, interval: f32 },
    /// One spread of `count` shots across a cone aimed at the player
    VolleyOnce { count: u32 },
    /// One ring of `count` shots
    RadialOnce { count: u32 },
    /// Fast precise aimed shots with a long gap
    SnipeMulti { remaining: u32, interval: f32 },
    /// Never fires
    None,
}

impl Attack {
    pub fn kind(&self) -> PatternKind {
        match self {
            Attack::FixedDir => PatternKind::FixedDir,
            Attack::SingleOnce => PatternKind::SingleOnce,
            Attack::MultiTimes { .. } => PatternKind::MultiTimes,
            Attack::VolleyOnce { .. } => PatternKind::VolleyOnce,
            Attack::RadialOnce { .. } => PatternKind::RadialOnce,
            Attack::SnipeMulti { .. } => PatternKind::SnipeMulti,
            Attack::None => PatternKind::None,
        }
    }
}

/// Assigned attack plus its cooldown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackState {
    pub attack: Attack,
    /// Seconds until the next shot; infinite once the pattern is spent
    pub cooldown: f32,
    /// Set once a one-shot pattern has fired or a multi pattern ran dry
    pub fired: bool,
}

impl AttackState {
    pub fn silent() -> Self {
        Self {
            attack: Attack::None,
            cooldown: f32::INFINITY,
            fired: false,
        }
    }

    pub fn is_spent(&self) -> bool {
        !self.cooldown.is_finite()
    }

    fn disable(&mut self) {
        self.cooldown = f32::INFINITY;
        self.fired = true;
    }
}

pub const FIXED_DIR_INTERVAL: f32 = 1.6;
pub const MULTI_INTERVAL: f32 = 0.9;
/// Each multi shot comes this much sooner than the last
pub const MULTI_DECAY: f32 = 0.8;
pub const SNIPE_INTERVAL: f32 = 1.6;
pub const SNIPE_SHOTS: u32 = 3;
pub const VOLLEY_COUNT: u32 = 5;
/// Full width of the volley cone (radians)
pub const VOLLEY_CONE: f32 = 0.6;
pub const RADIAL_COUNT: u32 = 12;

/// Higher stages fire faster
pub fn stage_cooldown_scale(stage: u32) -> f32 {
    1.0 / (1.0 + 0.15 * stage.saturating_sub(1) as f32)
}

/// Jitter so neighbours do not fire in lockstep
fn jitter(rng: &mut SessionRng) -> f32 {
    rng.range(0.8, 1.2)
}

fn pattern_table(kind: EnemyKind) -> &'static [(PatternKind, f32)] {
    match kind {
        EnemyKind::Grunt => &[(PatternKind::FixedDir, 0.6), (PatternKind::SingleOnce, 0.4)],
        EnemyKind::Shooter => &[
            (PatternKind::MultiTimes, 0.4),
            (PatternKind::SingleOnce, 0.3),
            (PatternKind::VolleyOnce, 0.3),
        ],
        EnemyKind::Waver => &[(PatternKind::FixedDir, 0.5), (PatternKind::MultiTimes, 0.5)],
        EnemyKind::Charger => &[(PatternKind::SingleOnce, 0.7), (PatternKind::FixedDir, 0.3)],
        EnemyKind::Tank => &[(PatternKind::RadialOnce, 0.5), (PatternKind::VolleyOnce, 0.5)],
        EnemyKind::Sniper => &[(PatternKind::SnipeMulti, 1.0)],
        EnemyKind::Swarmer => &[(PatternKind::FixedDir, 1.0)],
        EnemyKind::Mine => &[(PatternKind::None, 1.0)],
    }
}

/// Pick and arm a pattern for a freshly spawned enemy.
///
/// Stage 1 keeps every shooter on `FixedDir`; hazards never fire.
pub fn assign_pattern(kind: EnemyKind, stage: u32, rng: &mut SessionRng) -> AttackState {
    let choice = if !kind.fires() {
        PatternKind::None
    } else if stage <= 1 {
        PatternKind::FixedDir
    } else {
        rng.pick_weighted(pattern_table(kind)).unwrap_or(PatternKind::FixedDir)
    };
    arm(choice, stage, rng)
}

/// Build the pattern state and its first cooldown
pub fn arm(choice: PatternKind, stage: u32, rng: &mut SessionRng) -> AttackState {
    let scale = stage_cooldown_scale(stage);
    let (attack, first) = match choice {
        PatternKind::FixedDir => (Attack::FixedDir, rng.range(0.8, 1.6)),
        PatternKind::SingleOnce => (Attack::SingleOnce, rng.range(0.6, 1.2)),
        PatternKind::MultiTimes => (
            Attack::MultiTimes {
                remaining: rng.range_u32(2, 4),
                interval: MULTI_INTERVAL,
            },
            0.8 * jitter(rng),
        ),
        PatternKind::VolleyOnce => (Attack::VolleyOnce { count: VOLLEY_COUNT }, rng.range(1.0, 1.8)),
        PatternKind::RadialOnce => (Attack::RadialOnce { count: RADIAL_COUNT }, rng.range(1.0, 1.8)),
        PatternKind::SnipeMulti => (
            Attack::SnipeMulti {
                remaining: SNIPE_SHOTS,
                interval: SNIPE_INTERVAL,
            },
            jitter(rng),
        ),
        PatternKind::None => return AttackState::silent(),
    };
    AttackState {
        attack,
        cooldown: first * scale,
        fired: false,
    }
}

/// Decrement the enemy's cooldown and fire its pattern when it runs out.
///
/// Returns the number of bullets appended to `out`.
pub fn try_attack(
    enemy: &mut Enemy,
    target: Vec2,
    dt: f32,
    stage: u32,
    tuning: &Tuning,
    rng: &mut SessionRng,
    out: &mut Vec<Bullet>,
) -> usize {
    let state = &mut enemy.attack;
    if state.is_spent() {
        return 0;
    }
    state.cooldown -= dt;
    if state.cooldown > 0.0 {
        return 0;
    }

    let origin = enemy.pos;
    let before = out.len();
    let scale = stage_cooldown_scale(stage);
    let speed = tuning.enemy_bullet_speed;
    let radius = tuning.enemy_bullet_radius;

    match state.attack {
        Attack::FixedDir => {
            out.push(Bullet::enemy(origin, Vec2::new(-speed, 0.0), radius));
            state.cooldown = FIXED_DIR_INTERVAL * scale * jitter(rng);
        }
        Attack::SingleOnce => {
            fire_aimed(origin, target, speed + rng.range(0.0, 80.0), radius, out);
            state.disable();
        }
        Attack::MultiTimes { remaining, interval } => {
            fire_aimed(origin, target, speed + rng.range(0.0, 80.0), radius, out);
            let remaining = remaining.saturating_sub(1);
            let interval = interval * MULTI_DECAY;
            state.attack = Attack::MultiTimes { remaining, interval };
            if remaining == 0 {
                state.disable();
            } else {
                state.cooldown = interval * scale * jitter(rng);
            }
        }
        Attack::VolleyOnce { count } => {
            fire_spread(origin, target, count, VOLLEY_CONE, speed, radius, out);
            state.disable();
        }
        Attack::RadialOnce { count } => {
            let phase = rng.next_f32() * TAU / count.max(1) as f32;
            fire_ring(origin, count, phase, speed * 0.8, radius, out);
            state.disable();
        }
        Attack::SnipeMulti { remaining, interval } => {
            fire_aimed(origin, target, tuning.snipe_bullet_speed, radius * 0.75, out);
            let remaining = remaining.saturating_sub(1);
            state.attack = Attack::SnipeMulti { remaining, interval };
            if remaining == 0 {
                state.disable();
            } else {
                state.cooldown = interval * scale * jitter(rng);
            }
        }
        Attack::None => state.disable(),
    }
    out.len() - before
}

/// Boss volleys; the stage decides which ones are in rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossVolley {
    Aimed,
    Spread { count: u32 },
    Radial { count: u32 },
    Snipe,
}

pub fn boss_volleys(stage: u32) -> &'static [BossVolley] {
    match stage {
        0 | 1 => &[BossVolley::Aimed, BossVolley::Radial { count: 12 }],
        2 => &[
            BossVolley::Aimed,
            BossVolley::Spread { count: 5 },
            BossVolley::Radial { count: 16 },
        ],
        _ => &[
            BossVolley::Spread { count: 7 },
            BossVolley::Snipe,
            BossVolley::Radial { count: 20 },
            BossVolley::Aimed,
        ],
    }
}

/// Boss fire routine; steps through the stage rotation and re-arms forever
pub fn boss_attack(
    boss: &mut Boss,
    target: Vec2,
    dt: f32,
    tuning: &Tuning,
    rng: &mut SessionRng,
    out: &mut Vec<Bullet>,
) -> usize {
    boss.fire_cooldown -= dt;
    if boss.fire_cooldown > 0.0 {
        return 0;
    }

    let volleys = boss_volleys(boss.stage);
    let volley = volleys[boss.volley_index % volleys.len()];
    boss.volley_index = (boss.volley_index + 1) % volleys.len();
    let origin = boss.pos - Vec2::new(boss.radius * 0.6, 0.0);
    let speed = tuning.enemy_bullet_speed;
    let radius = tuning.enemy_bullet_radius;
    let before = out.len();

    match volley {
        BossVolley::Aimed => {
            // Three quick lines around the player's bearing
            fire_spread(origin, target, 3, 0.15, speed * 1.2, radius, out);
        }
        BossVolley::Spread { count } => {
            fire_spread(origin, target, count, VOLLEY_CONE * 1.5, speed, radius, out);
        }
        BossVolley::Radial { count } => {
            let phase = rng.next_f32() * TAU;
            fire_ring(boss.pos, count, phase, speed * 0.8, radius, out);
        }
        BossVolley::Snipe => {
            fire_aimed(origin, target, tuning.snipe_bullet_speed, radius * 0.75, out);
        }
    }

    arm_boss(boss, tuning, rng);
    out.len() - before
}

/// Set the boss's next volley delay for its stage
pub fn arm_boss(boss: &mut Boss, tuning: &Tuning, rng: &mut SessionRng) {
    boss.fire_cooldown =
        tuning.boss_fire_interval * stage_cooldown_scale(boss.stage) * jitter(rng);
}

fn fire_aimed(origin: Vec2, target: Vec2, speed: f32, radius: f32, out: &mut Vec<Bullet>) {
    out.push(Bullet::enemy(origin, bearing(origin, target) * speed, radius));
}

/// `count` shots evenly spread across `cone` radians centered on the target
fn fire_spread(
    origin: Vec2,
    target: Vec2,
    count: u32,
    cone: f32,
    speed: f32,
    radius: f32,
    out: &mut Vec<Bullet>,
) {
    let center = bearing(origin, target);
    let center = center.y.atan2(center.x);
    if count <= 1 {
        out.push(Bullet::enemy(origin, from_angle(center) * speed, radius));
        return;
    }
    let step = cone / (count - 1) as f32;
    let start = center - cone / 2.0;
    for i in 0..count {
        let angle = start + step * i as f32;
        out.push(Bullet::enemy(origin, from_angle(angle) * speed, radius));
    }
}

/// `count` shots evenly spaced around the full circle
fn fire_ring(origin: Vec2, count: u32, phase: f32, speed: f32, radius: f32, out: &mut Vec<Bullet>) {
    let step = TAU / count.max(1) as f32;
    for i in 0..count {
        let angle = phase + step * i as f32;
        out.push(Bullet::enemy(origin, from_angle(angle) * speed, radius));
    }
}
