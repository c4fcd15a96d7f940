//! Enemy spawning and boss entry
//!
//! Picks the enemy kind from a stage-indexed weighted table, paces spawns on a
//! shrinking interval, enforces the per-stage concurrency cap, and summons the
//! stage boss once the score threshold is crossed.

use std::f32::consts::TAU;

use glam::Vec2;

use super::attack::{arm_boss, assign_pattern};
use super::rng::SessionRng;
use super::state::{Boss, Enemy, EnemyKind, GameEvent, GameState, MoveState, StagePhase};
use crate::consts::*;

/// Delay before the first spawn of a stage
pub const FIRST_SPAWN_DELAY: f32 = 1.0;
/// Vertical margin kept free at spawn
pub const SPAWN_Y_MARGIN: f32 = 40.0;

pub const WAVE_AMPLITUDE: f32 = 90.0;
pub const WAVE_FREQUENCY: f32 = 3.0;
pub const CHARGE_DASH_SPEED: f32 = 420.0;

/// Spawn pacing state
#[derive(Debug, Clone)]
pub struct SpawnDirector {
    /// Seconds until the next spawn attempt
    pub timer: f32,
}

impl Default for SpawnDirector {
    fn default() -> Self {
        Self {
            timer: FIRST_SPAWN_DELAY,
        }
    }
}

/// Weighted kind table for a stage
pub fn stage_table(stage: u32) -> &'static [(EnemyKind, f32)] {
    use EnemyKind::*;
    match stage {
        0 | 1 => &[(Grunt, 1.0)],
        2 => &[(Grunt, 0.5), (Shooter, 0.25), (Waver, 0.25)],
        3 => &[(Grunt, 0.35), (Shooter, 0.25), (Waver, 0.2), (Charger, 0.2)],
        4 => &[
            (Grunt, 0.25),
            (Shooter, 0.2),
            (Waver, 0.15),
            (Charger, 0.15),
            (Tank, 0.1),
            (Sniper, 0.15),
        ],
        _ => &[
            (Grunt, 0.2),
            (Shooter, 0.15),
            (Waver, 0.12),
            (Charger, 0.12),
            (Tank, 0.1),
            (Mine, 0.1),
            (Sniper, 0.1),
            (Swarmer, 0.11),
        ],
    }
}

/// Maximum concurrent enemies for a stage
pub fn enemy_cap(stage: u32) -> usize {
    let stage = stage.max(1) as usize;
    (4 + 2 * stage).min(20)
}

/// Later stages spawn more often
pub fn interval_scale(stage: u32) -> f32 {
    1.0 / (1.0 + 0.1 * stage.saturating_sub(1) as f32)
}

/// Seconds until the next spawn attempt
pub fn spawn_interval(elapsed: f32, stage: u32, rng: &mut SessionRng) -> f32 {
    let base = 1.0 - (elapsed * 0.01).min(0.6);
    base * interval_scale(stage) * (0.9 + rng.next_f32() * 0.3)
}

/// Summon the stage boss once the score threshold is reached.
///
/// Returns true on the frame the boss appears.
pub fn check_boss_trigger(state: &mut GameState) -> bool {
    let stage = state.world.stage;
    if state.stage_phase != StagePhase::Normal
        || state.boss.is_some()
        || state.world.bosses_spawned.contains(&stage)
        || state.world.score < state.tuning.threshold(stage)
    {
        return false;
    }

    state.enemies.clear();
    state.enemy_bullets.clear();

    let id = state.next_entity_id();
    let mut boss = Boss::new(id, stage, &state.tuning);
    arm_boss(&mut boss, &state.tuning, &mut state.rng);
    log::info!(
        "Boss for stage {} entering (score {}, hp {})",
        stage,
        state.world.score,
        boss.hp
    );
    state.boss = Some(boss);
    state.world.bosses_spawned.insert(stage);
    state.stage_phase = StagePhase::BossTriggered;
    state.emit(GameEvent::BossSpawned { stage });
    true
}

/// Count down and spawn normal enemies; suppressed while a boss is up
pub fn update_spawns(state: &mut GameState, dt: f32) {
    if state.boss_active() || state.stage_phase != StagePhase::Normal {
        return;
    }

    state.spawn.timer -= dt;
    if state.spawn.timer > 0.0 {
        return;
    }

    let stage = state.world.stage;
    state.spawn.timer = spawn_interval(state.world.time, stage, &mut state.rng);

    let cap = enemy_cap(stage);
    if state.enemies.len() >= cap {
        // Deferred, not dropped: the timer was just reset
        return;
    }

    spawn_enemy(state);
    if stage >= 2
        && state.enemies.len() < cap
        && state.rng.chance(state.tuning.second_spawn_chance)
    {
        spawn_enemy(state);
    }
}

/// Spawn one enemy of a stage-weighted kind at the right edge
pub fn spawn_enemy(state: &mut GameState) -> u32 {
    let stage = state.world.stage;
    let kind = state
        .rng
        .pick_weighted(stage_table(stage))
        .unwrap_or(EnemyKind::Grunt);

    let width = state.tuning.field_width;
    let height = state.tuning.field_height;
    let y = state.rng.range(SPAWN_Y_MARGIN, (height - SPAWN_Y_MARGIN).max(SPAWN_Y_MARGIN));

    let difficulty = state.world.difficulty as f32;
    let speed = state.world.scroll_speed
        * (1.0 + difficulty * 0.05)
        * (0.9 + state.rng.next_f32() * 0.4)
        * kind.params().speed_mult;
    let vy = match kind {
        EnemyKind::Mine => 0.0,
        _ => state.rng.signed() * 20.0,
    };

    spawn_enemy_at(
        state,
        kind,
        Vec2::new(width + ENEMY_ENTRY_OFFSET, y),
        Vec2::new(-speed, vy),
    )
}

/// Place an enemy of `kind` with an assigned pattern and movement
pub fn spawn_enemy_at(state: &mut GameState, kind: EnemyKind, pos: Vec2, vel: Vec2) -> u32 {
    let stage = state.world.stage;
    let params = kind.params();
    let attack = assign_pattern(kind, stage, &mut state.rng);
    let movement = match kind {
        EnemyKind::Waver => MoveState::Wave {
            phase: state.rng.next_f32() * TAU,
            amplitude: WAVE_AMPLITUDE,
            frequency: WAVE_FREQUENCY,
        },
        EnemyKind::Charger => MoveState::Charge {
            delay: state.rng.range(0.8, 1.5),
            dash_speed: CHARGE_DASH_SPEED,
            dashing: false,
        },
        _ => MoveState::Drift,
    };

    let id = state.next_entity_id();
    state.enemies.push(Enemy {
        id,
        kind,
        pos,
        vel,
        radius: params.radius,
        hp: params.hp,
        attack,
        movement,
    });
    log::debug!(
        "Spawned {} #{} at ({:.0}, {:.0}) pattern {:?}",
        kind.as_str(),
        id,
        pos.x,
        pos.y,
        attack.attack.kind()
    );
    id
}
