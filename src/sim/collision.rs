//! Collision detection and response
//!
//! Everything is a circle. Resolution runs in a fixed order each frame:
//! player shots vs enemies, player shots vs boss, hazards vs player, then
//! pickups vs player. Hits mark entities; removal happens by `retain`
//! afterward, never while iterating.

use glam::Vec2;

use super::pools::Body;
use super::progression;
use super::state::{Companion, EnemyKind, GameEvent, GameState, PickupKind};

/// Circle-circle overlap, touching counts
pub fn circle_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) <= reach * reach
}

/// Overlap test between two bodies
pub fn overlaps<A: Body, B: Body>(a: &A, b: &B) -> bool {
    circle_overlap(a.pos(), a.radius(), b.pos(), b.radius())
}

/// What a hit did to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Invulnerable or already dead
    Ignored,
    /// A shield charge took it
    Absorbed,
    Damaged,
    Killed,
}

/// Run every collision pass for this frame
pub fn resolve(state: &mut GameState) {
    shots_vs_enemies(state);
    shots_vs_boss(state);
    if !state.is_playing() {
        return;
    }
    hazards_vs_player(state);
    if !state.is_playing() {
        return;
    }
    pickups_vs_player(state);
}

/// Player and companion shots against normal enemies
pub fn shots_vs_enemies(state: &mut GameState) {
    let mut kills: Vec<(EnemyKind, Vec2)> = Vec::new();

    for bullet in state.player_bullets.iter_mut() {
        if bullet.consumed {
            continue;
        }
        for enemy in state.enemies.iter_mut() {
            if enemy.hp <= 0 || (bullet.pierce && bullet.hit_ids.contains(&enemy.id)) {
                continue;
            }
            if !overlaps(&*bullet, &*enemy) {
                continue;
            }
            enemy.hp -= bullet.damage;
            if enemy.hp <= 0 {
                kills.push((enemy.kind, enemy.pos));
            }
            if bullet.pierce {
                bullet.hit_ids.push(enemy.id);
            } else {
                bullet.consumed = true;
                break;
            }
        }
    }

    state.player_bullets.retain(|b| !b.consumed);
    state.enemies.retain(|e| e.hp > 0);

    for (kind, pos) in kills {
        enemy_killed(state, kind, pos);
    }
}

/// Score, debris, and the drop roll for a destroyed enemy
fn enemy_killed(state: &mut GameState, kind: EnemyKind, pos: Vec2) {
    let params = kind.params();
    let points = params.points + state.world.difficulty as u64 * 10;
    state.add_score(points);
    state.emit(GameEvent::EnemyDestroyed { kind, points });
    state.burst(pos, params.color, 12);

    let roll = state.rng.next_f32();
    if let Some(drop) = state.tuning.drops.roll(roll) {
        log::debug!("{} dropped {:?}", kind.as_str(), drop);
        state.spawn_pickup(drop, pos);
    }
}

/// Player and companion shots against the boss
pub fn shots_vs_boss(state: &mut GameState) {
    let damage = state.tuning.boss_hit_damage;
    let Some(boss) = state.boss.as_mut() else {
        return;
    };

    for bullet in state.player_bullets.iter_mut() {
        if boss.hp <= 0 {
            break;
        }
        if bullet.consumed || (bullet.pierce && bullet.hit_ids.contains(&boss.id)) {
            continue;
        }
        if !overlaps(&*bullet, &*boss) {
            continue;
        }
        boss.hp = (boss.hp - damage).max(0);
        if bullet.pierce {
            bullet.hit_ids.push(boss.id);
        } else {
            bullet.consumed = true;
        }
    }
    state.player_bullets.retain(|b| !b.consumed);

    if state.boss.as_ref().is_some_and(|b| b.hp <= 0) {
        boss_defeated(state);
    }
}

fn boss_defeated(state: &mut GameState) {
    let Some(boss) = state.boss.take() else {
        return;
    };
    let stage = boss.stage;
    let points = state.tuning.boss_points_per_stage * stage as u64;
    state.add_score(points);
    state.enemy_bullets.clear();
    state.burst(boss.pos, 0xffd36b, 60);
    log::info!("Boss for stage {} destroyed (+{} points)", stage, points);
    progression::stage_cleared(state, stage);
}

/// Enemy bullets, enemy bodies and the boss against the player
pub fn hazards_vs_player(state: &mut GameState) {
    if !state.player.alive {
        return;
    }
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    let mut bullet_hits = 0;
    for bullet in state.enemy_bullets.iter_mut() {
        if circle_overlap(bullet.pos, bullet.radius, player_pos, player_radius) {
            bullet.consumed = true;
            bullet_hits += 1;
        }
    }
    state.enemy_bullets.retain(|b| !b.consumed);

    // Rammed enemies are destroyed without scoring
    let mut rammed: Vec<(Vec2, u32)> = Vec::new();
    state.enemies.retain(|e| {
        let hit = circle_overlap(e.pos, e.radius, player_pos, player_radius);
        if hit {
            rammed.push((e.pos, e.kind.params().color));
        }
        !hit
    });

    let boss_contact = state
        .boss
        .as_ref()
        .is_some_and(|b| circle_overlap(b.pos, b.radius, player_pos, player_radius));

    let tuning = &state.tuning;
    let (bullet_damage, bullet_grace) = (tuning.enemy_bullet_damage, tuning.enemy_bullet_grace);
    let (contact_damage, contact_grace) = (tuning.enemy_contact_damage, tuning.enemy_contact_grace);
    let (boss_damage, boss_grace) = (tuning.boss_contact_damage, tuning.boss_contact_grace);

    for _ in 0..bullet_hits {
        damage_player(state, bullet_damage, bullet_grace);
    }
    for (pos, color) in rammed {
        state.burst(pos, color, 10);
        damage_player(state, contact_damage, contact_grace);
    }
    if boss_contact {
        damage_player(state, boss_damage, boss_grace);
    }
}

/// Apply one hit to the player: invulnerability, then shield, then hp
pub fn damage_player(state: &mut GameState, amount: f32, grace: f32) -> HitOutcome {
    if !state.player.alive || state.player.invulnerable > 0.0 {
        return HitOutcome::Ignored;
    }

    if state.player.shield_charges > 0 {
        state.player.shield_charges -= 1;
        state.player.invulnerable = state.tuning.shield_grace;
        state.emit(GameEvent::ShieldAbsorbed);
        return HitOutcome::Absorbed;
    }

    let player = &mut state.player;
    player.hp = (player.hp - amount).max(0.0);
    player.invulnerable = grace;
    let dead = player.hp <= 0.0;
    state.emit(GameEvent::PlayerHit { damage: amount });

    if dead {
        state.player.alive = false;
        let pos = state.player.pos;
        state.burst(pos, 0x7fd7ff, 40);
        progression::game_over(state);
        HitOutcome::Killed
    } else {
        HitOutcome::Damaged
    }
}

/// Collect every pickup the player touches
pub fn pickups_vs_player(state: &mut GameState) {
    if !state.player.alive {
        return;
    }
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    let mut collected: Vec<PickupKind> = Vec::new();
    state.pickups.retain(|p| {
        let hit = circle_overlap(p.pos, p.radius, player_pos, player_radius);
        if hit {
            collected.push(p.kind);
        }
        !hit
    });

    for kind in collected {
        apply_pickup(state, kind);
    }
}

/// Apply a pickup's effect, clamped to the tuning limits
pub fn apply_pickup(state: &mut GameState, kind: PickupKind) {
    let tuning = &state.tuning;
    let max_level = tuning.max_level();
    let player = &mut state.player;

    match kind {
        PickupKind::Heal => {
            player.hp = (player.hp + player.max_hp * tuning.heal_fraction).min(player.max_hp);
        }
        PickupKind::Shield => {
            player.shield_charges = player.shield_charges.saturating_add(1).min(tuning.max_shield_charges);
        }
        PickupKind::Companion => {
            if state.companions.len() < tuning.max_companions {
                let slot = state.companions.len();
                state.companions.push(Companion::new(slot, tuning.companion_offset));
            } else {
                player.bonus_level = player.bonus_level.saturating_add(1).min(max_level);
            }
        }
        PickupKind::Power => {
            player.weapon_level = player.weapon_level.saturating_add(1).min(max_level);
        }
        PickupKind::Speed => {
            player.speed_multiplier = tuning.speed_multiplier;
            player.speed_timer = tuning.speed_duration;
        }
    }

    log::debug!("Collected {:?}", kind);
    state.emit(GameEvent::PickupCollected { kind });
}
