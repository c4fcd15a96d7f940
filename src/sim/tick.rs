//! Frame simulation tick
//!
//! One call per rendered frame. Order: world clock, player, companions, boss
//! trigger and spawns, enemies, boss, pool advance, collisions, stage flow.

use glam::Vec2;

use super::attack;
use super::collision;
use super::pools::{self, Body};
use super::progression;
use super::spawn;
use super::state::{BossPhase, Bullet, GameState};
use crate::clamp_axis;
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal movement in [-1, 1]
    pub move_x: f32,
    /// Vertical movement in [-1, 1] (positive is down)
    pub move_y: f32,
    /// Fire held
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    /// Clamped movement vector, never longer than 1
    pub fn movement(&self) -> Vec2 {
        let v = Vec2::new(clamp_axis(self.move_x), clamp_axis(self.move_y));
        if v.length_squared() > 1.0 { v.normalize() } else { v }
    }
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Pausing returns immediately, unpausing runs this frame
    if input.pause {
        progression::toggle_pause(state);
    }
    if !state.is_playing() {
        return;
    }
    if dt.is_nan() || dt <= 0.0 {
        return;
    }
    let dt = dt.min(MAX_DT);

    update_world(state, dt);
    update_player(state, input, dt);
    update_companions(state, input, dt);

    spawn::check_boss_trigger(state);
    spawn::update_spawns(state, dt);
    update_enemies(state, dt);
    update_boss(state, dt);

    let (width, height) = (state.tuning.field_width, state.tuning.field_height);
    pools::advance_bullets(&mut state.player_bullets, dt, width, height);
    pools::advance_bullets(&mut state.enemy_bullets, dt, width, height);
    pools::advance_pickups(&mut state.pickups, dt, state.tuning.pickup_gravity, width, height);
    pools::advance_particles(&mut state.particles, dt);

    collision::resolve(state);
    progression::update_stage_flow(state);
}

fn update_world(state: &mut GameState, dt: f32) {
    let world = &mut state.world;
    world.time += dt;
    world.scroll_x += world.scroll_speed * dt;
    world.difficulty = 1 + (world.time / state.tuning.difficulty_step_secs.max(f32::EPSILON)) as u32;
}

fn update_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let width = state.tuning.field_width;
    let height = state.tuning.field_height;
    let player = &mut state.player;

    player.invulnerable = (player.invulnerable - dt).max(0.0);
    if player.speed_timer > 0.0 {
        player.speed_timer -= dt;
        if player.speed_timer <= 0.0 {
            player.speed_timer = 0.0;
            player.speed_multiplier = 1.0;
        }
    }

    player.pos += input.movement() * player.speed() * dt;
    let r = player.radius;
    player.pos.x = player.pos.x.clamp(r, (width - r).max(r));
    player.pos.y = player.pos.y.clamp(r, (height - r).max(r));

    player.fire_cooldown -= dt;
    if input.fire && player.fire_cooldown <= 0.0 {
        player.fire_cooldown = state.tuning.fire_interval;
        fire_volley(state);
    }
}

/// Parallel shot lines fanning out from the nose; the center line becomes a
/// beam at full weapon level
fn fire_volley(state: &mut GameState) {
    let tuning = &state.tuning;
    let player = &state.player;
    let lines = player.shot_lines(tuning.max_shot_lines);
    let beam = player.weapon_level >= tuning.max_level();
    let origin = player.pos + Vec2::new(player.radius, 0.0);
    let center = (lines - 1) as f32 / 2.0;

    for i in 0..lines {
        let offset = i as f32 - center;
        let pos = origin + Vec2::new(0.0, offset * 6.0);
        let bullet = if beam && i == lines / 2 {
            Bullet::beam(pos, Vec2::new(tuning.beam_speed, 0.0), tuning.beam_radius, tuning.beam_ttl)
        } else {
            Bullet::player(
                pos,
                Vec2::new(tuning.shot_speed, offset * tuning.shot_spread),
                tuning.shot_radius,
            )
        };
        state.player_bullets.push(bullet);
    }
}

fn update_companions(state: &mut GameState, input: &TickInput, dt: f32) {
    let player_pos = state.player.pos;
    let tuning = &state.tuning;
    for companion in state.companions.iter_mut() {
        companion.fire_cooldown -= dt;
        if input.fire && companion.fire_cooldown <= 0.0 {
            companion.fire_cooldown = tuning.companion_fire_interval;
            state.player_bullets.push(Bullet::companion(
                companion.position(player_pos),
                Vec2::new(tuning.companion_shot_speed, 0.0),
                tuning.shot_radius,
            ));
        }
    }
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let target = state.player.pos;
    let stage = state.world.stage;
    let width = state.tuning.field_width;
    let height = state.tuning.field_height;

    for enemy in state.enemies.iter_mut() {
        enemy.integrate(dt);
        enemy.steer(dt, target);
        // Hold fire until on screen
        if enemy.pos.x <= width {
            attack::try_attack(
                enemy,
                target,
                dt,
                stage,
                &state.tuning,
                &mut state.rng,
                &mut state.enemy_bullets,
            );
        }
    }
    pools::sweep_enemies(&mut state.enemies, width, height);
}

fn update_boss(state: &mut GameState, dt: f32) {
    let target = state.player.pos;
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    boss.advance(dt);
    if boss.phase == BossPhase::Fight {
        attack::boss_attack(
            boss,
            target,
            dt,
            &state.tuning,
            &mut state.rng,
            &mut state.enemy_bullets,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn::spawn_enemy_at;
    use crate::sim::state::{
        Boss, EnemyKind, GameEvent, GamePhase, PauseReason, Pickup, PickupKind, StagePhase,
    };
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    /// Playing state with spawns pushed far out and no start shield
    fn quiet_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Tuning::default());
        progression::start(&mut state, seed);
        state.spawn.timer = 1000.0;
        state.player.invulnerable = 0.0;
        state
    }

    fn count_events(state: &GameState, pred: impl Fn(&GameEvent) -> bool) -> usize {
        state.events.iter().filter(|e| pred(*e)).count()
    }

    #[test]
    fn test_tick_pause() {
        let mut state = quiet_state(1);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, FRAME_DT);
        assert_eq!(state.phase, GamePhase::Paused(PauseReason::User));
        let time = state.world.time;

        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(state.world.time, time);

        tick(&mut state, &pause, FRAME_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.world.time > time);
    }

    #[test]
    fn test_title_ignores_ticks() {
        let mut state = GameState::new(1, Tuning::default());
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(state.phase, GamePhase::Title);
        assert_eq!(state.world.time, 0.0);
    }

    #[test]
    fn test_zero_dt_changes_nothing() {
        let mut state = quiet_state(3);
        let pos = Vec2::new(500.0, 200.0);
        spawn_enemy_at(&mut state, EnemyKind::Grunt, pos, Vec2::new(-100.0, 0.0));
        state.player_bullets.push(Bullet::player(Vec2::new(200.0, 100.0), Vec2::X * 500.0, 4.0));
        let before = state.clone();

        let input = TickInput {
            move_x: 1.0,
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, 0.0);
        tick(&mut state, &input, -1.0);
        tick(&mut state, &input, f32::NAN);

        assert_eq!(state.world.time, before.world.time);
        assert_eq!(state.player.pos, before.player.pos);
        assert_eq!(state.enemies[0].pos, before.enemies[0].pos);
        assert_eq!(state.player_bullets.len(), before.player_bullets.len());
        assert_eq!(state.player_bullets[0].pos, before.player_bullets[0].pos);
        assert_eq!(state.spawn.timer, before.spawn.timer);
        assert!(state.events.is_empty());
        let mut a = state.rng.clone();
        let mut b = before.rng.clone();
        assert_eq!(a.next_f32(), b.next_f32());
    }

    #[test]
    fn test_dt_clamped() {
        let mut state = quiet_state(3);
        tick(&mut state, &TickInput::default(), 5.0);
        assert!((state.world.time - MAX_DT).abs() < 1e-6);
    }

    #[test]
    fn test_movement_clamped_and_normalized() {
        let input = TickInput {
            move_x: 3.0,
            move_y: -3.0,
            ..Default::default()
        };
        let v = input.movement();
        assert!((v.length() - 1.0).abs() < 1e-5);
        assert!(v.x > 0.0 && v.y < 0.0);

        let input = TickInput {
            move_x: f32::NAN,
            move_y: 0.5,
            ..Default::default()
        };
        assert_eq!(input.movement(), Vec2::new(0.0, 0.5));
    }

    #[test]
    fn test_player_stays_on_field() {
        let mut state = quiet_state(5);
        let input = TickInput {
            move_x: -1.0,
            move_y: -1.0,
            ..Default::default()
        };
        for _ in 0..300 {
            tick(&mut state, &input, FRAME_DT);
        }
        assert_eq!(state.player.pos, Vec2::splat(state.player.radius));
    }

    #[test]
    fn test_volley_widens_with_weapon_level() {
        let mut state = quiet_state(5);
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, FRAME_DT);
        assert_eq!(state.player_bullets.len(), 1);

        state.player_bullets.clear();
        state.player.weapon_level = 2;
        state.player.fire_cooldown = 0.0;
        tick(&mut state, &fire, FRAME_DT);
        assert_eq!(state.player_bullets.len(), 3);
        assert!(state.player_bullets.iter().all(|b| !b.pierce));

        state.player_bullets.clear();
        state.player.weapon_level = state.tuning.max_level();
        state.player.fire_cooldown = 0.0;
        tick(&mut state, &fire, FRAME_DT);
        assert_eq!(state.player_bullets.len(), MAX_SHOT_LINES as usize);
        assert_eq!(state.player_bullets.iter().filter(|b| b.pierce).count(), 1);
    }

    #[test]
    fn test_even_line_count_still_fires_beam() {
        let tuning = Tuning::from_json(r#"{ "max_shot_lines": 4 }"#).unwrap();
        let mut state = GameState::new(5, tuning);
        progression::start(&mut state, 5);
        state.spawn.timer = 1000.0;
        state.player.weapon_level = state.tuning.max_level();
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, FRAME_DT);
        assert_eq!(state.player_bullets.len(), 4);
        assert_eq!(state.player_bullets.iter().filter(|b| b.pierce).count(), 1);
    }

    #[test]
    fn test_companions_fire_with_player() {
        let mut state = quiet_state(5);
        collision::apply_pickup(&mut state, PickupKind::Companion);
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, FRAME_DT);
        assert_eq!(state.player_bullets.len(), 2);
    }

    #[test]
    fn test_speed_boost_expires() {
        let mut state = quiet_state(5);
        collision::apply_pickup(&mut state, PickupKind::Speed);
        assert!(state.player.speed() > state.player.base_speed);
        let steps = (state.tuning.speed_duration / FRAME_DT) as usize + 5;
        for _ in 0..steps {
            tick(&mut state, &TickInput::default(), FRAME_DT);
        }
        assert_eq!(state.player.speed_multiplier, 1.0);
    }

    #[test]
    fn test_grunt_killed_by_shot() {
        let mut state = quiet_state(7);
        spawn_enemy_at(&mut state, EnemyKind::Grunt, Vec2::new(300.0, 270.0), Vec2::ZERO);
        state.player_bullets.push(Bullet::player(Vec2::new(290.0, 270.0), Vec2::new(520.0, 0.0), 4.0));

        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert!(state.enemies.is_empty());
        assert_eq!(state.world.score, 50 + state.world.difficulty as u64 * 10);
        assert_eq!(
            count_events(&state, |e| matches!(e, GameEvent::EnemyDestroyed { kind: EnemyKind::Grunt, .. })),
            1
        );
    }

    #[test]
    fn test_contact_kills_weak_player() {
        let mut state = quiet_state(7);
        state.player.hp = 20.0;
        let pos = state.player.pos;
        spawn_enemy_at(&mut state, EnemyKind::Grunt, pos, Vec2::ZERO);

        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(state.player.hp, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(count_events(&state, |e| matches!(e, GameEvent::GameOver { .. })), 1);

        // Further frames are inert
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(count_events(&state, |e| matches!(e, GameEvent::GameOver { .. })), 1);
    }

    #[test]
    fn test_threshold_summons_single_boss() {
        let mut state = quiet_state(11);
        state.spawn.timer = 0.0;
        for i in 0..3 {
            spawn_enemy_at(
                &mut state,
                EnemyKind::Grunt,
                Vec2::new(600.0, 100.0 + 100.0 * i as f32),
                Vec2::ZERO,
            );
        }
        state.enemy_bullets.push(Bullet::enemy(Vec2::new(800.0, 500.0), Vec2::ZERO, 4.0));
        state.world.score = state.tuning.threshold(1);
        state.player.invulnerable = 1.0e9;

        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert!(state.boss.is_some());
        assert!(state.enemies.is_empty());
        assert!(state.enemy_bullets.is_empty());

        for _ in 0..1200 {
            tick(&mut state, &TickInput::default(), FRAME_DT);
            assert!(state.enemies.is_empty());
            assert!(state.boss.is_some());
        }
        assert_eq!(count_events(&state, |e| matches!(e, GameEvent::BossSpawned { .. })), 1);
        assert_eq!(state.stage_phase, StagePhase::BossFight);
    }

    #[test]
    fn test_boss_defeat_pauses_for_stage_clear() {
        let mut state = quiet_state(13);
        let mut boss = Boss::new(500, 1, &state.tuning);
        boss.pos = Vec2::new(700.0, 270.0);
        boss.vel = Vec2::ZERO;
        boss.phase = BossPhase::Fight;
        boss.fire_cooldown = 100.0;
        boss.hp = state.tuning.boss_hit_damage;
        state.boss = Some(boss);
        state.world.bosses_spawned.insert(1);
        state.stage_phase = StagePhase::BossFight;
        state.player_bullets.push(Bullet::player(Vec2::new(690.0, 270.0), Vec2::new(520.0, 0.0), 4.0));

        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert!(state.boss.is_none());
        assert_eq!(state.phase, GamePhase::Paused(PauseReason::StageClear));

        // Pause input cannot leave a stage-clear pause
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &pause, FRAME_DT);
        }
        assert_eq!(state.phase, GamePhase::Paused(PauseReason::StageClear));
        assert_eq!(count_events(&state, |e| matches!(e, GameEvent::StageCleared { stage: 1 })), 1);

        assert!(progression::acknowledge_stage_clear(&mut state));
        assert_eq!(state.world.stage, 2);
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_spawns_resume_after_stage_clear() {
        let mut state = quiet_state(19);
        state.world.score = state.tuning.threshold(1);
        state.player.invulnerable = 1.0e9;
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert!(state.boss.is_some());

        if let Some(boss) = state.boss.as_mut() {
            boss.pos = Vec2::new(700.0, 270.0);
            boss.vel = Vec2::ZERO;
            boss.phase = BossPhase::Fight;
            boss.fire_cooldown = 100.0;
            boss.hp = state.tuning.boss_hit_damage;
        }
        state.player_bullets.push(Bullet::player(Vec2::new(690.0, 270.0), Vec2::new(520.0, 0.0), 4.0));
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert!(state.boss.is_none());
        assert_eq!(state.phase, GamePhase::Paused(PauseReason::StageClear));

        assert!(progression::acknowledge_stage_clear(&mut state));
        assert_eq!(state.world.stage, 2);
        // Stay below the stage 2 threshold
        state.world.score = state.tuning.threshold(1);
        state.player.invulnerable = 1.0e9;

        let mut most = 0;
        for _ in 0..300 {
            tick(&mut state, &TickInput::default(), FRAME_DT);
            most = most.max(state.enemies.len());
        }
        assert!(state.boss.is_none());
        assert!(most > 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let inputs: Vec<TickInput> = (0..900)
            .map(|i| TickInput {
                move_x: ((i / 60) % 3) as f32 - 1.0,
                move_y: ((i / 45) % 3) as f32 - 1.0,
                fire: i % 2 == 0,
                pause: false,
            })
            .collect();

        let run = |seed: u64| {
            let mut state = GameState::new(seed, Tuning::default());
            progression::start(&mut state, seed);
            for input in &inputs {
                tick(&mut state, input, FRAME_DT);
            }
            state
        };

        let a = run(77);
        let b = run(77);
        assert_eq!(a.world.score, b.world.score);
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.enemy_bullets.len(), b.enemy_bullets.len());
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.player.hp, b.player.hp);
        for (ea, eb) in a.enemies.iter().zip(&b.enemies) {
            assert_eq!(ea.pos, eb.pos);
            assert_eq!(ea.kind, eb.kind);
        }
    }

    proptest! {
        #[test]
        fn prop_pools_integrate_before_removal(
            dt in 0.001f32..MAX_DT,
            vx in -300.0f32..300.0,
            vy in -300.0f32..300.0
        ) {
            let mut state = quiet_state(21);
            let vel = Vec2::new(vx, vy);
            // Kept clear of each other and of the player
            spawn_enemy_at(&mut state, EnemyKind::Grunt, Vec2::new(500.0, 100.0), vel);
            state.enemies[0].attack = attack::AttackState::silent();
            state.player_bullets.push(Bullet::player(Vec2::new(300.0, 450.0), vel, 4.0));
            state.enemy_bullets.push(Bullet::enemy(Vec2::new(700.0, 400.0), vel, 4.0));
            state.pickups.push(Pickup {
                id: 900,
                kind: PickupKind::Heal,
                pos: Vec2::new(600.0, 250.0),
                vel,
                radius: 10.0,
            });

            tick(&mut state, &TickInput::default(), dt);

            let close = |a: Vec2, b: Vec2| (a - b).length() < 1e-3;
            prop_assert!(close(state.enemies[0].pos, Vec2::new(500.0, 100.0) + vel * dt));
            prop_assert!(close(state.player_bullets[0].pos, Vec2::new(300.0, 450.0) + vel * dt));
            prop_assert!(close(state.enemy_bullets[0].pos, Vec2::new(700.0, 400.0) + vel * dt));
            prop_assert!(close(state.pickups[0].pos, Vec2::new(600.0, 250.0) + vel * dt));
        }
    }
}
