//! Renderable view of the simulation
//!
//! A renderer never touches [`GameState`]; it gets a flat, serializable
//! [`RenderSnapshot`] in draw order, or walks it through a [`DrawSink`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{BulletOwner, EnemyKind, GamePhase, GameState, PauseReason, PickupKind, StagePhase};

pub const PLAYER_COLOR: u32 = 0x7fd7ff;
pub const COMPANION_COLOR: u32 = 0x57c7ff;
pub const SHOT_COLOR: u32 = 0xfff27f;
pub const BEAM_COLOR: u32 = 0xff7ff2;
pub const ENEMY_SHOT_COLOR: u32 = 0xff5c5c;
pub const BOSS_COLOR: u32 = 0xc04fff;
pub const HUD_COLOR: u32 = 0xffffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Player,
    Companion,
    PlayerShot,
    CompanionShot,
    Beam,
    EnemyShot,
    Enemy(EnemyKind),
    Boss,
    Pickup(PickupKind),
    Particle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_type: EntityType,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: u32,
    /// Previous position for bullet trails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail: Option<(f32, f32)>,
}

impl EntitySnapshot {
    fn new(entity_type: EntityType, pos: Vec2, radius: f32, color: u32) -> Self {
        Self {
            entity_type,
            x: pos.x,
            y: pos.y,
            radius,
            color,
            trail: None,
        }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub stage_phase: StagePhase,
    pub stage: u32,
    pub score: u64,
    pub difficulty: u32,
    pub scroll_x: f32,
    pub hp_fraction: f32,
    /// Present only while a boss is on the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boss_hp_fraction: Option<f32>,
    pub shield_charges: u8,
    pub weapon_level: u8,
    pub companions: usize,
    pub invulnerable: bool,
    pub width: f32,
    pub height: f32,
    /// Back to front
    pub entities: Vec<EntitySnapshot>,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let mut entities = Vec::with_capacity(
            state.particles.len()
                + state.pickups.len()
                + state.enemies.len()
                + state.player_bullets.len()
                + state.enemy_bullets.len()
                + state.companions.len()
                + 2,
        );

        entities.extend(state.particles.iter().map(|p| {
            EntitySnapshot::new(EntityType::Particle, p.pos, p.size, p.color)
        }));
        entities.extend(state.pickups.iter().map(|p| {
            EntitySnapshot::new(EntityType::Pickup(p.kind), p.pos, p.radius, p.kind.color())
        }));
        entities.extend(state.enemies.iter().map(|e| {
            EntitySnapshot::new(EntityType::Enemy(e.kind), e.pos, e.radius, e.kind.params().color)
        }));
        if let Some(boss) = &state.boss {
            entities.push(EntitySnapshot::new(EntityType::Boss, boss.pos, boss.radius, BOSS_COLOR));
        }
        for bullet in state.player_bullets.iter().chain(&state.enemy_bullets) {
            let (entity_type, color) = match bullet.owner {
                BulletOwner::Player if bullet.pierce => (EntityType::Beam, BEAM_COLOR),
                BulletOwner::Player => (EntityType::PlayerShot, SHOT_COLOR),
                BulletOwner::Companion => (EntityType::CompanionShot, COMPANION_COLOR),
                BulletOwner::Enemy => (EntityType::EnemyShot, ENEMY_SHOT_COLOR),
            };
            let mut view = EntitySnapshot::new(entity_type, bullet.pos, bullet.radius, color);
            view.trail = Some((bullet.prev_pos.x, bullet.prev_pos.y));
            entities.push(view);
        }
        let player = &state.player;
        entities.extend(state.companions.iter().map(|c| {
            EntitySnapshot::new(EntityType::Companion, c.position(player.pos), 8.0, COMPANION_COLOR)
        }));
        if player.alive {
            entities.push(EntitySnapshot::new(EntityType::Player, player.pos, player.radius, PLAYER_COLOR));
        }

        Self {
            phase: state.phase,
            stage_phase: state.stage_phase,
            stage: state.world.stage,
            score: state.world.score,
            difficulty: state.world.difficulty,
            scroll_x: state.world.scroll_x,
            hp_fraction: player.hp_fraction(),
            boss_hp_fraction: state.boss.as_ref().map(|b| b.hp_fraction()),
            shield_charges: player.shield_charges,
            weapon_level: player.weapon_level,
            companions: state.companions.len(),
            invulnerable: player.invulnerable > 0.0,
            width: state.tuning.field_width,
            height: state.tuning.field_height,
            entities,
        }
    }

    pub fn count(&self, entity_type: EntityType) -> usize {
        self.entities.iter().filter(|e| e.entity_type == entity_type).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Walk the snapshot through a drawing backend: entities, then HUD,
    /// then the phase overlay
    pub fn draw<S: DrawSink>(&self, sink: &mut S) {
        for entity in &self.entities {
            sink.circle(entity.pos(), entity.radius, entity.color);
            if let EntityType::Pickup(kind) = entity.entity_type {
                sink.text(entity.pos(), kind.label(), HUD_COLOR);
            }
        }

        sink.text(Vec2::new(12.0, 20.0), &format!("SCORE {}", self.score), HUD_COLOR);
        sink.text(Vec2::new(12.0, 40.0), &format!("STAGE {}", self.stage), HUD_COLOR);
        sink.text(
            Vec2::new(12.0, 60.0),
            &format!("HP {:.0}%", self.hp_fraction * 100.0),
            HUD_COLOR,
        );
        if let Some(fraction) = self.boss_hp_fraction {
            sink.text(
                Vec2::new(self.width / 2.0, 20.0),
                &format!("BOSS {:.0}%", fraction * 100.0),
                BOSS_COLOR,
            );
        }

        let center = Vec2::new(self.width / 2.0, self.height / 2.0);
        match self.phase {
            GamePhase::Title => sink.text(center, "SHMUP ZERO", HUD_COLOR),
            GamePhase::Paused(PauseReason::User) => sink.text(center, "PAUSED", HUD_COLOR),
            GamePhase::Paused(PauseReason::StageClear) => {
                sink.text(center, &format!("STAGE {} CLEAR", self.stage), HUD_COLOR)
            }
            GamePhase::GameOver => sink.text(center, "GAME OVER", HUD_COLOR),
            GamePhase::Playing => {}
        }
    }
}

/// Drawing backend seam (canvas, terminal, test recorder)
pub trait DrawSink {
    fn circle(&mut self, pos: Vec2, radius: f32, color: u32);
    fn text(&mut self, pos: Vec2, text: &str, color: u32);
}
