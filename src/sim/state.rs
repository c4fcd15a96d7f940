//! Game state and core simulation types
//!
//! Everything the frame simulator owns lives in [`GameState`]; components get
//! it by `&mut` from the tick and never keep references across frames.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::attack::AttackState;
use super::rng::SessionRng;
use super::spawn::SpawnDirector;
use crate::consts::*;
use crate::tuning::Tuning;

/// Top-level phase; exactly one holds at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first start
    Title,
    /// Active gameplay
    Playing,
    /// Simulation suspended
    Paused(PauseReason),
    /// Run ended
    GameOver,
}

/// Why the simulation is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Player asked for a pause; toggling resumes
    User,
    /// Boss defeated; waits for the stage-clear acknowledgment
    StageClear,
}

/// Stage sub-flow, only advanced while `Playing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagePhase {
    /// Normal enemies spawning, score climbing toward the threshold
    Normal,
    /// Boss summoned and flying in
    BossTriggered,
    /// Boss on station and firing
    BossFight,
    /// Boss destroyed, stage clear pending acknowledgment
    BossDefeated,
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Companion,
    Enemy,
}

/// A projectile of any owner
#[derive(Debug, Clone)]
pub struct Bullet {
    pub pos: Vec2,
    /// Position before the last advance (trail rendering)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub owner: BulletOwner,
    pub damage: i32,
    /// Remaining lifetime for beam shots; `None` lives until off-screen
    pub ttl: Option<f32>,
    /// Beam shots pass through targets instead of being consumed
    pub pierce: bool,
    /// Targets a piercing shot already damaged
    pub hit_ids: Vec<u32>,
    /// Marked during collision resolution, swept afterward
    pub consumed: bool,
}

impl Bullet {
    fn new(pos: Vec2, vel: Vec2, radius: f32, owner: BulletOwner, damage: i32) -> Self {
        Self {
            pos,
            prev_pos: pos,
            vel,
            radius,
            owner,
            damage,
            ttl: None,
            pierce: false,
            hit_ids: Vec::new(),
            consumed: false,
        }
    }

    pub fn player(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self::new(pos, vel, radius, BulletOwner::Player, 1)
    }

    pub fn companion(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self::new(pos, vel, radius, BulletOwner::Companion, 1)
    }

    pub fn enemy(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self::new(pos, vel, radius, BulletOwner::Enemy, 1)
    }

    /// Short-lived piercing shot
    pub fn beam(pos: Vec2, vel: Vec2, radius: f32, ttl: f32) -> Self {
        Self {
            ttl: Some(ttl),
            pierce: true,
            ..Self::new(pos, vel, radius, BulletOwner::Player, 1)
        }
    }

    pub fn expired(&self) -> bool {
        matches!(self.ttl, Some(t) if t <= 0.0)
    }
}

/// Enemy types (closed set, resolved to parameters once at spawn)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Grunt,
    Shooter,
    Waver,
    Charger,
    Tank,
    Mine,
    Sniper,
    Swarmer,
}

/// Per-kind constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyParams {
    pub radius: f32,
    pub hp: i32,
    /// Multiplier on the scroll-relative entry speed
    pub speed_mult: f32,
    /// Base kill score before the difficulty bonus
    pub points: u64,
    pub color: u32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 8] = [
        EnemyKind::Grunt,
        EnemyKind::Shooter,
        EnemyKind::Waver,
        EnemyKind::Charger,
        EnemyKind::Tank,
        EnemyKind::Mine,
        EnemyKind::Sniper,
        EnemyKind::Swarmer,
    ];

    pub fn params(self) -> EnemyParams {
        let (radius, hp, speed_mult, points, color) = match self {
            EnemyKind::Grunt => (16.0, 1, 1.0, 50, 0xff6b6b),
            EnemyKind::Shooter => (18.0, 3, 0.9, 100, 0xffb86b),
            EnemyKind::Waver => (16.0, 2, 0.9, 80, 0xd68bff),
            EnemyKind::Charger => (17.0, 2, 0.7, 120, 0xff4fa0),
            EnemyKind::Tank => (26.0, 8, 0.55, 250, 0x9aa5b1),
            EnemyKind::Mine => (14.0, 4, 0.4, 60, 0xffe14f),
            EnemyKind::Sniper => (18.0, 3, 0.7, 180, 0x4fffd2),
            EnemyKind::Swarmer => (12.0, 1, 1.5, 40, 0xff8f5a),
        };
        EnemyParams {
            radius,
            hp,
            speed_mult,
            points,
            color,
        }
    }

    /// Whether this kind ever shoots
    pub fn fires(self) -> bool {
        !matches!(self, EnemyKind::Mine)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnemyKind::Grunt => "grunt",
            EnemyKind::Shooter => "shooter",
            EnemyKind::Waver => "waver",
            EnemyKind::Charger => "charger",
            EnemyKind::Tank => "tank",
            EnemyKind::Mine => "mine",
            EnemyKind::Sniper => "sniper",
            EnemyKind::Swarmer => "swarmer",
        }
    }
}

/// Enemy steering applied after each advance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveState {
    /// Straight line at spawn velocity
    Drift,
    /// Sinusoidal vertical weave
    Wave {
        phase: f32,
        amplitude: f32,
        frequency: f32,
    },
    /// Drift until `delay` runs out, then dash at the player once
    Charge {
        delay: f32,
        dash_speed: f32,
        dashing: bool,
    },
}

/// A normal enemy
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub hp: i32,
    pub attack: AttackState,
    pub movement: MoveState,
}

impl Enemy {
    /// Steer for the next frame; position has already advanced
    pub fn steer(&mut self, dt: f32, target: Vec2) {
        match &mut self.movement {
            MoveState::Drift => {}
            MoveState::Wave {
                phase,
                amplitude,
                frequency,
            } => {
                *phase += *frequency * dt;
                self.vel.y = *amplitude * phase.cos();
            }
            MoveState::Charge {
                delay,
                dash_speed,
                dashing,
            } => {
                if !*dashing {
                    *delay -= dt;
                    if *delay <= 0.0 {
                        *dashing = true;
                        self.vel = crate::bearing(self.pos, target) * *dash_speed;
                    }
                }
            }
        }
    }
}

/// Boss movement phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Flying in from the right edge
    Enter,
    /// Patrolling vertically and firing
    Fight,
}

/// Stage boss; at most one exists
#[derive(Debug, Clone)]
pub struct Boss {
    pub id: u32,
    pub stage: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub phase: BossPhase,
    /// Horizontal station the boss settles on
    pub patrol_x: f32,
    pub patrol_top: f32,
    pub patrol_bottom: f32,
    pub fire_cooldown: f32,
    /// Next entry in the stage's volley rotation
    pub volley_index: usize,
}

/// Entry speed while flying in
pub const BOSS_ENTRY_SPEED: f32 = 120.0;
/// Vertical patrol speed
pub const BOSS_PATROL_SPEED: f32 = 90.0;

impl Boss {
    pub fn new(id: u32, stage: u32, tuning: &Tuning) -> Self {
        let radius = tuning.boss_radius;
        let hp = tuning.boss_hp(stage);
        Self {
            id,
            stage,
            pos: Vec2::new(tuning.field_width + radius, tuning.field_height / 2.0),
            vel: Vec2::new(-BOSS_ENTRY_SPEED, 0.0),
            radius,
            hp,
            max_hp: hp,
            phase: BossPhase::Enter,
            patrol_x: tuning.field_width * 0.8,
            patrol_top: radius + 20.0,
            patrol_bottom: tuning.field_height - radius - 20.0,
            fire_cooldown: tuning.boss_fire_interval,
            volley_index: 0,
        }
    }

    /// Move one step and apply the phase rules
    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        match self.phase {
            BossPhase::Enter => {
                if self.pos.x <= self.patrol_x {
                    self.pos.x = self.patrol_x;
                    self.vel = Vec2::new(0.0, BOSS_PATROL_SPEED);
                    self.phase = BossPhase::Fight;
                }
            }
            BossPhase::Fight => {
                if self.pos.y <= self.patrol_top {
                    self.pos.y = self.patrol_top;
                    self.vel.y = self.vel.y.abs();
                } else if self.pos.y >= self.patrol_bottom {
                    self.pos.y = self.patrol_bottom;
                    self.vel.y = -self.vel.y.abs();
                }
            }
        }
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            0.0
        } else {
            (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
        }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Heal,
    Shield,
    Companion,
    Power,
    Speed,
}

impl PickupKind {
    pub const ALL: [PickupKind; 5] = [
        PickupKind::Heal,
        PickupKind::Shield,
        PickupKind::Companion,
        PickupKind::Power,
        PickupKind::Speed,
    ];

    pub fn color(self) -> u32 {
        match self {
            PickupKind::Heal => 0x6bff8f,
            PickupKind::Shield => 0x0088ff,
            PickupKind::Companion => 0x57c7ff,
            PickupKind::Power => 0xff3b3b,
            PickupKind::Speed => 0xffe14f,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PickupKind::Heal => "H",
            PickupKind::Shield => "B",
            PickupKind::Companion => "C",
            PickupKind::Power => "P",
            PickupKind::Speed => "S",
        }
    }
}

/// A falling power-up
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// Satellite that follows the player and fires alongside
#[derive(Debug, Clone)]
pub struct Companion {
    pub slot: usize,
    /// Vertical offset from the player
    pub offset_y: f32,
    pub fire_cooldown: f32,
}

impl Companion {
    /// Slots alternate above and below the player, widening outward
    pub fn new(slot: usize, spacing: f32) -> Self {
        let ring = (slot / 2 + 1) as f32;
        let side = if slot % 2 == 0 { -1.0 } else { 1.0 };
        Self {
            slot,
            offset_y: side * ring * spacing,
            fire_cooldown: 0.0,
        }
    }

    pub fn position(&self, player_pos: Vec2) -> Vec2 {
        player_pos + Vec2::new(-10.0, self.offset_y)
    }
}

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub color: u32,
    pub size: f32,
}

/// The player's ship
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub base_speed: f32,
    /// Active move-speed multiplier from a speed pickup
    pub speed_multiplier: f32,
    /// Seconds left on the speed multiplier
    pub speed_timer: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub fire_cooldown: f32,
    /// Seconds of remaining invulnerability
    pub invulnerable: f32,
    pub shield_charges: u8,
    /// Extra parallel shot lines from power pickups
    pub weapon_level: u8,
    /// Extra shot lines from companions collected past the cap
    pub bonus_level: u8,
    pub alive: bool,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(100.0, tuning.field_height / 2.0),
            radius: tuning.player_radius,
            base_speed: tuning.player_speed,
            speed_multiplier: 1.0,
            speed_timer: 0.0,
            hp: tuning.player_max_hp,
            max_hp: tuning.player_max_hp,
            fire_cooldown: 0.0,
            invulnerable: tuning.start_invulnerability,
            shield_charges: 0,
            weapon_level: 0,
            bonus_level: 0,
            alive: true,
        }
    }

    pub fn speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        }
    }

    /// Parallel lines in one volley
    pub fn shot_lines(&self, max_lines: u8) -> u8 {
        1u8.saturating_add(self.weapon_level)
            .saturating_add(self.bonus_level)
            .min(max_lines.max(1))
    }
}

/// Scrolling world and progression counters
#[derive(Debug, Clone)]
pub struct World {
    /// Seconds of play this run
    pub time: f32,
    pub scroll_x: f32,
    pub scroll_speed: f32,
    /// 1 + one step per `difficulty_step_secs`
    pub difficulty: u32,
    /// Current stage (1-based)
    pub stage: u32,
    pub score: u64,
    /// Score when the current stage began
    pub stage_baseline_score: u64,
    /// Stages whose boss has already appeared
    pub bosses_spawned: BTreeSet<u32>,
}

impl World {
    pub fn new(scroll_speed: f32) -> Self {
        Self {
            time: 0.0,
            scroll_x: 0.0,
            scroll_speed,
            difficulty: 1,
            stage: 1,
            score: 0,
            stage_baseline_score: 0,
            bosses_spawned: BTreeSet::new(),
        }
    }
}

/// Discrete outputs for UI/audio collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    StageCleared { stage: u32 },
    GameOver { score: u64, stage: u32 },
    PickupCollected { kind: PickupKind },
    BossSpawned { stage: u32 },
    EnemyDestroyed { kind: EnemyKind, points: u64 },
    PlayerHit { damage: f32 },
    ShieldAbsorbed,
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub rng: SessionRng,
    pub phase: GamePhase,
    pub stage_phase: StagePhase,
    pub world: World,
    pub player: Player,
    pub companions: Vec<Companion>,
    /// Player and companion shots
    pub player_bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub pickups: Vec<Pickup>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub spawn: SpawnDirector,
    /// Effective particle cap (tuning cap narrowed by settings)
    pub max_particles: usize,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a state on the title screen
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let max_particles = tuning.max_particles.min(MAX_PARTICLES);
        Self {
            rng: SessionRng::new(seed),
            phase: GamePhase::Title,
            stage_phase: StagePhase::Normal,
            world: World::new(tuning.scroll_speed),
            player: Player::new(&tuning),
            companions: Vec::new(),
            player_bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            enemies: Vec::new(),
            boss: None,
            pickups: Vec::new(),
            particles: Vec::new(),
            spawn: SpawnDirector::default(),
            max_particles,
            events: Vec::new(),
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn boss_active(&self) -> bool {
        self.boss.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Add score; score never decreases during a run
    pub fn add_score(&mut self, points: u64) {
        self.world.score = self.world.score.saturating_add(points);
    }

    /// Spawn a pickup drifting back with the scroll
    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.pickups.push(Pickup {
            id,
            kind,
            pos,
            vel: Vec2::new(-self.world.scroll_speed * 0.5, -40.0),
            radius: self.tuning.pickup_radius,
        });
        id
    }

    /// Radial burst of cosmetic particles
    pub fn burst(&mut self, pos: Vec2, color: u32, count: usize) {
        for _ in 0..count {
            let angle = self.rng.next_f32() * std::f32::consts::TAU;
            let speed = self.rng.range(80.0, 240.0);
            let life = self.rng.range(0.5, 1.0);
            let size = self.rng.range(2.0, 5.0);
            self.particles.push(Particle {
                pos,
                vel: crate::from_angle(angle) * speed,
                life,
                color,
                size,
            });
        }
        if self.particles.len() > self.max_particles {
            let excess = self.particles.len() - self.max_particles;
            self.particles.drain(..excess);
        }
    }
}
