//! Data-driven game balance
//!
//! Every gameplay constant that differed between the old game variants lives
//! here, so one simulator covers all of them. Loaded from JSON; missing fields
//! take their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::PickupKind;

/// Upper bound accepted for `max_shot_lines`
pub const SHOT_LINES_LIMIT: u8 = 64;

/// Errors raised while loading a tuning file
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Independent drop probabilities rolled when an enemy dies.
///
/// The bands are laid end to end on [0, 1), so at most one pickup drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropChances {
    pub heal: f32,
    pub shield: f32,
    pub companion: f32,
    pub power: f32,
    pub speed: f32,
}

impl Default for DropChances {
    fn default() -> Self {
        Self {
            heal: 0.06,
            shield: 0.04,
            companion: 0.03,
            power: 0.05,
            speed: 0.04,
        }
    }
}

impl DropChances {
    pub fn total(&self) -> f32 {
        self.heal + self.shield + self.companion + self.power + self.speed
    }

    /// Map a roll in [0, 1) onto the drop bands
    pub fn roll(&self, r: f32) -> Option<PickupKind> {
        let bands = [
            (PickupKind::Heal, self.heal),
            (PickupKind::Shield, self.shield),
            (PickupKind::Companion, self.companion),
            (PickupKind::Power, self.power),
            (PickupKind::Speed, self.speed),
        ];
        let mut edge = 0.0;
        for (kind, chance) in bands {
            edge += chance;
            if r < edge {
                return Some(kind);
            }
        }
        None
    }
}

/// Complete balance sheet for one simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub field_width: f32,
    pub field_height: f32,
    /// Background scroll speed (pixels/s); enemies move relative to it
    pub scroll_speed: f32,
    /// Seconds of play per difficulty step
    pub difficulty_step_secs: f32,

    // === Player ===
    pub player_radius: f32,
    pub player_speed: f32,
    pub player_max_hp: f32,
    /// Seconds between player volleys
    pub fire_interval: f32,
    /// Invulnerability granted at the start of a run
    pub start_invulnerability: f32,
    pub shot_speed: f32,
    pub shot_radius: f32,
    /// Vertical velocity added per line away from the center line
    pub shot_spread: f32,
    /// Beam shot fired on the center line at maximum weapon level
    pub beam_speed: f32,
    pub beam_radius: f32,
    pub beam_ttl: f32,
    pub max_shot_lines: u8,

    // === Companions ===
    pub max_companions: usize,
    pub companion_offset: f32,
    pub companion_fire_interval: f32,
    pub companion_shot_speed: f32,

    // === Damage ===
    pub max_shield_charges: u8,
    pub shield_grace: f32,
    pub enemy_bullet_damage: f32,
    pub enemy_bullet_grace: f32,
    pub enemy_contact_damage: f32,
    pub enemy_contact_grace: f32,
    pub boss_contact_damage: f32,
    pub boss_contact_grace: f32,

    // === Pickups ===
    /// Fraction of max hp restored by a heal
    pub heal_fraction: f32,
    pub speed_multiplier: f32,
    pub speed_duration: f32,
    pub pickup_radius: f32,
    pub pickup_gravity: f32,
    pub drops: DropChances,

    // === Enemies ===
    pub enemy_bullet_speed: f32,
    pub snipe_bullet_speed: f32,
    pub enemy_bullet_radius: f32,
    /// Chance of a second enemy joining a spawn (stage 2+)
    pub second_spawn_chance: f32,

    // === Boss ===
    pub boss_base_hp: i32,
    pub boss_hp_per_stage: i32,
    pub boss_radius: f32,
    /// Damage every player shot deals to a boss
    pub boss_hit_damage: i32,
    pub boss_points_per_stage: u64,
    pub boss_fire_interval: f32,

    // === Progression ===
    /// Score at which each stage's boss appears (monotonically increasing)
    pub stage_thresholds: Vec<u64>,
    /// Threshold increment for stages past the table
    pub threshold_step: u64,

    pub max_particles: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            scroll_speed: 160.0,
            difficulty_step_secs: 20.0,

            player_radius: 16.0,
            player_speed: 420.0,
            player_max_hp: 100.0,
            fire_interval: 0.12,
            start_invulnerability: 1.2,
            shot_speed: 520.0,
            shot_radius: 4.0,
            shot_spread: 60.0,
            beam_speed: 900.0,
            beam_radius: 6.0,
            beam_ttl: 0.35,
            max_shot_lines: MAX_SHOT_LINES,

            max_companions: 2,
            companion_offset: 36.0,
            companion_fire_interval: 0.3,
            companion_shot_speed: 480.0,

            max_shield_charges: 3,
            shield_grace: 0.3,
            enemy_bullet_damage: 20.0,
            enemy_bullet_grace: 0.5,
            enemy_contact_damage: 30.0,
            enemy_contact_grace: 0.6,
            boss_contact_damage: 40.0,
            boss_contact_grace: 0.8,

            heal_fraction: 0.3,
            speed_multiplier: 1.5,
            speed_duration: 6.0,
            pickup_radius: 10.0,
            pickup_gravity: 30.0,
            drops: DropChances::default(),

            enemy_bullet_speed: 200.0,
            snipe_bullet_speed: 380.0,
            enemy_bullet_radius: 4.0,
            second_spawn_chance: 0.2,

            boss_base_hp: 120,
            boss_hp_per_stage: 60,
            boss_radius: 48.0,
            boss_hit_damage: 2,
            boss_points_per_stage: 1000,
            boss_fire_interval: 1.4,

            stage_thresholds: vec![1500, 4000, 8000, 13000, 20000],
            threshold_step: 8000,

            max_particles: MAX_PARTICLES,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json_pretty(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants the simulator relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.field_width <= 0.0 || self.field_height <= 0.0 {
            return Err(TuningError::Invalid("field must have positive size".into()));
        }
        if self.stage_thresholds.is_empty() {
            return Err(TuningError::Invalid("at least one stage threshold required".into()));
        }
        if self.stage_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TuningError::Invalid(
                "stage thresholds must be strictly increasing".into(),
            ));
        }
        if self.threshold_step == 0 {
            return Err(TuningError::Invalid("threshold_step must be positive".into()));
        }
        if self.max_shot_lines == 0 || self.max_shot_lines > SHOT_LINES_LIMIT {
            return Err(TuningError::Invalid(format!(
                "max_shot_lines must be in 1..={SHOT_LINES_LIMIT}"
            )));
        }
        if self.max_shield_charges == u8::MAX {
            return Err(TuningError::Invalid("max_shield_charges must be below 255".into()));
        }
        if self.player_max_hp <= 0.0 || self.boss_base_hp <= 0 || self.boss_hit_damage <= 0 {
            return Err(TuningError::Invalid("hit points and boss damage must be positive".into()));
        }
        if self.fire_interval <= 0.0 || self.companion_fire_interval <= 0.0 {
            return Err(TuningError::Invalid("fire intervals must be positive".into()));
        }
        let total = self.drops.total();
        if !(0.0..=1.0).contains(&total) {
            return Err(TuningError::Invalid(format!(
                "drop chances must sum to at most 1 (got {total})"
            )));
        }
        Ok(())
    }

    /// Score needed to summon the boss of `stage` (1-based)
    pub fn threshold(&self, stage: u32) -> u64 {
        let idx = stage.saturating_sub(1) as usize;
        match self.stage_thresholds.get(idx) {
            Some(&t) => t,
            None => {
                let last = self.stage_thresholds.last().copied().unwrap_or(0);
                let extra = (idx + 1 - self.stage_thresholds.len()) as u64;
                last + extra * self.threshold_step
            }
        }
    }

    /// Highest weapon or bonus level reachable
    pub fn max_level(&self) -> u8 {
        self.max_shot_lines.saturating_sub(1)
    }

    pub fn boss_hp(&self, stage: u32) -> i32 {
        self.boss_base_hp + self.boss_hp_per_stage * stage.saturating_sub(1) as i32
    }
}
