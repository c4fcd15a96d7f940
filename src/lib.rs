//! Shmup Zero - side-scrolling shoot-em-up simulation core
//!
//! Core modules:
//! - `sim`: Frame simulation (entities, attack patterns, spawns, collisions, stages)
//! - `tuning`: Data-driven game balance
//! - `session`: Frame loop owner wiring the simulation to persistence
//! - `persistence`: Key-value storage backends for high scores and settings
//! - `platform`: Browser/native differences (logging, clock, JS handle)
//! - `autopilot`: Scripted pilot for headless runs

pub mod autopilot;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use session::Session;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest step a single update may take (stalls and tab switches)
    pub const MAX_DT: f32 = 1.0 / 30.0;
    /// Nominal frame step used by the headless runner
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Default playfield dimensions (logical pixels)
    pub const FIELD_WIDTH: f32 = 960.0;
    pub const FIELD_HEIGHT: f32 = 540.0;

    /// Parallel shot lines the player can fire at once
    pub const MAX_SHOT_LINES: u8 = 5;

    /// Hard cap on cosmetic particles
    pub const MAX_PARTICLES: usize = 512;

    /// Bullets and pickups are culled this far outside the field
    pub const OFFSCREEN_MARGIN: f32 = 20.0;
    /// Enemies enter this far to the right of the field
    pub const ENEMY_ENTRY_OFFSET: f32 = 40.0;
    /// Enemies are culled this far outside the field
    pub const ENEMY_CULL_MARGIN: f32 = 60.0;
}

/// Clamp one input axis to [-1, 1]; non-finite values read as 0
#[inline]
pub fn clamp_axis(v: f32) -> f32 {
    if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Unit vector from `from` toward `to`, pointing left when the points coincide
#[inline]
pub fn bearing(from: Vec2, to: Vec2) -> Vec2 {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO { Vec2::NEG_X } else { dir }
}

/// Unit vector for an angle in radians
#[inline]
pub fn from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
