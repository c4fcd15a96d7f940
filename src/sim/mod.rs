//! Frame simulation module
//!
//! All gameplay logic lives here. Rules for this module:
//! - One explicit `GameState`, passed by `&mut`
//! - Seeded RNG only
//! - Pools iterate in spawn order and shrink only through `retain`
//! - No rendering, storage or platform dependencies

pub mod attack;
pub mod collision;
pub mod pools;
pub mod progression;
pub mod rng;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use attack::{Attack, AttackState, PatternKind};
pub use collision::{HitOutcome, circle_overlap};
pub use rng::SessionRng;
pub use snapshot::{DrawSink, EntitySnapshot, EntityType, RenderSnapshot};
pub use spawn::SpawnDirector;
pub use state::{
    Boss, BossPhase, Bullet, BulletOwner, Enemy, EnemyKind, GameEvent, GamePhase, GameState,
    PauseReason, Pickup, PickupKind, Player, StagePhase,
};
pub use tick::{TickInput, tick};
