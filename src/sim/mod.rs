//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, passed explicitly
//! - Stable iteration order (store order)
//! - No rendering or platform dependencies

pub mod agent;
pub mod autopilot;
pub mod collision;
pub mod movement;
pub mod state;
pub mod tick;

pub use collision::{TargetGrid, TargetHit, enemy_fire_hits, player_fire_hits};
pub use movement::{LookIntent, MoveIntent};
pub use state::{
    Broadphase, GameEvent, GamePhase, GameState, HudStats, Outcome, Owner, Player, Projectile,
    SimConfig, SoundCue, Target, TargetVariant, Wander,
};
pub use tick::{TickInput, fire, reload, tick};
