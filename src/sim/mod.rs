//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed or caller-chosen timestep only, never the wall clock
//! - Seeded RNG only, injected through `RandomSource`
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod combat;
pub mod health;
pub mod pattern;
pub mod state;
pub mod tick;
pub mod wave;

pub use combat::{CollisionKind, CombatContext, Outcome, SideEffect, resolve};
pub use health::{DamageReport, HealthPool};
pub use pattern::{
    AimKind, AttackMode, AttackPattern, BurstConfig, FireRequest, PatternCycle, SweepConfig,
    TrackConfig,
};
pub use state::{
    Boss, Bullet, Enemy, EnemyMotion, Faction, GameEvent, GameState, LevelPhase, Missile, Pickup,
    Player, TickInput,
};
pub use tick::tick;
pub use wave::{SpawnRequest, SpawnScheduler, WaveTracker};
