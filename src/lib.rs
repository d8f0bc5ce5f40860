//! Starblitz - deterministic core of a vertical arcade space shooter
//!
//! Core modules:
//! - `sim`: combat resolution, attack patterns, wave progression, world tick
//! - `config`: validated per-level tuning
//! - `rng`: seeded, injectable randomness
//!
//! The crate owns rules and state only. Rendering, audio, input devices and
//! broad-phase physics belong to the embedding layer, which feeds
//! `sim::tick` a `TickInput` each step and consumes the returned
//! `GameEvent` stream.

pub mod config;
pub mod rng;
pub mod sim;

pub use config::{ConfigError, LevelConfig};
pub use sim::{GameEvent, GameState, TickInput, tick};

use glam::Vec2;

/// Game tuning constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena extents (world units, origin at screen center)
    pub const ARENA_MIN_X: f32 = -8.35;
    pub const ARENA_MAX_X: f32 = 8.35;
    pub const ARENA_BOTTOM_Y: f32 = -5.7;
    pub const ARENA_TOP_Y: f32 = 5.7;

    /// Player craft - confined to the lower half of the arena
    pub const PLAYER_MIN_Y: f32 = -4.57;
    pub const PLAYER_MAX_Y: f32 = 0.0;
    pub const PLAYER_SPAWN_Y: f32 = -4.0;
    pub const PLAYER_SPEED: f32 = 10.0;
    pub const PLAYER_FIRE_COOLDOWN: f32 = 0.3;
    pub const PLAYER_MAX_LIVES: i32 = 5;
    /// Hull-fire stages kick in at these remaining lives
    pub const PLAYER_DAMAGE_STAGES: [i32; 2] = [3, 1];
    /// Post-hit invulnerability window (seconds)
    pub const PLAYER_IFRAME_TIME: f32 = 1.0;

    /// Projectiles
    pub const PLAYER_BULLET_SPEED: f32 = 10.0;
    pub const ENEMY_BULLET_SPEED: f32 = 8.0;
    pub const BOSS_BULLET_SPEED: f32 = 10.0;
    pub const BOSS_BULLET_LIFETIME: f32 = 5.0;
    pub const BULLET_DAMAGE: i32 = 1;
    /// How far past the arena edge a bullet may fly before culling
    pub const BULLET_CULL_MARGIN: f32 = 1.0;

    /// Raider: descends, wraps to the top, fires short bursts
    pub const RAIDER_DESCENT_SPEED: f32 = 5.0;
    pub const RAIDER_BURST_SHOTS: u32 = 3;
    pub const RAIDER_BURST_INTERVAL: f32 = 0.12;
    /// Cycle entry long enough to hold the full burst
    pub const RAIDER_BURST_WINDOW: f32 = 0.3;
    pub const RAIDER_IDLE_TIME: f32 = 3.0;
    pub const RAM_DAMAGE: i32 = 1;

    /// Missile carrier: enters to a hold line, strafes, launches on a period
    pub const CARRIER_ENTER_SPEED: f32 = 6.0;
    pub const CARRIER_STRAFE_SPEED: f32 = 4.0;
    pub const CARRIER_HOLD_Y: f32 = 5.5;
    pub const CARRIER_LAUNCH_PERIOD: f32 = 5.0;

    /// Guided missile
    pub const MISSILE_SPEED: f32 = 6.0;
    pub const MISSILE_TURN_RATE: f32 = 120.0;
    pub const MISSILE_FUSE: f32 = 5.0;
    pub const MISSILE_BLAST_RADIUS: f32 = 1.5;
    pub const MISSILE_BLAST_DAMAGE: i32 = 1;

    /// Health pickups fall from where they are dropped
    pub const PICKUP_FALL_SPEED: f32 = 5.0;
    /// Boss threshold drops materialize along the top edge
    pub const PICKUP_DROP_Y: f32 = 5.7;
    pub const PICKUP_HEAL: i32 = 1;

    /// Boss spawns above the visible arena and flies in
    pub const BOSS_SPAWN_Y: f32 = 7.0;

    /// Contact radii
    pub const PLAYER_RADIUS: f32 = 0.5;
    pub const ENEMY_RADIUS: f32 = 0.6;
    pub const BOSS_RADIUS: f32 = 1.6;
    pub const BULLET_RADIUS: f32 = 0.15;
    pub const MISSILE_RADIUS: f32 = 0.3;
    pub const PICKUP_RADIUS: f32 = 0.4;
}

/// Normalize a heading to [-180, 180)
#[inline]
pub fn normalize_deg(mut deg: f32) -> f32 {
    while deg >= 180.0 {
        deg -= 360.0;
    }
    while deg < -180.0 {
        deg += 360.0;
    }
    deg
}

/// Unit vector for a heading given in degrees CCW from straight down
#[inline]
pub fn heading_to_dir(deg: f32) -> Vec2 {
    let r = deg.to_radians();
    Vec2::new(r.sin(), -r.cos())
}

/// Heading (degrees CCW from straight down) of a direction vector
#[inline]
pub fn dir_to_heading(dir: Vec2) -> f32 {
    dir.x.atan2(-dir.y).to_degrees()
}

/// Rotate `current` toward `target` by at most `max_step` degrees,
/// taking the short way around
#[inline]
pub fn move_toward_heading(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = normalize_deg(target - current);
    normalize_deg(current + delta.clamp(-max_step, max_step))
}
