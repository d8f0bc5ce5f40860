//! World state for one level run.
//!
//! Everything needed for continue/replay determinism lives here and is
//! serializable, including the RNG. Entity vectors are kept in id order;
//! `tick` processes them in that order and never reads the wall clock.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::health::HealthPool;
use super::pattern::{
    AimKind, AttackMode, AttackPattern, BurstConfig, PatternCycle, SweepConfig, TrackConfig,
};
use super::wave::{SpawnScheduler, WaveTracker};
use crate::config::{BossConfig, ConfigError, EnemyKind, LevelConfig};
use crate::consts::*;
use crate::rng::GameRng;

/// Which side an entity fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Hostile,
}

/// Level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    Playing,
    /// Wave cleared and boss (if any) down
    Complete,
    /// Player craft destroyed
    GameOver,
}

/// The player craft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub health: HealthPool,
    /// Post-hit invulnerability remaining, seconds
    pub invuln: f32,
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
}

impl Player {
    fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            pos: Vec2::new(0.0, PLAYER_SPAWN_Y),
            health: HealthPool::with_thresholds(PLAYER_MAX_LIVES, PLAYER_DAMAGE_STAGES.to_vec())?,
            invuln: 0.0,
            fire_cooldown: 0.0,
        })
    }
}

/// Movement behavior of an enemy craft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyMotion {
    /// Straight descent; re-enters at the top after leaving the bottom
    Descend,
    /// Descending toward the hold line
    Enter,
    /// Holding altitude, bouncing between the arena edges
    Strafe { dir: f32 },
}

/// A hostile craft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub health: HealthPool,
    pub pattern: AttackPattern,
    pub motion: EnemyMotion,
}

/// The boss craft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub health: HealthPool,
    pub pattern: AttackPattern,
    pub entered: bool,
    pub strafe_dir: f32,
    pub config: BossConfig,
}

impl Boss {
    fn from_config(cfg: &BossConfig) -> Result<Self, ConfigError> {
        let aimed_shots = (cfg.aimed_duration / cfg.aimed_interval).ceil().max(1.0) as u32;
        let cycle = PatternCycle::new(vec![
            (
                cfg.aimed_duration,
                AttackMode::Burst(BurstConfig {
                    shots: aimed_shots,
                    interval: cfg.aimed_interval,
                    aim: AimKind::AtTarget,
                }),
            ),
            (
                cfg.sweep_duration,
                AttackMode::Sweep(SweepConfig {
                    fire_interval: cfg.sweep_interval,
                    from_deg: cfg.sweep_from_deg,
                    to_deg: cfg.sweep_to_deg,
                }),
            ),
        ])?;
        Ok(Self {
            pos: Vec2::new(0.0, BOSS_SPAWN_Y),
            health: HealthPool::with_threshold_step(cfg.max_hp, cfg.threshold_step)?,
            pattern: AttackPattern::with_grace(cycle, cfg.grace),
            entered: false,
            strafe_dir: 1.0,
            config: *cfg,
        })
    }
}

/// A projectile in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub faction: Faction,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining lifetime; None lives until it leaves the arena
    pub ttl: Option<f32>,
}

/// A guided munition chasing the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Missile {
    pub id: u32,
    pub pos: Vec2,
    pub pattern: AttackPattern,
    /// Detonates when this runs out
    pub fuse: f32,
}

/// A falling health pickup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec2,
}

/// Side-effect requests emitted by `tick` for the embedding layer to
/// realize (spawn VFX, play cues, advance menus)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EnemySpawned { id: u32, kind: EnemyKind, pos: Vec2 },
    ShotFired { faction: Faction, pos: Vec2, heading_deg: f32 },
    MissileLaunched { id: u32, pos: Vec2 },
    EnemyDestroyed { id: u32, pos: Vec2 },
    MissileDetonated { pos: Vec2, hit_player: bool },
    /// Boss crossed a damage threshold (stage counts up from 1)
    BossDamageStage { threshold: i32, stage: u32 },
    PickupDropped { id: u32, pos: Vec2 },
    PickupCollected { healed_to: i32 },
    PlayerDamaged { remaining: i32 },
    /// Player hull fell past a damage stage
    PlayerDamageStage { threshold: i32 },
    PlayerDestroyed,
    BossDefeated { pos: Vec2 },
    WaveComplete,
    LevelComplete,
    GameOver,
}

/// Player input sampled for one tick
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Desired movement direction, clamped to unit length
    pub move_dir: Vec2,
    /// Fire button held
    pub fire: bool,
}

/// Prebuilt per-kind parts, validated once at level start so spawning
/// during play never has to handle config errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EnemyProtos {
    raider_cycle: PatternCycle,
    carrier_cycle: PatternCycle,
    missile_cycle: PatternCycle,
    unit_health: HealthPool,
}

impl EnemyProtos {
    fn build() -> Result<Self, ConfigError> {
        let raider_cycle = PatternCycle::new(vec![
            (
                RAIDER_BURST_WINDOW,
                AttackMode::Burst(BurstConfig {
                    shots: RAIDER_BURST_SHOTS,
                    interval: RAIDER_BURST_INTERVAL,
                    aim: AimKind::Down,
                }),
            ),
            (RAIDER_IDLE_TIME, AttackMode::Idle),
        ])?;
        // one launch at entry, then the entry wraps
        let carrier_cycle = PatternCycle::new(vec![(
            CARRIER_LAUNCH_PERIOD,
            AttackMode::Burst(BurstConfig {
                shots: 1,
                interval: CARRIER_LAUNCH_PERIOD,
                aim: AimKind::Down,
            }),
        )])?;
        let missile_cycle = PatternCycle::new(vec![(
            MISSILE_FUSE,
            AttackMode::Track(TrackConfig {
                turn_rate_deg: MISSILE_TURN_RATE,
            }),
        )])?;
        Ok(Self {
            raider_cycle,
            carrier_cycle,
            missile_cycle,
            unit_health: HealthPool::new(1)?,
        })
    }
}

/// Complete level state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed, kept for diagnostics
    pub seed: u64,
    pub rng: GameRng,
    pub config: LevelConfig,
    pub phase: LevelPhase,
    pub tick_count: u64,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub bullets: Vec<Bullet>,
    pub missiles: Vec<Missile>,
    pub pickups: Vec<Pickup>,
    pub wave: Option<WaveTracker>,
    pub scheduler: Option<SpawnScheduler>,
    protos: EnemyProtos,
    next_id: u32,
}

impl GameState {
    /// Build a level from a config; every config problem is fatal here,
    /// before the first tick
    pub fn new(config: LevelConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let wave = if config.spawn_target > 0 {
            Some(WaveTracker::new(config.spawn_target)?)
        } else {
            None
        };
        let scheduler = (config.spawn_target > 0).then(|| SpawnScheduler::from_level(&config));
        let boss = match &config.boss {
            Some(cfg) => Some(Boss::from_config(cfg)?),
            None => None,
        };
        Ok(Self {
            seed,
            rng: GameRng::new(seed),
            config,
            phase: LevelPhase::Playing,
            tick_count: 0,
            player: Player::new()?,
            enemies: Vec::new(),
            boss,
            bullets: Vec::new(),
            missiles: Vec::new(),
            pickups: Vec::new(),
            wave,
            scheduler,
            protos: EnemyProtos::build()?,
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Field an enemy craft of the given kind
    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let (pattern, motion) = match kind {
            EnemyKind::Raider => (
                AttackPattern::new(self.protos.raider_cycle.clone()),
                EnemyMotion::Descend,
            ),
            EnemyKind::MissileCarrier => (
                AttackPattern::new(self.protos.carrier_cycle.clone()),
                EnemyMotion::Enter,
            ),
        };
        self.enemies.push(Enemy {
            id,
            kind,
            pos,
            health: self.protos.unit_health.clone(),
            pattern,
            motion,
        });
        id
    }

    pub fn spawn_bullet(&mut self, faction: Faction, pos: Vec2, vel: Vec2, ttl: Option<f32>) -> u32 {
        let id = self.next_entity_id();
        self.bullets.push(Bullet {
            id,
            faction,
            pos,
            vel,
            ttl,
        });
        id
    }

    /// Launch a missile along `heading_deg`; it steers from there
    pub fn spawn_missile(&mut self, pos: Vec2, heading_deg: f32) -> u32 {
        let id = self.next_entity_id();
        let mut pattern = AttackPattern::new(self.protos.missile_cycle.clone());
        pattern.set_facing(heading_deg);
        self.missiles.push(Missile {
            id,
            pos,
            pattern,
            fuse: MISSILE_FUSE,
        });
        id
    }

    pub fn spawn_pickup(&mut self, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.pickups.push(Pickup { id, pos });
        id
    }

    /// Restore id-sorted iteration order after external mutation
    /// (e.g. a hand-edited save)
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.bullets.sort_by_key(|b| b.id);
        self.missiles.sort_by_key(|m| m.id);
        self.pickups.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = LevelConfig::opening_wave();
        cfg.spawn_target = 0;
        assert_eq!(
            GameState::new(cfg, 1).err(),
            Some(ConfigError::EmptyLevel)
        );
    }

    #[test]
    fn test_wave_level_layout() {
        let state = GameState::new(LevelConfig::opening_wave(), 1).unwrap();
        assert!(state.wave.is_some());
        assert!(state.scheduler.is_some());
        assert!(state.boss.is_none());
        assert_eq!(state.phase, LevelPhase::Playing);
        assert_eq!(state.player.health.hp(), PLAYER_MAX_LIVES);
    }

    #[test]
    fn test_boss_level_layout() {
        let state = GameState::new(LevelConfig::boss_fight(), 1).unwrap();
        assert!(state.wave.is_none());
        assert!(state.scheduler.is_none());
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.health.hp(), 50);
        assert!(boss.pattern.in_grace());
        assert!(!boss.entered);
    }

    #[test]
    fn test_entity_ids_monotonic() {
        let mut state = GameState::new(LevelConfig::opening_wave(), 1).unwrap();
        let a = state.spawn_enemy(EnemyKind::Raider, Vec2::ZERO);
        let b = state.spawn_bullet(Faction::Player, Vec2::ZERO, Vec2::ZERO, None);
        let c = state.spawn_pickup(Vec2::ZERO);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_normalize_order_sorts_by_id() {
        let mut state = GameState::new(LevelConfig::opening_wave(), 1).unwrap();
        state.spawn_enemy(EnemyKind::Raider, Vec2::ZERO);
        state.spawn_enemy(EnemyKind::MissileCarrier, Vec2::ONE);
        state.enemies.reverse();
        state.normalize_order();
        assert!(state.enemies[0].id < state.enemies[1].id);
    }

    #[test]
    fn test_state_serde_round_trip() {
        let mut state = GameState::new(LevelConfig::mixed_assault(), 77).unwrap();
        state.spawn_enemy(EnemyKind::Raider, Vec2::new(1.0, 4.0));
        state.spawn_missile(Vec2::new(0.0, 5.0), 12.5);
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
