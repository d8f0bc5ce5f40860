//! Per-level configuration, validated before any simulation is built.
//!
//! Every knob a level can turn lives here. `GameState::new` refuses to
//! construct from an invalid config, so the simulation itself never has to
//! re-check these values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::rng::{RandomSource, pick_weighted};

/// Fatal configuration error, raised before a level starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Health pool maximum must be positive
    NonPositiveMaxHp,
    /// Thresholds must be strictly decreasing, inside (0, max_hp)
    BadThresholds,
    /// Attack cycle has no entries
    EmptyCycle,
    /// Cycle entry duration must be positive and finite
    BadDuration,
    /// Burst needs at least one shot and a positive interval
    BadBurst,
    /// Sweep fire interval must be positive
    BadSweep,
    /// Track turn rate must be positive
    BadTurnRate,
    /// Wave target count must be positive
    ZeroTargetCount,
    /// Spawn table must list at least one enemy kind
    EmptySpawnTable,
    /// Spawn weights must be positive and finite
    BadSpawnWeight,
    /// Arena bounds must enclose a positive area
    BadBounds,
    /// Drop chance must lie in [0, 1]
    BadDropChance,
    /// Spawn delay must be non-negative and finite
    BadSpawnDelay,
    /// Level has neither a wave nor a boss
    EmptyLevel,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::NonPositiveMaxHp => "health pool maximum must be positive",
            ConfigError::BadThresholds => {
                "health thresholds must be strictly decreasing inside (0, max_hp)"
            }
            ConfigError::EmptyCycle => "attack cycle has no entries",
            ConfigError::BadDuration => "attack cycle durations must be positive",
            ConfigError::BadBurst => "burst needs at least one shot and a positive interval",
            ConfigError::BadSweep => "sweep fire interval must be positive",
            ConfigError::BadTurnRate => "track turn rate must be positive",
            ConfigError::ZeroTargetCount => "wave target count must be positive",
            ConfigError::EmptySpawnTable => "spawn table must list at least one enemy kind",
            ConfigError::BadSpawnWeight => "spawn weights must be positive and finite",
            ConfigError::BadBounds => "arena bounds must enclose a positive area",
            ConfigError::BadDropChance => "drop chance must lie in [0, 1]",
            ConfigError::BadSpawnDelay => "spawn delay must be non-negative",
            ConfigError::EmptyLevel => "level has neither a wave nor a boss",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ConfigError {}

/// Enemy craft kinds the spawner can field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Raider,
    MissileCarrier,
}

/// Playfield limits in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub bottom_y: f32,
    pub top_y: f32,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            min_x: ARENA_MIN_X,
            max_x: ARENA_MAX_X,
            bottom_y: ARENA_BOTTOM_Y,
            top_y: ARENA_TOP_Y,
        }
    }
}

impl ArenaBounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = self.min_x.is_finite()
            && self.max_x.is_finite()
            && self.bottom_y.is_finite()
            && self.top_y.is_finite();
        if !finite || self.min_x >= self.max_x || self.bottom_y >= self.top_y {
            return Err(ConfigError::BadBounds);
        }
        Ok(())
    }
}

/// Weighted table of enemy kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTable {
    pub entries: Vec<(EnemyKind, f32)>,
}

impl SpawnTable {
    pub fn new(entries: Vec<(EnemyKind, f32)>) -> Self {
        Self { entries }
    }

    /// Table that only ever yields one kind
    pub fn single(kind: EnemyKind) -> Self {
        Self {
            entries: vec![(kind, 1.0)],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptySpawnTable);
        }
        for (_, w) in &self.entries {
            if !w.is_finite() || *w <= 0.0 {
                return Err(ConfigError::BadSpawnWeight);
            }
        }
        Ok(())
    }

    /// Weighted pick; a single roll from the injected source
    pub fn pick<R: RandomSource + ?Sized>(&self, rng: &mut R) -> EnemyKind {
        let weights: Vec<f32> = self.entries.iter().map(|(_, w)| *w).collect();
        self.entries[pick_weighted(rng, &weights)].0
    }
}

/// Boss behavior tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    pub max_hp: i32,
    /// A damage stage (and a pickup drop) every this many hit points
    pub threshold_step: i32,
    /// Initial hold-fire window after the boss appears
    pub grace: f32,
    /// Aimed-fire phase length and shot spacing
    pub aimed_duration: f32,
    pub aimed_interval: f32,
    /// Full there-and-back sweep length and shot spacing
    pub sweep_duration: f32,
    pub sweep_interval: f32,
    pub sweep_from_deg: f32,
    pub sweep_to_deg: f32,
    pub enter_speed: f32,
    pub strafe_speed: f32,
    /// Altitude the boss holds once it has entered
    pub hold_y: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            max_hp: 50,
            threshold_step: 10,
            grace: 3.0,
            aimed_duration: 10.0,
            aimed_interval: 0.5,
            sweep_duration: 4.0,
            sweep_interval: 0.08,
            sweep_from_deg: 80.0,
            sweep_to_deg: -80.0,
            enter_speed: 3.0,
            strafe_speed: 2.0,
            hold_y: 3.5,
        }
    }
}

impl BossConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hp <= 0 {
            return Err(ConfigError::NonPositiveMaxHp);
        }
        if self.threshold_step <= 0 || self.threshold_step >= self.max_hp {
            return Err(ConfigError::BadThresholds);
        }
        if self.grace < 0.0 || !self.grace.is_finite() {
            return Err(ConfigError::BadDuration);
        }
        if self.aimed_duration <= 0.0 || self.sweep_duration <= 0.0 {
            return Err(ConfigError::BadDuration);
        }
        if self.aimed_interval <= 0.0 {
            return Err(ConfigError::BadBurst);
        }
        if self.sweep_interval <= 0.0 {
            return Err(ConfigError::BadSweep);
        }
        Ok(())
    }
}

/// Everything needed to build one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Enemies the wave will field in total; 0 only for pure boss levels
    pub spawn_target: u32,
    /// Delay before the first spawn and between spawns
    pub spawn_delay: f32,
    pub spawn_table: SpawnTable,
    pub bounds: ArenaBounds,
    /// Probability a destroyed enemy drops a health pickup
    pub drop_chance: f32,
    pub boss: Option<BossConfig>,
}

impl LevelConfig {
    /// First sortie: raiders only
    pub fn opening_wave() -> Self {
        Self {
            name: "opening-wave".into(),
            spawn_target: 15,
            spawn_delay: 3.0,
            spawn_table: SpawnTable::single(EnemyKind::Raider),
            bounds: ArenaBounds::default(),
            drop_chance: 0.2,
            boss: None,
        }
    }

    /// Second sortie: raiders and missile carriers, evenly weighted
    pub fn mixed_assault() -> Self {
        Self {
            name: "mixed-assault".into(),
            spawn_target: 25,
            spawn_delay: 3.0,
            spawn_table: SpawnTable::new(vec![
                (EnemyKind::Raider, 1.0),
                (EnemyKind::MissileCarrier, 1.0),
            ]),
            bounds: ArenaBounds::default(),
            drop_chance: 0.2,
            boss: None,
        }
    }

    /// Final sortie: no wave, boss only
    pub fn boss_fight() -> Self {
        Self {
            name: "boss-fight".into(),
            spawn_target: 0,
            spawn_delay: 3.0,
            spawn_table: SpawnTable::new(Vec::new()),
            bounds: ArenaBounds::default(),
            drop_chance: 0.2,
            boss: Some(BossConfig::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounds.validate()?;
        if !self.drop_chance.is_finite() || !(0.0..=1.0).contains(&self.drop_chance) {
            return Err(ConfigError::BadDropChance);
        }
        if !self.spawn_delay.is_finite() || self.spawn_delay < 0.0 {
            return Err(ConfigError::BadSpawnDelay);
        }
        if self.spawn_target == 0 && self.boss.is_none() {
            return Err(ConfigError::EmptyLevel);
        }
        if self.spawn_target > 0 {
            self.spawn_table.validate()?;
        }
        if let Some(boss) = &self.boss {
            boss.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(LevelConfig::opening_wave().validate().is_ok());
        assert!(LevelConfig::mixed_assault().validate().is_ok());
        assert!(LevelConfig::boss_fight().validate().is_ok());
    }

    #[test]
    fn test_empty_level_rejected() {
        let mut cfg = LevelConfig::opening_wave();
        cfg.spawn_target = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyLevel));
    }

    #[test]
    fn test_bad_weight_rejected() {
        let mut cfg = LevelConfig::opening_wave();
        cfg.spawn_table = SpawnTable::new(vec![(EnemyKind::Raider, -1.0)]);
        assert_eq!(cfg.validate(), Err(ConfigError::BadSpawnWeight));

        cfg.spawn_table = SpawnTable::new(Vec::new());
        assert_eq!(cfg.validate(), Err(ConfigError::EmptySpawnTable));
    }

    #[test]
    fn test_bad_drop_chance_rejected() {
        let mut cfg = LevelConfig::opening_wave();
        cfg.drop_chance = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::BadDropChance));
    }

    #[test]
    fn test_bad_bounds_rejected() {
        let mut cfg = LevelConfig::opening_wave();
        cfg.bounds.min_x = cfg.bounds.max_x;
        assert_eq!(cfg.validate(), Err(ConfigError::BadBounds));
    }

    #[test]
    fn test_boss_threshold_step_rejected() {
        let mut cfg = LevelConfig::boss_fight();
        let boss = cfg.boss.as_mut().unwrap();
        boss.threshold_step = boss.max_hp;
        assert_eq!(cfg.validate(), Err(ConfigError::BadThresholds));
    }

    #[test]
    fn test_level_config_from_json() {
        let text = r#"{
            "name": "custom",
            "spawn_target": 4,
            "spawn_delay": 1.5,
            "spawn_table": { "entries": [["Raider", 3.0], ["MissileCarrier", 1.0]] },
            "bounds": { "min_x": -8.35, "max_x": 8.35, "bottom_y": -5.7, "top_y": 5.7 },
            "drop_chance": 0.2,
            "boss": null
        }"#;
        let cfg: LevelConfig = serde_json::from_str(text).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.spawn_target, 4);
        assert_eq!(cfg.spawn_table.entries.len(), 2);
    }
}
