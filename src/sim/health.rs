//! Hit-point pools with one-way damage thresholds.
//!
//! Thresholds fire in descending order as HP falls past them; a single hit
//! can cross several at once. Healing restores HP but never re-arms a
//! consumed threshold, and death is reported exactly once.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Result of one damage application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    pub remaining: i32,
    /// Thresholds crossed by this hit, highest first
    pub crossed: Vec<i32>,
    /// True only on the call that emptied the pool
    pub died: bool,
}

/// Hit-point pool with descending one-shot thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPool {
    max_hp: i32,
    hp: i32,
    thresholds: Vec<i32>,
    next_threshold: usize,
}

impl HealthPool {
    /// Plain pool with no thresholds
    pub fn new(max_hp: i32) -> Result<Self, ConfigError> {
        Self::with_thresholds(max_hp, Vec::new())
    }

    /// Pool with explicit thresholds, strictly decreasing inside (0, max_hp)
    pub fn with_thresholds(max_hp: i32, thresholds: Vec<i32>) -> Result<Self, ConfigError> {
        if max_hp <= 0 {
            return Err(ConfigError::NonPositiveMaxHp);
        }
        for t in &thresholds {
            if *t <= 0 || *t >= max_hp {
                return Err(ConfigError::BadThresholds);
            }
        }
        if thresholds.windows(2).any(|w| w[0] <= w[1]) {
            return Err(ConfigError::BadThresholds);
        }
        Ok(Self {
            max_hp,
            hp: max_hp,
            thresholds,
            next_threshold: 0,
        })
    }

    /// Thresholds at every multiple of `step` strictly below `max_hp`
    /// (e.g. 50 with step 10 yields 40, 30, 20, 10)
    pub fn with_threshold_step(max_hp: i32, step: i32) -> Result<Self, ConfigError> {
        if max_hp <= 0 {
            return Err(ConfigError::NonPositiveMaxHp);
        }
        if step <= 0 || step >= max_hp {
            return Err(ConfigError::BadThresholds);
        }
        let mut thresholds = Vec::new();
        let mut t = (max_hp - 1) / step * step;
        while t > 0 {
            thresholds.push(t);
            t -= step;
        }
        Self::with_thresholds(max_hp, thresholds)
    }

    /// Apply damage, consuming any thresholds the new HP falls past.
    /// Non-positive amounts and hits on an empty pool are no-ops.
    pub fn apply_damage(&mut self, amount: i32) -> DamageReport {
        if amount <= 0 || self.hp <= 0 {
            return DamageReport {
                remaining: self.hp,
                crossed: Vec::new(),
                died: false,
            };
        }
        self.hp = (self.hp - amount).max(0);
        let mut crossed = Vec::new();
        while self.next_threshold < self.thresholds.len()
            && self.hp <= self.thresholds[self.next_threshold]
        {
            crossed.push(self.thresholds[self.next_threshold]);
            self.next_threshold += 1;
        }
        DamageReport {
            remaining: self.hp,
            crossed,
            died: self.hp == 0,
        }
    }

    /// Heal up to `max_hp`; no-op when dead or for non-positive amounts.
    /// Returns the remaining HP.
    pub fn apply_heal(&mut self, amount: i32) -> i32 {
        if amount > 0 && self.hp > 0 {
            self.hp = (self.hp + amount).min(self.max_hp);
        }
        self.hp
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Remaining fraction in [0, 1], for presentation layers
    pub fn fraction(&self) -> f32 {
        self.hp as f32 / self.max_hp as f32
    }

    /// How many thresholds have fired so far
    pub fn consumed_thresholds(&self) -> usize {
        self.next_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_damage_clamps_to_zero() {
        let mut pool = HealthPool::new(5).unwrap();
        let report = pool.apply_damage(99);
        assert_eq!(report.remaining, 0);
        assert!(report.died);
        assert!(pool.is_dead());
    }

    #[test]
    fn test_non_positive_damage_ignored() {
        let mut pool = HealthPool::new(5).unwrap();
        assert_eq!(pool.apply_damage(0).remaining, 5);
        assert_eq!(pool.apply_damage(-3).remaining, 5);
        assert_eq!(pool.hp(), 5);
    }

    #[test]
    fn test_single_threshold_crossing() {
        let mut pool = HealthPool::with_threshold_step(50, 10).unwrap();
        let report = pool.apply_damage(12);
        assert_eq!(report.remaining, 38);
        assert_eq!(report.crossed, vec![40]);
        assert!(!report.died);
    }

    #[test]
    fn test_lethal_hit_crosses_all_thresholds() {
        let mut pool = HealthPool::with_thresholds(50, vec![40, 30, 20, 10]).unwrap();
        let report = pool.apply_damage(50);
        assert_eq!(report.crossed, vec![40, 30, 20, 10]);
        assert_eq!(report.remaining, 0);
        assert!(report.died);
    }

    #[test]
    fn test_death_reported_once() {
        let mut pool = HealthPool::new(3).unwrap();
        assert!(pool.apply_damage(3).died);
        let again = pool.apply_damage(3);
        assert!(!again.died);
        assert!(again.crossed.is_empty());
        assert_eq!(again.remaining, 0);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut pool = HealthPool::new(5).unwrap();
        pool.apply_damage(2);
        assert_eq!(pool.apply_heal(10), 5);
    }

    #[test]
    fn test_heal_ignored_when_dead() {
        let mut pool = HealthPool::new(5).unwrap();
        pool.apply_damage(5);
        assert_eq!(pool.apply_heal(3), 0);
        assert!(pool.is_dead());
    }

    #[test]
    fn test_heal_does_not_rearm_thresholds() {
        let mut pool = HealthPool::with_threshold_step(50, 10).unwrap();
        assert_eq!(pool.apply_damage(15).crossed, vec![40]);
        pool.apply_heal(10);
        assert_eq!(pool.hp(), 45);
        // back below 40: already consumed, nothing fires
        assert_eq!(pool.apply_damage(10).crossed, Vec::<i32>::new());
        // but the next one down still does
        assert_eq!(pool.apply_damage(10).crossed, vec![30]);
    }

    #[test]
    fn test_threshold_step_builder() {
        let pool = HealthPool::with_threshold_step(50, 10).unwrap();
        assert_eq!(pool.thresholds, vec![40, 30, 20, 10]);
        let pool = HealthPool::with_threshold_step(50, 25).unwrap();
        assert_eq!(pool.thresholds, vec![25]);
    }

    #[test]
    fn test_invalid_construction_rejected() {
        assert_eq!(HealthPool::new(0), Err(ConfigError::NonPositiveMaxHp));
        assert_eq!(
            HealthPool::with_thresholds(50, vec![10, 40]),
            Err(ConfigError::BadThresholds)
        );
        assert_eq!(
            HealthPool::with_thresholds(50, vec![50]),
            Err(ConfigError::BadThresholds)
        );
        assert_eq!(
            HealthPool::with_thresholds(50, vec![20, 20]),
            Err(ConfigError::BadThresholds)
        );
    }

    proptest! {
        #[test]
        fn hp_stays_in_range(ops in proptest::collection::vec((any::<bool>(), -10i32..200), 0..64)) {
            let mut pool = HealthPool::with_threshold_step(50, 10).unwrap();
            for (heal, amount) in ops {
                if heal {
                    pool.apply_heal(amount);
                } else {
                    pool.apply_damage(amount);
                }
                prop_assert!(pool.hp() >= 0 && pool.hp() <= pool.max_hp());
            }
        }
    }
}
