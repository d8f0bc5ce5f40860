//! Collision outcome resolution.
//!
//! Detection happens elsewhere (the world tick, or an embedder's physics).
//! This module only decides what a contact means. `resolve` is pure apart
//! from the single optional pickup roll, so identical inputs and an
//! identical injected roll always produce identical outcomes.

use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

/// Contact classes the arbiter understands. In every outcome the
/// initiator is the entity that delivered the hit (bullet, rammer,
/// missile) and the target the one that received it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    /// An enemy craft rams the player
    PlayerVsEnemyBody,
    /// A hostile bullet reaches the player
    PlayerVsEnemyBullet,
    /// A player bullet hits an enemy craft
    BulletVsEnemy,
    /// A player bullet hits the boss
    BulletVsBoss,
    /// A guided missile reaches the player
    MissileVsPlayer,
    /// A player bullet shoots a missile down
    MissileVsBullet,
}

/// Facts the arbiter needs about one contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatContext {
    /// Damage carried by the initiating entity
    pub damage: i32,
    /// Target hit points before the contact
    pub target_hp: i32,
    /// Probability that a destroyed enemy drops a health pickup
    pub drop_chance: f32,
}

/// Follow-up work the embedding layer owes after an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    PlayEffect,
    PlayDeathSound,
    NotifyWaveController,
}

/// What one contact resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub damage_to_target: i32,
    pub destroy_initiator: bool,
    pub destroy_target: bool,
    /// The raw pickup roll, when one was made
    pub pickup_roll: Option<f32>,
    pub drops_pickup: bool,
    pub side_effects: Vec<SideEffect>,
}

impl Outcome {
    fn nothing() -> Self {
        Self {
            damage_to_target: 0,
            destroy_initiator: false,
            destroy_target: false,
            pickup_roll: None,
            drops_pickup: false,
            side_effects: Vec::new(),
        }
    }
}

/// Decide what a contact means. Only `BulletVsEnemy` ever consumes
/// randomness, and only when the hit is lethal.
pub fn resolve<R: RandomSource + ?Sized>(
    kind: CollisionKind,
    ctx: &CombatContext,
    rng: &mut R,
) -> Outcome {
    let lethal = ctx.target_hp - ctx.damage <= 0;
    let mut out = Outcome::nothing();
    match kind {
        CollisionKind::BulletVsEnemy => {
            out.damage_to_target = ctx.damage;
            out.destroy_initiator = true;
            if lethal {
                out.destroy_target = true;
                let roll = rng.uniform01();
                out.pickup_roll = Some(roll);
                out.drops_pickup = roll < ctx.drop_chance;
                out.side_effects = vec![
                    SideEffect::PlayEffect,
                    SideEffect::PlayDeathSound,
                    SideEffect::NotifyWaveController,
                ];
            }
        }
        CollisionKind::BulletVsBoss => {
            out.damage_to_target = ctx.damage;
            out.destroy_initiator = true;
            if lethal {
                // the boss drops pickups on thresholds, never on death,
                // and is no part of the spawn wave
                out.destroy_target = true;
                out.side_effects = vec![SideEffect::PlayEffect, SideEffect::PlayDeathSound];
            }
        }
        CollisionKind::PlayerVsEnemyBody => {
            // ramming always costs the enemy its craft
            out.damage_to_target = ctx.damage;
            out.destroy_initiator = true;
            out.destroy_target = lethal;
            out.side_effects = vec![
                SideEffect::PlayEffect,
                SideEffect::PlayDeathSound,
                SideEffect::NotifyWaveController,
            ];
        }
        CollisionKind::PlayerVsEnemyBullet => {
            out.damage_to_target = ctx.damage;
            out.destroy_initiator = true;
            out.destroy_target = lethal;
        }
        CollisionKind::MissileVsPlayer => {
            out.damage_to_target = ctx.damage;
            out.destroy_initiator = true;
            out.destroy_target = lethal;
            out.side_effects = vec![SideEffect::PlayEffect];
        }
        CollisionKind::MissileVsBullet => {
            out.destroy_initiator = true;
            out.destroy_target = true;
            out.side_effects = vec![SideEffect::PlayEffect];
        }
    }
    out
}
