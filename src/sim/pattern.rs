//! Attack pattern sequencing.
//!
//! Actors run a configured cycle of timed modes. Time is consumed with
//! carry-over at every boundary, so the shots emitted over a span of time
//! do not depend on how that span was sliced into ticks. Headings are
//! degrees CCW from straight down (see `crate::heading_to_dir`).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::{dir_to_heading, move_toward_heading, normalize_deg};

/// How a burst aims each shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AimKind {
    /// Straight down the fire axis
    Down,
    /// At the target's position when the shot fires (down if there is none)
    AtTarget,
}

/// Burst: `shots` fire requests, the first at mode entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstConfig {
    pub shots: u32,
    pub interval: f32,
    pub aim: AimKind,
}

/// Sweep: aim fans from `from_deg` to `to_deg` and back over the entry's
/// duration, firing on a fixed cadence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub fire_interval: f32,
    pub from_deg: f32,
    pub to_deg: f32,
}

/// Track: steer toward the target with a bounded turn rate, never firing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub turn_rate_deg: f32,
}

/// One behavior the sequencer can run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackMode {
    Idle,
    Burst(BurstConfig),
    Sweep(SweepConfig),
    Track(TrackConfig),
}

/// A validated, non-empty list of (duration, mode) entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCycle {
    entries: Vec<(f32, AttackMode)>,
}

impl PatternCycle {
    pub fn new(entries: Vec<(f32, AttackMode)>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyCycle);
        }
        for (duration, mode) in &entries {
            if !duration.is_finite() || *duration <= 0.0 {
                return Err(ConfigError::BadDuration);
            }
            match mode {
                AttackMode::Idle => {}
                AttackMode::Burst(b) => {
                    if b.shots == 0 || !b.interval.is_finite() || b.interval <= 0.0 {
                        return Err(ConfigError::BadBurst);
                    }
                }
                AttackMode::Sweep(s) => {
                    if !s.fire_interval.is_finite() || s.fire_interval <= 0.0 {
                        return Err(ConfigError::BadSweep);
                    }
                }
                AttackMode::Track(t) => {
                    if !t.turn_rate_deg.is_finite() || t.turn_rate_deg <= 0.0 {
                        return Err(ConfigError::BadTurnRate);
                    }
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(f32, AttackMode)] {
        &self.entries
    }
}

/// A single shot the owning actor should materialize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireRequest {
    pub heading_deg: f32,
}

impl FireRequest {
    /// Unit direction of the shot
    pub fn dir(&self) -> Vec2 {
        crate::heading_to_dir(self.heading_deg)
    }
}

/// Scratch state for the current cycle entry, reset on every entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum ModeState {
    Idle,
    Burst { fired: u32, until_next: f32 },
    Sweep { until_shot: f32 },
    Track,
}

impl ModeState {
    fn for_mode(mode: &AttackMode) -> Self {
        match mode {
            AttackMode::Idle => ModeState::Idle,
            AttackMode::Burst(_) => ModeState::Burst {
                fired: 0,
                until_next: 0.0,
            },
            AttackMode::Sweep(s) => ModeState::Sweep {
                until_shot: s.fire_interval,
            },
            AttackMode::Track(_) => ModeState::Track,
        }
    }
}

/// Runs a `PatternCycle`, consuming time with carry-over.
///
/// A transition happens only when elapsed time exceeds the current entry's
/// duration; a tick landing exactly on a boundary parks the sequencer
/// there, and the next entry's effects fire on the first tick that
/// advances past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackPattern {
    cycle: PatternCycle,
    index: usize,
    elapsed: f32,
    grace_remaining: f32,
    facing_deg: f32,
    mode_state: ModeState,
}

impl AttackPattern {
    pub fn new(cycle: PatternCycle) -> Self {
        Self::with_grace(cycle, 0.0)
    }

    /// Hold fire (and cycle time) for `grace` seconds before the first entry
    pub fn with_grace(cycle: PatternCycle, grace: f32) -> Self {
        let mode_state = ModeState::for_mode(&cycle.entries[0].1);
        Self {
            cycle,
            index: 0,
            elapsed: 0.0,
            grace_remaining: grace.max(0.0),
            facing_deg: 0.0,
            mode_state,
        }
    }

    pub fn mode(&self) -> AttackMode {
        self.cycle.entries[self.index].1
    }

    pub fn in_grace(&self) -> bool {
        self.grace_remaining > 0.0
    }

    /// Current steering heading; meaningful for `Track` cycles
    pub fn facing_deg(&self) -> f32 {
        self.facing_deg
    }

    pub fn set_facing(&mut self, deg: f32) {
        self.facing_deg = normalize_deg(deg);
    }

    /// Advance by `dt`, emitting fire requests in chronological order
    pub fn tick(&mut self, dt: f32, own_pos: Vec2, target: Option<Vec2>) -> Vec<FireRequest> {
        let mut out = Vec::new();
        if !dt.is_finite() || dt <= 0.0 {
            return out;
        }
        let mut remaining = dt;
        if self.grace_remaining > 0.0 {
            let used = self.grace_remaining.min(remaining);
            self.grace_remaining -= used;
            remaining -= used;
        }
        while remaining > 0.0 {
            let (duration, mode) = self.cycle.entries[self.index];
            let room = duration - self.elapsed;
            if room <= 0.0 {
                self.enter_next();
                continue;
            }
            let step = remaining.min(room);
            self.advance(step, duration, mode, own_pos, target, &mut out);
            self.elapsed += step;
            remaining -= step;
            if remaining > 0.0 {
                self.enter_next();
            }
        }
        out
    }

    fn enter_next(&mut self) {
        self.index = (self.index + 1) % self.cycle.entries.len();
        self.elapsed = 0.0;
        self.mode_state = ModeState::for_mode(&self.cycle.entries[self.index].1);
    }

    /// Consume `step` seconds inside the current entry
    fn advance(
        &mut self,
        step: f32,
        duration: f32,
        mode: AttackMode,
        own_pos: Vec2,
        target: Option<Vec2>,
        out: &mut Vec<FireRequest>,
    ) {
        match (mode, &mut self.mode_state) {
            (AttackMode::Idle, ModeState::Idle) => {}
            (AttackMode::Burst(cfg), ModeState::Burst { fired, until_next }) => {
                let mut left = step;
                while *fired < cfg.shots {
                    if *until_next > left {
                        *until_next -= left;
                        break;
                    }
                    left -= *until_next;
                    let heading = match cfg.aim {
                        AimKind::Down => 0.0,
                        AimKind::AtTarget => aim_at(own_pos, target),
                    };
                    out.push(FireRequest {
                        heading_deg: heading,
                    });
                    *fired += 1;
                    *until_next = cfg.interval;
                }
            }
            (AttackMode::Sweep(cfg), ModeState::Sweep { until_shot }) => {
                let mut t_in_mode = self.elapsed;
                let mut left = step;
                loop {
                    if *until_shot > left {
                        *until_shot -= left;
                        break;
                    }
                    t_in_mode += *until_shot;
                    left -= *until_shot;
                    out.push(FireRequest {
                        heading_deg: sweep_angle(&cfg, duration, t_in_mode),
                    });
                    *until_shot = cfg.fire_interval;
                }
            }
            (AttackMode::Track(cfg), ModeState::Track) => {
                if let Some(tpos) = target {
                    let to = tpos - own_pos;
                    if to.length_squared() > 1e-6 {
                        self.facing_deg = move_toward_heading(
                            self.facing_deg,
                            dir_to_heading(to),
                            cfg.turn_rate_deg * step,
                        );
                    }
                }
            }
            // mode_state is rebuilt on every entry, so this cannot be reached
            _ => {}
        }
    }
}

fn aim_at(own_pos: Vec2, target: Option<Vec2>) -> f32 {
    match target {
        Some(tpos) if (tpos - own_pos).length_squared() > 1e-6 => dir_to_heading(tpos - own_pos),
        _ => 0.0,
    }
}

/// Sweep aim at `t` seconds into an entry of the given duration: out along
/// the first half, back along the second
fn sweep_angle(cfg: &SweepConfig, duration: f32, t: f32) -> f32 {
    let half = duration * 0.5;
    if t < half {
        let frac = t / half;
        cfg.from_deg + (cfg.to_deg - cfg.from_deg) * frac
    } else {
        let frac = ((t - half) / half).min(1.0);
        cfg.to_deg + (cfg.from_deg - cfg.to_deg) * frac
    }
}
