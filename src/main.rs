//! Starblitz entry point
//!
//! Headless demo: runs one level under a scripted autopilot and logs the
//! event stream. The loop drives the sim through the same frame
//! accumulator a real frontend would use, so it doubles as a determinism
//! soak and a worked example of embedding the simulation.
//!
//! Usage: `starblitz [seed] [level]` where `level` is a preset name
//! (`opening-wave`, `mixed-assault`, `boss-fight`) or a path to a level
//! config JSON file.

use std::process::ExitCode;

use glam::Vec2;

use starblitz::consts::{MAX_SUBSTEPS, SIM_DT};
use starblitz::sim::{GameEvent, GameState, LevelPhase, TickInput, tick};
use starblitz::LevelConfig;

const MAX_RUN_SECONDS: f32 = 180.0;
/// Synthetic frame clock for the headless loop (30 Hz frames over a 60 Hz sim)
const FRAME_DT: f32 = 1.0 / 30.0;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(raw) => match raw.parse::<u64>() {
            Ok(seed) => seed,
            Err(_) => {
                log::error!("seed must be an unsigned integer, got {:?}", raw);
                return ExitCode::FAILURE;
            }
        },
        None => 0xC0FFEE,
    };
    let config = match args.next().as_deref() {
        None | Some("mixed-assault") => LevelConfig::mixed_assault(),
        Some("opening-wave") => LevelConfig::opening_wave(),
        Some("boss-fight") => LevelConfig::boss_fight(),
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("failed to load {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
    };

    log::info!("Starblitz starting: level {} (seed {})", config.name, seed);
    let mut state = match GameState::new(config, seed) {
        Ok(state) => state,
        Err(err) => {
            log::error!("bad level config: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut time = 0.0f32;
    let mut accumulator = 0.0f32;
    let mut kills = 0u32;
    while state.phase == LevelPhase::Playing && time < MAX_RUN_SECONDS {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = autopilot(time);
            for event in tick(&mut state, &input, SIM_DT) {
                log_event(time, &event);
                if matches!(event, GameEvent::EnemyDestroyed { .. }) {
                    kills += 1;
                }
            }
            accumulator -= SIM_DT;
            time += SIM_DT;
            substeps += 1;
        }
    }

    log::info!(
        "run over: {:?} after {:.1} s ({} ticks), {} enemy craft down, {} hull left",
        state.phase,
        time,
        state.tick_count,
        kills,
        state.player.health.hp(),
    );
    ExitCode::SUCCESS
}

/// Scripted stand-in for a human: strafe on a slow sine, hug the lower
/// half of the arena, hold the trigger
fn autopilot(time: f32) -> TickInput {
    TickInput {
        move_dir: Vec2::new((time * 0.7).sin(), -0.2),
        fire: true,
    }
}

fn load_config(path: &str) -> Result<LevelConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let config: LevelConfig = serde_json::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

fn log_event(time: f32, event: &GameEvent) {
    match event {
        GameEvent::ShotFired { .. } => log::debug!("[{:7.3}] {:?}", time, event),
        _ => log::info!("[{:7.3}] {:?}", time, event),
    }
}
