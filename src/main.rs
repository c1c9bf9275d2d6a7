//! MAVERICK: a 2D action platformer
//!
//! Run, jump, slide and shoot through rooms of a level, beat the boss at
//! the end. Everything is drawn with debug shapes:
//! - Fixed-step simulation on a small entity-component engine
//! - Maps are RON files of named layers
//! - Progress is saved to the platform data directory
//!
//! `--headless-frames <n>` runs the simulation without a window and prints
//! a summary, for smoke tests.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
mod game;
mod input;
mod world;

use anyhow::{Context, Result};
use clap::Parser;
use macroquad::prelude::{get_frame_time, next_frame};
use macroquad::window::Conf;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use config::EngineConfig;
use game::state::SaveError;
use game::{default_save_path, draw_level, GameState, LevelRuntime, LevelStatus, RuntimeStats};
use input::{ControllerButton, ControllerState, InputState};
use world::LevelSource;

#[derive(Parser, Debug)]
#[command(name = "maverick", version, about = "A 2D action platformer")]
struct Arguments {
    /// Built-in level name or path to a map file
    #[arg(long, default_value = "intro_stage")]
    level: String,

    /// Engine config (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "maverick::game=debug" (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,

    /// Run this many frames without a window, print a summary and exit
    #[arg(long)]
    headless_frames: Option<u64>,

    /// Save file (defaults to the platform data directory)
    #[arg(long)]
    save: Option<PathBuf>,
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).context("invalid --log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn load_state(path: &PathBuf, config: &EngineConfig) -> GameState {
    match GameState::load(path) {
        Ok(mut state) => {
            info!("loaded save from {}", path.display());
            state.reset_lives(config);
            state
        }
        Err(SaveError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => GameState::new(config),
        Err(e) => {
            warn!("ignoring unreadable save {}: {}", path.display(), e);
            GameState::new(config)
        }
    }
}

fn load_game(args: &Arguments) -> Result<(LevelRuntime, PathBuf)> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let save_path = args.save.clone().unwrap_or_else(default_save_path);
    let state = load_state(&save_path, &config);

    let (map, builders) = LevelSource::parse(&args.level)
        .load()
        .with_context(|| format!("failed to load level {}", args.level))?;
    let runtime = LevelRuntime::new(config, &map, &builders, state)
        .with_context(|| format!("failed to build level {}", map.name))?;
    Ok((runtime, save_path))
}

fn run_headless(runtime: &mut LevelRuntime, frames: u64) -> RuntimeStats {
    let idle = ControllerState::new();
    for _ in 0..frames {
        runtime.update(1.0 / 60.0, &idle);
        if runtime.status() != LevelStatus::Playing {
            break;
        }
    }
    runtime.stats()
}

fn save(runtime: &LevelRuntime, path: &PathBuf) {
    if let Err(e) = runtime.state.save(path) {
        warn!("failed to save game: {}", e);
    }
}

fn window_conf(config: &EngineConfig) -> Conf {
    Conf {
        window_title: format!("MAVERICK v{}", VERSION),
        window_width: (config.view_width * config.ppm * 2.0) as i32,
        window_height: (config.view_height * config.ppm * 2.0) as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

async fn run_window(mut runtime: LevelRuntime, save_path: PathBuf) {
    let mut input = InputState::new();
    let mut controller = ControllerState::new();
    let mut saved = false;
    if input.has_gamepad() {
        info!("gamepad connected");
    }

    loop {
        input.poll(&mut controller);
        runtime.update(get_frame_time(), &controller);
        draw_level(&runtime);

        if runtime.status() != LevelStatus::Playing {
            if !saved {
                if runtime.status() == LevelStatus::GameOver {
                    let config = runtime.config.clone();
                    runtime.state.reset_lives(&config);
                }
                save(&runtime, &save_path);
                saved = true;
            }
            if controller.is_just_pressed(ControllerButton::Start) {
                break;
            }
        }
        next_frame().await;
    }
    info!("bye");
}

fn main() -> Result<()> {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let args = Arguments::parse();
    init_tracing(args.log.as_deref())?;
    info!("=== MAVERICK v{} ===", VERSION);

    let (mut runtime, save_path) = load_game(&args)?;

    if let Some(frames) = args.headless_frames {
        let stats = run_headless(&mut runtime, frames);
        println!("level:    {}", runtime.level_name);
        println!("status:   {:?}", runtime.status());
        println!("frames:   {} ({} steps)", stats.frames, stats.steps);
        println!("events:   {}", stats.events);
        println!("entities: {}", runtime.world.entity_count());
        println!("deaths:   {}", stats.deaths);
        println!("kills:    {}", stats.enemies_killed);
        return Ok(());
    }

    let conf = window_conf(&runtime.config);
    macroquad::Window::from_config(conf, run_window(runtime, save_path));
    Ok(())
}
