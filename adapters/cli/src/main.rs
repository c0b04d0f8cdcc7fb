#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots a Tactica demo session.

mod config;
mod demo;
mod game;
mod scenario_transfer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tactica_core::ScreenPoint;
use tactica_rendering::{
    AssetManifest, DirectoryAssets, HeadlessBackend, Presentation, RenderingBackend,
};
use tactica_rendering_macroquad::MacroquadBackend;
use tactica_world::{query, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::game::{reveal_player_sight, Game};
use crate::scenario_transfer::ScenarioSnapshot;

const DEFAULT_HEADLESS_FRAMES: u64 = 240;
const SIGHT_RADIUS: u32 = 8;

/// Tactica - real-time strategy engine demo
#[derive(Parser, Debug)]
#[command(name = "tactica")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames to run; headless runs default to 240
    #[arg(short, long)]
    frames: Option<u64>,

    /// Open a window instead of running headless
    #[arg(short, long)]
    windowed: bool,

    /// Seed of the generated demo scenario
    #[arg(short, long, default_value = "1")]
    seed: u64,

    /// Scenario snapshot to load instead of generating one
    #[arg(long)]
    scenario: Option<String>,

    /// Print the scenario snapshot and exit
    #[arg(long)]
    export_scenario: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Tactica command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    install_tracing(args.verbose);

    let config = AppConfig::load(args.config.as_deref())?;
    let snapshot = match &args.scenario {
        Some(encoded) => {
            ScenarioSnapshot::decode(encoded).context("failed to decode scenario snapshot")?
        }
        None => demo::generate(args.seed, config.map),
    };
    let mut world = snapshot.to_world();
    if args.export_scenario {
        let encoded = ScenarioSnapshot::from_world(&world)
            .encode()
            .context("failed to encode scenario snapshot")?;
        println!("{encoded}");
        return Ok(());
    }

    reveal_player_sight(&mut world, SIGHT_RADIUS);
    info!(
        banner = query::welcome_banner(&world),
        objects = query::object_count(&world),
        columns = snapshot.columns,
        rows = snapshot.rows,
        "world ready"
    );

    let frame_limit = if args.windowed {
        args.frames
    } else {
        Some(args.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES))
    };
    let mut game = load_game(&config, world, frame_limit)?;
    let presentation = Presentation::new(
        config.window.title.clone(),
        config.pipeline.width,
        config.pipeline.height,
    )
    .with_scale(config.window.scale)
    .with_target_fps(config.window.target_fps);

    if args.windowed {
        MacroquadBackend::new()
            .with_vsync(config.window.vsync)
            .with_show_fps(config.window.show_fps)
            .run(presentation, move |dt, raw, surface| {
                game.frame(dt, &raw, surface)
            })
    } else {
        let tactical = config.pipeline.tactical_area();
        let centre = ScreenPoint::new(
            tactical.x() + tactical.width() / 2,
            tactical.y() + tactical.height() / 2,
        );
        let frames = frame_limit.unwrap_or(DEFAULT_HEADLESS_FRAMES);
        HeadlessBackend::new(frames)
            .with_inputs(demo::scripted_input(frames, centre))
            .run(presentation, move |dt, raw, surface| {
                game.frame(dt, &raw, surface)
            })
    }
}

fn load_game(config: &AppConfig, world: World, frame_limit: Option<u64>) -> Result<Game> {
    match (
        config.assets.directory.as_deref(),
        config.assets.manifest_path(),
    ) {
        (Some(directory), Some(manifest_path)) => {
            let manifest = AssetManifest::load(&manifest_path)?;
            let assets = DirectoryAssets::new(directory);
            Ok(Game::new(config, world, &manifest, &assets, frame_limit))
        }
        _ => {
            let (manifest, assets) = demo::assets();
            Ok(Game::new(config, world, &manifest, &assets, frame_limit))
        }
    }
}

fn install_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
