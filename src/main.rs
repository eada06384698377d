//! Apparition demo host.
//!
//! Loads presence defaults from an INI file and a scene from JSON, then runs
//! a fixed-step loop that plays the scene script and advances presence timers,
//! logging every transition.
//!
//! # Main Loop
//!
//! 1. Load `PresenceConfig` (missing file keeps defaults)
//! 2. Spawn the scene and register logging observers
//! 3. Each step:
//!    - Update `WorldTime`
//!    - Play due script entries
//!    - Advance presence timers
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --scene assets/demo_scene.json --seconds 3
//! ```

use std::path::PathBuf;

use apparition::events::presence::{activate_log_observer, presence_log_observer};
use apparition::resources::diagnostics::PresenceDiagnostics;
use apparition::resources::presenceconfig::PresenceConfig;
use apparition::resources::scene::{SceneData, SceneScript};
use apparition::resources::worldtime::WorldTime;
use apparition::systems::presence::{presence_state, setup_pending_presences};
use apparition::systems::scene::{scene_script_system, spawn_scene};
use apparition::systems::time::{presence_timer_system, update_world_time};
use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::Parser;

const DEMO_SCENE: &str = include_str!("../assets/demo_scene.json");

/// Apparition presence lifecycle demo
#[derive(Parser)]
#[command(version, about = "Plays a presence scene script and logs every transition.")]
struct Cli {
    /// INI file with presence defaults.
    #[arg(long, value_name = "PATH", default_value = "./presence.ini")]
    config: PathBuf,

    /// JSON scene to play. Uses the built-in demo scene when omitted.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Fixed step in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Seconds to simulate.
    #[arg(long, default_value_t = 5.0)]
    seconds: f32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.dt <= 0.0 {
        eprintln!("Error: --dt must be positive");
        std::process::exit(1);
    }

    let mut config = PresenceConfig::with_path(cli.config.clone());
    if let Err(e) = config.load_from_file() {
        log::info!("{}, using defaults", e);
    }

    let scene = match &cli.scene {
        Some(path) => SceneData::load_from_file(&path.to_string_lossy()),
        None => SceneData::from_json(DEMO_SCENE),
    };
    let scene = match scene {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut world = World::new();
    world.insert_resource(config);
    world.insert_resource(WorldTime::default());
    world.spawn(Observer::new(presence_log_observer));
    world.spawn(Observer::new(activate_log_observer));
    // Ensure the observers are registered before anything triggers events.
    world.flush();

    let handles = match spawn_scene(&mut world, &scene) {
        Ok(handles) => handles,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    world.insert_resource(handles.clone());
    world.insert_resource(SceneScript::new(&scene));

    let mut update = Schedule::default();
    update.add_systems(
        (
            setup_pending_presences,
            scene_script_system,
            presence_timer_system,
        )
            .chain(),
    );

    // --------------- Main loop ---------------
    let steps = (cli.seconds / cli.dt).ceil() as u64;
    for _ in 0..steps {
        update_world_time(&mut world, cli.dt);
        update.run(&mut world);
        world.clear_trackers();
    }

    let mut names: Vec<&String> = handles.objects.keys().collect();
    names.sort();
    for name in names {
        if let Some(core) = handles.core(name) {
            if let Some(state) = presence_state(&world, core) {
                log::info!("{}: {}", name, state);
            }
        }
    }
    if let Some(diagnostics) = world.get_resource::<PresenceDiagnostics>() {
        for entry in &diagnostics.entries {
            log::warn!("{}", entry);
        }
    }
}
