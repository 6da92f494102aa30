//! dash-probe: run dash target resolution or a whole headless dash against
//! a JSON scene and print the result as JSON.
//!
//! Usage:
//!   dash-probe resolve --scene arena.json --agent 0,2,0 --aim-origin 0,3,-5 --aim-at 0,0,20
//!   dash-probe simulate --scene arena.json --config dash.json --aim-at 0,0,20 --secs 1.0

use std::path::PathBuf;
use std::process;

use glam::Vec3;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blink_core::commands::PlayerCommand;
use blink_core::config::DashConfig;
use blink_core::constants::DEFAULT_STEP_SECS;
use blink_core::types::{Ray, Transform};
use blink_dash::{DashEngine, EngineConfig};
use blink_spatial::{QueryFilter, StaticScene, TargetResolver};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "resolve" => cmd_resolve(&args[2..]),
        "simulate" => cmd_simulate(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn print_usage() {
    eprintln!(
        "dash-probe: Blink dash resolution and simulation tool\n\
         \n\
         Commands:\n\
         \n\
         resolve   Resolve one dash target and print the resolution\n\
         simulate  Run a full dash in the headless engine and print snapshots\n\
         \n\
         Options (both commands):\n\
         \n\
           --scene <path>       Scene JSON (default: flat ground at y = 0)\n\
           --config <path>      Dash config JSON (default: built-in tuning)\n\
           --agent <x,y,z>      Agent root position (default: 0,2,0)\n\
           --aim-origin <x,y,z> Aim ray origin (default: 5 behind, 1 above the agent)\n\
           --aim-at <x,y,z>     Point the aim ray passes through (required)\n\
         \n\
         Options (simulate):\n\
         \n\
           --secs <s>           Seconds to simulate (default: 1.0)\n\
           --dt <s>             Tick length (default: 1/60)\n\
           --every-tick         Print every snapshot instead of only the last\n\
         \n\
         Set RUST_LOG=debug to see resolver and ability logs on stderr.\n"
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
    }
    None
}

fn parse_vec3(args: &[String], flag: &str) -> Option<Vec3> {
    let raw = flag_value(args, flag)?;
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        eprintln!("Error: {flag} expects x,y,z, got {raw}");
        process::exit(1);
    }
    let mut xyz = [0.0f32; 3];
    for (slot, part) in xyz.iter_mut().zip(&parts) {
        match part.trim().parse() {
            Ok(v) => *slot = v,
            Err(_) => {
                eprintln!("Error: {flag} has a non-numeric component: {part}");
                process::exit(1);
            }
        }
    }
    Some(Vec3::from_array(xyz))
}

fn parse_f64(args: &[String], flag: &str, default: f64) -> f64 {
    match flag_value(args, flag).map(str::parse::<f64>) {
        Some(Ok(v)) => v,
        Some(Err(_)) => {
            eprintln!("Error: {flag} expects a number");
            process::exit(1);
        }
        None => default,
    }
}

fn load_scene(args: &[String]) -> StaticScene {
    match flag_value(args, "--scene").map(PathBuf::from) {
        Some(path) => StaticScene::load(&path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
        None => {
            let mut scene = StaticScene::new();
            scene.add_ground(0.0);
            scene
        }
    }
}

fn load_config(args: &[String]) -> DashConfig {
    match flag_value(args, "--config").map(PathBuf::from) {
        Some(path) => DashConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
        None => DashConfig::default(),
    }
}

struct Probe {
    scene: StaticScene,
    config: DashConfig,
    agent: Transform,
    aim: Ray,
}

fn parse_probe(args: &[String]) -> Probe {
    let agent = parse_vec3(args, "--agent").unwrap_or(Vec3::new(0.0, 2.0, 0.0));
    let Some(target) = parse_vec3(args, "--aim-at") else {
        eprintln!("Error: --aim-at <x,y,z> is required");
        process::exit(1);
    };
    let origin = parse_vec3(args, "--aim-origin").unwrap_or(agent + Vec3::new(0.0, 1.0, -5.0));
    Probe {
        scene: load_scene(args),
        config: load_config(args),
        agent: Transform::from_position(agent),
        aim: Ray::toward(origin, target),
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

// --- Resolve command ---

fn cmd_resolve(args: &[String]) {
    let probe = parse_probe(args);
    let resolver = TargetResolver::new(probe.config.resolver.clone());
    info!(colliders = probe.scene.len(), "resolve_start");

    let result = resolver.resolve_detailed(
        &probe.scene,
        Some(&probe.agent),
        &probe.aim,
        &QueryFilter::new(),
    );
    match result {
        Ok(resolution) => print_json(&resolution),
        Err(reason) => {
            print_json(&serde_json::json!({ "failure": reason, "message": reason.to_string() }));
            process::exit(2);
        }
    }
}

// --- Simulate command ---

fn cmd_simulate(args: &[String]) {
    let probe = parse_probe(args);
    let secs = parse_f64(args, "--secs", 1.0);
    let dt = parse_f64(args, "--dt", DEFAULT_STEP_SECS);
    if !(dt > 0.0) {
        eprintln!("Error: --dt must be positive");
        process::exit(1);
    }
    let every_tick = args.iter().any(|a| a == "--every-tick");

    let config = EngineConfig {
        dash: probe.config,
        spawn: probe.agent,
        ..Default::default()
    };
    let mut engine = DashEngine::new(config, probe.scene).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    engine.queue_command(PlayerCommand::Dash { aim: probe.aim });

    if every_tick {
        while engine.time() < secs {
            print_json(&engine.tick(dt));
        }
    } else {
        print_json(&engine.run_for(secs, dt));
    }
    info!(ticks = engine.tick_count(), "simulate_done");
    print_json(&serde_json::json!({ "stats": engine.ability().stats() }));
}
