use std::{collections::VecDeque, fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tombsim::{
    Tuning, World, data,
    ecs::resources::GameState,
    items::{TargetEvent, closest_monster},
    map::{CarvedLevels, Grid, LevelSource, RepeatingLevels},
    render::{draw_log, draw_map, draw_status},
    scripted_input::ScriptedInput,
    turn::{TurnOutcome, perform},
};

/// Run a dungeon headlessly from a script of player keys.
#[derive(Parser, Debug)]
#[command(name = "tombsim", version)]
struct Cli {
    /// ASCII level map, used for every depth. Defaults to the built-in demo
    /// level followed by carved ones.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Key script to play. Without one the game only starts.
    #[arg(long)]
    script: Option<PathBuf>,
    /// TOML tuning overrides.
    #[arg(long)]
    tuning: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// Write the final snapshot here as JSON.
    #[arg(long)]
    save: Option<PathBuf>,
}

/// Click the nearest visible monster for any spell that asks, else cancel.
fn auto_target(world: &World) -> VecDeque<TargetEvent> {
    let event = closest_monster(world, world.torch_radius())
        .and_then(|monster| world.position(monster))
        .map_or(TargetEvent::Cancel, TargetEvent::Click);
    VecDeque::from([event])
}

fn print_new_lines(world: &World, seen: &mut u64) {
    let log = world.log();
    for entry in log.since(*seen) {
        println!("[{:?}] {}", entry.severity, entry.text);
    }
    *seen = log.pushed();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    if let Some(seed) = cli.seed {
        tuning.seed = seed;
    }

    let plan = match &cli.level {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading level {}", path.display()))?;
            Grid::parse(&text, &data::marker_glyphs())?.into_plan()?
        }
        None => data::demo_plan()?,
    };
    // A custom level repeats on every descent; the demo leads into carved ones.
    let mut levels: Box<dyn LevelSource> = match &cli.level {
        Some(_) => Box::new(RepeatingLevels::new(vec![plan.clone()])?),
        None => Box::new(CarvedLevels::default()),
    };
    let mut script = match &cli.script {
        Some(path) => ScriptedInput::from_file(path)?,
        None => ScriptedInput::parse(""),
    };
    info!(seed = tuning.seed, intents = script.remaining(), "starting");

    let mut world = World::new(plan, tuning);
    let mut seen = 0;
    print_new_lines(&world, &mut seen);

    while let Some(intent) = script.next_intent() {
        if world.game_state() == GameState::Dead {
            info!(left = script.remaining() + 1, "player is dead, stopping script");
            break;
        }
        let mut targeting = auto_target(&world);
        let outcome = perform(&mut world, intent, &mut targeting, levels.as_mut());
        if outcome == TurnOutcome::Ignored {
            debug!(?intent, "intent ignored");
        }
        for cue in world.drain_audio() {
            debug!(cue = cue.id(), "audio cue");
        }
        print_new_lines(&world, &mut seen);
    }

    println!();
    for row in draw_map(&world) {
        println!("{row}");
    }
    println!("{}", draw_status(&world));
    let rows = world.tuning().log.capacity;
    for line in draw_log(&world, rows) {
        println!("{line}");
    }

    if let Some(path) = &cli.save {
        let json = world.snapshot().to_json()?;
        fs::write(path, json).with_context(|| format!("writing snapshot {}", path.display()))?;
        info!(path = %path.display(), "snapshot saved");
    }
    Ok(())
}
