//! Waldo Reactor - command line runner
//!
//! Loads a challenge, binds a program to each waldo, runs the reactor for a
//! number of ticks and prints the final state.

use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use waldo_reactor::challenge::Challenge;
use waldo_reactor::core::config::{SimulationConfig, StepSpeed};
use waldo_reactor::core::error::Result;
use waldo_reactor::core::types::{GridPos, WaldoColor};
use waldo_reactor::driver::{RunSummary, TickDriver};
use waldo_reactor::programs::{self, ScriptProgram};
use waldo_reactor::reactor::{ReactorSnapshot, SharedReactor};
use waldo_reactor::waldo::WaldoProgram;

/// Run a chemistry reactor with two programmable waldos
#[derive(Parser, Debug)]
#[command(name = "waldo-reactor")]
#[command(about = "Run a reactor challenge with programs bound to the red and blue waldos")]
struct Args {
    /// Built-in challenge passcode
    #[arg(long, default_value = "Hello world!")]
    challenge: String,

    /// Load the challenge from a TOML file instead
    #[arg(long)]
    challenge_file: Option<PathBuf>,

    /// Simulation config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Red program: a sample name (LittleLoop, BigLoop, Shuttle) or a script
    #[arg(long)]
    red: Option<String>,

    /// Red start cell as X,Y (defaults to the sample's start, or 0,0)
    #[arg(long, value_parser = parse_pos)]
    red_start: Option<GridPos>,

    /// Blue program: a sample name or a script
    #[arg(long)]
    blue: Option<String>,

    /// Blue start cell as X,Y
    #[arg(long, value_parser = parse_pos)]
    blue_start: Option<GridPos>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Pace ticks at this speed instead of running flat out
    #[arg(long, value_parser = parse_speed)]
    realtime: Option<StepSpeed>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Log filter, e.g. "waldo_reactor=debug"
    #[arg(long)]
    log: Option<String>,
}

fn parse_pos(s: &str) -> std::result::Result<GridPos, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
    Ok(GridPos::new(x, y))
}

fn parse_speed(s: &str) -> std::result::Result<StepSpeed, String> {
    s.parse::<StepSpeed>().map_err(|e| e.to_string())
}

/// Resolve a sample name or parse a script
fn resolve_program(
    text: &str,
    start: Option<GridPos>,
) -> Result<(Box<dyn WaldoProgram>, GridPos)> {
    if let Some((program, default_start)) = programs::sample(text) {
        return Ok((program, start.unwrap_or(default_start)));
    }
    let script = ScriptProgram::parse(text)?;
    Ok((Box::new(script), start.unwrap_or_default()))
}

#[derive(serde::Serialize)]
struct RunOutput<'a> {
    challenge: &'a str,
    summary: &'a RunSummary,
    snapshot: &'a ReactorSnapshot,
}

fn main() {
    let args = Args::parse();

    let filter = args
        .log
        .clone()
        .map(EnvFilter::new)
        .unwrap_or_else(|| {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waldo_reactor=info"))
        });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args) {
        Ok(summary) if summary.is_clean() => {}
        Ok(_) => std::process::exit(2),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<RunSummary> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from_toml(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let challenge = match &args.challenge_file {
        Some(path) => Challenge::load_from_toml(path)?,
        None => Challenge::get(&args.challenge)?,
    };
    let mut reactor = challenge.build(config.clone())?;

    for (color, program, start) in [
        (WaldoColor::Red, &args.red, args.red_start),
        (WaldoColor::Blue, &args.blue, args.blue_start),
    ] {
        if let Some(text) = program {
            let (program, start) = resolve_program(text, start)?;
            reactor.bind_program(color, start, program)?;
        }
    }

    let shared = SharedReactor::new(reactor);
    let summary = match args.realtime {
        Some(speed) => {
            let driver = TickDriver::new(shared.clone(), speed);
            let rt = Runtime::new()?;
            let show = !args.json;
            rt.block_on(driver.run_realtime(args.ticks, |report| {
                if show {
                    if let Ok(snapshot) = shared.snapshot() {
                        println!("--- tick {} ---\n{}", report.tick, snapshot.render_grid());
                    }
                }
            }))
        }
        None => TickDriver::new(shared.clone(), config.step_speed).run_ticks(args.ticks),
    };

    let snapshot = shared.snapshot()?;
    if args.json {
        let output = RunOutput {
            challenge: &challenge.name,
            summary: &summary,
            snapshot: &snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("=== {} ===", challenge.name);
        println!("{}", snapshot.render_grid());
        println!("{}", snapshot.summary());
        println!(
            "{} tick(s) in {}ms",
            summary.ticks_run, summary.elapsed_ms
        );
    }

    shared.with(|r| r.dispose())?;
    if let Some(fault) = &summary.fault {
        tracing::warn!(%fault, "run ended with a fault");
    }
    Ok(summary)
}

