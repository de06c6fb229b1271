use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use playback_timeline::{Timeline, TimelineConfig};
use playback_tools::{SnapshotInspector, SynthConfig, SyntheticMatch};
use tracing_subscriber::EnvFilter;

mod replay;

use replay::ReplayFile;

#[derive(Parser)]
#[command(name = "playback-cli", about = "CLI tool for match playback")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Replay a match file and print the snapshot at a round
    Replay {
        /// Replay file (JSON, or zstd-compressed JSON ending in .zst)
        path: PathBuf,
        /// Round to stop at (defaults to the last recorded round)
        #[arg(long)]
        to: Option<u32>,
        /// Rounds between timeline keyframes
        #[arg(long)]
        keyframes: Option<u32>,
    },
    /// Generate a synthetic match and scrub through it
    Demo {
        #[arg(short, long, default_value = "200")]
        rounds: u32,
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Write a synthetic match to a replay file
    Export {
        path: PathBuf,
        #[arg(short, long, default_value = "200")]
        rounds: u32,
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

fn synth_config(rounds: u32, seed: u64) -> SynthConfig {
    SynthConfig {
        rounds,
        seed,
        ..SynthConfig::default()
    }
}

fn timeline_config(keyframes: Option<u32>) -> TimelineConfig {
    let mut config = TimelineConfig::default();
    if let Some(interval) = keyframes {
        config.keyframe_interval = interval;
    }
    config
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("playback-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", playback_common::crate_info());
            println!("kernel: {}", playback_kernel::crate_info());
            println!("timeline: {}", playback_timeline::crate_info());
            println!("tools: {}", playback_tools::crate_info());
        }
        Commands::Replay {
            path,
            to,
            keyframes,
        } => {
            let file = replay::load(&path)?;
            println!(
                "Replay: {} rounds, map={}",
                file.rounds.len(),
                file.header.map.name
            );
            let mut timeline = replay::record(file, timeline_config(keyframes))?;
            let target = to.unwrap_or(timeline.farthest());
            timeline.seek(target)?;

            let world = timeline.current();
            world
                .verify_aggregates()
                .with_context(|| format!("aggregates at round {target}"))?;
            println!("{}", SnapshotInspector::summary(world));
            println!("State hash: {:#018x}", world.state_hash());
        }
        Commands::Demo { rounds, seed } => {
            println!("Synthetic match: seed={seed}, rounds={rounds}");
            let synth = SyntheticMatch::generate(&synth_config(rounds, seed));
            let sequential = synth.replay()?;

            let mut timeline =
                replay::record(ReplayFile::from(synth), TimelineConfig::default())?;
            println!("{}", SnapshotInspector::summary(timeline.head()));

            let midpoint = rounds / 2;
            timeline.seek(midpoint)?;
            let mid_hash = timeline.current().state_hash();
            timeline.seek(timeline.farthest())?;
            let end_hash = timeline.current().state_hash();
            timeline.seek(midpoint)?;
            timeline.step_back()?;
            timeline.step_forward()?;

            let end_ok = end_hash == sequential.state_hash();
            let mid_ok = timeline.current().state_hash() == mid_hash;
            println!("Seek to end: {}", if end_ok { "OK" } else { "MISMATCH" });
            println!(
                "Scrub back to round {midpoint}: {}",
                if mid_ok { "OK" } else { "MISMATCH" }
            );
            println!("Keyframes: {}", timeline.keyframe_count());
            print_first_body(&timeline);
        }
        Commands::Export {
            path,
            rounds,
            seed,
        } => {
            let synth = SyntheticMatch::generate(&synth_config(rounds, seed));
            replay::save(&path, &ReplayFile::from(synth))?;
            println!("Wrote {rounds} rounds to {}", path.display());
        }
    }

    Ok(())
}

fn print_first_body(timeline: &Timeline) {
    let world = timeline.current();
    if let Some(info) = SnapshotInspector::list_bodies(world)
        .first()
        .and_then(|&id| SnapshotInspector::inspect_body(world, id))
    {
        println!("{info}");
    }
}
