#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Prey Arena rounds headlessly.
//!
//! An autopilot plays the prey while the simulation runs at a fixed frame
//! duration; the round ends when the prey dies or the frame budget runs out,
//! and a score summary is printed.

mod autopilot;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context as _, Result};
use clap::Parser;
use prey_arena_core::{Event, UnitTypeName, WeaponTypeName};
use prey_arena_system_scoring::ScoreRow;
use prey_arena_world::{query, Game, WorldConfig};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::autopilot::Autopilot;

/// Runs Prey Arena rounds with a scripted player.
#[derive(Debug, Parser)]
#[command(name = "prey-arena", version, about)]
struct Args {
    /// TOML file with world configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the engine RNG and terrain, overriding the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of rounds to play.
    #[arg(long, default_value_t = 1)]
    rounds: usize,
    /// Frame budget per round.
    #[arg(long, default_value_t = 3_600)]
    frames: u64,
    /// Simulated duration of one frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
    /// Log filter, for example `debug` or `prey_arena_world=trace`.
    #[arg(long)]
    log: Option<String>,
}

/// Outcome of a single round.
#[derive(Debug, Serialize)]
struct RoundSummary {
    round: usize,
    frames: u64,
    total_score: u32,
    duration_ms: u128,
    kills: Vec<ScoreRow<UnitTypeName>>,
    shots: Vec<ScoreRow<WeaponTypeName>>,
}

/// Outcome of the whole run.
#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    rounds: Vec<RoundSummary>,
    spendable_points: u32,
    difficulty: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let summary = run(config, &args)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
    Ok(())
}

fn load_config(path: &Path) -> Result<WorldConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn parse_config(text: &str) -> Result<WorldConfig> {
    let config: WorldConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

fn run(config: WorldConfig, args: &Args) -> Result<RunSummary> {
    let seed = config.seed;
    let dt = Duration::from_millis(args.frame_ms);
    let mut game = Game::new(config).context("cannot build the world")?;
    info!(seed, banner = query::welcome_banner(&game), "world created");

    let mut rounds = Vec::with_capacity(args.rounds);
    for _ in 0..args.rounds {
        let round = game.start_round();
        let mut autopilot = Autopilot::default();
        let mut frames = 0;
        let mut total_score = None;

        while frames < args.frames && game.is_round_active() {
            let input = autopilot.next_frame(&game);
            game.update(dt, &input)
                .with_context(|| format!("simulation failed in round {round} at frame {frames}"))?;
            frames += 1;
            for event in game.drain_events() {
                if let Event::RoundEnded { total_score: total, .. } = event {
                    total_score = Some(total);
                }
                debug!(?event, "event");
            }
        }
        let total_score = match total_score {
            Some(total) => total,
            None => game.end_round().unwrap_or(0),
        };
        let _ = game.drain_events();

        let score = game
            .score()
            .round_scores()
            .get(round)
            .context("finished round has no score")?;
        rounds.push(RoundSummary {
            round,
            frames,
            total_score,
            duration_ms: score.duration(game.engine().now()).as_millis(),
            kills: score.kill_rows(),
            shots: score.shot_rows(),
        });
    }

    Ok(RunSummary {
        seed,
        rounds,
        spendable_points: game.score().spendable_points(),
        difficulty: game.score().difficulty(),
    })
}

fn print_summary(summary: &RunSummary) {
    println!("seed {}", summary.seed);
    for round in &summary.rounds {
        println!(
            "round {}: {} points in {:.1}s ({} frames)",
            round.round,
            round.total_score,
            round.duration_ms as f64 / 1000.0,
            round.frames
        );
        for row in &round.kills {
            println!("  killed {:?} x{} = {}", row.name, row.count, row.score);
        }
        for row in &round.shots {
            println!("  fired {:?} x{} = {}", row.name, row.count, row.score);
        }
    }
    println!(
        "spendable points {}, difficulty {:.2}",
        summary.spendable_points, summary.difficulty
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use prey_arena_world::ConfigError;

    #[test]
    fn partial_configs_keep_defaults() {
        let config = parse_config(
            r#"
            seed = 7
            sector_size = 21.0

            [terrain]
            kind = "plain"
            threshold = -0.9
            "#,
        )
        .expect("config parses");

        assert_eq!(config.seed, 7);
        assert_eq!(config.sector_size, 21.0);
        assert_eq!(config.damping, WorldConfig::default().damping);
    }

    #[test]
    fn malformed_configs_are_rejected() {
        assert!(parse_config("seed = \"seven\"").is_err());
    }

    #[test]
    fn configs_that_cannot_build_a_world_are_rejected() {
        let error = parse_config("sector_size = 0.0").expect_err("zero sectors");
        assert_eq!(
            error.downcast_ref::<ConfigError>(),
            Some(&ConfigError::NotPositive("sector_size"))
        );
        assert!(parse_config("path_node_size = -2.0").is_err());
        assert!(parse_config("damping = 2.0").is_err());
        assert!(parse_config("max_spawn_attempts = 0").is_err());
    }

    #[test]
    fn short_runs_produce_a_summary_per_round() {
        let args = Args::parse_from(["prey-arena", "--rounds", "2", "--frames", "30"]);
        let summary = run(WorldConfig::default().with_seed(3), &args).expect("run");

        assert_eq!(summary.rounds.len(), 2);
        assert!(summary.rounds.iter().all(|round| round.frames <= 30));
        assert_eq!(summary.rounds[1].round, 1);
    }
}
