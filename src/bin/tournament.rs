//! Tournament CLI.
//!
//! Plays many games between built-in actors and writes one JSON line per
//! game, followed by a win-rate summary on stderr.
//!
//! Usage:
//!   cargo run --release --bin tournament -- --games 50 --players 4 --seed 7

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use conquest::config::GameConfig;
use conquest::tournament::{run_tournament, write_jsonl, Summary, TournamentConfig};

#[derive(Debug, Parser)]
#[command(name = "tournament")]
#[command(about = "Batch games between built-in actors", version)]
struct Cli {
    /// Game config JSON used as the template for every game
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of games to play
    #[arg(short, long, default_value_t = 10)]
    games: usize,

    /// Number of parallel threads
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Generated roster size when the config has none
    #[arg(short, long, default_value_t = 4)]
    players: usize,

    /// Comma-separated providers assigned to generated seats in turn
    #[arg(long, default_value = "random")]
    providers: String,

    /// Base seed; game i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Rounds per game before it is stopped
    #[arg(long)]
    max_turns: Option<u32>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress progress and summary output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conquest=warn")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut game = match &cli.config {
        Some(path) => match GameConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => GameConfig::default(),
    };
    if game.players.is_empty() {
        let providers: Vec<&str> = cli.providers.split(',').map(str::trim).collect();
        game.players = GameConfig::generated_roster(cli.players, "random");
        for (i, player) in game.players.iter_mut().enumerate() {
            player.provider = providers[i % providers.len()].to_string();
        }
    }
    if cli.seed.is_some() {
        game.seed = cli.seed;
    }
    if let Some(max_turns) = cli.max_turns {
        game.max_turns = max_turns;
    }

    let config = TournamentConfig {
        game,
        games: cli.games,
        threads: cli.threads,
        quiet: cli.quiet,
    };
    if !cli.quiet {
        eprintln!(
            "Tournament: {} games, {} players, {} threads",
            config.games,
            config.game.players.len(),
            config.threads
        );
    }

    let start = Instant::now();
    let records = match run_tournament(&config) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if !cli.quiet {
        eprintln!(
            "Completed {} games in {:.1}s",
            records.len(),
            start.elapsed().as_secs_f64()
        );
        Summary::from_records(&records).print();
    }

    let written = match &cli.output {
        Some(path) => File::create(path).and_then(|file| write_jsonl(&records, &mut BufWriter::new(file))),
        None => write_jsonl(&records, &mut BufWriter::new(io::stdout().lock())),
    };
    if let Err(e) = written {
        eprintln!("error: failed to write results: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
