//! Conquest -- plays one game between configured actors.
//!
//! The roster comes from a JSON config file or is generated from
//! `--players` and `--provider`. Flags override individual config fields.
//! The game runs to completion or the turn cap and ends with a textual
//! winner/draw summary on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use conquest::board::Variant;
use conquest::config::GameConfig;
use conquest::orchestrator::{GameReport, Orchestrator, OrchestratorError, Outcome};
use conquest::rules::FortifyRule;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Standard,
    TwoPlayer,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Standard => Variant::Standard,
            VariantArg::TwoPlayer => Variant::TwoPlayer,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FortifyArg {
    Connected,
    Adjacent,
}

impl From<FortifyArg> for FortifyRule {
    fn from(f: FortifyArg) -> Self {
        match f {
            FortifyArg::Connected => FortifyRule::Connected,
            FortifyArg::Adjacent => FortifyRule::Adjacent,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "conquest")]
#[command(about = "Territorial conquest between autonomous players", version)]
struct Cli {
    /// Game config JSON (roster, limits, rules)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of generated players when no roster is configured
    #[arg(short, long)]
    players: Option<usize>,

    /// Provider for generated players
    #[arg(long, default_value = "random")]
    provider: String,

    /// Ruleset variant
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Board definition JSON
    #[arg(long)]
    board: Option<PathBuf>,

    /// Seed for dice, shuffles and built-in actors
    #[arg(long)]
    seed: Option<u64>,

    /// Rounds played before the game is stopped
    #[arg(long)]
    max_turns: Option<u32>,

    /// Fortification path rule
    #[arg(long, value_enum)]
    fortify: Option<FortifyArg>,

    /// Print the chat transcript after the game
    #[arg(long)]
    transcript: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig, OrchestratorError> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };
        if let Some(variant) = self.variant {
            config.variant = variant.into();
        }
        if config.players.is_empty() || self.players.is_some() {
            let count = self.players.unwrap_or(match config.variant {
                Variant::Standard => 3,
                Variant::TwoPlayer => 2,
            });
            config.players = GameConfig::generated_roster(count, &self.provider);
        }
        if let Some(board) = &self.board {
            config.board = Some(board.clone());
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns = max_turns;
        }
        if let Some(fortify) = self.fortify {
            config.rules.fortify_rule = fortify.into();
        }
        Ok(config)
    }
}

fn print_summary(report: &GameReport) {
    match &report.outcome {
        Outcome::Winner { player } => println!("Winner: {player} after {} turns", report.turns),
        Outcome::Draw => println!("Draw after {} turns", report.turns),
        Outcome::TurnLimit => println!("No winner: turn limit reached after {} turns", report.turns),
    }
    let s = report.stats;
    println!(
        "Decisions: {} requested, {} retried, {} fell back, {} provider failures",
        s.requests, s.retries, s.fallbacks, s.provider_failures
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "conquest=debug" } else { "conquest=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = async {
        let config = cli.game_config()?;
        let mut orchestrator = Orchestrator::from_config(&config, tokio::runtime::Handle::current())?;
        let report = orchestrator.run().await?;
        Ok::<_, OrchestratorError>((report, orchestrator))
    }
    .await;

    match result {
        Ok((report, orchestrator)) => {
            print_summary(&report);
            if cli.transcript {
                match serde_json::to_string_pretty(orchestrator.transcript()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(error = %e, "failed to serialize transcript"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "game aborted");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
