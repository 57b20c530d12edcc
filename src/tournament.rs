//! Batch play between built-in actors.
//!
//! Plays many independent games with the same roster, optionally in
//! parallel, and reports one JSON line per game plus a win-rate summary.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::GameConfig;
use crate::orchestrator::{DecisionStats, Orchestrator, OrchestratorError, Outcome};

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Game(#[from] OrchestratorError),
}

/// Configuration for a batch of games.
#[derive(Debug, Clone)]
pub struct TournamentConfig {
    /// Template for every game. Game `i` uses `seed + i` when a seed is set.
    pub game: GameConfig,
    pub games: usize,
    /// Number of parallel threads; 1 plays sequentially.
    pub threads: usize,
    /// Suppress per-game progress lines.
    pub quiet: bool,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        TournamentConfig {
            game: GameConfig::default(),
            games: 10,
            threads: 4,
            quiet: false,
        }
    }
}

/// Result line for one game.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub seed: Option<u64>,
    pub winner: Option<String>,
    pub turns: u32,
    pub outcome: Outcome,
    pub stats: DecisionStats,
    pub elapsed_ms: u128,
}

/// Plays game `game_id` to the end on its own single-threaded runtime.
pub fn play_game(config: &TournamentConfig, game_id: usize) -> Result<GameRecord, TournamentError> {
    let mut game = config.game.clone();
    game.seed = config.game.seed.map(|s| s.wrapping_add(game_id as u64));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let start = Instant::now();
    let mut orchestrator = Orchestrator::from_config(&game, runtime.handle().clone())?;
    let report = runtime.block_on(orchestrator.run())?;
    Ok(GameRecord {
        game_id,
        seed: game.seed,
        winner: report.outcome.winner().map(str::to_string),
        turns: report.turns,
        outcome: report.outcome,
        stats: report.stats,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

/// Runs every game and returns the records of those that finished, in
/// completion order.
pub fn run_tournament(config: &TournamentConfig) -> Result<Vec<GameRecord>, TournamentError> {
    let mut records = Vec::with_capacity(config.games);
    run_tournament_with_callback(config, |record| records.push(record))?;
    Ok(records)
}

/// Like `run_tournament`, handing each record to `on_game` as it completes.
///
/// Games that fail are logged and skipped.
pub fn run_tournament_with_callback<F>(config: &TournamentConfig, mut on_game: F) -> Result<(), TournamentError>
where
    F: FnMut(GameRecord) + Send,
{
    use rayon::prelude::*;

    config.game.validate().map_err(OrchestratorError::from)?;
    let completed = AtomicUsize::new(0);
    let report = |result: Result<GameRecord, TournamentError>, game_id: usize| match result {
        Ok(record) => {
            if !config.quiet {
                let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                eprintln!(
                    "Game {}/{}: {} after {} turns ({:.1}s)",
                    n,
                    config.games,
                    record.outcome,
                    record.turns,
                    record.elapsed_ms as f64 / 1000.0
                );
            }
            Some(record)
        }
        Err(e) => {
            error!(game_id, error = %e, "game failed");
            None
        }
    };

    if config.threads <= 1 {
        for game_id in 0..config.games {
            if let Some(record) = report(play_game(config, game_id), game_id) {
                on_game(record);
            }
        }
        return Ok(());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let (tx, rx) = std::sync::mpsc::channel::<GameRecord>();
    std::thread::scope(|scope| {
        scope.spawn(|| {
            pool.install(|| {
                (0..config.games)
                    .into_par_iter()
                    .for_each_with(tx, |tx, game_id| {
                        if let Some(record) = report(play_game(config, game_id), game_id) {
                            let _ = tx.send(record);
                        }
                    });
            });
        });
        for record in rx {
            on_game(record);
        }
    });
    Ok(())
}

/// Writes records as JSONL, one game per line.
pub fn write_jsonl<W: Write>(records: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Aggregate results of a tournament.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub games: usize,
    pub wins: BTreeMap<String, usize>,
    pub draws: usize,
    pub turn_limits: usize,
    pub avg_turns: f64,
}

impl Summary {
    pub fn from_records(records: &[GameRecord]) -> Self {
        let mut summary = Summary {
            games: records.len(),
            ..Default::default()
        };
        let mut turns = 0u64;
        for record in records {
            turns += u64::from(record.turns);
            match &record.outcome {
                Outcome::Winner { player } => *summary.wins.entry(player.clone()).or_default() += 1,
                Outcome::Draw => summary.draws += 1,
                Outcome::TurnLimit => summary.turn_limits += 1,
            }
        }
        summary.avg_turns = turns as f64 / records.len().max(1) as f64;
        summary
    }

    /// Prints the summary to stderr.
    pub fn print(&self) {
        eprintln!("=== Tournament Summary ===");
        eprintln!("Games: {}", self.games);
        eprintln!("Avg turns/game: {:.1}", self.avg_turns);
        eprintln!("Draws: {}", self.draws);
        eprintln!("Turn limit reached: {}", self.turn_limits);
        eprintln!("Win distribution:");
        for (player, wins) in &self.wins {
            let pct = 100.0 * *wins as f64 / self.games.max(1) as f64;
            eprintln!("  {player:>12}: {wins} ({pct:.1}%)");
        }
        info!(games = self.games, draws = self.draws, "tournament finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Variant;

    fn config(threads: usize) -> TournamentConfig {
        TournamentConfig {
            game: GameConfig {
                variant: Variant::Standard,
                players: GameConfig::generated_roster(3, "random"),
                seed: Some(42),
                max_turns: 15,
                ..Default::default()
            },
            games: 3,
            threads,
            quiet: true,
        }
    }

    #[test]
    fn sequential_games_are_reproducible() {
        let a = run_tournament(&config(1)).unwrap();
        let b = run_tournament(&config(1)).unwrap();
        assert_eq!(a.len(), 3);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.outcome, y.outcome);
            assert_eq!(x.turns, y.turns);
            assert_eq!(x.seed, Some(42 + x.game_id as u64));
        }
    }

    #[test]
    fn parallel_run_plays_every_game() {
        let records = run_tournament(&config(2)).unwrap();
        let mut ids: Vec<_> = records.iter().map(|r| r.game_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn jsonl_has_one_line_per_game() {
        let records = run_tournament(&config(1)).unwrap();
        let mut out = Vec::new();
        write_jsonl(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert!(first.get("outcome").is_some());
        assert!(first.get("turns").is_some());
    }

    #[test]
    fn summary_counts_outcomes() {
        let record = |outcome| GameRecord {
            game_id: 0,
            seed: None,
            winner: None,
            turns: 10,
            outcome,
            stats: DecisionStats::default(),
            elapsed_ms: 0,
        };
        let records = vec![
            record(Outcome::Winner {
                player: "Ann".into(),
            }),
            record(Outcome::Winner {
                player: "Ann".into(),
            }),
            record(Outcome::Draw),
            record(Outcome::TurnLimit),
        ];
        let summary = Summary::from_records(&records);
        assert_eq!(summary.games, 4);
        assert_eq!(summary.wins.get("Ann"), Some(&2));
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.turn_limits, 1);
        assert!((summary.avg_turns - 10.0).abs() < f64::EPSILON);
    }
}
