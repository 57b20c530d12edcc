//! Game configuration.
//!
//! A `GameConfig` is read from JSON and may be adjusted by command-line
//! flags before validation. Every field except the roster has a default.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::PROVIDERS;
use crate::board::{Board, BoardConfig, BoardError, Seat, Variant};
use crate::orchestrator::Limits;
use crate::rules::setup::NEUTRAL_NAME;
use crate::rules::RulesConfig;

/// Mixes the game seed into distinct per-actor seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{variant:?} games need {expected} players, got {got}")]
    PlayerCount {
        variant: Variant,
        expected: &'static str,
        got: usize,
    },

    #[error("duplicate player name '{0}'")]
    DuplicateName(String),

    #[error("duplicate colour '{0}'")]
    DuplicateColor(String),

    #[error("'{0}' is reserved for the Neutral player")]
    ReservedName(String),

    #[error("unknown provider '{provider}' for {player}")]
    UnknownProvider { player: String, provider: String },

    #[error("{0} must be at least 1")]
    ZeroLimit(&'static str),
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub color: String,
    /// Actor provider identifier, e.g. `random`.
    pub provider: String,
}

impl PlayerConfig {
    pub fn new(name: impl Into<String>, color: impl Into<String>, provider: impl Into<String>) -> Self {
        PlayerConfig {
            name: name.into(),
            color: color.into(),
            provider: provider.into(),
        }
    }
}

/// Everything needed to start a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub variant: Variant,
    pub players: Vec<PlayerConfig>,
    /// Board definition file; the classic map when absent.
    pub board: Option<PathBuf>,
    /// Seed for dice, shuffles and built-in actors. Entropy when absent.
    pub seed: Option<u64>,
    pub rules: RulesConfig,
    pub max_turns: u32,
    pub max_decision_attempts: u32,
    pub max_phase_actions: u32,
    pub max_forced_trades: u32,
    pub chat_max_exchanges: u32,
    pub global_chat_limit: usize,
    pub conversation_limit: usize,
    pub event_feed_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        let limits = Limits::default();
        GameConfig {
            variant: Variant::Standard,
            players: Vec::new(),
            board: None,
            seed: None,
            rules: RulesConfig::default(),
            max_turns: limits.max_turns,
            max_decision_attempts: limits.max_decision_attempts,
            max_phase_actions: limits.max_phase_actions,
            max_forced_trades: limits.max_forced_trades,
            chat_max_exchanges: limits.chat_max_exchanges,
            global_chat_limit: limits.global_chat_limit,
            conversation_limit: limits.conversation_limit,
            event_feed_limit: limits.event_feed_limit,
        }
    }
}

/// Colours handed out to generated rosters, in seat order.
pub const DEFAULT_COLORS: [&str; 6] = ["Red", "Blue", "Green", "Yellow", "Purple", "Black"];

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// A roster of `count` players named `Player 1..` all using `provider`.
    pub fn generated_roster(count: usize, provider: &str) -> Vec<PlayerConfig> {
        (0..count)
            .map(|i| {
                let color = DEFAULT_COLORS
                    .get(i)
                    .map_or_else(|| format!("Color{}", i + 1), |c| c.to_string());
                PlayerConfig::new(format!("Player {}", i + 1), color, provider)
            })
            .collect()
    }

    /// Checks the roster against the variant and the limits for sanity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let got = self.players.len();
        let expected = match self.variant {
            Variant::Standard if !(3..=6).contains(&got) => Some("3 to 6"),
            Variant::TwoPlayer if got != 2 => Some("exactly 2"),
            _ => None,
        };
        if let Some(expected) = expected {
            return Err(ConfigError::PlayerCount {
                variant: self.variant,
                expected,
                got,
            });
        }

        let mut names = HashSet::new();
        let mut colors = HashSet::new();
        for p in &self.players {
            if p.name == NEUTRAL_NAME {
                return Err(ConfigError::ReservedName(p.name.clone()));
            }
            if !names.insert(p.name.as_str()) {
                return Err(ConfigError::DuplicateName(p.name.clone()));
            }
            if !colors.insert(p.color.as_str()) {
                return Err(ConfigError::DuplicateColor(p.color.clone()));
            }
            if !PROVIDERS.contains(&p.provider.as_str()) {
                return Err(ConfigError::UnknownProvider {
                    player: p.name.clone(),
                    provider: p.provider.clone(),
                });
            }
        }

        if self.max_turns == 0 {
            return Err(ConfigError::ZeroLimit("max_turns"));
        }
        if self.max_decision_attempts == 0 {
            return Err(ConfigError::ZeroLimit("max_decision_attempts"));
        }
        if self.max_phase_actions == 0 {
            return Err(ConfigError::ZeroLimit("max_phase_actions"));
        }
        Ok(())
    }

    pub fn seats(&self) -> Vec<Seat> {
        self.players
            .iter()
            .map(|p| Seat::new(p.name.clone(), p.color.clone()))
            .collect()
    }

    pub fn load_board(&self) -> Result<Board, BoardError> {
        let config = match &self.board {
            Some(path) => BoardConfig::load(path)?,
            None => BoardConfig::classic()?,
        };
        config.build()
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_turns: self.max_turns,
            max_decision_attempts: self.max_decision_attempts,
            max_phase_actions: self.max_phase_actions,
            max_forced_trades: self.max_forced_trades,
            chat_max_exchanges: self.chat_max_exchanges,
            global_chat_limit: self.global_chat_limit,
            conversation_limit: self.conversation_limit,
            event_feed_limit: self.event_feed_limit,
        }
    }

    /// Seed for the actor in seat `index`.
    pub fn actor_seed(&self, index: usize) -> u64 {
        match self.seed {
            Some(seed) => seed ^ SEED_STRIDE.wrapping_mul(index as u64 + 1),
            None => rand::random(),
        }
    }
}
