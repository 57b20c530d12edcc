//! Rules engine.
//!
//! Every state-mutating operation on a `GameState` lives here. Operations
//! validate first and mutate only once every check has passed, so an
//! `Err(RuleViolation)` always leaves the state untouched.

pub mod cards;
pub mod combat;
pub mod diplomacy;
pub mod fortify;
pub mod phase;
pub mod reinforce;
pub mod setup;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Phase;

pub use cards::{is_valid_set, trade_bonus, trade_cards, valid_sets};
pub use combat::{attack, post_attack_fortify, resolve_dice, BattleReport};
pub use diplomacy::{accept_alliance, break_alliance, propose_alliance, reject_alliance};
pub use fortify::{can_fortify_path, fortify};
pub use phase::{acting_player, advance_turn, check_game_over, end_attack_phase, GameOutcome};
pub use reinforce::{calculate_reinforcements, deploy, end_reinforce_phase};

/// How fortification paths are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FortifyRule {
    /// Any chain of territories owned by the mover.
    #[default]
    Connected,
    /// Direct neighbours only.
    Adjacent,
}

/// Tunable rule options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub fortify_rule: FortifyRule,
}

/// An action rejected by the engine. The state is unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("action not allowed in phase {0}")]
    WrongPhase(Phase),
    #[error("it is not {0}'s turn")]
    NotYourTurn(String),
    #[error("unknown territory '{0}'")]
    UnknownTerritory(String),
    #[error("unknown player '{0}'")]
    UnknownPlayer(String),
    #[error("{player} does not own {territory}")]
    NotOwner { player: String, territory: String },
    #[error("{0} is already claimed")]
    AlreadyClaimed(String),
    #[error("{from} does not border {to}")]
    NotAdjacent { from: String, to: String },
    #[error("no chain of owned territories connects {from} to {to}")]
    NotConnected { from: String, to: String },
    #[error("cannot attack your own territory {0}")]
    OwnTerritory(String),
    #[error("{0} is unoccupied")]
    Unoccupied(String),
    #[error("{territory} needs more than {armies} armies for this")]
    InsufficientArmies { territory: String, armies: u32 },
    #[error("army count {requested} outside allowed range {min}..={max}")]
    ArmyCountOutOfRange { requested: u32, min: u32, max: u32 },
    #[error("cards {0:?} do not form a valid set")]
    InvalidCardSet([usize; 3]),
    #[error("card index {index} out of range for a hand of {hand}")]
    CardIndexOutOfRange { index: usize, hand: usize },
    #[error("a card trade is mandatory before anything else")]
    TradeRequired,
    #[error("a post-attack fortification is pending")]
    ConquestPending,
    #[error("no post-attack fortification is pending for {from} -> {to}")]
    NoConquestPending { from: String, to: String },
    #[error("already fortified this turn")]
    AlreadyFortified,
    #[error("deployable armies must be placed first")]
    DeploymentPending,
    #[error("setup armies exhausted")]
    SetupArmiesExhausted,
    #[error("setup placement invalid: {0}")]
    InvalidPlacement(String),
    #[error("diplomacy: {0}")]
    Diplomacy(String),
    #[error("invalid roster: {0}")]
    InvalidRoster(String),
    #[error("the game is over")]
    GameOver,
    #[error("{0} is not a rules action")]
    NotARuleAction(&'static str),
    #[error("{0} is neutral and takes no actions")]
    NeutralCannotAct(String),
    /// A structural invariant was already broken; the game cannot continue.
    #[error("state corruption: {0}")]
    StateCorruption(String),
}
