//! Append-only game history.
//!
//! Events carry names rather than ids so they can be handed to actors and
//! presentation layers without a lookup table.

use std::collections::BTreeMap;

use serde::Serialize;

use super::state::Relation;

/// Something that happened, as recorded in the history feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    TurnStart {
        player: String,
    },
    ContinentControl {
        /// Continent name to controlling player name.
        controllers: BTreeMap<String, String>,
    },
    AttackResult {
        attacker: String,
        defender: String,
        from: String,
        to: String,
        attacker_rolls: Vec<u8>,
        defender_rolls: Vec<u8>,
        attacker_losses: u32,
        defender_losses: u32,
        conquered: bool,
    },
    Conquest {
        player: String,
        territory: String,
        previous_owner: String,
    },
    CardsTraded {
        player: String,
        bonus_armies: u32,
        territory_bonus: Option<String>,
    },
    CardDrawn {
        player: String,
    },
    Elimination {
        eliminated: String,
        by: String,
        cards_transferred: usize,
    },
    Fortify {
        player: String,
        from: String,
        to: String,
        armies: u32,
    },
    DiplomacyChange {
        players: [String; 2],
        relation: Relation,
    },
    AllianceProposed {
        proposer: String,
        target: String,
    },
    Betrayal {
        betrayer: String,
        victim: String,
    },
}

/// A history entry stamped with the turn it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub turn: u32,
    #[serde(flatten)]
    pub event: GameEvent,
}
