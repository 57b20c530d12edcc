//! Read-only state snapshots handed to actors and presentation.
//!
//! Everything is keyed by name. Hand contents are only visible to the
//! viewing player; everyone else sees card counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{Card, GameState, HistoryEntry, Phase, PlayerId, Relation};
use crate::rules::trade_bonus;

/// A chat line, global or private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub turn: u32,
    pub sender: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TerritoryView {
    pub continent: String,
    pub owner: Option<String>,
    pub army_count: u32,
    pub adjacent_to: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContinentView {
    pub bonus_armies: u32,
    pub members: Vec<String>,
    pub controller: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub color: String,
    pub is_neutral: bool,
    pub eliminated: bool,
    pub card_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
    pub territories: Vec<String>,
    pub armies_to_deploy: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConquestView {
    pub from: String,
    pub to: String,
    pub min_movable: u32,
    pub max_movable: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationView {
    pub players: [String; 2],
    pub relation: Relation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub proposer: String,
    pub target: String,
}

/// The whole visible game state for one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub turn: u32,
    pub phase: Phase,
    pub current_player: Option<String>,
    pub viewer: Option<String>,
    pub territories: BTreeMap<String, TerritoryView>,
    pub continents: BTreeMap<String, ContinentView>,
    pub players: BTreeMap<String, PlayerView>,
    pub conquest: Option<ConquestView>,
    pub diplomacy: Vec<RelationView>,
    pub proposals: Vec<ProposalView>,
    pub next_trade_bonus: u32,
    pub recent_events: Vec<HistoryEntry>,
    pub global_chat: Vec<ChatMessage>,
}

impl StateSnapshot {
    /// Builds the snapshot `viewer` is allowed to see.
    ///
    /// Only the last `event_limit` history entries are included.
    pub fn build(
        state: &GameState,
        viewer: Option<PlayerId>,
        event_limit: usize,
        global_chat: &[ChatMessage],
    ) -> Self {
        let territories = state
            .territories
            .iter()
            .map(|t| {
                let view = TerritoryView {
                    continent: state.continent(t.continent).name.clone(),
                    owner: t.owner.map(|p| state.pname(p).to_string()),
                    army_count: t.armies,
                    adjacent_to: t.adjacent.iter().map(|&n| state.tname(n).to_string()).collect(),
                };
                (t.name.clone(), view)
            })
            .collect();

        let continents = state
            .continents
            .iter()
            .map(|c| {
                let view = ContinentView {
                    bonus_armies: c.bonus_armies,
                    members: c.members.iter().map(|&m| state.tname(m).to_string()).collect(),
                    controller: state
                        .continent_controller(c.id)
                        .map(|p| state.pname(p).to_string()),
                };
                (c.name.clone(), view)
            })
            .collect();

        let players = state
            .players
            .iter()
            .map(|p| {
                let view = PlayerView {
                    color: p.color.clone(),
                    is_neutral: p.is_neutral,
                    eliminated: p.eliminated,
                    card_count: p.hand.len(),
                    hand: (Some(p.id) == viewer).then(|| p.hand.clone()),
                    territories: state.owned_by(p.id).map(|t| t.name.clone()).collect(),
                    armies_to_deploy: p.armies_to_deploy,
                };
                (p.name.clone(), view)
            })
            .collect();

        let conquest = state.conquest.map(|c| ConquestView {
            from: state.tname(c.from).to_string(),
            to: state.tname(c.to).to_string(),
            min_movable: c.min_movable,
            max_movable: c.max_movable,
        });

        let diplomacy = state
            .relations
            .iter()
            .map(|(pair, &relation)| {
                let (a, b) = pair.members();
                RelationView {
                    players: [state.pname(a).to_string(), state.pname(b).to_string()],
                    relation,
                }
            })
            .collect();

        let proposals = state
            .proposals
            .iter()
            .map(|(pair, &proposer)| {
                let (a, b) = pair.members();
                let target = if a == proposer { b } else { a };
                ProposalView {
                    proposer: state.pname(proposer).to_string(),
                    target: state.pname(target).to_string(),
                }
            })
            .collect();

        let skip = state.history.len().saturating_sub(event_limit);
        let in_turns = matches!(state.phase, Phase::Reinforce | Phase::Attack | Phase::Fortify);

        StateSnapshot {
            turn: state.turn,
            phase: state.phase,
            current_player: in_turns.then(|| state.pname(state.current_player).to_string()),
            viewer: viewer.map(|p| state.pname(p).to_string()),
            territories,
            continents,
            players,
            conquest,
            diplomacy,
            proposals,
            next_trade_bonus: trade_bonus(state.trades_completed),
            recent_events: state.history[skip..].to_vec(),
            global_chat: global_chat.to_vec(),
        }
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
