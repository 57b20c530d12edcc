//! Game state representation.
//!
//! Holds the complete snapshot of a game at a given point in time:
//! territory ownership and armies, players and hands, the deck, the phase
//! cursor, setup bookkeeping, pending-conquest context, diplomacy and the
//! event history. Only the rules engine writes to it.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::card::Deck;
use super::event::{GameEvent, HistoryEntry};
use super::map::Board;
use super::player::{Player, PlayerId};
use super::territory::{Continent, ContinentId, Territory, TerritoryId};

/// Which ruleset the game is played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// 3 to 6 players claiming territories in turn.
    #[default]
    Standard,
    /// Two humans plus an auto-played Neutral.
    TwoPlayer,
}

/// The phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "SETUP_START")]
    SetupStart,
    #[serde(rename = "SETUP_DETERMINE_ORDER")]
    SetupDetermineOrder,
    #[serde(rename = "SETUP_CLAIM_TERRITORIES")]
    SetupClaimTerritories,
    #[serde(rename = "SETUP_PLACE_ARMIES")]
    SetupPlaceArmies,
    #[serde(rename = "SETUP_2P_DEAL_CARDS")]
    Setup2pDealCards,
    #[serde(rename = "SETUP_2P_PLACE_REMAINING")]
    Setup2pPlaceRemaining,
    #[serde(rename = "REINFORCE")]
    Reinforce,
    #[serde(rename = "ATTACK")]
    Attack,
    #[serde(rename = "FORTIFY")]
    Fortify,
    #[serde(rename = "GAME_OVER")]
    GameOver,
}

impl Phase {
    /// Returns the wire name of the phase.
    pub const fn name(self) -> &'static str {
        match self {
            Phase::SetupStart => "SETUP_START",
            Phase::SetupDetermineOrder => "SETUP_DETERMINE_ORDER",
            Phase::SetupClaimTerritories => "SETUP_CLAIM_TERRITORIES",
            Phase::SetupPlaceArmies => "SETUP_PLACE_ARMIES",
            Phase::Setup2pDealCards => "SETUP_2P_DEAL_CARDS",
            Phase::Setup2pPlaceRemaining => "SETUP_2P_PLACE_REMAINING",
            Phase::Reinforce => "REINFORCE",
            Phase::Attack => "ATTACK",
            Phase::Fortify => "FORTIFY",
            Phase::GameOver => "GAME_OVER",
        }
    }

    pub const fn is_setup(self) -> bool {
        matches!(
            self,
            Phase::SetupStart
                | Phase::SetupDetermineOrder
                | Phase::SetupClaimTerritories
                | Phase::SetupPlaceArmies
                | Phase::Setup2pDealCards
                | Phase::Setup2pPlaceRemaining
        )
    }

    /// Phases the engine resolves on its own without asking any player.
    pub const fn is_automatic(self) -> bool {
        matches!(
            self,
            Phase::SetupStart | Phase::SetupDetermineOrder | Phase::Setup2pDealCards
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Diplomatic standing between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    #[default]
    Neutral,
    Alliance,
    War,
}

/// Unordered pair of players, used as the diplomacy key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerPair(PlayerId, PlayerId);

impl PlayerPair {
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        if a <= b {
            PlayerPair(a, b)
        } else {
            PlayerPair(b, a)
        }
    }

    pub fn members(self) -> (PlayerId, PlayerId) {
        (self.0, self.1)
    }

    pub fn contains(self, p: PlayerId) -> bool {
        self.0 == p || self.1 == p
    }
}

/// The armed post-attack fortification after a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConquestContext {
    pub from: TerritoryId,
    pub to: TerritoryId,
    pub min_movable: u32,
    pub max_movable: u32,
}

/// Setup-phase cursor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupState {
    pub unclaimed: Vec<TerritoryId>,
    pub order: Vec<PlayerId>,
    pub cursor: usize,
    pub first_player: Option<PlayerId>,
}

/// Complete game state.
#[derive(Debug, Clone)]
pub struct GameState {
    pub variant: Variant,
    pub territories: Vec<Territory>,
    pub continents: Vec<Continent>,
    index: HashMap<String, TerritoryId>,
    pub players: Vec<Player>,
    pub turn: u32,
    pub phase: Phase,
    pub current_player: PlayerId,
    pub deck: Deck,
    /// Card sets traded so far by anyone; drives the bonus schedule.
    pub trades_completed: u32,
    pub setup: SetupState,
    pub conquest: Option<ConquestContext>,
    /// Player who must trade down after absorbing an eliminated hand.
    pub elimination_trade: Option<PlayerId>,
    pub relations: BTreeMap<PlayerPair, Relation>,
    /// Outstanding alliance proposals, pair to proposer.
    pub proposals: BTreeMap<PlayerPair, PlayerId>,
    pub history: Vec<HistoryEntry>,
    pub winner: Option<PlayerId>,
}

impl GameState {
    /// Creates an empty game on `board` with no players seated.
    pub fn new(board: Board, variant: Variant) -> Self {
        let index = board
            .territories
            .iter()
            .map(|t| (t.name.clone(), t.id))
            .collect();
        GameState {
            variant,
            territories: board.territories,
            continents: board.continents,
            index,
            players: Vec::new(),
            turn: 1,
            phase: Phase::SetupStart,
            current_player: PlayerId(0),
            deck: Deck::default(),
            trades_completed: 0,
            setup: SetupState::default(),
            conquest: None,
            elimination_trade: None,
            relations: BTreeMap::new(),
            proposals: BTreeMap::new(),
            history: Vec::new(),
            winner: None,
        }
    }

    pub fn territory_id(&self, name: &str) -> Option<TerritoryId> {
        self.index.get(name).copied()
    }

    pub fn territory(&self, id: TerritoryId) -> &Territory {
        &self.territories[id.0]
    }

    pub fn territory_mut(&mut self, id: TerritoryId) -> &mut Territory {
        &mut self.territories[id.0]
    }

    pub fn continent(&self, id: ContinentId) -> &Continent {
        &self.continents[id.0]
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.0]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.0]
    }

    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players.iter().find(|p| p.name == name).map(|p| p.id)
    }

    pub fn neutral_player(&self) -> Option<PlayerId> {
        self.players.iter().find(|p| p.is_neutral).map(|p| p.id)
    }

    /// Territories owned by `player`, in board order.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Territory> + '_ {
        self.territories
            .iter()
            .filter(move |t| t.owner == Some(player))
    }

    pub fn owned_count(&self, player: PlayerId) -> usize {
        self.owned_by(player).count()
    }

    /// Returns the player owning every member of the continent, if any.
    pub fn continent_controller(&self, id: ContinentId) -> Option<PlayerId> {
        let continent = self.continent(id);
        let first = continent.members.first()?;
        let owner = self.territory(*first).owner?;
        continent
            .members
            .iter()
            .all(|&m| self.territory(m).owner == Some(owner))
            .then_some(owner)
    }

    /// Continents fully held by `player`.
    pub fn controlled_continents(&self, player: PlayerId) -> Vec<ContinentId> {
        self.continents
            .iter()
            .filter(|c| self.continent_controller(c.id) == Some(player))
            .map(|c| c.id)
            .collect()
    }

    /// Non-neutral players that still hold territory.
    pub fn active_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.id)
            .collect()
    }

    pub fn relation(&self, a: PlayerId, b: PlayerId) -> Relation {
        self.relations
            .get(&PlayerPair::new(a, b))
            .copied()
            .unwrap_or_default()
    }

    /// Appends an event stamped with the current turn.
    pub fn record(&mut self, event: GameEvent) {
        self.history.push(HistoryEntry {
            turn: self.turn,
            event,
        });
    }

    /// Name of a territory, for messages and events.
    pub fn tname(&self, id: TerritoryId) -> &str {
        &self.territory(id).name
    }

    /// Name of a player, for messages and events.
    pub fn pname(&self, id: PlayerId) -> &str {
        &self.player(id).name
    }
}
