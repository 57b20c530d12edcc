//! Board representation and game-state types.
//!
//! Contains the data model for territories, continents, cards, players,
//! the event history and the overall game state, plus board loading.

pub mod card;
pub mod event;
pub mod map;
pub mod player;
pub mod state;
pub mod territory;

pub use card::{Card, CardSymbol, Deck, NAMED_SYMBOLS};
pub use event::{GameEvent, HistoryEntry};
pub use map::{Board, BoardConfig, BoardError, CLASSIC_BOARD};
pub use player::{Player, PlayerId, Seat};
pub use state::{
    ConquestContext, GameState, Phase, PlayerPair, Relation, SetupState, Variant,
};
pub use territory::{Continent, ContinentId, Territory, TerritoryId};
