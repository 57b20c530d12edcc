//! Territories and continents.
//!
//! Territories are addressed by dense `TerritoryId` indices into the
//! `GameState` territory table so adjacency walks never hash names.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Index of a territory in the board's territory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerritoryId(pub usize);

/// Index of a continent in the board's continent table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContinentId(pub usize);

/// An ownable map region.
///
/// `armies` is at least 1 whenever `owner` is set, except for the window
/// between a capture and the mandatory post-attack fortification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub continent: ContinentId,
    pub owner: Option<PlayerId>,
    pub armies: u32,
    pub adjacent: Vec<TerritoryId>,
}

impl Territory {
    /// Returns true if `other` borders this territory.
    pub fn borders(&self, other: TerritoryId) -> bool {
        self.adjacent.contains(&other)
    }

    /// Returns true if the territory belongs to `player`.
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }
}

/// A fixed group of territories granting a reinforcement bonus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continent {
    pub id: ContinentId,
    pub name: String,
    pub bonus_armies: u32,
    pub members: Vec<TerritoryId>,
}
