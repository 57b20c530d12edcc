//! Board definitions.
//!
//! Boards are described in JSON:
//! `{"continents":[{"name","bonus_armies"}], "territories": {name: {"continent", "adjacent_to": [..]}}}`.
//! Loading resolves names to dense ids and symmetrizes adjacency; a missing
//! reverse edge is logged and repaired rather than rejected.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::territory::{Continent, ContinentId, Territory, TerritoryId};

/// The classic 42-territory world map.
pub const CLASSIC_BOARD: &str = include_str!("../../boards/classic.json");

/// Errors raised while loading a board definition.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read board file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed board JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("board has no territories")]
    Empty,
    #[error("duplicate continent '{0}'")]
    DuplicateContinent(String),
    #[error("territory '{territory}' references unknown continent '{continent}'")]
    UnknownContinent { territory: String, continent: String },
    #[error("territory '{territory}' lists unknown neighbour '{neighbour}'")]
    UnknownNeighbour { territory: String, neighbour: String },
    #[error("continent '{0}' has no territories")]
    EmptyContinent(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinentDef {
    pub name: String,
    pub bonus_armies: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryDef {
    pub continent: String,
    #[serde(default)]
    pub adjacent_to: Vec<String>,
}

/// A board definition as read from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub continents: Vec<ContinentDef>,
    pub territories: BTreeMap<String, TerritoryDef>,
}

/// A resolved board ready to seed a `GameState`.
#[derive(Debug, Clone)]
pub struct Board {
    pub territories: Vec<Territory>,
    pub continents: Vec<Continent>,
}

impl BoardConfig {
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BoardError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The embedded classic world map.
    pub fn classic() -> Result<Self, BoardError> {
        Self::from_json(CLASSIC_BOARD)
    }

    /// Resolves names into ids and validates references.
    pub fn build(&self) -> Result<Board, BoardError> {
        if self.territories.is_empty() {
            return Err(BoardError::Empty);
        }

        let mut continent_ids: HashMap<&str, ContinentId> = HashMap::new();
        let mut continents = Vec::with_capacity(self.continents.len());
        for (i, def) in self.continents.iter().enumerate() {
            if continent_ids.insert(def.name.as_str(), ContinentId(i)).is_some() {
                return Err(BoardError::DuplicateContinent(def.name.clone()));
            }
            continents.push(Continent {
                id: ContinentId(i),
                name: def.name.clone(),
                bonus_armies: def.bonus_armies,
                members: Vec::new(),
            });
        }

        let territory_ids: HashMap<&str, TerritoryId> = self
            .territories
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), TerritoryId(i)))
            .collect();

        let mut territories = Vec::with_capacity(self.territories.len());
        for (i, (name, def)) in self.territories.iter().enumerate() {
            let continent = *continent_ids.get(def.continent.as_str()).ok_or_else(|| {
                BoardError::UnknownContinent {
                    territory: name.clone(),
                    continent: def.continent.clone(),
                }
            })?;
            let mut adjacent = Vec::with_capacity(def.adjacent_to.len());
            for neighbour in &def.adjacent_to {
                let id = *territory_ids.get(neighbour.as_str()).ok_or_else(|| {
                    BoardError::UnknownNeighbour {
                        territory: name.clone(),
                        neighbour: neighbour.clone(),
                    }
                })?;
                if id != TerritoryId(i) && !adjacent.contains(&id) {
                    adjacent.push(id);
                }
            }
            continents[continent.0].members.push(TerritoryId(i));
            territories.push(Territory {
                id: TerritoryId(i),
                name: name.clone(),
                continent,
                owner: None,
                armies: 0,
                adjacent,
            });
        }

        if let Some(empty) = continents.iter().find(|c| c.members.is_empty()) {
            return Err(BoardError::EmptyContinent(empty.name.clone()));
        }

        symmetrize(&mut territories);
        Ok(Board {
            territories,
            continents,
        })
    }
}

fn symmetrize(territories: &mut [Territory]) {
    let mut missing = Vec::new();
    for t in territories.iter() {
        for &n in &t.adjacent {
            if !territories[n.0].adjacent.contains(&t.id) {
                missing.push((n, t.id));
            }
        }
    }
    for (at, to) in missing {
        warn!(
            from = %territories[to.0].name,
            to = %territories[at.0].name,
            "adjacency is not symmetric, adding reverse edge"
        );
        territories[at.0].adjacent.push(to);
    }
}
