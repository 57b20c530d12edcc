//! Players and their per-turn bookkeeping.

use serde::{Deserialize, Serialize};

use super::card::Card;

/// Index of a player in the `GameState` player list. Stable for the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

/// A seat at the table: the identity a player is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    pub color: String,
}

impl Seat {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Seat {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// A participant. Eliminated players stay in the list for history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub is_neutral: bool,
    pub hand: Vec<Card>,
    pub armies_to_deploy: u32,
    pub has_fortified_this_turn: bool,
    pub has_conquered_territory_this_turn: bool,
    pub initial_armies_pool: u32,
    pub armies_placed_in_setup: u32,
    pub eliminated: bool,
}

impl Player {
    pub fn new(id: PlayerId, seat: &Seat, is_neutral: bool) -> Self {
        Player {
            id,
            name: seat.name.clone(),
            color: seat.color.clone(),
            is_neutral,
            hand: Vec::new(),
            armies_to_deploy: 0,
            has_fortified_this_turn: false,
            has_conquered_territory_this_turn: false,
            initial_armies_pool: 0,
            armies_placed_in_setup: 0,
            eliminated: false,
        }
    }

    /// Armies from the initial pool not yet placed during setup.
    pub fn setup_armies_remaining(&self) -> u32 {
        self.initial_armies_pool
            .saturating_sub(self.armies_placed_in_setup)
    }

    /// Clears the once-per-turn flags.
    pub fn reset_turn_flags(&mut self) {
        self.has_fortified_this_turn = false;
        self.has_conquered_territory_this_turn = false;
    }

    /// True for players that take turns: not neutral and not eliminated.
    pub fn is_active(&self) -> bool {
        !self.is_neutral && !self.eliminated
    }
}
