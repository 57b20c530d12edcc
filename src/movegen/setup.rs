//! Legal setup actions.

use crate::board::{GameState, PlayerId};
use crate::protocol::ActionTemplate;
use crate::rules::setup::{neutral_remaining, two_player_quota};

/// One claim per unclaimed territory, in board order.
pub fn claim_templates(state: &GameState) -> Vec<ActionTemplate> {
    state
        .territories
        .iter()
        .filter(|t| t.owner.is_none())
        .map(|t| ActionTemplate::SetupClaim {
            territory: t.name.clone(),
        })
        .collect()
}

/// One placement per owned territory while the pool lasts.
pub fn place_templates(state: &GameState, player: PlayerId) -> Vec<ActionTemplate> {
    if state.player(player).setup_armies_remaining() == 0 {
        return Vec::new();
    }
    state
        .owned_by(player)
        .map(|t| ActionTemplate::SetupPlaceArmy {
            territory: t.name.clone(),
        })
        .collect()
}

/// The composite two-player placement turn.
pub fn two_player_templates(state: &GameState, player: PlayerId) -> Vec<ActionTemplate> {
    let quota = two_player_quota(state, player);
    let neutral_left = neutral_remaining(state);
    if quota == 0 && neutral_left == 0 {
        return Vec::new();
    }
    let neutral_owned_territories = state
        .neutral_player()
        .map(|n| state.owned_by(n).map(|t| t.name.clone()).collect())
        .unwrap_or_default();
    vec![ActionTemplate::Setup2pPlaceArmiesTurn {
        player_armies_to_place_this_turn: quota,
        player_owned_territories: state.owned_by(player).map(|t| t.name.clone()).collect(),
        neutral_can_place: neutral_left > 0,
        neutral_owned_territories,
    }]
}
