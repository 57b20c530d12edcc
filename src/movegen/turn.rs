//! Legal actions during a player's turn: reinforce, attack, fortify.

use crate::board::{GameState, PlayerId, Relation, TerritoryId};
use crate::protocol::ActionTemplate;
use crate::rules::fortify::reachable;
use crate::rules::{valid_sets, FortifyRule, RulesConfig};

/// One trade per valid set in the hand.
pub fn trade_templates(state: &GameState, player: PlayerId, must_trade: bool) -> Vec<ActionTemplate> {
    valid_sets(&state.player(player).hand)
        .into_iter()
        .map(|card_indices| ActionTemplate::TradeCards {
            card_indices,
            must_trade,
        })
        .collect()
}

/// Deploy templates for every owned territory, capped at the deployable pool.
pub fn deploy_templates(state: &GameState, player: PlayerId) -> Vec<ActionTemplate> {
    let max_armies = state.player(player).armies_to_deploy;
    if max_armies == 0 {
        return Vec::new();
    }
    state
        .owned_by(player)
        .map(|t| ActionTemplate::Deploy {
            territory: t.name.clone(),
            max_armies,
        })
        .collect()
}

/// Every attack from an owned territory with spare armies into an adjacent enemy.
///
/// Attacks on allies are offered as `BETRAY_ALLY`.
pub fn attack_templates(state: &GameState, player: PlayerId) -> Vec<ActionTemplate> {
    let mut out = Vec::new();
    for from in state.owned_by(player).filter(|t| t.armies > 1) {
        for &n in &from.adjacent {
            let target = state.territory(n);
            let Some(owner) = target.owner.filter(|&o| o != player) else {
                continue;
            };
            let (from_name, to, max_armies_for_attack) =
                (from.name.clone(), target.name.clone(), from.armies - 1);
            out.push(if state.relation(player, owner) == Relation::Alliance {
                ActionTemplate::BetrayAlly {
                    from: from_name,
                    to,
                    max_armies_for_attack,
                }
            } else {
                ActionTemplate::Attack {
                    from: from_name,
                    to,
                    max_armies_for_attack,
                }
            });
        }
    }
    out
}

/// Every (from, to) pair of owned territories armies may move between.
pub fn fortify_templates(state: &GameState, rules: RulesConfig, player: PlayerId) -> Vec<ActionTemplate> {
    if state.player(player).has_fortified_this_turn {
        return Vec::new();
    }
    let mut out = Vec::new();
    for from in state.owned_by(player).filter(|t| t.armies > 1) {
        let targets: Vec<TerritoryId> = match rules.fortify_rule {
            FortifyRule::Connected => reachable(state, player, from.id),
            FortifyRule::Adjacent => {
                let mut adj: Vec<TerritoryId> = from
                    .adjacent
                    .iter()
                    .copied()
                    .filter(|&n| state.territory(n).owner == Some(player))
                    .collect();
                adj.sort();
                adj
            }
        };
        for to in targets {
            out.push(ActionTemplate::Fortify {
                from: from.name.clone(),
                to: state.tname(to).to_string(),
                max_armies_to_move: from.armies - 1,
            });
        }
    }
    out
}
