//! Legal action enumeration.
//!
//! Produces the template list offered to the acting player for the current
//! phase and sub-phase. Order is deterministic: board order for territories,
//! seat order for players, the phase's end action after its moves and
//! diplomacy last.

pub mod setup;
pub mod turn;

use crate::board::{GameState, Phase, PlayerId, Relation};
use crate::protocol::ActionTemplate;
use crate::rules::cards::must_trade;
use crate::rules::diplomacy::can_negotiate;
use crate::rules::{acting_player, RulesConfig};

/// Returns the legal action templates for `player`, empty if it is not their move.
///
/// A pending post-attack fortification is offered exclusively, then a forced
/// card trade, then any armies still to deploy mid-attack; otherwise the full
/// menu of the phase.
pub fn valid_actions(state: &GameState, rules: RulesConfig, player: PlayerId) -> Vec<ActionTemplate> {
    if acting_player(state) != Some(player) || state.player(player).is_neutral {
        return Vec::new();
    }
    match state.phase {
        Phase::SetupClaimTerritories => setup::claim_templates(state),
        Phase::SetupPlaceArmies => setup::place_templates(state, player),
        Phase::Setup2pPlaceRemaining => setup::two_player_templates(state, player),
        Phase::Reinforce | Phase::Attack | Phase::Fortify => turn_actions(state, rules, player),
        _ => Vec::new(),
    }
}

fn turn_actions(state: &GameState, rules: RulesConfig, player: PlayerId) -> Vec<ActionTemplate> {
    if let Some(ctx) = state.conquest {
        return vec![ActionTemplate::PostAttackFortify {
            from_territory: state.tname(ctx.from).to_string(),
            to_territory: state.tname(ctx.to).to_string(),
            min_armies: ctx.min_movable,
            max_armies: ctx.max_movable,
        }];
    }
    if must_trade(state, player) {
        return turn::trade_templates(state, player, true);
    }

    let mut out = Vec::new();
    match state.phase {
        Phase::Reinforce => {
            out.extend(turn::deploy_templates(state, player));
            out.extend(turn::trade_templates(state, player, false));
            out.push(ActionTemplate::EndReinforcePhase);
        }
        Phase::Attack => {
            let deploy = turn::deploy_templates(state, player);
            if !deploy.is_empty() {
                return deploy;
            }
            out.extend(turn::attack_templates(state, player));
            out.push(ActionTemplate::EndAttackPhase);
        }
        Phase::Fortify => {
            out.extend(turn::fortify_templates(state, rules, player));
            out.push(ActionTemplate::EndTurn);
            return out;
        }
        _ => {}
    }
    out.extend(diplomacy_templates(state, player));
    out
}

/// Alliance proposals, breaks and answers to proposals aimed at `player`.
pub fn diplomacy_templates(state: &GameState, player: PlayerId) -> Vec<ActionTemplate> {
    let mut out = Vec::new();
    for other in state.players.iter().filter(|o| can_negotiate(state, player, o.id)) {
        let pair = crate::board::PlayerPair::new(player, other.id);
        match state.relation(player, other.id) {
            Relation::Alliance => out.push(ActionTemplate::BreakAlliance {
                target_player_name: other.name.clone(),
            }),
            _ => match state.proposals.get(&pair) {
                None => out.push(ActionTemplate::ProposeAlliance {
                    target_player_name: other.name.clone(),
                }),
                Some(&proposer) if proposer == other.id => {
                    out.extend(alliance_response_templates(&other.name));
                }
                Some(_) => {}
            },
        }
    }
    out
}

/// The two answers to an alliance proposal from `proposer`.
pub fn alliance_response_templates(proposer: &str) -> Vec<ActionTemplate> {
    vec![
        ActionTemplate::AcceptAlliance {
            proposing_player_name: proposer.to_string(),
        },
        ActionTemplate::RejectAlliance {
            proposing_player_name: proposer.to_string(),
        },
    ]
}
