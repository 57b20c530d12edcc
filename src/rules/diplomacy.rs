//! Alliance proposals, responses, breaks and betrayals.
//!
//! Relations are keyed by unordered player pair. At most one proposal per
//! pair is outstanding; it is removed when answered.

use tracing::info;

use crate::board::{GameEvent, GameState, Phase, PlayerId, PlayerPair, Relation};

use super::RuleViolation;

fn lookup(state: &GameState, name: &str) -> Result<PlayerId, RuleViolation> {
    state
        .player_by_name(name)
        .ok_or_else(|| RuleViolation::UnknownPlayer(name.to_string()))
}

/// Players a proposal could be sent to: other active, non-neutral players.
pub fn can_negotiate(state: &GameState, a: PlayerId, b: PlayerId) -> bool {
    a != b && state.player(a).is_active() && state.player(b).is_active()
}

fn set_relation(state: &mut GameState, a: PlayerId, b: PlayerId, relation: Relation) {
    state.relations.insert(PlayerPair::new(a, b), relation);
    info!(a = %state.pname(a), b = %state.pname(b), ?relation, "relation changed");
    state.record(GameEvent::DiplomacyChange {
        players: [state.pname(a).to_string(), state.pname(b).to_string()],
        relation,
    });
}

/// Records an alliance offer from the current player to `target`.
pub fn propose_alliance(
    state: &mut GameState,
    proposer: PlayerId,
    target: &str,
) -> Result<PlayerId, RuleViolation> {
    if !matches!(state.phase, Phase::Reinforce | Phase::Attack) {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    if state.current_player != proposer {
        return Err(RuleViolation::NotYourTurn(state.pname(proposer).to_string()));
    }
    let target_id = lookup(state, target)?;
    if !can_negotiate(state, proposer, target_id) {
        return Err(RuleViolation::Diplomacy(format!(
            "{target} cannot receive proposals"
        )));
    }
    if state.relation(proposer, target_id) == Relation::Alliance {
        return Err(RuleViolation::Diplomacy(format!("already allied with {target}")));
    }
    let pair = PlayerPair::new(proposer, target_id);
    if state.proposals.contains_key(&pair) {
        return Err(RuleViolation::Diplomacy(format!(
            "a proposal with {target} is already pending"
        )));
    }
    state.proposals.insert(pair, proposer);
    state.record(GameEvent::AllianceProposed {
        proposer: state.pname(proposer).to_string(),
        target: target.to_string(),
    });
    Ok(target_id)
}

fn take_proposal(
    state: &mut GameState,
    responder: PlayerId,
    proposer: &str,
) -> Result<PlayerId, RuleViolation> {
    let proposer_id = lookup(state, proposer)?;
    let pair = PlayerPair::new(proposer_id, responder);
    match state.proposals.get(&pair) {
        Some(&p) if p == proposer_id && proposer_id != responder => {
            state.proposals.remove(&pair);
            Ok(proposer_id)
        }
        _ => Err(RuleViolation::Diplomacy(format!(
            "no pending proposal from {proposer}"
        ))),
    }
}

/// Accepts a pending proposal; the pair becomes allied.
pub fn accept_alliance(
    state: &mut GameState,
    responder: PlayerId,
    proposer: &str,
) -> Result<(), RuleViolation> {
    let proposer_id = take_proposal(state, responder, proposer)?;
    set_relation(state, proposer_id, responder, Relation::Alliance);
    Ok(())
}

/// Rejects a pending proposal; the pair returns to neutral.
pub fn reject_alliance(
    state: &mut GameState,
    responder: PlayerId,
    proposer: &str,
) -> Result<(), RuleViolation> {
    let proposer_id = take_proposal(state, responder, proposer)?;
    set_relation(state, proposer_id, responder, Relation::Neutral);
    Ok(())
}

/// Forms an alliance agreed outside the proposal handshake (private negotiation).
pub fn form_alliance(state: &mut GameState, a: PlayerId, b: PlayerId) -> Result<(), RuleViolation> {
    if !can_negotiate(state, a, b) {
        return Err(RuleViolation::Diplomacy("players cannot ally".into()));
    }
    state.proposals.remove(&PlayerPair::new(a, b));
    if state.relation(a, b) != Relation::Alliance {
        set_relation(state, a, b, Relation::Alliance);
    }
    Ok(())
}

/// Ends an alliance by the current player.
pub fn break_alliance(
    state: &mut GameState,
    player: PlayerId,
    target: &str,
) -> Result<(), RuleViolation> {
    if !matches!(state.phase, Phase::Reinforce | Phase::Attack) {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    if state.current_player != player {
        return Err(RuleViolation::NotYourTurn(state.pname(player).to_string()));
    }
    let target_id = lookup(state, target)?;
    if state.relation(player, target_id) != Relation::Alliance {
        return Err(RuleViolation::Diplomacy(format!("not allied with {target}")));
    }
    set_relation(state, player, target_id, Relation::Neutral);
    Ok(())
}

/// Attacking an ally turns the pair to war.
pub fn mark_betrayal(state: &mut GameState, betrayer: PlayerId, victim: PlayerId) {
    state.proposals.remove(&PlayerPair::new(betrayer, victim));
    state.record(GameEvent::Betrayal {
        betrayer: state.pname(betrayer).to_string(),
        victim: state.pname(victim).to_string(),
    });
    set_relation(state, betrayer, victim, Relation::War);
}
