//! Phase sequencing logic.
//!
//! Determines who acts in the current phase, advances the turn cursor and
//! detects the end of the game.
//!
//! Turn flow: REINFORCE -> ATTACK -> FORTIFY -> next player's REINFORCE.

use std::collections::BTreeMap;

use tracing::info;

use crate::board::{GameEvent, GameState, Phase, PlayerId};

use super::cards::must_trade;
use super::reinforce::{calculate_reinforcements, ensure_current};
use super::RuleViolation;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(PlayerId),
    /// Every player was eliminated at once.
    Draw,
}

/// The player expected to act in the current phase, if any.
///
/// Setup sub-phases follow the setup-order cursor, the main game follows
/// the current player. Automatic phases and GAME_OVER have no actor.
pub fn acting_player(state: &GameState) -> Option<PlayerId> {
    match state.phase {
        Phase::SetupClaimTerritories | Phase::SetupPlaceArmies | Phase::Setup2pPlaceRemaining => {
            state.setup.order.get(state.setup.cursor).copied()
        }
        Phase::Reinforce | Phase::Attack | Phase::Fortify => Some(state.current_player),
        _ => None,
    }
}

/// Evaluates the terminal conditions without changing anything.
///
/// Neutral never counts as a contender: in the two-player variant the last
/// human holding territory wins even if Neutral still has some.
pub fn game_outcome(state: &GameState) -> Option<GameOutcome> {
    if state.phase.is_setup() {
        return None;
    }
    let total = state.territories.len();
    if let Some(p) = state
        .players
        .iter()
        .find(|p| !p.is_neutral && state.owned_count(p.id) == total)
    {
        return Some(GameOutcome::Winner(p.id));
    }
    let alive: Vec<PlayerId> = state
        .players
        .iter()
        .filter(|p| !p.is_neutral && state.owned_count(p.id) > 0)
        .map(|p| p.id)
        .collect();
    match alive.as_slice() {
        [] => Some(GameOutcome::Draw),
        [only] => Some(GameOutcome::Winner(*only)),
        _ => None,
    }
}

/// Moves the game to GAME_OVER if a terminal condition holds.
pub fn check_game_over(state: &mut GameState) -> Option<GameOutcome> {
    let outcome = game_outcome(state)?;
    state.phase = Phase::GameOver;
    state.winner = match outcome {
        GameOutcome::Winner(p) => Some(p),
        GameOutcome::Draw => None,
    };
    match outcome {
        GameOutcome::Winner(p) => info!(winner = %state.pname(p), turn = state.turn, "game over"),
        GameOutcome::Draw => info!(turn = state.turn, "game over, draw"),
    }
    Some(outcome)
}

/// Starts `player`'s turn: REINFORCE with freshly computed reinforcements.
pub fn start_turn(state: &mut GameState, player: PlayerId) {
    state.current_player = player;
    state.phase = Phase::Reinforce;
    state.conquest = None;
    let armies = calculate_reinforcements(state, player);
    state.player_mut(player).armies_to_deploy = armies;
    info!(turn = state.turn, player = %state.pname(player), armies, "turn start");
    state.record(GameEvent::TurnStart {
        player: state.pname(player).to_string(),
    });
    let controllers: BTreeMap<String, String> = state
        .continents
        .iter()
        .filter_map(|c| {
            state
                .continent_controller(c.id)
                .map(|p| (c.name.clone(), state.pname(p).to_string()))
        })
        .collect();
    state.record(GameEvent::ContinentControl { controllers });
}

/// Hands the turn to the next active player holding territory.
///
/// The turn number increments each time the cursor wraps around the table.
pub fn advance_turn(state: &mut GameState) {
    let current = state.current_player;
    state.player_mut(current).reset_turn_flags();
    state.player_mut(current).armies_to_deploy = 0;

    let n = state.players.len();
    let next = (1..=n)
        .map(|step| PlayerId((current.0 + step) % n))
        .find(|&p| state.player(p).is_active() && state.owned_count(p) > 0);
    let Some(next) = next else {
        check_game_over(state);
        return;
    };
    if next.0 <= current.0 {
        state.turn += 1;
    }
    start_turn(state, next);
}

/// Ends ATTACK and moves to FORTIFY.
pub fn end_attack_phase(state: &mut GameState, player: PlayerId) -> Result<(), RuleViolation> {
    ensure_current(state, player)?;
    if state.phase != Phase::Attack {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    if state.conquest.is_some() {
        return Err(RuleViolation::ConquestPending);
    }
    if must_trade(state, player) {
        return Err(RuleViolation::TradeRequired);
    }
    if state.player(player).armies_to_deploy > 0 {
        return Err(RuleViolation::DeploymentPending);
    }
    state.phase = Phase::Fortify;
    Ok(())
}

/// Ends FORTIFY and passes the turn.
pub fn end_turn(state: &mut GameState, player: PlayerId) -> Result<(), RuleViolation> {
    ensure_current(state, player)?;
    if state.phase != Phase::Fortify {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    advance_turn(state);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Player, Seat};
    use crate::rules::testutil::{line_state, put};

    fn three_player_state() -> GameState {
        let mut state = line_state();
        state
            .players
            .push(Player::new(PlayerId(2), &Seat::new("Cy", "Green"), false));
        put(&mut state, "A", 0, 1);
        put(&mut state, "B", 1, 1);
        put(&mut state, "C", 2, 1);
        put(&mut state, "D", 2, 1);
        state
    }

    #[test]
    fn acting_player_follows_phase() {
        let mut state = three_player_state();
        state.current_player = PlayerId(1);
        assert_eq!(acting_player(&state), Some(PlayerId(1)));
        state.phase = Phase::SetupClaimTerritories;
        state.setup.order = vec![PlayerId(2), PlayerId(0)];
        state.setup.cursor = 1;
        assert_eq!(acting_player(&state), Some(PlayerId(0)));
        state.setup.cursor = 5;
        assert_eq!(acting_player(&state), None);
        state.phase = Phase::SetupStart;
        assert_eq!(acting_player(&state), None);
    }

    #[test]
    fn advance_turn_skips_players_without_territory() {
        let mut state = three_player_state();
        put(&mut state, "B", 2, 1);
        state.player_mut(PlayerId(1)).eliminated = true;
        state.phase = Phase::Fortify;
        advance_turn(&mut state);
        assert_eq!(state.current_player, PlayerId(2));
        assert_eq!(state.phase, Phase::Reinforce);
        assert_eq!(state.turn, 1);
        assert_eq!(state.player(PlayerId(2)).armies_to_deploy, 3 + 3);
    }

    #[test]
    fn turn_number_increments_on_wrap() {
        let mut state = three_player_state();
        state.current_player = PlayerId(2);
        state.player_mut(PlayerId(2)).has_fortified_this_turn = true;
        advance_turn(&mut state);
        assert_eq!(state.current_player, PlayerId(0));
        assert_eq!(state.turn, 2);
        assert!(!state.player(PlayerId(2)).has_fortified_this_turn);
    }

    #[test]
    fn turn_start_records_continent_control() {
        let mut state = three_player_state();
        start_turn(&mut state, PlayerId(2));
        let last = &state.history.last().unwrap().event;
        match last {
            GameEvent::ContinentControl { controllers } => {
                assert_eq!(controllers.get("East").map(String::as_str), Some("Cy"));
                assert!(!controllers.contains_key("West"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn game_continues_with_two_contenders() {
        let state = three_player_state();
        assert_eq!(game_outcome(&state), None);
    }

    #[test]
    fn sole_survivor_wins() {
        let mut state = three_player_state();
        put(&mut state, "A", 2, 1);
        put(&mut state, "B", 2, 1);
        assert_eq!(game_outcome(&state), Some(GameOutcome::Winner(PlayerId(2))));
        check_game_over(&mut state);
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(state.winner, Some(PlayerId(2)));
    }

    #[test]
    fn no_contenders_is_a_draw() {
        let mut state = three_player_state();
        for t in state.territories.iter_mut() {
            t.owner = None;
        }
        assert_eq!(game_outcome(&state), Some(GameOutcome::Draw));
    }

    #[test]
    fn no_game_over_during_setup() {
        let mut state = three_player_state();
        state.phase = Phase::SetupPlaceArmies;
        put(&mut state, "A", 2, 1);
        put(&mut state, "B", 2, 1);
        assert_eq!(game_outcome(&state), None);
    }

    #[test]
    fn neutral_holdings_do_not_block_two_player_win() {
        let mut state = line_state();
        state
            .players
            .push(Player::new(PlayerId(2), &Seat::new("Neutral", "Gray"), true));
        put(&mut state, "A", 0, 1);
        put(&mut state, "B", 0, 1);
        put(&mut state, "C", 2, 1);
        put(&mut state, "D", 2, 1);
        assert_eq!(game_outcome(&state), Some(GameOutcome::Winner(PlayerId(0))));
    }

    #[test]
    fn end_attack_blocked_by_pending_conquest() {
        let mut state = three_player_state();
        state.phase = Phase::Attack;
        let (a, b) = (state.territory_id("A").unwrap(), state.territory_id("B").unwrap());
        state.conquest = Some(crate::board::ConquestContext {
            from: a,
            to: b,
            min_movable: 1,
            max_movable: 1,
        });
        assert_eq!(
            end_attack_phase(&mut state, PlayerId(0)),
            Err(RuleViolation::ConquestPending)
        );
        state.conquest = None;
        end_attack_phase(&mut state, PlayerId(0)).unwrap();
        assert_eq!(state.phase, Phase::Fortify);
    }
}
