//! End-of-turn fortification.

use std::collections::VecDeque;

use tracing::debug;

use crate::board::{GameEvent, GameState, Phase, PlayerId, TerritoryId};

use super::reinforce::{ensure_current, owned_territory};
use super::{FortifyRule, RuleViolation};

/// Returns true if armies may travel from `from` to `to` under `rule`.
///
/// Both ends must share an owner. Under `Connected` the path may pass
/// through any number of that owner's territories.
pub fn can_fortify_path(
    state: &GameState,
    rule: FortifyRule,
    from: TerritoryId,
    to: TerritoryId,
) -> bool {
    if from == to {
        return false;
    }
    let Some(owner) = state.territory(from).owner else {
        return false;
    };
    if state.territory(to).owner != Some(owner) {
        return false;
    }
    match rule {
        FortifyRule::Adjacent => state.territory(from).borders(to),
        FortifyRule::Connected => reachable(state, owner, from).contains(&to),
    }
}

/// Territories reachable from `start` through `owner`'s territories (excluding `start`).
pub fn reachable(state: &GameState, owner: PlayerId, start: TerritoryId) -> Vec<TerritoryId> {
    let mut seen = vec![false; state.territories.len()];
    let mut queue = VecDeque::from([start]);
    let mut out = Vec::new();
    seen[start.0] = true;
    while let Some(cur) = queue.pop_front() {
        for &n in &state.territory(cur).adjacent {
            if !seen[n.0] && state.territory(n).owner == Some(owner) {
                seen[n.0] = true;
                out.push(n);
                queue.push_back(n);
            }
        }
    }
    out.sort();
    out
}

/// Moves armies between two of the player's territories, once per turn.
pub fn fortify(
    state: &mut GameState,
    rule: FortifyRule,
    player: PlayerId,
    from: &str,
    to: &str,
    num_armies: u32,
) -> Result<(), RuleViolation> {
    ensure_current(state, player)?;
    if state.phase != Phase::Fortify {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    if state.player(player).has_fortified_this_turn {
        return Err(RuleViolation::AlreadyFortified);
    }
    let f = owned_territory(state, player, from)?;
    let t = owned_territory(state, player, to)?;
    if !can_fortify_path(state, rule, f, t) {
        let (from, to) = (from.to_string(), to.to_string());
        return Err(match rule {
            FortifyRule::Adjacent => RuleViolation::NotAdjacent { from, to },
            FortifyRule::Connected => RuleViolation::NotConnected { from, to },
        });
    }
    let available = state.territory(f).armies.saturating_sub(1);
    if num_armies == 0 || num_armies > available {
        return Err(RuleViolation::ArmyCountOutOfRange {
            requested: num_armies,
            min: 1,
            max: available,
        });
    }
    state.territory_mut(f).armies -= num_armies;
    state.territory_mut(t).armies += num_armies;
    state.player_mut(player).has_fortified_this_turn = true;
    debug!(player = %state.pname(player), from, to, num_armies, "fortified");
    state.record(GameEvent::Fortify {
        player: state.pname(player).to_string(),
        from: from.to_string(),
        to: to.to_string(),
        armies: num_armies,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testutil::{line_state, put};

    fn fortify_state() -> GameState {
        let mut state = line_state();
        state.phase = Phase::Fortify;
        put(&mut state, "A", 0, 5);
        put(&mut state, "B", 0, 1);
        put(&mut state, "C", 0, 1);
        put(&mut state, "D", 1, 2);
        state
    }

    #[test]
    fn connected_rule_walks_owned_chain() {
        let state = fortify_state();
        let (a, c, d) = (
            state.territory_id("A").unwrap(),
            state.territory_id("C").unwrap(),
            state.territory_id("D").unwrap(),
        );
        assert!(can_fortify_path(&state, FortifyRule::Connected, a, c));
        assert!(!can_fortify_path(&state, FortifyRule::Adjacent, a, c));
        assert!(!can_fortify_path(&state, FortifyRule::Connected, a, d));
    }

    #[test]
    fn enemy_territory_breaks_the_chain() {
        let mut state = fortify_state();
        put(&mut state, "B", 1, 1);
        let (a, c) = (state.territory_id("A").unwrap(), state.territory_id("C").unwrap());
        assert!(!can_fortify_path(&state, FortifyRule::Connected, a, c));
    }

    #[test]
    fn fortify_moves_and_flags() {
        let mut state = fortify_state();
        fortify(&mut state, FortifyRule::Connected, PlayerId(0), "A", "C", 4).unwrap();
        let (a, c) = (state.territory_id("A").unwrap(), state.territory_id("C").unwrap());
        assert_eq!(state.territory(a).armies, 1);
        assert_eq!(state.territory(c).armies, 5);
        assert!(state.player(PlayerId(0)).has_fortified_this_turn);
        assert_eq!(
            fortify(&mut state, FortifyRule::Connected, PlayerId(0), "C", "B", 1),
            Err(RuleViolation::AlreadyFortified)
        );
    }

    #[test]
    fn fortify_must_leave_one_behind() {
        let mut state = fortify_state();
        let before = state.territories.clone();
        let err = fortify(&mut state, FortifyRule::Adjacent, PlayerId(0), "A", "B", 5).unwrap_err();
        assert_eq!(
            err,
            RuleViolation::ArmyCountOutOfRange {
                requested: 5,
                min: 1,
                max: 4
            }
        );
        assert_eq!(state.territories, before);
        assert!(!state.player(PlayerId(0)).has_fortified_this_turn);
    }

    #[test]
    fn adjacent_rule_rejects_distant_target() {
        let mut state = fortify_state();
        let err = fortify(&mut state, FortifyRule::Adjacent, PlayerId(0), "A", "C", 1).unwrap_err();
        assert!(matches!(err, RuleViolation::NotAdjacent { .. }));
    }
}
