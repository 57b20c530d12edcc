//! Reinforcement math and deployment.

use tracing::{debug, warn};

use crate::board::{GameState, Phase, PlayerId, TerritoryId};

use super::cards::must_trade;
use super::RuleViolation;

/// Minimum armies a player receives per turn from territory count.
pub const MIN_REINFORCEMENTS: u32 = 3;

/// Armies due at the start of `player`'s turn: one per three territories
/// (at least 3) plus the bonus of every fully held continent.
pub fn calculate_reinforcements(state: &GameState, player: PlayerId) -> u32 {
    let territories = state.owned_count(player) as u32;
    let base = (territories / 3).max(MIN_REINFORCEMENTS);
    let continents: u32 = state
        .controlled_continents(player)
        .into_iter()
        .map(|c| state.continent(c).bonus_armies)
        .sum();
    base + continents
}

/// Resolves a territory name owned by `player`.
pub(crate) fn owned_territory(
    state: &GameState,
    player: PlayerId,
    name: &str,
) -> Result<TerritoryId, RuleViolation> {
    let id = state
        .territory_id(name)
        .ok_or_else(|| RuleViolation::UnknownTerritory(name.to_string()))?;
    if state.territory(id).owner != Some(player) {
        return Err(RuleViolation::NotOwner {
            player: state.pname(player).to_string(),
            territory: name.to_string(),
        });
    }
    Ok(id)
}

pub(crate) fn ensure_current(state: &GameState, player: PlayerId) -> Result<(), RuleViolation> {
    if state.phase == Phase::GameOver {
        return Err(RuleViolation::GameOver);
    }
    if state.current_player != player {
        return Err(RuleViolation::NotYourTurn(state.pname(player).to_string()));
    }
    Ok(())
}

/// Places `num_armies` from the deployable pool onto an owned territory.
///
/// Allowed during REINFORCE, and during ATTACK while armies earned from a
/// forced elimination trade are still waiting to be placed.
pub fn deploy(
    state: &mut GameState,
    player: PlayerId,
    territory: &str,
    num_armies: u32,
) -> Result<(), RuleViolation> {
    ensure_current(state, player)?;
    let available = state.player(player).armies_to_deploy;
    match state.phase {
        Phase::Reinforce => {}
        Phase::Attack if available > 0 => {}
        other => return Err(RuleViolation::WrongPhase(other)),
    }
    if state.conquest.is_some() {
        return Err(RuleViolation::ConquestPending);
    }
    if must_trade(state, player) {
        return Err(RuleViolation::TradeRequired);
    }
    let id = owned_territory(state, player, territory)?;
    if num_armies == 0 || num_armies > available {
        return Err(RuleViolation::ArmyCountOutOfRange {
            requested: num_armies,
            min: 1,
            max: available,
        });
    }
    state.player_mut(player).armies_to_deploy -= num_armies;
    state.territory_mut(id).armies += num_armies;
    debug!(player = %state.pname(player), territory, num_armies, "deployed");
    Ok(())
}

/// Spreads `armies` one at a time over the player's territories in board order.
pub fn auto_distribute(state: &mut GameState, player: PlayerId, armies: u32) {
    let owned: Vec<TerritoryId> = state.owned_by(player).map(|t| t.id).collect();
    if owned.is_empty() {
        return;
    }
    for i in 0..armies as usize {
        state.territory_mut(owned[i % owned.len()]).armies += 1;
    }
}

/// Ends REINFORCE and moves to ATTACK. Undeployed armies are auto-distributed.
pub fn end_reinforce_phase(state: &mut GameState, player: PlayerId) -> Result<(), RuleViolation> {
    ensure_current(state, player)?;
    if state.phase != Phase::Reinforce {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    if must_trade(state, player) {
        return Err(RuleViolation::TradeRequired);
    }
    let leftover = std::mem::take(&mut state.player_mut(player).armies_to_deploy);
    if leftover > 0 {
        warn!(player = %state.pname(player), leftover, "auto-distributing undeployed armies");
        auto_distribute(state, player, leftover);
    }
    state.phase = Phase::Attack;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardConfig, Card, CardSymbol, GameState, Player, Seat, Variant};
    use crate::rules::testutil::{line_state, put};

    #[test]
    fn minimum_is_three() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        put(&mut state, "C", 1, 1);
        assert_eq!(calculate_reinforcements(&state, PlayerId(0)), 3);
    }

    #[test]
    fn continent_bonus_requires_full_control() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        put(&mut state, "B", 1, 1);
        put(&mut state, "C", 0, 1);
        put(&mut state, "D", 0, 1);
        // East held, West split.
        assert_eq!(calculate_reinforcements(&state, PlayerId(0)), 3 + 3);
        assert_eq!(calculate_reinforcements(&state, PlayerId(1)), 3);
        put(&mut state, "B", 0, 1);
        assert_eq!(calculate_reinforcements(&state, PlayerId(0)), 3 + 2 + 3);
    }

    #[test]
    fn territory_count_divided_by_three() {
        let board = BoardConfig::classic().unwrap().build().unwrap();
        let mut state = GameState::new(board, Variant::Standard);
        state
            .players
            .push(Player::new(PlayerId(0), &Seat::new("Ann", "Red"), false));
        // 14 territories spread so no continent is complete.
        let mut given = 0;
        for t in state.territories.iter_mut() {
            if given < 14 && t.id.0 % 3 == 0 {
                t.owner = Some(PlayerId(0));
                t.armies = 1;
                given += 1;
            }
        }
        assert!(state.controlled_continents(PlayerId(0)).is_empty());
        assert_eq!(calculate_reinforcements(&state, PlayerId(0)), 4);
    }

    #[test]
    fn deploy_moves_armies_from_pool() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        state.player_mut(PlayerId(0)).armies_to_deploy = 3;
        deploy(&mut state, PlayerId(0), "A", 2).unwrap();
        assert_eq!(state.player(PlayerId(0)).armies_to_deploy, 1);
        let a = state.territory_id("A").unwrap();
        assert_eq!(state.territory(a).armies, 3);
    }

    #[test]
    fn deploy_rejects_excess_and_foreign_territory() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        put(&mut state, "B", 1, 1);
        state.player_mut(PlayerId(0)).armies_to_deploy = 3;
        assert!(matches!(
            deploy(&mut state, PlayerId(0), "A", 4),
            Err(RuleViolation::ArmyCountOutOfRange { .. })
        ));
        assert!(matches!(
            deploy(&mut state, PlayerId(0), "B", 1),
            Err(RuleViolation::NotOwner { .. })
        ));
        assert!(matches!(
            deploy(&mut state, PlayerId(1), "B", 1),
            Err(RuleViolation::NotYourTurn(_))
        ));
        assert_eq!(state.player(PlayerId(0)).armies_to_deploy, 3);
    }

    #[test]
    fn deploy_blocked_while_trade_is_mandatory() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        state.player_mut(PlayerId(0)).armies_to_deploy = 3;
        state.player_mut(PlayerId(0)).hand = vec![Card::territory("Z", CardSymbol::Infantry); 5];
        assert_eq!(
            deploy(&mut state, PlayerId(0), "A", 1),
            Err(RuleViolation::TradeRequired)
        );
    }

    #[test]
    fn end_reinforce_spreads_leftovers() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        put(&mut state, "B", 0, 1);
        state.player_mut(PlayerId(0)).armies_to_deploy = 3;
        end_reinforce_phase(&mut state, PlayerId(0)).unwrap();
        assert_eq!(state.phase, Phase::Attack);
        assert_eq!(state.player(PlayerId(0)).armies_to_deploy, 0);
        let a = state.territory_id("A").unwrap();
        let b = state.territory_id("B").unwrap();
        assert_eq!(state.territory(a).armies, 3);
        assert_eq!(state.territory(b).armies, 2);
    }
}
