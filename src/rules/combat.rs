//! Attack resolution and the post-attack fortification it arms.
//!
//! Dice are rolled by `attack`; `apply_battle` takes the rolls as input so
//! fixed outcomes can be replayed.

use rand::Rng;
use tracing::{debug, info};

use crate::board::{ConquestContext, GameEvent, GameState, Phase, PlayerId, Relation, TerritoryId};

use super::cards::{draw_card, must_trade, ELIMINATION_TRADE_HAND};
use super::diplomacy::mark_betrayal;
use super::phase::check_game_over;
use super::reinforce::{ensure_current, owned_territory};
use super::RuleViolation;

/// Most dice an attacker may roll.
pub const MAX_ATTACK_DICE: u32 = 3;
/// Most dice a defender may roll.
pub const MAX_DEFENSE_DICE: u32 = 2;

/// Outcome of one attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleReport {
    pub attacker_rolls: Vec<u8>,
    pub defender_rolls: Vec<u8>,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    pub conquered: bool,
    pub eliminated: Option<PlayerId>,
}

/// Compares dice pairwise, highest against highest. Ties go to the defender.
///
/// Returns `(attacker_losses, defender_losses)`.
pub fn resolve_dice(attacker: &[u8], defender: &[u8]) -> (u32, u32) {
    let mut a = attacker.to_vec();
    let mut d = defender.to_vec();
    a.sort_unstable_by(|x, y| y.cmp(x));
    d.sort_unstable_by(|x, y| y.cmp(x));
    let mut losses = (0, 0);
    for (ra, rd) in a.iter().zip(d.iter()) {
        if ra > rd {
            losses.1 += 1;
        } else {
            losses.0 += 1;
        }
    }
    losses
}

/// Rolls `n` six-sided dice, sorted descending.
pub fn roll_dice(rng: &mut (impl Rng + ?Sized), n: u32) -> Vec<u8> {
    let mut rolls: Vec<u8> = (0..n).map(|_| rng.gen_range(1..=6)).collect();
    rolls.sort_unstable_by(|a, b| b.cmp(a));
    rolls
}

/// Most defending dice the territory may roll.
pub fn max_defense_dice(armies: u32) -> u32 {
    armies.min(MAX_DEFENSE_DICE)
}

/// Checks an attack without rolling. Returns the resolved (from, to) ids.
pub fn check_attack(
    state: &GameState,
    player: PlayerId,
    from: &str,
    to: &str,
    num_armies: u32,
) -> Result<(TerritoryId, TerritoryId), RuleViolation> {
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
    let f = owned_territory(state, player, from)?;
    let t = state
        .territory_id(to)
        .ok_or_else(|| RuleViolation::UnknownTerritory(to.to_string()))?;
    match state.territory(t).owner {
        Some(owner) if owner == player => {
            return Err(RuleViolation::OwnTerritory(to.to_string()));
        }
        None => return Err(RuleViolation::Unoccupied(to.to_string())),
        Some(_) => {}
    }
    if !state.territory(f).borders(t) {
        return Err(RuleViolation::NotAdjacent {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    let armies = state.territory(f).armies;
    if armies < 2 {
        return Err(RuleViolation::InsufficientArmies {
            territory: from.to_string(),
            armies,
        });
    }
    if num_armies == 0 || num_armies >= armies {
        return Err(RuleViolation::ArmyCountOutOfRange {
            requested: num_armies,
            min: 1,
            max: armies - 1,
        });
    }
    Ok((f, t))
}

/// Resolves one attack.
///
/// `defender_dice` overrides the defender's dice count (used when another
/// player picks the dice for a Neutral territory); `None` rolls the maximum.
pub fn attack(
    state: &mut GameState,
    player: PlayerId,
    from: &str,
    to: &str,
    num_armies: u32,
    defender_dice: Option<u32>,
    rng: &mut (impl Rng + ?Sized),
) -> Result<BattleReport, RuleViolation> {
    let (f, t) = check_attack(state, player, from, to, num_armies)?;
    let max_def = max_defense_dice(state.territory(t).armies);
    let def_dice = match defender_dice {
        None => max_def,
        Some(d) if (1..=max_def).contains(&d) => d,
        Some(d) => {
            return Err(RuleViolation::ArmyCountOutOfRange {
                requested: d,
                min: 1,
                max: max_def,
            })
        }
    };
    let attacker_rolls = roll_dice(rng, num_armies.min(MAX_ATTACK_DICE));
    let defender_rolls = roll_dice(rng, def_dice);
    apply_battle(
        state,
        player,
        f,
        t,
        num_armies,
        attacker_rolls,
        defender_rolls,
    )
}

/// Applies already-rolled dice to an attack that passed `check_attack`.
pub fn apply_battle(
    state: &mut GameState,
    player: PlayerId,
    from: TerritoryId,
    to: TerritoryId,
    num_armies: u32,
    attacker_rolls: Vec<u8>,
    defender_rolls: Vec<u8>,
) -> Result<BattleReport, RuleViolation> {
    let defender = state
        .territory(to)
        .owner
        .ok_or_else(|| RuleViolation::Unoccupied(state.tname(to).to_string()))?;
    if state.relation(player, defender) == Relation::Alliance {
        mark_betrayal(state, player, defender);
    }

    let (attacker_losses, defender_losses) = resolve_dice(&attacker_rolls, &defender_rolls);
    {
        let src = state.territory_mut(from);
        src.armies = src.armies.saturating_sub(attacker_losses);
    }
    let conquered = {
        let dst = state.territory_mut(to);
        dst.armies = dst.armies.saturating_sub(defender_losses);
        dst.armies == 0
    };

    debug!(
        attacker = %state.pname(player),
        from = %state.tname(from),
        to = %state.tname(to),
        ?attacker_rolls,
        ?defender_rolls,
        attacker_losses,
        defender_losses,
        conquered,
        "attack resolved"
    );
    state.record(GameEvent::AttackResult {
        attacker: state.pname(player).to_string(),
        defender: state.pname(defender).to_string(),
        from: state.tname(from).to_string(),
        to: state.tname(to).to_string(),
        attacker_rolls: attacker_rolls.clone(),
        defender_rolls: defender_rolls.clone(),
        attacker_losses,
        defender_losses,
        conquered,
    });

    let mut eliminated = None;
    if conquered {
        state.territory_mut(to).owner = Some(player);
        state.record(GameEvent::Conquest {
            player: state.pname(player).to_string(),
            territory: state.tname(to).to_string(),
            previous_owner: state.pname(defender).to_string(),
        });
        if !state.player(player).has_conquered_territory_this_turn {
            state.player_mut(player).has_conquered_territory_this_turn = true;
            draw_card(state, player);
        }
        if state.owned_count(defender) == 0 {
            eliminate(state, defender, player);
            eliminated = Some(defender);
        }
        let survivors = num_armies.saturating_sub(attacker_losses);
        let max_movable = survivors.min(state.territory(from).armies.saturating_sub(1));
        let dice = attacker_rolls.len() as u32;
        let min_movable = if max_movable > 0 {
            dice.min(max_movable).max(1)
        } else {
            0
        };
        state.conquest = Some(ConquestContext {
            from,
            to,
            min_movable,
            max_movable,
        });
    }

    if eliminated.is_some() {
        check_game_over(state);
    }

    Ok(BattleReport {
        attacker_rolls,
        defender_rolls,
        attacker_losses,
        defender_losses,
        conquered,
        eliminated,
    })
}

/// Removes `loser` from play and hands its cards to `by`.
fn eliminate(state: &mut GameState, loser: PlayerId, by: PlayerId) {
    let cards = std::mem::take(&mut state.player_mut(loser).hand);
    let cards_transferred = cards.len();
    state.player_mut(loser).eliminated = true;
    state.player_mut(loser).armies_to_deploy = 0;
    state.player_mut(by).hand.extend(cards);
    state.proposals.retain(|pair, _| !pair.contains(loser));
    if state.player(by).hand.len() >= ELIMINATION_TRADE_HAND {
        state.elimination_trade = Some(by);
    }
    info!(eliminated = %state.pname(loser), by = %state.pname(by), "player eliminated");
    state.record(GameEvent::Elimination {
        eliminated: state.pname(loser).to_string(),
        by: state.pname(by).to_string(),
        cards_transferred,
    });
}

/// Moves armies into a freshly captured territory and clears the conquest context.
pub fn post_attack_fortify(
    state: &mut GameState,
    player: PlayerId,
    from: &str,
    to: &str,
    num_armies: u32,
) -> Result<(), RuleViolation> {
    ensure_current(state, player)?;
    let ctx = match state.conquest {
        Some(ctx) if state.tname(ctx.from) == from && state.tname(ctx.to) == to => ctx,
        _ => {
            return Err(RuleViolation::NoConquestPending {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    };
    if num_armies < ctx.min_movable || num_armies > ctx.max_movable {
        return Err(RuleViolation::ArmyCountOutOfRange {
            requested: num_armies,
            min: ctx.min_movable,
            max: ctx.max_movable,
        });
    }
    state.territory_mut(ctx.from).armies -= num_armies;
    state.territory_mut(ctx.to).armies += num_armies;
    state.conquest = None;
    Ok(())
}
