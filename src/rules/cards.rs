//! Card sets, the trade-in schedule and card draws.

use tracing::debug;

use crate::board::{Card, CardSymbol, GameEvent, GameState, Phase, PlayerId};

use super::RuleViolation;

/// Fixed bonuses for the first trades; each later trade adds 5 more.
const TRADE_SCHEDULE: [u32; 6] = [4, 6, 8, 10, 12, 15];

/// Armies placed directly on a traded territory the trader occupies.
pub const OCCUPIED_TERRITORY_BONUS: u32 = 2;

/// Hand size at which trading becomes mandatory at reinforcement.
pub const MUST_TRADE_HAND: usize = 5;

/// Hand size that triggers a forced trade after absorbing an eliminated hand.
pub const ELIMINATION_TRADE_HAND: usize = 6;

/// Hand size a forced elimination trade must get down to.
pub const ELIMINATION_TRADE_TARGET: usize = 4;

/// Bonus armies for the set traded after `completed` earlier trades.
pub fn trade_bonus(completed: u32) -> u32 {
    let n = completed as usize;
    match TRADE_SCHEDULE.get(n) {
        Some(&b) => b,
        None => {
            let last = TRADE_SCHEDULE[TRADE_SCHEDULE.len() - 1];
            last + (n - TRADE_SCHEDULE.len() + 1) as u32 * 5
        }
    }
}

/// Returns true if the three cards form a tradeable set.
///
/// Valid sets: three of one design, one of each design, or either with
/// wildcards standing in for the missing members.
pub fn is_valid_set(cards: [&Card; 3]) -> bool {
    let wild = cards.iter().filter(|c| c.symbol.is_wild()).count();
    let mut named: Vec<CardSymbol> = cards
        .iter()
        .map(|c| c.symbol)
        .filter(|s| !s.is_wild())
        .collect();
    named.sort_by_key(|s| *s as u8);
    named.dedup();
    match wild {
        0 => named.len() == 1 || named.len() == 3,
        // Two named cards plus a wild can always complete one pattern.
        _ => true,
    }
}

/// All index triples of `hand` forming valid sets, in lexicographic order.
pub fn valid_sets(hand: &[Card]) -> Vec<[usize; 3]> {
    let mut sets = Vec::new();
    for i in 0..hand.len() {
        for j in i + 1..hand.len() {
            for k in j + 1..hand.len() {
                if is_valid_set([&hand[i], &hand[j], &hand[k]]) {
                    sets.push([i, j, k]);
                }
            }
        }
    }
    sets
}

/// True if `player` currently has to trade before doing anything else.
pub fn must_trade(state: &GameState, player: PlayerId) -> bool {
    let hand = &state.player(player).hand;
    if state.elimination_trade == Some(player) {
        return hand.len() > ELIMINATION_TRADE_TARGET && !valid_sets(hand).is_empty();
    }
    state.phase == Phase::Reinforce
        && state.current_player == player
        && hand.len() >= MUST_TRADE_HAND
        && !valid_sets(hand).is_empty()
}

/// Trades the cards at `indices` for armies.
///
/// The set bonus goes to `armies_to_deploy`; the first traded card naming a
/// territory the player occupies puts 2 armies straight onto it. Traded
/// cards go back to the deck, which is reshuffled.
pub fn trade_cards(
    state: &mut GameState,
    player: PlayerId,
    indices: [usize; 3],
    rng: &mut (impl rand::Rng + ?Sized),
) -> Result<u32, RuleViolation> {
    let forced = state.elimination_trade == Some(player);
    if !forced && state.phase != Phase::Reinforce {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    if !forced && state.current_player != player {
        return Err(RuleViolation::NotYourTurn(state.pname(player).to_string()));
    }
    if state.player(player).is_neutral {
        return Err(RuleViolation::NeutralCannotAct(state.pname(player).to_string()));
    }
    let hand_len = state.player(player).hand.len();
    for &index in &indices {
        if index >= hand_len {
            return Err(RuleViolation::CardIndexOutOfRange {
                index,
                hand: hand_len,
            });
        }
    }
    if indices[0] == indices[1] || indices[1] == indices[2] || indices[0] == indices[2] {
        return Err(RuleViolation::InvalidCardSet(indices));
    }
    {
        let hand = &state.player(player).hand;
        if !is_valid_set([&hand[indices[0]], &hand[indices[1]], &hand[indices[2]]]) {
            return Err(RuleViolation::InvalidCardSet(indices));
        }
    }

    let mut sorted = indices;
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let traded: Vec<Card> = sorted
        .iter()
        .map(|&i| state.player_mut(player).hand.remove(i))
        .collect();

    let bonus = trade_bonus(state.trades_completed);
    state.trades_completed += 1;
    state.player_mut(player).armies_to_deploy += bonus;

    let occupied = traded
        .iter()
        .filter_map(|c| c.territory_name.as_deref())
        .filter_map(|name| state.territory_id(name))
        .find(|&id| state.territory(id).owner == Some(player));
    if let Some(id) = occupied {
        state.territory_mut(id).armies += OCCUPIED_TERRITORY_BONUS;
    }

    state.deck.return_to_bottom(traded);
    state.deck.shuffle(rng);

    if forced && state.player(player).hand.len() <= ELIMINATION_TRADE_TARGET {
        state.elimination_trade = None;
    }

    let territory_bonus = occupied.map(|id| state.tname(id).to_string());
    debug!(player = %state.pname(player), bonus, ?territory_bonus, "cards traded");
    state.record(GameEvent::CardsTraded {
        player: state.pname(player).to_string(),
        bonus_armies: bonus,
        territory_bonus,
    });
    Ok(bonus)
}

/// Gives `player` the top card of the deck, if one remains.
pub fn draw_card(state: &mut GameState, player: PlayerId) -> bool {
    match state.deck.draw() {
        Some(card) => {
            state.player_mut(player).hand.push(card);
            state.record(GameEvent::CardDrawn {
                player: state.pname(player).to_string(),
            });
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Player, PlayerId, Seat};
    use crate::rules::testutil::{line_state, put};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn card(symbol: CardSymbol) -> Card {
        if symbol.is_wild() {
            Card::wildcard()
        } else {
            Card::territory("X", symbol)
        }
    }

    fn set(a: CardSymbol, b: CardSymbol, c: CardSymbol) -> bool {
        is_valid_set([&card(a), &card(b), &card(c)])
    }

    use CardSymbol::{Artillery as Art, Cavalry as Cav, Infantry as Inf, Wildcard as Wild};

    #[test]
    fn schedule_matches_table_then_steps_by_five() {
        let got: Vec<u32> = (0..9).map(trade_bonus).collect();
        assert_eq!(got, vec![4, 6, 8, 10, 12, 15, 20, 25, 30]);
    }

    #[test]
    fn three_of_a_kind_and_one_of_each() {
        assert!(set(Inf, Inf, Inf));
        assert!(set(Art, Art, Art));
        assert!(set(Inf, Cav, Art));
        assert!(!set(Inf, Inf, Cav));
        assert!(!set(Cav, Art, Art));
    }

    #[test]
    fn wildcards_substitute() {
        assert!(set(Inf, Inf, Wild));
        assert!(set(Inf, Cav, Wild));
        assert!(set(Inf, Wild, Wild));
        assert!(set(Wild, Wild, Wild));
    }

    #[test]
    fn valid_sets_enumerates_triples() {
        let hand = vec![card(Inf), card(Inf), card(Cav), card(Inf)];
        assert_eq!(valid_sets(&hand), vec![[0, 1, 3]]);
        assert!(valid_sets(&hand[..2]).is_empty());
    }

    #[test]
    fn trade_grants_bonus_and_occupied_territory_armies() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        put(&mut state, "B", 1, 1);
        state.player_mut(PlayerId(0)).hand = vec![
            Card::territory("B", Inf),
            Card::territory("A", Inf),
            Card::territory("C", Inf),
        ];
        let mut rng = SmallRng::seed_from_u64(42);
        let bonus = trade_cards(&mut state, PlayerId(0), [0, 1, 2], &mut rng).unwrap();
        assert_eq!(bonus, 4);
        assert_eq!(state.player(PlayerId(0)).armies_to_deploy, 4);
        assert!(state.player(PlayerId(0)).hand.is_empty());
        let a = state.territory_id("A").unwrap();
        assert_eq!(state.territory(a).armies, 3);
        assert_eq!(state.trades_completed, 1);
        assert_eq!(state.deck.len(), 3);
    }

    #[test]
    fn invalid_set_leaves_state_untouched() {
        let mut state = line_state();
        put(&mut state, "A", 0, 1);
        state.player_mut(PlayerId(0)).hand =
            vec![card(Inf), card(Inf), card(Cav)];
        let before = state.player(PlayerId(0)).clone();
        let mut rng = SmallRng::seed_from_u64(42);
        let err = trade_cards(&mut state, PlayerId(0), [0, 1, 2], &mut rng).unwrap_err();
        assert_eq!(err, RuleViolation::InvalidCardSet([0, 1, 2]));
        assert_eq!(state.player(PlayerId(0)), &before);
        assert_eq!(state.trades_completed, 0);
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut state = line_state();
        state.player_mut(PlayerId(0)).hand = vec![card(Inf), card(Inf), card(Inf)];
        let mut rng = SmallRng::seed_from_u64(42);
        let err = trade_cards(&mut state, PlayerId(0), [0, 1, 5], &mut rng).unwrap_err();
        assert!(matches!(err, RuleViolation::CardIndexOutOfRange { index: 5, .. }));
    }

    #[test]
    fn must_trade_at_five_cards_with_a_set() {
        let mut state = line_state();
        state.player_mut(PlayerId(0)).hand = vec![card(Inf); 4];
        assert!(!must_trade(&state, PlayerId(0)));
        state.player_mut(PlayerId(0)).hand.push(card(Cav));
        assert!(must_trade(&state, PlayerId(0)));
    }

    #[test]
    fn must_trade_only_for_current_player_in_reinforce() {
        let mut state = line_state();
        state.player_mut(PlayerId(1)).hand = vec![card(Inf); 5];
        assert!(!must_trade(&state, PlayerId(1)));
        state.current_player = PlayerId(1);
        assert!(must_trade(&state, PlayerId(1)));
        state.phase = Phase::Attack;
        assert!(!must_trade(&state, PlayerId(1)));
    }

    #[test]
    fn elimination_trade_forces_down_to_four() {
        let mut state = line_state();
        state.phase = Phase::Attack;
        state.player_mut(PlayerId(0)).hand = vec![card(Inf); 6];
        state.elimination_trade = Some(PlayerId(0));
        assert!(must_trade(&state, PlayerId(0)));
        let mut rng = SmallRng::seed_from_u64(1);
        trade_cards(&mut state, PlayerId(0), [0, 1, 2], &mut rng).unwrap();
        assert_eq!(state.player(PlayerId(0)).hand.len(), 3);
        assert_eq!(state.elimination_trade, None);
        assert!(!must_trade(&state, PlayerId(0)));
    }

    #[test]
    fn neutral_cannot_trade() {
        let mut state = line_state();
        state
            .players
            .push(Player::new(PlayerId(2), &Seat::new("Neutral", "Gray"), true));
        state.current_player = PlayerId(2);
        state.player_mut(PlayerId(2)).hand = vec![card(Inf); 3];
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            trade_cards(&mut state, PlayerId(2), [0, 1, 2], &mut rng),
            Err(RuleViolation::NeutralCannotAct("Neutral".into()))
        );
        assert_eq!(state.player(PlayerId(2)).hand.len(), 3);
    }

    #[test]
    fn draw_card_records_event() {
        let mut state = line_state();
        state.deck.return_to_bottom([card(Art)]);
        assert!(draw_card(&mut state, PlayerId(1)));
        assert_eq!(state.player(PlayerId(1)).hand.len(), 1);
        assert!(!draw_card(&mut state, PlayerId(1)));
    }
}
