//! Game setup: seating, turn order, territory claiming and initial armies.
//!
//! Standard games (3-6 players) claim territories one at a time and then
//! place the rest of their pool one army per action. The two-player variant
//! adds a Neutral, deals the territories out evenly and then has each human
//! place two of their own armies plus one Neutral army per turn.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::board::{Board, Deck, GameState, Phase, Player, PlayerId, Seat, TerritoryId, Variant};

use super::phase::start_turn;
use super::RuleViolation;

pub const NEUTRAL_NAME: &str = "Neutral";
pub const NEUTRAL_COLOR: &str = "Gray";

/// Wildcards shuffled into the deck.
pub const WILDCARDS: usize = 2;

/// Own armies a human places per two-player setup turn.
pub const TWO_PLAYER_OWN_PER_TURN: u32 = 2;
/// Neutral armies a human places per two-player setup turn.
pub const TWO_PLAYER_NEUTRAL_PER_TURN: u32 = 1;

/// Starting army pool by number of seated players.
pub const fn initial_army_pool(players: usize) -> Option<u32> {
    match players {
        2 => Some(40),
        3 => Some(35),
        4 => Some(30),
        5 => Some(25),
        6 => Some(20),
        _ => None,
    }
}

/// Creates a game on `board` with `seats` seated, ready for SETUP_START.
pub fn new_game(
    board: Board,
    variant: Variant,
    seats: &[Seat],
    rng: &mut (impl Rng + ?Sized),
) -> Result<GameState, RuleViolation> {
    let mut state = GameState::new(board, variant);
    seat_players(&mut state, seats)?;
    let wildcards = match variant {
        Variant::Standard => WILDCARDS,
        // Added once setup is finished.
        Variant::TwoPlayer => 0,
    };
    state.deck = Deck::for_territories(state.territories.iter().map(|t| t.name.as_str()), wildcards);
    state.deck.shuffle(rng);
    Ok(state)
}

fn seat_players(state: &mut GameState, seats: &[Seat]) -> Result<(), RuleViolation> {
    let allowed = match state.variant {
        Variant::Standard => 3..=6,
        Variant::TwoPlayer => 2..=2,
    };
    if !allowed.contains(&seats.len()) {
        return Err(RuleViolation::InvalidRoster(format!(
            "{:?} needs {}-{} players, got {}",
            state.variant,
            allowed.start(),
            allowed.end(),
            seats.len()
        )));
    }
    let mut names = HashSet::new();
    let mut colors = HashSet::new();
    for seat in seats {
        if seat.name == NEUTRAL_NAME && state.variant == Variant::TwoPlayer {
            return Err(RuleViolation::InvalidRoster(format!(
                "'{NEUTRAL_NAME}' is reserved"
            )));
        }
        if !names.insert(seat.name.as_str()) {
            return Err(RuleViolation::InvalidRoster(format!(
                "duplicate player name '{}'",
                seat.name
            )));
        }
        if !colors.insert(seat.color.as_str()) {
            return Err(RuleViolation::InvalidRoster(format!(
                "duplicate color '{}'",
                seat.color
            )));
        }
    }

    let pool = initial_army_pool(seats.len()).ok_or_else(|| {
        RuleViolation::InvalidRoster(format!("no army pool for {} players", seats.len()))
    })?;
    let holders = match state.variant {
        Variant::Standard => seats.len(),
        Variant::TwoPlayer => seats.len() + 1,
    };
    let per_holder = state.territories.len().div_ceil(holders) as u32;
    if per_holder > pool {
        return Err(RuleViolation::InvalidRoster(format!(
            "board too large for an army pool of {pool}"
        )));
    }

    for (i, seat) in seats.iter().enumerate() {
        let mut player = Player::new(PlayerId(i), seat, false);
        player.initial_armies_pool = pool;
        state.players.push(player);
    }
    if state.variant == Variant::TwoPlayer {
        let color = if colors.contains(NEUTRAL_COLOR) {
            format!("{NEUTRAL_NAME}-{NEUTRAL_COLOR}")
        } else {
            NEUTRAL_COLOR.to_string()
        };
        let id = PlayerId(state.players.len());
        let mut neutral = Player::new(id, &Seat::new(NEUTRAL_NAME, color), true);
        neutral.initial_armies_pool = pool;
        state.players.push(neutral);
    }
    Ok(())
}

/// Resolves one automatic setup phase. Returns false if the current phase needs a player.
pub fn run_automatic(state: &mut GameState, rng: &mut (impl Rng + ?Sized)) -> bool {
    match state.phase {
        Phase::SetupStart => {
            state.phase = match state.variant {
                Variant::Standard => Phase::SetupDetermineOrder,
                Variant::TwoPlayer => Phase::Setup2pDealCards,
            };
            true
        }
        Phase::SetupDetermineOrder => {
            determine_order(state, rng);
            true
        }
        Phase::Setup2pDealCards => {
            deal_two_player(state, rng);
            true
        }
        _ => false,
    }
}

fn shuffled_humans(state: &GameState, rng: &mut (impl Rng + ?Sized)) -> Vec<PlayerId> {
    let mut order: Vec<PlayerId> = state
        .players
        .iter()
        .filter(|p| !p.is_neutral)
        .map(|p| p.id)
        .collect();
    order.shuffle(rng);
    order
}

/// Draws a random seating order; its head places first and plays first.
pub fn determine_order(state: &mut GameState, rng: &mut (impl Rng + ?Sized)) {
    let order = shuffled_humans(state, rng);
    let mut unclaimed: Vec<TerritoryId> = state.territories.iter().map(|t| t.id).collect();
    unclaimed.shuffle(rng);
    info!(
        order = ?order.iter().map(|&p| state.pname(p)).collect::<Vec<_>>(),
        "setup order determined"
    );
    state.setup.first_player = order.first().copied();
    state.setup.order = order;
    state.setup.cursor = 0;
    state.setup.unclaimed = unclaimed;
    state.phase = Phase::SetupClaimTerritories;
}

/// Deals every territory round-robin to the two humans and Neutral, one army each.
pub fn deal_two_player(state: &mut GameState, rng: &mut (impl Rng + ?Sized)) {
    let order = shuffled_humans(state, rng);
    let mut holders = order.clone();
    holders.extend(state.neutral_player());
    let mut ids: Vec<TerritoryId> = state.territories.iter().map(|t| t.id).collect();
    ids.shuffle(rng);
    for (i, id) in ids.into_iter().enumerate() {
        let holder = holders[i % holders.len()];
        let t = state.territory_mut(id);
        t.owner = Some(holder);
        t.armies = 1;
        state.player_mut(holder).armies_placed_in_setup += 1;
    }
    state.setup.first_player = order.first().copied();
    state.setup.order = order;
    state.setup.cursor = 0;
    state.phase = Phase::Setup2pPlaceRemaining;
}

fn ensure_setup_actor(
    state: &GameState,
    phase: Phase,
    player: PlayerId,
) -> Result<(), RuleViolation> {
    if state.phase != phase {
        return Err(RuleViolation::WrongPhase(state.phase));
    }
    if super::phase::acting_player(state) != Some(player) {
        return Err(RuleViolation::NotYourTurn(state.pname(player).to_string()));
    }
    Ok(())
}

/// Moves the setup cursor to the next player in order with armies left.
/// Returns false when nobody has any left.
fn advance_cursor(state: &mut GameState) -> bool {
    let n = state.setup.order.len();
    for step in 1..=n {
        let idx = (state.setup.cursor + step) % n;
        let p = state.setup.order[idx];
        if state.player(p).setup_armies_remaining() > 0 {
            state.setup.cursor = idx;
            return true;
        }
    }
    false
}

/// Claims an unclaimed territory with one army.
pub fn claim_territory(
    state: &mut GameState,
    player: PlayerId,
    territory: &str,
    rng: &mut (impl Rng + ?Sized),
) -> Result<(), RuleViolation> {
    ensure_setup_actor(state, Phase::SetupClaimTerritories, player)?;
    let id = state
        .territory_id(territory)
        .ok_or_else(|| RuleViolation::UnknownTerritory(territory.to_string()))?;
    if state.territory(id).owner.is_some() {
        return Err(RuleViolation::AlreadyClaimed(territory.to_string()));
    }
    if state.player(player).setup_armies_remaining() == 0 {
        return Err(RuleViolation::SetupArmiesExhausted);
    }
    let t = state.territory_mut(id);
    t.owner = Some(player);
    t.armies = 1;
    state.player_mut(player).armies_placed_in_setup += 1;
    state.setup.unclaimed.retain(|&u| u != id);
    debug!(player = %state.pname(player), territory, "claimed");

    if state.setup.unclaimed.is_empty() {
        state.phase = Phase::SetupPlaceArmies;
    }
    if !advance_cursor(state) {
        finish_setup(state, rng)?;
    }
    Ok(())
}

/// Places one army from the initial pool onto an owned territory.
pub fn place_setup_army(
    state: &mut GameState,
    player: PlayerId,
    territory: &str,
    rng: &mut (impl Rng + ?Sized),
) -> Result<(), RuleViolation> {
    ensure_setup_actor(state, Phase::SetupPlaceArmies, player)?;
    let id = super::reinforce::owned_territory(state, player, territory)?;
    if state.player(player).setup_armies_remaining() == 0 {
        return Err(RuleViolation::SetupArmiesExhausted);
    }
    state.territory_mut(id).armies += 1;
    state.player_mut(player).armies_placed_in_setup += 1;
    if !advance_cursor(state) {
        finish_setup(state, rng)?;
    }
    Ok(())
}

/// Own armies the player must place this two-player setup turn.
pub fn two_player_quota(state: &GameState, player: PlayerId) -> u32 {
    state
        .player(player)
        .setup_armies_remaining()
        .min(TWO_PLAYER_OWN_PER_TURN)
}

/// Neutral armies still to be placed during two-player setup.
pub fn neutral_remaining(state: &GameState) -> u32 {
    state
        .neutral_player()
        .map(|n| state.player(n).setup_armies_remaining())
        .unwrap_or(0)
}

/// One composite two-player setup turn: own placements plus one Neutral army.
pub fn place_two_player_turn(
    state: &mut GameState,
    player: PlayerId,
    own: &[(String, u32)],
    neutral: Option<&(String, u32)>,
    rng: &mut (impl Rng + ?Sized),
) -> Result<(), RuleViolation> {
    ensure_setup_actor(state, Phase::Setup2pPlaceRemaining, player)?;
    let quota = two_player_quota(state, player);
    let mut placements = Vec::with_capacity(own.len());
    let mut total = 0;
    for (name, count) in own {
        let id = super::reinforce::owned_territory(state, player, name)?;
        if *count == 0 {
            return Err(RuleViolation::InvalidPlacement(format!(
                "zero armies on {name}"
            )));
        }
        total += count;
        placements.push((id, *count));
    }
    if total != quota {
        return Err(RuleViolation::InvalidPlacement(format!(
            "must place exactly {quota} own armies, got {total}"
        )));
    }

    let neutral_id = state.neutral_player();
    let neutral_placement = match (neutral_id, neutral_remaining(state), neutral) {
        (Some(n), remaining, Some((name, count))) if remaining > 0 => {
            if *count != TWO_PLAYER_NEUTRAL_PER_TURN {
                return Err(RuleViolation::InvalidPlacement(format!(
                    "must place exactly {TWO_PLAYER_NEUTRAL_PER_TURN} Neutral army"
                )));
            }
            let id = state
                .territory_id(name)
                .ok_or_else(|| RuleViolation::UnknownTerritory(name.clone()))?;
            if state.territory(id).owner != Some(n) {
                return Err(RuleViolation::NotOwner {
                    player: NEUTRAL_NAME.to_string(),
                    territory: name.clone(),
                });
            }
            Some((n, id))
        }
        (Some(_), remaining, None) if remaining > 0 => {
            return Err(RuleViolation::InvalidPlacement(
                "a Neutral army must be placed".into(),
            ))
        }
        (_, _, Some(_)) => {
            return Err(RuleViolation::InvalidPlacement(
                "no Neutral armies left to place".into(),
            ))
        }
        _ => None,
    };

    for (id, count) in placements {
        state.territory_mut(id).armies += count;
    }
    state.player_mut(player).armies_placed_in_setup += quota;
    if let Some((n, id)) = neutral_placement {
        state.territory_mut(id).armies += TWO_PLAYER_NEUTRAL_PER_TURN;
        state.player_mut(n).armies_placed_in_setup += TWO_PLAYER_NEUTRAL_PER_TURN;
    }

    if !advance_cursor(state) {
        finish_setup(state, rng)?;
    }
    Ok(())
}

/// Closes setup: two-player decks get their wildcards, then the first player's turn begins.
///
/// Fails without touching the state if setup never settled on a first player.
pub fn finish_setup(state: &mut GameState, rng: &mut (impl Rng + ?Sized)) -> Result<(), RuleViolation> {
    let first = state
        .setup
        .first_player
        .or_else(|| state.setup.order.first().copied())
        .ok_or_else(|| RuleViolation::StateCorruption("setup finished without a first player".into()))?;
    if state.variant == Variant::TwoPlayer {
        state.deck.add_wildcards(WILDCARDS);
        state.deck.shuffle(rng);
    }
    state.setup.cursor = 0;
    info!(first = %state.pname(first), "setup complete");
    start_turn(state, first);
    Ok(())
}
