//! Rules conformance scenarios.
//!
//! Each test builds a small position by hand, applies one rule and checks the
//! result against the documented behaviour.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use conquest::board::{
    BoardConfig, Card, CardSymbol, GameEvent, GameState, Phase, Player, PlayerId, Seat, Variant,
};
use conquest::engine::Engine;
use conquest::movegen::valid_actions;
use conquest::protocol::ActionTemplate;
use conquest::rules::combat::apply_battle;
use conquest::rules::{
    self, calculate_reinforcements, is_valid_set, resolve_dice, trade_bonus, FortifyRule,
    GameOutcome, RuleViolation, RulesConfig,
};

/// A-B-C-D-E in a line. A, B, C form "West" (bonus 2), D and E "East" (bonus 3).
const LINE: &str = r#"{
    "continents": [{"name": "West", "bonus_armies": 2}, {"name": "East", "bonus_armies": 3}],
    "territories": {
        "A": {"continent": "West", "adjacent_to": ["B"]},
        "B": {"continent": "West", "adjacent_to": ["A", "C"]},
        "C": {"continent": "West", "adjacent_to": ["B", "D"]},
        "D": {"continent": "East", "adjacent_to": ["C", "E"]},
        "E": {"continent": "East", "adjacent_to": ["D"]}
    }
}"#;

fn position(phase: Phase, layout: &[(&str, usize, u32)]) -> GameState {
    let board = BoardConfig::from_json(LINE).unwrap().build().unwrap();
    let mut state = GameState::new(board, Variant::Standard);
    state
        .players
        .push(Player::new(PlayerId(0), &Seat::new("Ann", "Red"), false));
    state
        .players
        .push(Player::new(PlayerId(1), &Seat::new("Bob", "Blue"), false));
    for &(name, owner, armies) in layout {
        let id = state.territory_id(name).unwrap();
        let t = state.territory_mut(id);
        t.owner = Some(PlayerId(owner));
        t.armies = armies;
    }
    state.phase = phase;
    state.current_player = PlayerId(0);
    state.setup.first_player = Some(PlayerId(0));
    state
}

fn id(state: &GameState, name: &str) -> conquest::board::TerritoryId {
    state.territory_id(name).unwrap()
}

#[test]
fn scenario_1_defender_loses_two() {
    assert_eq!(resolve_dice(&[6, 5, 4], &[3, 2]), (0, 2));
}

#[test]
fn scenario_2_wildcard_sets() {
    let inf = Card::territory("A", CardSymbol::Infantry);
    let inf2 = Card::territory("B", CardSymbol::Infantry);
    let cav = Card::territory("C", CardSymbol::Cavalry);
    let wild = Card::wildcard();
    assert!(is_valid_set([&inf, &inf2, &wild]));
    assert!(is_valid_set([&inf, &cav, &wild]));
    let art = Card::territory("D", CardSymbol::Artillery);
    assert!(is_valid_set([&inf, &cav, &art]));
    assert!(!is_valid_set([&inf, &inf2, &cav]));
}

#[test]
fn scenario_3_single_army_cannot_attack() {
    let state = position(
        Phase::Attack,
        &[("A", 0, 1), ("B", 0, 3), ("C", 1, 2), ("D", 1, 1), ("E", 1, 1)],
    );
    let menu = valid_actions(&state, RulesConfig::default(), PlayerId(0));
    let sources: Vec<&str> = menu
        .iter()
        .filter_map(|t| match t {
            ActionTemplate::Attack { from, .. } => Some(from.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(sources, ["B"]);
}

#[test]
fn scenario_4_fortify_cannot_empty_source() {
    let mut state = position(
        Phase::Fortify,
        &[("A", 0, 3), ("B", 0, 1), ("C", 1, 2), ("D", 1, 1), ("E", 1, 1)],
    );
    let before = state.clone();
    let err = rules::fortify(&mut state, FortifyRule::Connected, PlayerId(0), "A", "B", 3).unwrap_err();
    assert_eq!(
        err,
        RuleViolation::ArmyCountOutOfRange {
            requested: 3,
            min: 1,
            max: 2
        }
    );
    assert_eq!(state.territories, before.territories);
    assert!(!state.player(PlayerId(0)).has_fortified_this_turn);
}

#[test]
fn scenario_5_two_player_deal() {
    let board = BoardConfig::classic().unwrap().build().unwrap();
    let seats = [Seat::new("Ann", "Red"), Seat::new("Bob", "Blue")];
    let mut engine =
        Engine::new_game(board, Variant::TwoPlayer, &seats, RulesConfig::default(), Some(11)).unwrap();
    engine.advance_automatic();
    let state = engine.state();
    assert_eq!(state.phase, Phase::Setup2pPlaceRemaining);
    for player in &state.players {
        assert_eq!(state.owned_count(player.id), 14, "{}", player.name);
    }
    assert!(state.territories.iter().all(|t| t.armies == 1));
}

#[test]
fn scenario_6_capture_bounds() {
    let mut state = position(
        Phase::Attack,
        &[("A", 0, 1), ("B", 0, 4), ("C", 1, 1), ("D", 1, 2), ("E", 1, 1)],
    );
    let (b, c) = (id(&state, "B"), id(&state, "C"));
    let report = apply_battle(&mut state, PlayerId(0), b, c, 3, vec![6, 5, 4], vec![2]).unwrap();
    assert!(report.conquered);
    assert_eq!(report.attacker_losses, 0);
    let ctx = state.conquest.unwrap();
    assert_eq!((ctx.min_movable, ctx.max_movable), (3, 3));

    // Only the fortify-in action is offered until it is resolved.
    let menu = valid_actions(&state, RulesConfig::default(), PlayerId(0));
    assert_eq!(
        menu,
        [ActionTemplate::PostAttackFortify {
            from_territory: "B".into(),
            to_territory: "C".into(),
            min_armies: 3,
            max_armies: 3,
        }]
    );
    rules::post_attack_fortify(&mut state, PlayerId(0), "B", "C", 3).unwrap();
    assert_eq!(state.territory(b).armies, 1);
    assert_eq!(state.territory(c).armies, 3);
    assert!(state.conquest.is_none());
}

#[test]
fn fortify_connected_follows_owned_chains() {
    let layout = [("A", 0, 4), ("B", 0, 1), ("C", 0, 1), ("D", 1, 1), ("E", 1, 1)];
    let mut state = position(Phase::Fortify, &layout);
    rules::fortify(&mut state, FortifyRule::Connected, PlayerId(0), "A", "C", 2).unwrap();
    assert_eq!(state.territory(id(&state, "C")).armies, 3);
    assert!(state
        .history
        .iter()
        .any(|h| matches!(h.event, GameEvent::Fortify { armies: 2, .. })));
}

#[test]
fn fortify_adjacent_rejects_distant_targets() {
    let layout = [("A", 0, 4), ("B", 0, 1), ("C", 0, 1), ("D", 1, 1), ("E", 1, 1)];
    let mut state = position(Phase::Fortify, &layout);
    let err = rules::fortify(&mut state, FortifyRule::Adjacent, PlayerId(0), "A", "C", 2).unwrap_err();
    assert_eq!(
        err,
        RuleViolation::NotAdjacent {
            from: "A".into(),
            to: "C".into()
        }
    );
    rules::fortify(&mut state, FortifyRule::Adjacent, PlayerId(0), "A", "B", 2).unwrap();

    let rules = RulesConfig {
        fortify_rule: FortifyRule::Adjacent,
    };
    let fresh = position(Phase::Fortify, &layout);
    let actions = valid_actions(&fresh, rules, PlayerId(0));
    let targets: Vec<(&str, &str)> = actions
        .iter()
        .filter_map(|t| match t {
            ActionTemplate::Fortify { from, to, .. } => Some((from.as_str(), to.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(targets, [("A", "B")]);
}

#[test]
fn fortify_connected_is_blocked_by_enemy_territory() {
    let layout = [("A", 0, 4), ("B", 1, 1), ("C", 0, 1), ("D", 1, 1), ("E", 1, 1)];
    let mut state = position(Phase::Fortify, &layout);
    let err = rules::fortify(&mut state, FortifyRule::Connected, PlayerId(0), "A", "C", 1).unwrap_err();
    assert!(matches!(err, RuleViolation::NotConnected { .. }));
}

#[test]
fn continent_bonus_needs_every_member() {
    let state = position(
        Phase::Reinforce,
        &[("A", 0, 1), ("B", 0, 1), ("C", 0, 1), ("D", 1, 1), ("E", 0, 1)],
    );
    // Four territories give the floor of 3, plus West.
    assert_eq!(calculate_reinforcements(&state, PlayerId(0)), 5);
    // One territory, no continent: the floor.
    assert_eq!(calculate_reinforcements(&state, PlayerId(1)), 3);
}

#[test]
fn trade_schedule() {
    let bonuses: Vec<u32> = (0..9).map(trade_bonus).collect();
    assert_eq!(bonuses, [4, 6, 8, 10, 12, 15, 20, 25, 30]);
}

#[test]
fn capturing_the_last_territory_ends_the_game() {
    let mut state = position(
        Phase::Attack,
        &[("A", 0, 2), ("B", 0, 2), ("C", 0, 2), ("D", 0, 5), ("E", 1, 1)],
    );
    state
        .player_mut(PlayerId(1))
        .hand
        .push(Card::territory("E", CardSymbol::Cavalry));
    let (d, e) = (id(&state, "D"), id(&state, "E"));
    let report = apply_battle(&mut state, PlayerId(0), d, e, 3, vec![6, 6, 6], vec![1]).unwrap();
    assert_eq!(report.eliminated, Some(PlayerId(1)));
    assert!(state.player(PlayerId(1)).eliminated);
    assert_eq!(state.player(PlayerId(0)).hand.len(), 1);
    assert_eq!(state.phase, Phase::GameOver);
    assert_eq!(rules::phase::game_outcome(&state), Some(GameOutcome::Winner(PlayerId(0))));

    let mut rng = SmallRng::seed_from_u64(42);
    let err = rules::attack(&mut state, PlayerId(0), "D", "E", 1, None, &mut rng).unwrap_err();
    assert_eq!(err, RuleViolation::GameOver);
}

#[test]
fn rejected_attack_leaves_state_unchanged() {
    let mut state = position(
        Phase::Attack,
        &[("A", 0, 1), ("B", 0, 3), ("C", 1, 2), ("D", 1, 1), ("E", 1, 1)],
    );
    let before = state.clone();
    let mut rng = SmallRng::seed_from_u64(42);
    for (from, to, n) in [("A", "B", 1), ("B", "C", 3), ("B", "D", 1), ("B", "Z", 1)] {
        assert!(rules::attack(&mut state, PlayerId(0), from, to, n, None, &mut rng).is_err());
    }
    assert_eq!(state.territories, before.territories);
    assert_eq!(state.history.len(), before.history.len());
}
