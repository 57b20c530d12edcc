//! Property tests for dice, reinforcement math and random play.

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use conquest::board::{BoardConfig, Phase, Seat, Variant};
use conquest::engine::Engine;
use conquest::protocol::ActionTemplate;
use conquest::rules::{resolve_dice, trade_bonus, RulesConfig};

fn seats(n: usize) -> Vec<Seat> {
    ["Ann", "Bob", "Cid", "Dee", "Eve", "Fay"]
        .iter()
        .zip(["Red", "Blue", "Green", "Yellow", "Black", "Pink"])
        .take(n)
        .map(|(name, color)| Seat::new(*name, color))
        .collect()
}

fn rule_action(template: &ActionTemplate) -> bool {
    !matches!(
        template,
        ActionTemplate::ProposeAlliance { .. }
            | ActionTemplate::AcceptAlliance { .. }
            | ActionTemplate::RejectAlliance { .. }
            | ActionTemplate::BreakAlliance { .. }
            | ActionTemplate::ChooseDefenseDice { .. }
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn dice_losses_match_compared_pairs(
        attacker in prop::collection::vec(1u8..=6, 1..=3),
        defender in prop::collection::vec(1u8..=6, 1..=2),
    ) {
        let (a, d) = resolve_dice(&attacker, &defender);
        prop_assert_eq!((a + d) as usize, attacker.len().min(defender.len()));
    }

    #[test]
    fn defender_wins_ties(value in 1u8..=6) {
        prop_assert_eq!(resolve_dice(&[value], &[value]), (1, 0));
    }

    #[test]
    fn trade_bonus_keeps_growing(n in 0u32..200) {
        prop_assert!(trade_bonus(n + 1) > trade_bonus(n));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Every offered rule action is accepted, and the board stays consistent.
    #[test]
    fn random_play_only_takes_legal_actions(seed in any::<u64>(), players in 3usize..=5) {
        let board = BoardConfig::classic().unwrap().build().unwrap();
        let mut engine = Engine::new_game(
            board, Variant::Standard, &seats(players), RulesConfig::default(), Some(seed),
        ).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);

        for _ in 0..600 {
            engine.advance_automatic();
            if engine.phase() == Phase::GameOver {
                break;
            }
            let Some(player) = engine.acting_player() else { break };

            let menu = engine.valid_actions(player);
            prop_assert_eq!(&menu, &engine.valid_actions(player));
            let choices: Vec<&ActionTemplate> = menu.iter().filter(|t| rule_action(t)).collect();
            prop_assert!(!choices.is_empty(), "no rule action in {:?}", engine.phase());

            let template = choices[rng.gen_range(0..choices.len())];
            let action = template.instantiate(|min, max| rng.gen_range(min..=max));
            let applied = engine.apply(player, &action);
            prop_assert!(applied.is_ok(), "{:?} refused: {:?}", action, applied.err());

            let state = engine.state();
            if matches!(state.phase, Phase::Reinforce | Phase::Attack | Phase::Fortify) {
                for t in &state.territories {
                    prop_assert!(t.owner.is_some());
                    let pending = state.conquest.map(|c| c.to) == Some(t.id);
                    prop_assert!(pending || t.armies >= 1, "{} is empty", t.name);
                }
            }
        }
    }

    #[test]
    fn reinforcements_never_drop_below_three(seed in any::<u64>(), players in 3usize..=6) {
        let board = BoardConfig::classic().unwrap().build().unwrap();
        let mut engine = Engine::new_game(
            board, Variant::Standard, &seats(players), RulesConfig::default(), Some(seed),
        ).unwrap();
        engine.advance_automatic();
        let state = engine.state();
        for p in &state.players {
            prop_assert!(conquest::rules::calculate_reinforcements(state, p.id) >= 3);
        }
    }
}
