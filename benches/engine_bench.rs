use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use conquest::board::{BoardConfig, Phase, Seat, Variant};
use conquest::engine::Engine;
use conquest::protocol::{match_action, parse_reply, ActionTemplate, StateSnapshot};
use conquest::rules::{resolve_dice, RulesConfig};

fn seats() -> Vec<Seat> {
    vec![
        Seat::new("Ann", "Red"),
        Seat::new("Bob", "Blue"),
        Seat::new("Cid", "Green"),
        Seat::new("Dee", "Yellow"),
    ]
}

fn new_engine(seed: u64) -> Engine {
    let board = BoardConfig::classic().unwrap().build().unwrap();
    Engine::new_game(board, Variant::Standard, &seats(), RulesConfig::default(), Some(seed)).unwrap()
}

/// Plays random rule actions until `stop` holds or `limit` actions were taken.
fn play_random(engine: &mut Engine, rng: &mut SmallRng, limit: usize, stop: impl Fn(&Engine) -> bool) {
    for _ in 0..limit {
        engine.advance_automatic();
        if stop(engine) || engine.phase() == Phase::GameOver {
            return;
        }
        let Some(player) = engine.acting_player() else { return };
        let menu: Vec<ActionTemplate> = engine
            .valid_actions(player)
            .into_iter()
            .filter(|t| {
                !matches!(
                    t,
                    ActionTemplate::ProposeAlliance { .. }
                        | ActionTemplate::AcceptAlliance { .. }
                        | ActionTemplate::RejectAlliance { .. }
                        | ActionTemplate::BreakAlliance { .. }
                )
            })
            .collect();
        if menu.is_empty() {
            return;
        }
        let template = &menu[rng.gen_range(0..menu.len())];
        let action = template.instantiate(|min, max| rng.gen_range(min..=max));
        if engine.apply(player, &action).is_err() {
            return;
        }
    }
}

/// An engine in the first ATTACK phase after setup.
fn attack_position() -> Engine {
    let mut engine = new_engine(7);
    let mut rng = SmallRng::seed_from_u64(7);
    play_random(&mut engine, &mut rng, 10_000, |e| e.phase() == Phase::Attack);
    engine
}

fn bench_resolve_dice(c: &mut Criterion) {
    c.bench_function("resolve_dice_3v2", |b| {
        b.iter(|| resolve_dice(black_box(&[6, 3, 2]), black_box(&[5, 3])))
    });
}

fn bench_valid_actions_attack(c: &mut Criterion) {
    let engine = attack_position();
    let player = engine.acting_player().unwrap();
    c.bench_function("valid_actions_attack_phase", |b| {
        b.iter(|| engine.valid_actions(black_box(player)))
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let engine = attack_position();
    let player = engine.acting_player();
    c.bench_function("snapshot_build_to_json", |b| {
        b.iter(|| StateSnapshot::build(black_box(engine.state()), player, 50, &[]).to_value())
    });
}

fn bench_parse_and_match(c: &mut Criterion) {
    let engine = attack_position();
    let player = engine.acting_player().unwrap();
    let menu = engine.valid_actions(player);
    let reply = r#"Sure. ```json
{"thought": "hold the line", "action": {"type": "END_ATTACK_PHASE"}}
```"#;
    c.bench_function("parse_and_match_reply", |b| {
        b.iter(|| {
            let parsed = parse_reply(black_box(reply)).unwrap();
            match_action(&parsed.action, &menu, false)
        })
    });
}

fn bench_random_game(c: &mut Criterion) {
    let mut group = c.benchmark_group("game");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("random_4p_2000_actions", |b| {
        b.iter(|| {
            let mut engine = new_engine(3);
            let mut rng = SmallRng::seed_from_u64(3);
            play_random(&mut engine, &mut rng, 2_000, |_| false);
            engine.state().turn
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_dice,
    bench_valid_actions_attack,
    bench_snapshot,
    bench_parse_and_match,
    bench_random_game,
);
criterion_main!(benches);
