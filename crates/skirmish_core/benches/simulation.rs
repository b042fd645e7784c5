//! Simulation benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{ai_engine, run_frames};

/// Both sides driven by the AI, the player side through `apply_command`.
fn bot_match(seed: u64) -> (GameEngine, OpposingAi, SeededRandom) {
    let config = MatchConfig {
        seed,
        ..MatchConfig::default()
    };
    let engine = ai_engine(config);
    let player = OpposingAi::new(Faction::Player, engine.world().config.opponent_elo);
    (engine, player, SeededRandom::from_seed(seed.wrapping_add(1)))
}

fn tick_bot_match(engine: &mut GameEngine, player: &mut OpposingAi, random: &mut SeededRandom, frames: u64) {
    for _ in 0..frames {
        for command in player.think(engine.world(), random) {
            let _ = engine.apply_command(Faction::Player, command);
        }
        engine.update();
    }
}

/// Runs simulation benchmarks for the skirmish_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("bot_match_600_frames", |b| {
        b.iter_batched(
            || bot_match(42),
            |(mut engine, mut player, mut random)| {
                tick_bot_match(&mut engine, &mut player, &mut random, 600);
                black_box(engine.state_hash())
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("midgame_single_frame", |b| {
        let (mut engine, mut player, mut random) = bot_match(7);
        tick_bot_match(&mut engine, &mut player, &mut random, 3_000);
        let saved = engine.save_state().expect("midgame state saves");
        b.iter_batched(
            || {
                let mut restored = ai_engine(MatchConfig::default());
                restored.load_state(&saved).expect("midgame state loads");
                restored
            },
            |mut engine| {
                run_frames(&mut engine, 1);
                black_box(engine.frame())
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("snapshot_capture", |b| {
        let (mut engine, mut player, mut random) = bot_match(9);
        tick_bot_match(&mut engine, &mut player, &mut random, 3_000);
        b.iter(|| black_box(engine.snapshot()));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
