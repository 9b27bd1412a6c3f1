// Benchmarks: geração de jogadas, solver de final e busca de meio-jogo
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use virada::engine::{Engine, EngineConfig, NoBook, SearchBudget};
use virada::search::PositionalEvaluator;
use virada::*;

const MIDGAME: &str = "--XXXX----XOOX--OOXOXXXXOOOXOXXX-OXXOXXX--XOXX-----OOO------O--- O";
const ENDGAME: &str = "OOOOOOO-XXXXOO--XXXOXOOOXXOXOOOOXXXOOOO-XXOXOO--XX-XOO---XXXX--- X";

fn engine() -> Engine {
    let config = EngineConfig {
        tt_size_mb: 16,
        ..EngineConfig::single_thread()
    };
    Engine::new(config, Arc::new(PositionalEvaluator), Arc::new(NoBook)).unwrap()
}

fn bench_move_generation(c: &mut Criterion) {
    let board: Board = MIDGAME.parse().unwrap();
    c.bench_function("legal_moves", |b| b.iter(|| black_box(&board).legal_moves()));
    c.bench_function("generate_flips", |b| b.iter(|| generate_flips(black_box(&board))));
}

fn bench_search(c: &mut Criterion) {
    let engine = engine();
    let midgame: Board = MIDGAME.parse().unwrap();
    let endgame: Board = ENDGAME.parse().unwrap();

    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    group.bench_function("midgame_depth_8", |b| {
        b.iter(|| {
            engine.clear_cache();
            engine.search(
                black_box(&midgame),
                SearchBudget::Depth {
                    depth: 8,
                    selectivity: Selectivity::Exact,
                },
                false,
                false,
            )
        })
    });
    group.bench_function("endgame_exact", |b| {
        b.iter(|| {
            engine.clear_cache();
            engine.search(
                black_box(&endgame),
                SearchBudget::Depth {
                    depth: 60,
                    selectivity: Selectivity::Exact,
                },
                false,
                false,
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_move_generation, bench_search);
criterion_main!(benches);
