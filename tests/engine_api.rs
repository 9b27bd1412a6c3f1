// Testes da API do motor: passes, jogada única, cancelamento, tempo, sugestões e ponder
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::SeedableRng;

use virada::engine::{Engine, EngineConfig, MemoryBook, NoBook, SearchBudget};
use virada::intrinsics::{bits, popcount};
use virada::search::{calc_time_limit, get_level, Evaluator, PositionalEvaluator, SearchFlag};
use virada::*;

fn test_config() -> EngineConfig {
    EngineConfig {
        tt_size_mb: 4,
        ..EngineConfig::single_thread()
    }
}

fn engine() -> Engine {
    Engine::new(test_config(), Arc::new(PositionalEvaluator), Arc::new(NoBook)).unwrap()
}

fn exact(depth: i32) -> SearchBudget {
    SearchBudget::Depth {
        depth,
        selectivity: Selectivity::Exact,
    }
}

#[test]
fn test_full_board_is_terminal() {
    // 40 pretas, 24 brancas
    let s: String = "X".repeat(40) + &"O".repeat(24) + " X";
    let board: Board = s.parse().unwrap();
    let res = engine().search(&board, SearchBudget::Level(10), false, false);
    assert_eq!(res.best_move, MOVE_PASS);
    assert_eq!(res.value, 16);
    assert_eq!(res.depth, 0);
    assert!(res.is_end_search);
}

#[test]
fn test_no_moves_for_both_sides() {
    // Pretas em a1 e b1, branca em h8: ninguém joga, vazias vão para quem ganha
    let board = Board::new(0b11, 1 << 63);
    assert!(board.is_game_over());
    let res = engine().search(&board, SearchBudget::Time(Duration::from_millis(100)), false, false);
    assert_eq!(res.best_move, MOVE_PASS);
    assert_eq!(res.value, 62);
    assert!(res.is_end_search);
    assert_eq!(res.depth, 0);
}

#[test]
fn test_single_legal_move() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(3);
    let mut checked = 0;
    for _ in 0..300 {
        let mut board = Board::initial();
        while !board.is_game_over() {
            let legal = board.legal_moves();
            if legal == 0 {
                board.pass();
                continue;
            }
            if popcount(legal) == 1 {
                let cell = legal.trailing_zeros() as u8;
                for budget in [SearchBudget::Level(15), SearchBudget::Time(Duration::from_millis(50))] {
                    let res = engine.search(&board, budget, false, false);
                    assert_eq!(res.best_move, cell);
                    assert_eq!(res.depth, 1);
                    let child = board.move_copy(&board.calc_flip(cell));
                    if child.is_game_over() {
                        assert!(res.is_end_search);
                        assert_eq!(res.value, -child.end_score());
                    } else {
                        let eval = PositionalEvaluator.evaluate(&child).clamp(-SCORE_MAX, SCORE_MAX);
                        assert_eq!(res.value, -eval);
                    }
                }
                checked += 1;
            }
            let pos = bits(legal).choose(&mut rng).unwrap();
            board.apply(&board.calc_flip(pos));
        }
        if checked >= 5 {
            break;
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_precancelled_search_is_undefined() {
    let engine = engine();
    let flag = SearchFlag::new();
    flag.cancel();
    let res = engine.search_interruptible(&Board::initial(), SearchBudget::Level(20), false, false, &flag);
    assert!(!res.is_valid());
    assert_eq!(res.value, SCORE_UNDEFINED);
}

#[test]
fn test_cancellation_returns_last_completed_pass() {
    let engine = engine();
    let flag = SearchFlag::new();
    let canceller = {
        let flag = flag.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            flag.cancel();
        })
    };

    let start = Instant::now();
    let res = engine.search_interruptible(&Board::initial(), SearchBudget::Level(40), false, false, &flag);
    canceller.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(res.is_valid());
    assert!(res.depth < 40);
    assert!(Board::initial().is_legal(res.best_move));
}

#[test]
fn test_time_limited_search() {
    let engine = engine();
    let board = Board::initial();
    let limit = Duration::from_millis(300);
    let start = Instant::now();
    let res = engine.search(&board, SearchBudget::Time(limit), false, false);
    assert!(res.is_valid());
    assert!(board.is_legal(res.best_move));
    assert!(start.elapsed() < limit + Duration::from_secs(3));
}

#[test]
fn test_timed_result_reports_equivalent_level() {
    let engine = engine();
    let board = Board::initial();
    let res = engine.search(&board, SearchBudget::Time(Duration::from_millis(200)), false, false);
    assert!(res.is_valid());
    let level = res.level.unwrap();
    // O nível reportado busca pelo menos tão fundo como o passe atingido
    let (_, depth, selectivity) = get_level(level, board.n_discs());
    assert!(depth > res.depth || (depth == res.depth && selectivity >= res.selectivity));
    assert!(format!("{}", res).contains(&format!("level {}", level)));

    let res = engine.search(&board, SearchBudget::Level(4), false, false);
    assert_eq!(res.level, Some(4));
    let res = engine.search(&board, exact(4), false, false);
    assert_eq!(res.level, None);
}

#[test]
fn test_more_time_searches_deeper() {
    let board = Board::initial();
    let short = engine().search(&board, SearchBudget::Time(Duration::from_millis(20)), false, false);
    let long = engine().search(&board, SearchBudget::Time(Duration::from_millis(1500)), false, false);
    assert!(short.is_valid() && long.is_valid());
    assert!(long.depth >= short.depth, "curta {} longa {}", short, long);
}

#[test]
fn test_time_budget_is_monotonic() {
    let engine = engine();
    let board = Board::initial();
    let mut last = Duration::ZERO;
    for secs in [1, 10, 30, 60, 120, 600] {
        let budget = engine.time_budget(&board, Duration::from_secs(secs));
        assert_eq!(budget, calc_time_limit(&board, Duration::from_secs(secs), &engine.config().time));
        assert!(budget >= last);
        last = budget;
    }
}

#[test]
fn test_clock_budget() {
    let engine = engine();
    let board = Board::initial();
    let res = engine.search(&board, SearchBudget::Clock(Duration::from_secs(5)), false, false);
    assert!(res.is_valid());
    assert!(board.is_legal(res.best_move));
}

#[test]
fn test_legal_subset() {
    let engine = engine();
    let board = Board::initial();
    let c4 = coord_to_cell("c4").unwrap();
    let res = engine.search_with_legal_subset(&board, 1u64 << c4, SearchBudget::Level(4), false, false);
    assert_eq!(res.best_move, c4);
}

#[test]
fn test_hint_ranks_distinct_moves() {
    let engine = engine();
    let board = Board::initial();
    let hints = engine.hint(&board, SearchBudget::Level(3), 3);
    assert_eq!(hints.len(), 3);
    for w in hints.windows(2) {
        assert_ne!(w[0].best_move, w[1].best_move);
        assert!(w[0].value >= w[1].value);
    }
    assert!(hints.iter().all(|h| board.is_legal(h.best_move)));
}

#[test]
fn test_accept_loss_move() {
    let engine = engine();
    let board = Board::initial();
    let res = engine.accept_loss_move(&board, 2, 0);
    assert!(board.is_legal(res.best_move));
    // Perda zero: só jogadas com o melhor valor
    let best = bits(board.legal_moves())
        .map(|cell| {
            let child = board.move_copy(&board.calc_flip(cell));
            -engine.search(&child, SearchBudget::Level(2), true, false).value
        })
        .max()
        .unwrap();
    assert_eq!(res.value, best);
}

#[test]
fn test_ponder_ranks_all_moves() {
    let config = EngineConfig {
        ponder_max_depth: 6,
        ..test_config()
    };
    let engine = Engine::new(config, Arc::new(PositionalEvaluator), Arc::new(NoBook)).unwrap();
    let board = Board::initial();
    let flag = SearchFlag::new();
    let moves = engine.ponder(&board, &flag);

    assert_eq!(moves.len(), 4);
    assert!(moves.windows(2).all(|w| w[0].value >= w[1].value));
    for m in &moves {
        assert!(board.is_legal(m.cell));
        assert!(m.depth >= 1 && m.depth <= 6);
        assert_eq!(m.confidence, 100);
    }
}

#[test]
fn test_ponder_stops_on_cancel() {
    let engine = engine();
    let flag = SearchFlag::new();
    let canceller = {
        let flag = flag.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            flag.cancel();
        })
    };
    let start = Instant::now();
    let moves = engine.ponder(&Board::initial(), &flag);
    canceller.join().unwrap();
    assert!(start.elapsed() < Duration::from_secs(15));
    assert_eq!(moves.len(), 4);
}

#[test]
fn test_clear_cache() {
    let engine = engine();
    let board = Board::initial();
    engine.search(&board, SearchBudget::Level(4), false, false);
    assert!(engine.tt().get_best_move(board.hash()).is_some());
    engine.clear_cache();
    assert!(engine.tt().get_best_move(board.hash()).is_none());
}

#[test]
fn test_book_value_after_pass_is_negated() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..2000 {
        let mut board = Board::initial();
        while !board.is_game_over() && board.legal_moves() != 0 {
            let pos = bits(board.legal_moves()).choose(&mut rng).unwrap();
            board.apply(&board.calc_flip(pos));
        }
        if board.is_game_over() {
            continue;
        }

        let mut passed = board;
        passed.pass();
        let cell = bits(passed.legal_moves()).next().unwrap();
        let mut book = MemoryBook::new();
        book.insert(passed, cell, 6);
        let engine = Engine::new(test_config(), Arc::new(PositionalEvaluator), Arc::new(book)).unwrap();

        let res = engine.search(&board, SearchBudget::Level(5), true, false);
        assert!(res.is_book);
        assert_eq!(res.best_move, MOVE_PASS);
        assert_eq!(res.value, -6);
        return;
    }
    panic!("nenhuma posição com passe encontrada");
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = EngineConfig {
        threads: 0,
        ..EngineConfig::default()
    };
    assert!(Engine::new(config, Arc::new(PositionalEvaluator), Arc::new(NoBook)).is_err());
}
