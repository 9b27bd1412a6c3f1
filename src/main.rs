// Virada - Demonstração do motor: níveis, busca com tempo, sugestões e final exato
use std::sync::Arc;
use std::time::Duration;

use virada::engine::{Engine, EngineConfig, NoBook, SearchBudget};
use virada::search::{PositionalEvaluator, SearchResult};
use virada::*;

fn main() {
    env_logger::init();

    let config = EngineConfig::default();
    println!("=== VIRADA ===");
    println!("Threads: {} | TT: {} MB\n", config.threads, config.tt_size_mb);

    let engine = match Engine::new(config, Arc::new(PositionalEvaluator), Arc::new(NoBook)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("❌ Erro ao criar o motor: {}", e);
            std::process::exit(1);
        }
    };

    let test_positions = [
        (
            "Posição inicial",
            "---------------------------OX------XO--------------------------- X",
        ),
        (
            "Meio-jogo",
            "--XXXX----XOOX--OOXOXXXXOOOXOXXX-OXXOXXX--XOXX-----OOO------O--- O",
        ),
        (
            "Final (13 vazias)",
            "OOOOOOO-XXXXOO--XXXOXOOOXXOXOOOOXXXOOOO-XXOXOO--XX-XOO---XXXX--- X",
        ),
    ];

    for (name, s) in test_positions.iter() {
        println!("📋 {}", name);
        match s.parse::<Board>() {
            Ok(board) => {
                println!("{}", board);
                let result = engine.search(&board, SearchBudget::Level(11), false, true);
                print_result("Nível 11", &result);

                let result = engine.search(&board, SearchBudget::Time(Duration::from_millis(500)), false, true);
                print_result("500 ms", &result);

                for (i, hint) in engine.hint(&board, SearchBudget::Level(5), 3).iter().enumerate() {
                    println!("   sugestão {}: {} ({})", i + 1, cell_to_coord(hint.best_move), hint.value);
                }
            }
            Err(e) => println!("❌ Erro ao ler a posição: {}", e),
        }
        println!();
    }

    println!("=== PARTIDA RÁPIDA (nível 3 contra nível 3) ===");
    let mut board = Board::initial();
    let mut n_moves = 0;
    while !board.is_game_over() {
        let result = engine.search(&board, SearchBudget::Level(3), false, false);
        if result.best_move == MOVE_PASS {
            board.pass();
            continue;
        }
        if let Err(e) = board.play_checked(result.best_move) {
            println!("❌ {}", e);
            break;
        }
        n_moves += 1;
    }
    println!("{}", board);
    println!("✅ {} lances, resultado {} para quem joga", n_moves, board.end_score());
}

fn print_result(label: &str, result: &SearchResult) {
    if result.is_valid() {
        println!("✅ {}: {}", label, result);
    } else {
        println!("⚠️  {}: busca sem resultado", label);
    }
}
