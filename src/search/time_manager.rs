// Ficheiro: src/search/time_manager.rs
// Descrição: Orçamento de tempo por jogada e critérios de paragem do modo com tempo

use std::time::Duration;

use crate::core::*;
use crate::engine::config::TimeConfig;

/// Tempo a gastar nesta jogada, dado o relógio restante.
///
/// Se o modelo de nós diz que a busca exata até ao fim cabe no relógio,
/// gasta uma fração grande dele; caso contrário divide o tempo pelas
/// jogadas que faltam, com uma reserva fixa por jogada.
pub fn calc_time_limit(board: &Board, remaining: Duration, config: &TimeConfig) -> Duration {
    let remaining_ms = remaining.as_millis() as u64;
    let n_empties = board.n_empties() as f64;

    let complete_depth = (remaining.as_secs_f64() * config.nps / config.node_model_a).ln() / config.node_model_b;
    if n_empties <= complete_depth {
        let ms = (remaining_ms as f64 * config.complete_search_fraction) as u64;
        return Duration::from_millis(ms.max(1));
    }

    let remaining_moves = (board.n_empties() as i64 + 1) / 2;
    let overhead = config.per_move_overhead_ms * remaining_moves as u64;
    if remaining_ms <= overhead {
        return Duration::from_millis(1);
    }

    let min_moves = config.min_moves_divisor;
    let mut moves = (remaining_moves - config.remaining_moves_offset).max(min_moves);
    // Perto do fim cada jogada conta mais
    let n_discs = board.n_discs();
    if (remaining_ms > 60_000 && n_discs >= 30)
        || (remaining_ms > 30_000 && n_discs >= 32)
        || (remaining_ms > 10_000 && n_discs >= 30)
    {
        moves = (moves - 1).max(min_moves);
    }

    Duration::from_millis(((remaining_ms - overhead) / moves as u64).max(1))
}

/// A pré-análise por self-play só compensa com relógio folgado e muitas casas vazias
pub fn should_run_preanalysis(board: &Board, remaining: Duration, config: &TimeConfig) -> bool {
    remaining >= Duration::from_millis(config.preanalysis_min_remaining_ms)
        && board.n_empties() >= config.preanalysis_min_empties
}

/// Resumo de um passe completo do modo com tempo
#[derive(Debug, Clone, Copy)]
pub struct PassSummary {
    pub depth: i32,
    pub is_end_search: bool,
    pub elapsed: Duration,
    pub nodes: u64,
    pub policy_changed: bool,
    pub value_changed: bool,
}

/// Paragem antecipada: busca de meio-jogo profunda, já cara, e estável
/// (mesma jogada e mesmo valor bruto que o passe anterior).
pub fn should_break_early(pass: &PassSummary, limit: Duration, config: &TimeConfig) -> bool {
    !pass.is_end_search
        && pass.depth >= config.early_break_min_depth
        && pass.elapsed.as_secs_f64() > limit.as_secs_f64() * config.early_break_time_fraction
        && pass.nodes >= config.early_break_min_nodes
        && !pass.policy_changed
        && !pass.value_changed
}

/// Deve correr a verificação do segundo melhor lance depois deste passe
pub fn should_verify_best_move(pass: &PassSummary, config: &TimeConfig) -> bool {
    !pass.is_end_search && pass.depth >= config.verify_min_depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with_empties(n_empties: u32) -> Board {
        // Preenche a partir de a1, alternando cores por linha
        let mut player = 0u64;
        let mut opponent = 0u64;
        for cell in 0..(64 - n_empties) {
            if (cell / 8) % 2 == 0 {
                player |= 1 << cell;
            } else {
                opponent |= 1 << cell;
            }
        }
        Board::new(player, opponent)
    }

    #[test]
    fn test_opening_budget() {
        let config = TimeConfig::default();
        let board = Board::initial();
        // 30 jogadas restantes, 25 no divisor, 6 s de reserva
        let limit = calc_time_limit(&board, Duration::from_secs(60), &config);
        assert_eq!(limit, Duration::from_millis(54_000 / 25));
    }

    #[test]
    fn test_complete_search_budget() {
        let config = TimeConfig::default();
        let board = board_with_empties(20);
        let limit = calc_time_limit(&board, Duration::from_secs(10), &config);
        assert_eq!(limit, Duration::from_millis(8_000));
    }

    #[test]
    fn test_exhausted_clock() {
        let config = TimeConfig::default();
        let board = Board::initial();
        let limit = calc_time_limit(&board, Duration::from_millis(100), &config);
        assert_eq!(limit, Duration::from_millis(1));
    }

    #[test]
    fn test_budget_is_monotonic() {
        let config = TimeConfig::default();
        for n_empties in [10, 24, 34, 46, 60] {
            let board = board_with_empties(n_empties);
            let mut last = Duration::ZERO;
            for secs in [0, 1, 5, 10, 20, 31, 45, 61, 120, 300, 900] {
                let limit = calc_time_limit(&board, Duration::from_secs(secs), &config);
                assert!(limit >= last, "empties {} secs {}", n_empties, secs);
                last = limit;
            }
        }
    }

    #[test]
    fn test_preanalysis_trigger() {
        let config = TimeConfig::default();
        let board = Board::initial();
        assert!(should_run_preanalysis(&board, Duration::from_secs(60), &config));
        assert!(!should_run_preanalysis(&board, Duration::from_secs(10), &config));
        assert!(!should_run_preanalysis(&board_with_empties(20), Duration::from_secs(60), &config));
    }

    #[test]
    fn test_early_break() {
        let config = TimeConfig::default();
        let limit = Duration::from_secs(10);
        let mut pass = PassSummary {
            depth: 24,
            is_end_search: false,
            elapsed: Duration::from_secs(4),
            nodes: 200_000_000,
            policy_changed: false,
            value_changed: false,
        };
        assert!(should_break_early(&pass, limit, &config));

        pass.value_changed = true;
        assert!(!should_break_early(&pass, limit, &config));
        pass.value_changed = false;
        pass.elapsed = Duration::from_secs(2);
        assert!(!should_break_early(&pass, limit, &config));
        pass.elapsed = Duration::from_secs(4);
        pass.is_end_search = true;
        assert!(!should_break_early(&pass, limit, &config));
    }
}
