// Solver exato de final de jogo (contagem de discos até ao fim)

use crate::core::*;
use crate::intrinsics::{first_bit, popcount};
use crate::search::context::{Search, StopSignal};
use crate::search::move_ordering::*;
use crate::search::{END_POLL_MIN_DEPTH, END_TT_MIN_DEPTH};

/// Uma casa vazia: resultado final direto
fn last_empty(search: &mut Search) -> i32 {
    let board = search.board;
    let pos = first_bit(board.empties()) as u8;
    let p = popcount(board.player) as i32;
    let o = popcount(board.opponent) as i32;

    search.nodes += 1;
    let f = popcount(calc_flip(board.player, board.opponent, pos)) as i32;
    if f > 0 {
        return (p + f + 1) - (o - f);
    }
    search.nodes += 1;
    let f = popcount(calc_flip(board.opponent, board.player, pos)) as i32;
    if f > 0 {
        return (p - f) - (o + f + 1);
    }
    board.end_score()
}

#[inline]
pub fn nega_alpha_end_nws(
    search: &mut Search,
    alpha: i32,
    skipped: bool,
    legal: Option<Bitboard>,
    stop: &StopSignal,
) -> i32 {
    nega_alpha_end(search, alpha, alpha + 1, skipped, legal, stop)
}

/// Busca exata fail-soft. Só verifica o cancelamento com casas vazias suficientes.
pub fn nega_alpha_end(
    search: &mut Search,
    mut alpha: i32,
    mut beta: i32,
    skipped: bool,
    legal: Option<Bitboard>,
    stop: &StopSignal,
) -> i32 {
    let n_empties = search.n_empties();
    let polls = n_empties >= END_POLL_MIN_DEPTH;
    if polls && !stop.is_searching() {
        return SCORE_UNDEFINED;
    }
    if n_empties == 0 {
        search.nodes += 1;
        return search.board.end_score();
    }
    if n_empties == 1 {
        return last_empty(search);
    }

    search.nodes += 1;
    let legal = legal.unwrap_or_else(|| search.board.legal_moves());
    if legal == 0 {
        if skipped {
            return search.board.end_score();
        }
        search.pass();
        let v = -nega_alpha_end(search, -beta, -alpha, true, None, stop);
        search.pass();
        return if polls && !stop.is_searching() { SCORE_UNDEFINED } else { v };
    }

    let use_tt = n_empties >= END_TT_MIN_DEPTH;
    let hash = if use_tt { search.board.hash() } else { 0 };
    let first_alpha = alpha;
    let mut tt_move = None;
    if use_tt {
        let (lower, upper) = search.tt().get_bounds(hash, n_empties, Selectivity::Exact);
        if upper == lower || upper <= alpha {
            return upper;
        }
        if beta <= lower {
            return lower;
        }
        alpha = alpha.max(lower);
        beta = beta.min(upper);
        tt_move = search.tt().get_best_move(hash);
    }

    let mut list = build_move_list(&search.board, legal);
    if has_wipeout(&search.board, &list) {
        return SCORE_MAX;
    }
    if list.len() > 1 {
        evaluate_move_list_end(search, &mut list, tt_move);
    }

    let mut v = -SCORE_INF;
    let mut best_move = MOVE_NONE;
    for idx in 0..list.len() {
        swap_next_best(&mut list, idx);
        let m = list[idx];
        search.apply(&m.flip);
        let n_legal = if list.len() > 1 { Some(m.n_legal) } else { None };
        let g = -nega_alpha_end(search, -beta, -alpha, false, n_legal, stop);
        search.undo(&m.flip);
        if polls && !stop.is_searching() {
            return SCORE_UNDEFINED;
        }
        if v < g {
            v = g;
            best_move = m.flip.pos;
            if beta <= v {
                break;
            }
            alpha = alpha.max(v);
        }
    }

    if use_tt {
        search.tt().register(hash, n_empties, Selectivity::Exact, first_alpha, beta, v, best_move);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::thread_pool::ThreadPool;
    use crate::engine::tt::TranspositionTable;
    use crate::intrinsics::bits;
    use crate::search::context::{SearchFlag, SearchOptions, SearchShared};
    use crate::search::evaluation::DiscEvaluator;
    use std::sync::Arc;

    fn solve_brute(board: &mut Board, skipped: bool) -> i32 {
        let legal = board.legal_moves();
        if legal == 0 {
            if skipped {
                return board.end_score();
            }
            board.pass();
            let v = -solve_brute(board, true);
            board.pass();
            return v;
        }
        let mut best = -SCORE_INF;
        for pos in bits(legal) {
            let flip = board.calc_flip(pos);
            board.apply(&flip);
            best = best.max(-solve_brute(board, false));
            board.undo(&flip);
        }
        best
    }

    fn search_for(board: Board) -> Search {
        let shared = Arc::new(SearchShared {
            tt: TranspositionTable::new(1),
            evaluator: Arc::new(DiscEvaluator),
            pool: ThreadPool::new(0).unwrap(),
            options: SearchOptions::default(),
        });
        Search::new(board, Selectivity::Exact, false, shared)
    }

    #[test]
    fn test_last_empty_matches_brute_force() {
        // h8 vazia; jogador captura ao longo da coluna h
        let mut player = 0u64;
        let mut opponent = 0u64;
        for cell in 0..63u8 {
            if cell == 55 || cell % 3 == 0 {
                opponent |= 1 << cell;
            } else {
                player |= 1 << cell;
            }
        }
        let mut board = Board::new(player, opponent);
        let mut search = search_for(board);
        assert_eq!(last_empty(&mut search), solve_brute(&mut board, false));

        let mut swapped = board;
        swapped.pass();
        let mut search = search_for(swapped);
        assert_eq!(last_empty(&mut search), solve_brute(&mut swapped, false));
    }

    #[test]
    fn test_small_endgame_matches_brute_force() {
        // Tabuleiro com 8 casas vazias na última fila
        let player: u64 = 0x0000_FFFF_0F0F_3355;
        let opponent: u64 = 0x00FF_0000_F0F0_CCAA;
        let mut board = Board::new(player, opponent & !player);
        let expected = solve_brute(&mut board, false);
        let mut search = search_for(board);
        let stop = crate::search::context::StopSignal::new(SearchFlag::new(), SearchFlag::new());
        let v = nega_alpha_end(&mut search, -SCORE_MAX, SCORE_MAX, false, None, &stop);
        assert_eq!(v, expected);

        // Janela nula concorda com o valor exato
        let mut search = search_for(board);
        let v = nega_alpha_end_nws(&mut search, expected - 1, false, None, &stop);
        assert!(v >= expected);
        let mut search = search_for(board);
        let v = nega_alpha_end_nws(&mut search, expected, false, None, &stop);
        assert!(v <= expected);
    }

    #[test]
    fn test_cancelled_search_returns_sentinel() {
        let board: Board = "XXXXXXXXXOOOOOOOXXXXXXXXOOOOOOOOXXXXXXXX--------------------O--- X"
            .parse()
            .unwrap();
        let mut search = search_for(board);
        let local = SearchFlag::new();
        let stop = crate::search::context::StopSignal::new(SearchFlag::new(), local.clone());
        local.cancel();
        let v = nega_alpha_end(&mut search, -SCORE_MAX, SCORE_MAX, false, None, &stop);
        assert_eq!(v, SCORE_UNDEFINED);
    }
}
