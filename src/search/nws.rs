// Busca de janela nula (NWS) de meio-jogo e folhas de profundidade 1

use crate::core::*;
use crate::intrinsics::bits;
use crate::search::context::{Search, StopSignal};
use crate::search::endgame::nega_alpha_end_nws;
use crate::search::etc::etc_nws;
use crate::search::move_ordering::*;
use crate::search::probcut::mpc;
use crate::search::ybwc::ybwc_search_young_brothers;
use crate::search::{MID_ETC_DEPTH, MID_SIMPLE_DEPTH, MID_TO_END_DEPTH, YBWC_END_SPLIT_MIN_DEPTH, YBWC_MID_SPLIT_MIN_DEPTH};

/// Profundidade 1: avalia cada filho diretamente, sem moldura recursiva
pub fn nega_alpha_eval1(search: &mut Search, mut alpha: i32, beta: i32, skipped: bool) -> i32 {
    search.nodes += 1;
    let legal = search.board.legal_moves();
    if legal == 0 {
        if skipped {
            return search.board.end_score();
        }
        search.pass();
        let v = -nega_alpha_eval1(search, -beta, -alpha, true);
        search.pass();
        return v;
    }

    let mut v = -SCORE_INF;
    for pos in bits(legal) {
        let flip = search.board.calc_flip(pos);
        search.apply(&flip);
        search.nodes += 1;
        let g = -search.evaluate();
        search.undo(&flip);
        if v < g {
            v = g;
            if alpha < v {
                if beta <= v {
                    break;
                }
                alpha = v;
            }
        }
    }
    v
}

#[inline]
pub fn nega_alpha_eval1_nws(search: &mut Search, alpha: i32, skipped: bool) -> i32 {
    nega_alpha_eval1(search, alpha, alpha + 1, skipped)
}

/// NWS de meio-jogo para profundidades pequenas: sem ETC nem divisão entre threads
fn nega_alpha_ordering_nws_simple(
    search: &mut Search,
    alpha: i32,
    depth: i32,
    skipped: bool,
    legal: Option<Bitboard>,
    stop: &StopSignal,
) -> i32 {
    if !stop.is_searching() {
        return SCORE_UNDEFINED;
    }
    if depth == 0 {
        search.nodes += 1;
        return search.evaluate();
    }
    if depth == 1 {
        return nega_alpha_eval1_nws(search, alpha, skipped);
    }

    search.nodes += 1;
    let legal = legal.unwrap_or_else(|| search.board.legal_moves());
    if legal == 0 {
        if skipped {
            return search.board.end_score();
        }
        search.pass();
        let v = -nega_alpha_ordering_nws_simple(search, -alpha - 1, depth, true, None, stop);
        search.pass();
        return if stop.is_searching() { v } else { SCORE_UNDEFINED };
    }

    let hash = search.board.hash();
    let (lower, upper) = search.tt().get_bounds(hash, depth, search.selectivity);
    if upper <= alpha {
        return upper;
    }
    if alpha < lower {
        return lower;
    }

    if let Some(v) = mpc(search, alpha, alpha + 1, depth, Some(legal), false, stop) {
        return v;
    }

    let mut list = build_move_list(&search.board, legal);
    if has_wipeout(&search.board, &list) {
        return SCORE_MAX;
    }
    let tt_move = search.tt().get_best_move(hash);
    evaluate_move_list(search, &mut list, depth, tt_move);

    let mut v = -SCORE_INF;
    let mut best_move = MOVE_NONE;
    for idx in 0..list.len() {
        swap_next_best(&mut list, idx);
        let m = list[idx];
        search.apply(&m.flip);
        let g = -nega_alpha_ordering_nws_simple(search, -alpha - 1, depth - 1, false, Some(m.n_legal), stop);
        search.undo(&m.flip);
        if !stop.is_searching() {
            return SCORE_UNDEFINED;
        }
        if v < g {
            v = g;
            best_move = m.flip.pos;
            if alpha < v {
                break;
            }
        }
    }

    search.tt().register(hash, depth, search.selectivity, alpha, alpha + 1, v, best_move);
    v
}

/// NWS completa: TT, MPC, ETC e YBWC. Testa se o valor é > alpha.
pub fn nega_alpha_ordering_nws(
    search: &mut Search,
    alpha: i32,
    depth: i32,
    skipped: bool,
    legal: Option<Bitboard>,
    is_end_search: bool,
    stop: &StopSignal,
) -> i32 {
    if !stop.is_searching() {
        return SCORE_UNDEFINED;
    }
    if is_end_search {
        if depth <= MID_TO_END_DEPTH {
            return nega_alpha_end_nws(search, alpha, skipped, legal, stop);
        }
    } else if depth <= MID_SIMPLE_DEPTH {
        return nega_alpha_ordering_nws_simple(search, alpha, depth, skipped, legal, stop);
    }

    search.nodes += 1;
    let legal = legal.unwrap_or_else(|| search.board.legal_moves());
    if legal == 0 {
        if skipped {
            return search.board.end_score();
        }
        search.pass();
        let v = -nega_alpha_ordering_nws(search, -alpha - 1, depth, true, None, is_end_search, stop);
        search.pass();
        return if stop.is_searching() { v } else { SCORE_UNDEFINED };
    }

    let hash = search.board.hash();
    let (lower, upper) = search.tt().get_bounds(hash, depth, search.selectivity);
    if upper <= alpha {
        return upper;
    }
    if alpha < lower {
        return lower;
    }

    if let Some(v) = mpc(search, alpha, alpha + 1, depth, Some(legal), is_end_search, stop) {
        return v;
    }
    if !stop.is_searching() {
        return SCORE_UNDEFINED;
    }

    let mut list = build_move_list(&search.board, legal);
    if has_wipeout(&search.board, &list) {
        return SCORE_MAX;
    }

    let mut v = -SCORE_INF;
    if depth >= MID_ETC_DEPTH && search.options().use_etc && etc_nws(search, &mut list, depth, alpha, &mut v) {
        return v;
    }

    let tt_move = search.tt().get_best_move(hash);
    evaluate_move_list(search, &mut list, depth, tt_move);

    let mut best_move = MOVE_NONE;
    let split_min_depth = if is_end_search {
        YBWC_END_SPLIT_MIN_DEPTH
    } else {
        YBWC_MID_SPLIT_MIN_DEPTH
    };

    if search.use_multi_thread && depth >= split_min_depth && list.len() >= 2 {
        sort_move_list(&mut list);
        // Irmão mais velho sempre em série
        let first = list[0];
        search.apply(&first.flip);
        let g = -nega_alpha_ordering_nws(search, -alpha - 1, depth - 1, false, Some(first.n_legal), is_end_search, stop);
        search.undo(&first.flip);
        if !stop.is_searching() {
            return SCORE_UNDEFINED;
        }
        if v < g {
            v = g;
            best_move = first.flip.pos;
        }
        if v <= alpha {
            let (g, pos) = ybwc_search_young_brothers(search, alpha, depth, is_end_search, &list[1..], stop);
            if !stop.is_searching() {
                return SCORE_UNDEFINED;
            }
            if v < g {
                v = g;
                best_move = pos;
            }
        }
    } else {
        for idx in 0..list.len() {
            swap_next_best(&mut list, idx);
            let m = list[idx];
            search.apply(&m.flip);
            let g = -nega_alpha_ordering_nws(search, -alpha - 1, depth - 1, false, Some(m.n_legal), is_end_search, stop);
            search.undo(&m.flip);
            if !stop.is_searching() {
                return SCORE_UNDEFINED;
            }
            if v < g {
                v = g;
                best_move = m.flip.pos;
                if alpha < v {
                    break;
                }
            }
        }
    }

    search.tt().register(hash, depth, search.selectivity, alpha, alpha + 1, v, best_move);
    v
}
