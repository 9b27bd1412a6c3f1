// Busca de janela completa (NegaScout) e busca na raiz

use crate::core::*;
use crate::search::clog::ClogResult;
use crate::search::context::{Search, StopSignal};
use crate::search::endgame::nega_alpha_end;
use crate::search::etc::etc;
use crate::search::move_ordering::*;
use crate::search::nws::{nega_alpha_eval1, nega_alpha_ordering_nws};
use crate::search::probcut::mpc;
use crate::search::{MID_ETC_DEPTH, MID_TO_END_DEPTH};

/// Busca um filho: janela completa no primeiro, janela nula com re-busca nos restantes
#[allow(clippy::too_many_arguments)]
#[inline]
fn search_child(
    search: &mut Search,
    m: &FlipValue,
    alpha: i32,
    beta: i32,
    depth: i32,
    is_first: bool,
    is_end_search: bool,
    stop: &StopSignal,
) -> i32 {
    search.apply(&m.flip);
    let g = if is_first {
        -nega_scout(search, -beta, -alpha, depth - 1, false, Some(m.n_legal), is_end_search, stop)
    } else {
        let mut g = -nega_alpha_ordering_nws(search, -alpha - 1, depth - 1, false, Some(m.n_legal), is_end_search, stop);
        if alpha < g && g < beta && stop.is_searching() {
            g = -nega_scout(search, -beta, -g, depth - 1, false, Some(m.n_legal), is_end_search, stop);
        }
        g
    };
    search.undo(&m.flip);
    g
}

/// NegaScout fail-soft com janela (alpha, beta)
#[allow(clippy::too_many_arguments)]
pub fn nega_scout(
    search: &mut Search,
    mut alpha: i32,
    mut beta: i32,
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
            return nega_alpha_end(search, alpha, beta, skipped, legal, stop);
        }
    } else {
        if depth == 0 {
            search.nodes += 1;
            return search.evaluate();
        }
        if depth == 1 {
            return nega_alpha_eval1(search, alpha, beta, skipped);
        }
    }

    search.nodes += 1;
    let legal = legal.unwrap_or_else(|| search.board.legal_moves());
    if legal == 0 {
        if skipped {
            return search.board.end_score();
        }
        search.pass();
        let v = -nega_scout(search, -beta, -alpha, depth, true, None, is_end_search, stop);
        search.pass();
        return if stop.is_searching() { v } else { SCORE_UNDEFINED };
    }

    let hash = search.board.hash();
    let (lower, upper) = search.tt().get_bounds(hash, depth, search.selectivity);
    if upper == lower || upper <= alpha {
        return upper;
    }
    if beta <= lower {
        return lower;
    }
    alpha = alpha.max(lower);
    beta = beta.min(upper);

    if let Some(v) = mpc(search, alpha, beta, depth, Some(legal), is_end_search, stop) {
        return v;
    }
    if !stop.is_searching() {
        return SCORE_UNDEFINED;
    }

    let mut list = build_move_list(&search.board, legal);
    if has_wipeout(&search.board, &list) {
        return SCORE_MAX;
    }

    let first_alpha = alpha;
    let mut v = -SCORE_INF;
    if depth >= MID_ETC_DEPTH && search.options().use_etc && etc(search, &mut list, depth, &mut alpha, beta, &mut v) {
        return v;
    }

    let tt_move = search.tt().get_best_move(hash);
    evaluate_move_list(search, &mut list, depth, tt_move);

    let mut best_move = MOVE_NONE;
    for idx in 0..list.len() {
        swap_next_best(&mut list, idx);
        let m = list[idx];
        let g = search_child(search, &m, alpha, beta, depth, idx == 0, is_end_search, stop);
        if !stop.is_searching() {
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

    search.tt().register(hash, depth, search.selectivity, first_alpha, beta, v, best_move);
    v
}

/// Busca na raiz restrita a `use_legal`. Resultados do clog entram como valores já provados.
/// Devolve (valor, melhor jogada); `SCORE_UNDEFINED` se cancelada.
#[allow(clippy::too_many_arguments)]
pub fn first_nega_scout_legal(
    search: &mut Search,
    mut alpha: i32,
    beta: i32,
    depth: i32,
    is_end_search: bool,
    clogs: &[ClogResult],
    use_legal: Bitboard,
    stop: &StopSignal,
) -> (i32, u8) {
    search.nodes += 1;
    let first_alpha = alpha;
    let all_legal = search.board.legal_moves();
    let mut legal = use_legal & all_legal;
    let mut v = -SCORE_INF;
    let mut best_move = MOVE_NONE;

    for clog in clogs {
        let bit = 1u64 << clog.pos;
        if legal & bit != 0 {
            legal ^= bit;
            if v < clog.value {
                v = clog.value;
                best_move = clog.pos;
                alpha = alpha.max(v);
            }
        }
    }
    if legal == 0 || beta <= v {
        return (v, best_move);
    }

    let hash = search.board.hash();
    let mut list = build_move_list(&search.board, legal);
    if let Some(m) = list.iter().find(|m| m.flip.flip == search.board.opponent) {
        return (SCORE_MAX, m.flip.pos);
    }
    let tt_move = search.tt().get_best_move(hash);
    evaluate_move_list(search, &mut list, depth, tt_move);

    let mut searched = 0;
    for idx in 0..list.len() {
        swap_next_best(&mut list, idx);
        let m = list[idx];
        let is_first = searched == 0 && best_move == MOVE_NONE;
        let g = search_child(search, &m, alpha, beta, depth, is_first, is_end_search, stop);
        searched += 1;
        if !stop.is_searching() {
            return (SCORE_UNDEFINED, best_move);
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

    // Só vale como valor do nó se todas as jogadas foram consideradas
    if use_legal & all_legal == all_legal {
        search.tt().register(hash, depth, search.selectivity, first_alpha, beta, v, best_move);
    }
    (v, best_move)
}
