// Clog search: pré-busca barata de sequências forçadas curtas.
// Só expande posições com poucas jogadas legais; prova o valor exato de
// jogadas na raiz cuja partida termina dentro do horizonte.

use crate::core::*;
use crate::intrinsics::{bits, popcount};

/// Horizonte da pré-busca, em lances
pub const CLOG_SEARCH_MAX_DEPTH: i32 = 8;
/// Acima deste número de jogadas legais o ramo é considerado não forçado
const CLOG_MAX_BRANCH: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClogResult {
    pub pos: u8,
    pub value: i32,
}

/// Valor exato se todas as linhas acabam em `depth` lances, senão `None`
fn clog_search(board: &mut Board, depth: i32, skipped: bool, nodes: &mut u64) -> Option<i32> {
    *nodes += 1;
    let legal = board.legal_moves();
    if legal == 0 {
        if skipped {
            return Some(board.end_score());
        }
        board.pass();
        let res = clog_search(board, depth, true, nodes).map(|v| -v);
        board.pass();
        return res;
    }
    if depth == 0 || popcount(legal) > CLOG_MAX_BRANCH {
        return None;
    }

    let mut best = -SCORE_INF;
    for pos in bits(legal) {
        let flip = board.calc_flip(pos);
        board.apply(&flip);
        let res = clog_search(board, depth - 1, false, nodes);
        board.undo(&flip);
        best = best.max(-res?);
        if best == SCORE_MAX {
            break;
        }
    }
    Some(best)
}

/// Jogadas da raiz com valor provado. Devolve também o número de nós visitados.
pub fn first_clog_search(board: &Board, use_legal: Bitboard) -> (Vec<ClogResult>, u64) {
    let mut nodes = 0u64;
    let mut results = Vec::new();
    let mut board = *board;
    for pos in bits(board.legal_moves() & use_legal) {
        let flip = board.calc_flip(pos);
        board.apply(&flip);
        if let Some(v) = clog_search(&mut board, CLOG_SEARCH_MAX_DEPTH - 1, false, &mut nodes) {
            results.push(ClogResult { pos, value: -v });
        }
        board.undo(&flip);
    }
    (results, nodes)
}
