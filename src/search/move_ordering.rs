// Ordenação de jogadas: avaliação heurística de cada jogada antes do loop,
// seleção parcial (swap_next_best) durante o loop.

use crate::core::*;
use crate::intrinsics::{bits, popcount};
use crate::search::context::Search;
use crate::search::nws::nega_alpha_eval1;

/// Jogada candidata com o seu valor de ordenação e as jogadas legais do filho
#[derive(Debug, Clone, Copy, Default)]
pub struct FlipValue {
    pub flip: Flip,
    pub value: i32,
    pub n_legal: Bitboard,
}

// Pesos de ordenação
const W_TT_MOVE: i32 = 1 << 24;
const W_CELL: i32 = 1 << 4;
const W_MOBILITY: i32 = 1 << 7;
const W_CORNER_GIVEN: i32 = 1 << 9;
const W_EVAL: i32 = 1 << 5;
const W_SHALLOW: i32 = 1 << 6;

/// Profundidade a partir da qual a ordenação usa a avaliação estática do filho
const ORDERING_EVAL_DEPTH: i32 = 4;
/// Profundidade a partir da qual a ordenação usa uma busca de profundidade 1
const ORDERING_SHALLOW_DEPTH: i32 = 10;

const CORNERS: Bitboard = 0x8100_0000_0000_0081;

#[rustfmt::skip]
const CELL_PRIORITY: [i32; 64] = [
    8, 1, 6, 5, 5, 6, 1, 8,
    1, 0, 3, 3, 3, 3, 0, 1,
    6, 3, 4, 4, 4, 4, 3, 6,
    5, 3, 4, 2, 2, 4, 3, 5,
    5, 3, 4, 2, 2, 4, 3, 5,
    6, 3, 4, 4, 4, 4, 3, 6,
    1, 0, 3, 3, 3, 3, 0, 1,
    8, 1, 6, 5, 5, 6, 1, 8,
];

/// Lista de jogadas sem valores de ordenação
pub fn build_move_list(board: &Board, legal: Bitboard) -> Vec<FlipValue> {
    bits(legal)
        .map(|pos| FlipValue {
            flip: board.calc_flip(pos),
            value: 0,
            n_legal: 0,
        })
        .collect()
}

/// Alguma jogada captura todos os discos adversários (vitória imediata)
#[inline]
pub fn has_wipeout(board: &Board, list: &[FlipValue]) -> bool {
    list.iter().any(|m| m.flip.flip == board.opponent)
}

/// Atribui um valor heurístico a cada jogada e calcula as jogadas legais de cada filho
pub fn evaluate_move_list(search: &mut Search, list: &mut [FlipValue], depth: i32, tt_move: Option<u8>) {
    for m in list.iter_mut() {
        search.apply(&m.flip);
        m.n_legal = search.board.legal_moves();
        m.value = if Some(m.flip.pos) == tt_move {
            W_TT_MOVE
        } else {
            move_value(search, m, depth)
        };
        search.undo(&m.flip);
    }
}

/// Valor de ordenação com o tabuleiro já no filho
fn move_value(search: &mut Search, m: &FlipValue, depth: i32) -> i32 {
    let mut value = CELL_PRIORITY[m.flip.pos as usize] * W_CELL;
    value -= popcount(m.n_legal) as i32 * W_MOBILITY;
    if m.n_legal & CORNERS != 0 {
        value -= W_CORNER_GIVEN;
    }
    if depth >= ORDERING_SHALLOW_DEPTH {
        search.nodes += 1;
        let v = nega_alpha_eval1(search, -SCORE_MAX, SCORE_MAX, false);
        value -= v * W_SHALLOW;
    } else if depth >= ORDERING_EVAL_DEPTH {
        search.nodes += 1;
        value -= search.evaluate() * W_EVAL;
    }
    value
}

/// Versão barata para o solver de final: menos mobilidade adversária primeiro
pub fn evaluate_move_list_end(search: &mut Search, list: &mut [FlipValue], tt_move: Option<u8>) {
    for m in list.iter_mut() {
        search.apply(&m.flip);
        m.n_legal = search.board.legal_moves();
        search.undo(&m.flip);
        m.value = if Some(m.flip.pos) == tt_move {
            W_TT_MOVE
        } else {
            CELL_PRIORITY[m.flip.pos as usize] * W_CELL - popcount(m.n_legal) as i32 * W_MOBILITY
        };
    }
}

/// Traz para `idx` a melhor jogada ainda não explorada
#[inline]
pub fn swap_next_best(list: &mut [FlipValue], idx: usize) {
    let mut best = idx;
    for i in idx + 1..list.len() {
        if list[i].value > list[best].value {
            best = i;
        }
    }
    if best != idx {
        list.swap(idx, best);
    }
}

/// Ordenação completa (usada antes de dividir a busca entre threads)
pub fn sort_move_list(list: &mut [FlipValue]) {
    list.sort_by(|a, b| b.value.cmp(&a.value));
}
