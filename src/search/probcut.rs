// Multi-ProbCut: poda probabilística com busca rasa e modelo de erro calibrado.
// Os coeficientes foram ajustados empiricamente; não alterar sem recalibrar.

use crate::core::*;
use crate::search::context::{Search, StopSignal};
use crate::search::nws::nega_alpha_ordering_nws;

/// Profundidade mínima para tentar MPC
pub const USE_MPC_DEPTH: i32 = 3;
/// Em pré-buscas do Lazy SMP, sem MPC a partir desta profundidade
pub const MAX_MPC_DEPTH_PRESEARCH: i32 = 22;

// ============================================================================
// MODELO DE ERRO
// ============================================================================

const MID_A: f64 = 0.93740805837003;
const MID_B: f64 = -7.340323137961951;
const MID_C: f64 = 1.1401695320187872;
const MID_D: f64 = 0.700567733735339;
const MID_E: f64 = 2.662003673678691;
const MID_F: f64 = 3.0554301965778063;
const MID_G: f64 = 2.0942574977708674;

const END_A: f64 = 1.0991215402719048;
const END_B: f64 = 2.1818828716953917;
const END_C: f64 = -5.222054343259216;
const END_D: f64 = 5.266556448300817;
const END_E: f64 = -3.406095066993692;
const END_F: f64 = 8.038123155263888;

#[rustfmt::skip]
const MPC_SEARCH_DEPTH_MID: [i32; 61] = [
     0,  0,  0,  1,  2,  3,  2,  3,  4,  5,
     4,  5,  6,  7,  6,  7,  8,  9,  8,  9,
    10, 11, 10, 11, 12, 13, 12, 13, 14, 15,
    14, 15, 16, 17, 16, 17, 18, 19, 18, 19,
    20, 21, 20, 21, 22, 23, 22, 23, 24, 25,
    24, 25, 26, 27, 26, 27, 28, 29, 28, 29,
    30,
];

#[rustfmt::skip]
const MPC_SEARCH_DEPTH_END: [i32; 61] = [
     0,  1,  0,  1,  2,  3,  2,  3,  2,  3,
     2,  3,  2,  3,  2,  3,  4,  5,  4,  5,
     4,  5,  4,  5,  6,  7,  6,  7,  6,  7,
     6,  7,  8,  9,  8,  9,  8,  9,  8,  9,
    10, 11, 10, 11, 10, 11, 10, 11, 12, 13,
    12, 13, 12, 13, 12, 13, 14, 15, 14, 15,
    14,
];

/// Desvio esperado entre uma busca de profundidade `depth1` e uma de `depth2` (meio-jogo)
pub fn probcut_sigma(n_discs: u32, depth1: i32, depth2: i32) -> f64 {
    let res = MID_A * (n_discs as f64 / 64.0) + MID_B * (depth1 as f64 / 60.0) + MID_C * (depth2 as f64 / 60.0);
    MID_D * res * res * res + MID_E * res * res + MID_F * res + MID_G
}

/// Desvio esperado entre uma busca de profundidade `depth` e o resultado exato
pub fn probcut_sigma_end(n_discs: u32, depth: i32) -> f64 {
    let res = END_A * (n_discs as f64 / 64.0) + END_B * (depth as f64 / 60.0);
    END_C * res * res * res + END_D * res * res + END_E * res + END_F
}

/// Profundidade da busca rasa de verificação
#[inline]
pub fn mpc_search_depth(depth: i32, is_end_search: bool) -> i32 {
    let idx = depth.clamp(0, 60) as usize;
    if is_end_search {
        MPC_SEARCH_DEPTH_END[idx]
    } else {
        MPC_SEARCH_DEPTH_MID[idx]
    }
}

/// Margem de erro, em discos, para o nível de confiança pedido
fn mpc_error(mpct: f64, n_discs: u32, shallow: i32, deep: i32, is_end_search: bool) -> i32 {
    let sigma = if is_end_search {
        probcut_sigma_end(n_discs, shallow)
    } else {
        probcut_sigma(n_discs, shallow, deep)
    };
    (mpct * sigma).ceil() as i32
}

// ============================================================================
// PODA
// ============================================================================

#[inline]
fn cut_high(beta: i32, is_end_search: bool) -> i32 {
    // Resultados finais são pares: arredonda para cima
    if is_end_search {
        beta + (beta & 1)
    } else {
        beta
    }
}

#[inline]
fn cut_low(alpha: i32, is_end_search: bool) -> i32 {
    if is_end_search {
        alpha - (alpha & 1)
    } else {
        alpha
    }
}

/// Tenta um corte probabilístico. Devolve o valor do corte, se houver.
pub fn mpc(
    search: &mut Search,
    alpha: i32,
    beta: i32,
    depth: i32,
    legal: Option<Bitboard>,
    is_end_search: bool,
    stop: &StopSignal,
) -> Option<i32> {
    let selectivity = search.selectivity;
    if selectivity.is_exact()
        || !search.options().use_mpc
        || depth < USE_MPC_DEPTH
        || (search.is_presearch && depth >= MAX_MPC_DEPTH_PRESEARCH)
    {
        return None;
    }

    let search_depth = mpc_search_depth(depth, is_end_search);
    let n_discs = search.n_discs;

    if search_depth == 0 {
        let error = mpc_error(selectivity.mpct_single(), n_discs, 0, depth, is_end_search);
        let d0 = search.evaluate();
        if d0 >= beta + error {
            return Some(cut_high(beta, is_end_search));
        }
        if d0 <= alpha - error {
            return Some(cut_low(alpha, is_end_search));
        }
        return None;
    }

    let mpct = selectivity.mpct_multi();
    let error_search = mpc_error(mpct, n_discs, search_depth, depth, is_end_search);
    let error_0 = mpc_error(mpct, n_discs, 0, depth, is_end_search);
    let d0 = search.evaluate();

    // A verificação corre sem poda probabilística
    search.selectivity = Selectivity::Exact;
    let mut result = None;

    if d0 >= beta + error_0 {
        let pc_beta = beta + error_search;
        if pc_beta <= SCORE_MAX {
            let v = nega_alpha_ordering_nws(search, pc_beta - 1, search_depth, false, legal, false, stop);
            if stop.is_searching() && v >= pc_beta {
                result = Some(cut_high(beta, is_end_search));
            }
        }
    }
    if result.is_none() && stop.is_searching() && d0 <= alpha - error_0 {
        let pc_alpha = alpha - error_search;
        if pc_alpha >= -SCORE_MAX {
            let v = nega_alpha_ordering_nws(search, pc_alpha, search_depth, false, legal, false, stop);
            if stop.is_searching() && v <= pc_alpha {
                result = Some(cut_low(alpha, is_end_search));
            }
        }
    }

    search.selectivity = selectivity;
    result
}
