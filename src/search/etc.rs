// Enhanced Transposition Cutoff: consulta a TT para cada filho antes de expandir o nó

use crate::search::context::Search;
use crate::search::move_ordering::FlipValue;

/// ETC com janela completa.
/// Devolve `true` se algum filho já prova um corte (valor em `v`).
/// Jogadas resolvidas pela TT são removidas de `list`; `alpha` e `v` são apertados.
pub fn etc(
    search: &Search,
    list: &mut Vec<FlipValue>,
    depth: i32,
    alpha: &mut i32,
    beta: i32,
    v: &mut i32,
) -> bool {
    let tt = search.tt();
    let mut done = vec![false; list.len()];

    for (i, m) in list.iter().enumerate() {
        let child = search.board.move_copy(&m.flip);
        let (l, u) = tt.get_bounds(child.hash(), depth - 1, search.selectivity);
        if beta <= -u {
            *v = -u;
            return true;
        }
        if *alpha <= -u {
            *alpha = -u;
            *v = -u;
            if -l <= *v || u == l {
                done[i] = true;
            }
        } else if -l <= *alpha {
            *v = (*v).max(-l);
            done[i] = true;
        }
    }

    let mut i = 0;
    list.retain(|_| {
        let keep = !done[i];
        i += 1;
        keep
    });
    false
}

/// ETC para busca de janela nula (alpha, alpha + 1)
pub fn etc_nws(search: &Search, list: &mut Vec<FlipValue>, depth: i32, alpha: i32, v: &mut i32) -> bool {
    let tt = search.tt();
    let mut done = vec![false; list.len()];

    for (i, m) in list.iter().enumerate() {
        let child = search.board.move_copy(&m.flip);
        let (l, u) = tt.get_bounds(child.hash(), depth - 1, search.selectivity);
        if alpha < -u {
            *v = -u;
            return true;
        }
        if -alpha <= l {
            *v = (*v).max(-l);
            done[i] = true;
        }
    }

    let mut i = 0;
    list.retain(|_| {
        let keep = !done[i];
        i += 1;
        keep
    });
    false
}
