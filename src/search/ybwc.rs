// Young Brothers Wait Concept: depois do irmão mais velho, os restantes
// filhos de um nó NWS são distribuídos pelo pool de threads.

use crate::core::*;
use crate::engine::thread_pool::TaskHandle;
use crate::search::context::{Search, SearchFlag, StopSignal};
use crate::search::move_ordering::FlipValue;
use crate::search::nws::nega_alpha_ordering_nws;

/// (valor, nós, terminou sem cancelamento)
type BrotherResult = (i32, u64, bool);

/// Busca os irmãos mais novos com janela nula em `alpha`.
/// Devolve (melhor valor, melhor jogada); para no primeiro corte.
pub fn ybwc_search_young_brothers(
    search: &mut Search,
    alpha: i32,
    depth: i32,
    is_end_search: bool,
    brothers: &[FlipValue],
    stop: &StopSignal,
) -> (i32, u8) {
    let split = SearchFlag::new();
    let split_stop = stop.child(split.clone());
    let mut v = -SCORE_INF;
    let mut best_move = MOVE_NONE;
    let mut tasks: Vec<(u8, TaskHandle<BrotherResult>)> = Vec::new();

    for (i, m) in brothers.iter().enumerate() {
        if !split_stop.is_searching() {
            break;
        }

        // O último irmão fica sempre nesta thread
        if i + 1 < brothers.len() {
            let mut task_search = search.fork();
            task_search.apply(&m.flip);
            let task_stop = split_stop.clone();
            let n_legal = m.n_legal;
            let submitted = search.shared.pool.try_submit(move || {
                let g = -nega_alpha_ordering_nws(
                    &mut task_search,
                    -alpha - 1,
                    depth - 1,
                    false,
                    Some(n_legal),
                    is_end_search,
                    &task_stop,
                );
                (g, task_search.nodes, task_stop.is_searching())
            });
            if let Some(handle) = submitted {
                tasks.push((m.flip.pos, handle));
                continue;
            }
        }

        // Pool cheio: executa aqui
        search.apply(&m.flip);
        let g = -nega_alpha_ordering_nws(search, -alpha - 1, depth - 1, false, Some(m.n_legal), is_end_search, &split_stop);
        search.undo(&m.flip);
        if !split_stop.is_searching() {
            break;
        }
        if v < g {
            v = g;
            best_move = m.flip.pos;
            if alpha < v {
                split.cancel();
                break;
            }
        }

        collect_finished(search, &mut tasks, alpha, &mut v, &mut best_move, &split);
    }

    for (pos, handle) in tasks {
        if let Some(result) = handle.join() {
            merge_result(search, pos, result, alpha, &mut v, &mut best_move, &split);
        }
    }

    (v, best_move)
}

fn collect_finished(
    search: &mut Search,
    tasks: &mut Vec<(u8, TaskHandle<BrotherResult>)>,
    alpha: i32,
    v: &mut i32,
    best_move: &mut u8,
    split: &SearchFlag,
) {
    let mut k = 0;
    while k < tasks.len() {
        match tasks[k].1.try_join() {
            Some(result) => {
                let (pos, _) = tasks.swap_remove(k);
                merge_result(search, pos, result, alpha, v, best_move, split);
            }
            None => k += 1,
        }
    }
}

#[inline]
fn merge_result(
    search: &mut Search,
    pos: u8,
    (g, nodes, completed): BrotherResult,
    alpha: i32,
    v: &mut i32,
    best_move: &mut u8,
    split: &SearchFlag,
) {
    search.nodes += nodes;
    // Resultados calculados sob cancelamento não contam
    if completed && *v < g {
        *v = g;
        *best_move = pos;
        if alpha < *v {
            split.cancel();
        }
    }
}
