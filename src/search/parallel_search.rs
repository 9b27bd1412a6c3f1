// Ficheiro: src/search/parallel_search.rs
// Descrição: Aprofundamento iterativo com Lazy SMP.
// A thread principal faz a sequência autoritativa de passes; as threads
// auxiliares buscam a mesma raiz a profundidades desfasadas e só contribuem
// com entradas na TT partilhada.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel;
use log::Level;

use crate::core::*;
use crate::engine::config::TimeConfig;
use crate::engine::thread_pool::TaskHandle;
use crate::intrinsics::bits;
use crate::search::alpha_beta::{first_nega_scout_legal, nega_scout};
use crate::search::clog::ClogResult;
use crate::search::context::*;
use crate::search::nws::nega_alpha_ordering_nws;
use crate::search::time_manager::{should_break_early, should_verify_best_move, PassSummary};

/// Numa busca de final, os passes de meio-jogo param a esta distância do fim
const END_PRESEARCH_OFFSET: i32 = 10;

// ============================================================================
// ESCADA DE PROFUNDIDADE / SELETIVIDADE
// ============================================================================

/// Passo de profundidade dos passes de meio-jogo
#[inline]
fn depth_step(main_depth: i32, depth: i32) -> i32 {
    if main_depth <= 15 && main_depth < depth - 3 {
        3
    } else {
        1
    }
}

/// Próximo passe do modo de profundidade fixa, ou `None` quando o alvo já foi buscado
pub fn next_fixed_pass(
    main_depth: i32,
    main_sel: Selectivity,
    depth: i32,
    target: Selectivity,
    is_end_search: bool,
) -> Option<(i32, Selectivity)> {
    if !is_end_search || main_depth < depth - END_PRESEARCH_OFFSET {
        let next = main_depth + depth_step(main_depth, depth);
        return (next <= depth).then_some((next, main_sel));
    }
    if main_depth < depth {
        let sel = if depth <= 30 && target >= Selectivity::Mpc88 {
            Selectivity::Mpc88
        } else {
            Selectivity::Mpc74
        };
        return Some((depth, sel.min(target)));
    }
    if main_sel >= target {
        return None;
    }
    let jump = (main_sel >= Selectivity::Mpc74 && target > Selectivity::Mpc74 && depth <= 22)
        || (main_sel >= Selectivity::Mpc88 && target > Selectivity::Mpc88 && depth <= 25)
        || (main_sel >= Selectivity::Mpc93 && target > Selectivity::Mpc93 && depth <= 29)
        || main_sel >= Selectivity::Mpc98;
    let sel = if jump { target } else { main_sel.next().unwrap_or(target) };
    Some((main_depth, sel))
}

/// Próximo passe do modo com tempo, ou `None` quando a busca exata terminou
pub fn next_timed_pass(main_depth: i32, main_sel: Selectivity, max_depth: i32) -> Option<(i32, Selectivity)> {
    if main_depth < max_depth - END_PRESEARCH_OFFSET {
        let mut depth = main_depth + depth_step(main_depth, max_depth);
        let mut sel = main_sel;
        if depth > 13 && sel == Selectivity::Exact {
            sel = Selectivity::Mpc74;
        }
        if depth > 23 {
            if sel < Selectivity::Mpc93 {
                depth -= 1;
                sel = sel.next().unwrap_or(sel);
            } else {
                sel = Selectivity::Mpc74;
            }
        }
        return Some((depth, sel));
    }
    if main_depth < max_depth {
        return Some((max_depth, Selectivity::Mpc74));
    }
    main_sel.next().map(|sel| (main_depth, sel))
}

// ============================================================================
// THREADS AUXILIARES
// ============================================================================

/// Buscas auxiliares de um passe. O valor delas é descartado.
struct Helpers {
    tasks: Vec<TaskHandle<u64>>,
    flag: SearchFlag,
}

impl Helpers {
    fn none() -> Self {
        Helpers {
            tasks: Vec::new(),
            flag: SearchFlag::new(),
        }
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Cancela as auxiliares e devolve os nós que visitaram
    fn finish(self) -> u64 {
        self.flag.cancel();
        self.tasks.into_iter().filter_map(TaskHandle::join).sum()
    }
}

// ============================================================================
// LAZY SMP
// ============================================================================

enum PassOutcome<T> {
    Completed(T, u64),
    TimedOut(u64),
}

/// Uma busca de topo: raiz, jogadas permitidas e recursos partilhados
pub struct LazySmp<'a> {
    pub board: Board,
    pub shared: Arc<SearchShared>,
    pub clogs: &'a [ClogResult],
    pub use_legal: Bitboard,
    pub use_multi_thread: bool,
    /// Só há auxiliares enquanto a profundidade principal não passar disto
    pub helper_max_main_depth: i32,
    pub show_log: bool,
    pub stop: StopSignal,
}

impl<'a> LazySmp<'a> {
    fn log_level(&self) -> Level {
        if self.show_log {
            Level::Info
        } else {
            Level::Debug
        }
    }

    fn tt_stats(&self) -> String {
        let tt = &self.shared.tt;
        format!("tt {}‰ hits {:.1}%", tt.hashfull(), tt.hit_rate() * 100.0)
    }

    fn spawn_helpers(&self, main_depth: i32, main_sel: Selectivity, max_depth: i32) -> Helpers {
        let flag = SearchFlag::new();
        let stop = self.stop.child(flag.clone());
        let pool = &self.shared.pool;
        let mut tasks = Vec::new();

        // Seletividade da próxima auxiliar em cada profundidade
        let mut sub_sel: Vec<Option<Selectivity>> = vec![Some(Selectivity::Mpc74); HW2 as usize + 1];
        sub_sel[main_depth as usize] = main_sel.next();

        for idx in 0..pool.size() {
            if !stop.is_searching() {
                break;
            }
            let sub_depth = (main_depth + (idx as u32 + 1).trailing_zeros() as i32).min(max_depth);
            let Some(sel) = sub_sel[sub_depth as usize] else {
                continue;
            };
            sub_sel[sub_depth as usize] = sel.next();

            let sub_is_end_search = sub_depth == max_depth;
            let mut sub_search = Search::new(self.board, sel, false, Arc::clone(&self.shared));
            sub_search.is_presearch = true;
            let task_stop = stop.clone();
            let submitted = pool.try_submit(move || {
                nega_scout(&mut sub_search, -SCORE_MAX, SCORE_MAX, sub_depth, false, None, sub_is_end_search, &task_stop);
                sub_search.nodes
            });
            // Pool cheio: a auxiliar simplesmente não corre
            if let Some(handle) = submitted {
                tasks.push(handle);
            }
        }

        Helpers { tasks, flag }
    }

    fn helpers_for(&self, main_depth: i32, main_sel: Selectivity, max_depth: i32, allowed: bool) -> Helpers {
        if allowed && self.use_multi_thread && main_depth <= self.helper_max_main_depth {
            self.spawn_helpers(main_depth, main_sel, max_depth)
        } else {
            Helpers::none()
        }
    }

    /// Um passe da thread principal: (valor, jogada, nós)
    fn run_pass(
        &self,
        depth: i32,
        selectivity: Selectivity,
        is_end_search: bool,
        is_presearch: bool,
        stop: &StopSignal,
    ) -> ((i32, u8), u64) {
        let mut search = Search::new(self.board, selectivity, self.use_multi_thread, Arc::clone(&self.shared));
        search.is_presearch = is_presearch;
        let res = first_nega_scout_legal(
            &mut search,
            -SCORE_MAX,
            SCORE_MAX,
            depth,
            is_end_search,
            self.clogs,
            self.use_legal,
            stop,
        );
        (res, search.nodes)
    }

    /// Corre `task` numa thread própria até ao prazo; depois disso cancela-a
    /// e descarta o resultado.
    fn run_with_deadline<T, F>(&self, deadline: Instant, task: F) -> PassOutcome<T>
    where
        T: Send,
        F: FnOnce(&StopSignal) -> (T, u64) + Send,
    {
        let pass_flag = SearchFlag::new();
        let pass_stop = self.stop.child(pass_flag.clone());
        let (tx, rx) = channel::bounded(1);

        let outcome = crossbeam::scope(|s| {
            let pass_stop = &pass_stop;
            s.spawn(move |_| {
                let _ = tx.send(task(pass_stop));
            });
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((value, nodes)) => PassOutcome::Completed(value, nodes),
                Err(_) => {
                    pass_flag.cancel();
                    let nodes = rx.recv().map(|(_, nodes)| nodes).unwrap_or(0);
                    PassOutcome::TimedOut(nodes)
                }
            }
        });

        outcome.unwrap_or_else(|_| {
            log::error!("passe de busca terminou em pânico");
            PassOutcome::TimedOut(0)
        })
    }

    /// Aprofundamento até (depth, selectivity) exatos.
    /// Os passes anteriores só servem para ordenar jogadas e aquecer a TT.
    pub fn search_fixed(&self, depth: i32, selectivity: Selectivity) -> SearchResult {
        let start = Instant::now();
        let max_depth = self.board.n_empties() as i32;
        let depth = depth.clamp(1, max_depth.max(1));
        let is_end_search = depth == max_depth;
        let mut main_depth = 1;
        let mut main_sel = if is_end_search {
            Selectivity::Mpc74.min(selectivity)
        } else {
            selectivity
        };
        let mut result = SearchResult::undefined();
        let mut nodes = 0u64;

        log::log!(
            self.log_level(),
            "thread pool {} workers, {} livres",
            self.shared.pool.size(),
            self.shared.pool.idle_count()
        );

        while self.stop.is_searching() {
            let mut main_is_end_search = false;
            if main_depth >= max_depth {
                main_is_end_search = true;
                main_depth = max_depth;
            }
            let is_last_search = main_depth == depth && main_sel == selectivity;

            let helpers = self.helpers_for(main_depth, main_sel, max_depth, !(is_end_search && main_depth == depth));
            let n_helpers = helpers.len();
            let ((value, best_move), pass_nodes) =
                self.run_pass(main_depth, main_sel, main_is_end_search, !is_last_search, &self.stop);
            nodes += pass_nodes + helpers.finish();

            if value == SCORE_UNDEFINED || !self.stop.is_searching() {
                break;
            }

            result = SearchResult::new(best_move, value, main_depth, main_sel);
            result.is_end_search = main_is_end_search;
            result.nodes = nodes;
            result.elapsed = start.elapsed();
            log::log!(
                self.log_level(),
                "{} {} helpers {} {}",
                if is_last_search { "main" } else { "pre" },
                result,
                n_helpers,
                self.tt_stats()
            );

            match next_fixed_pass(main_depth, main_sel, depth, selectivity, is_end_search) {
                Some((d, s)) => {
                    main_depth = d;
                    main_sel = s;
                }
                None => break,
            }
        }

        result.nodes = nodes;
        result.elapsed = start.elapsed();
        result
    }

    /// Aprofundamento até esgotar `limit`. O último passe completo é o resultado.
    pub fn search_time_limit(&self, limit: Duration, config: &TimeConfig) -> SearchResult {
        let start = Instant::now();
        let deadline = start + limit;
        let max_depth = (self.board.n_empties() as i32).max(1);
        let mut main_depth = 1;
        let mut main_sel = Selectivity::Exact;
        let mut result = SearchResult::undefined();
        let mut nodes = 0u64;
        let mut before_raw_value = None;
        let mut verified = false;

        // O primeiro passe corre sempre até ao fim: há sempre uma jogada para devolver
        while self.stop.is_searching() && (!result.is_valid() || start.elapsed() < limit) {
            let mut main_is_end_search = false;
            if main_depth >= max_depth {
                main_is_end_search = true;
                main_depth = max_depth;
            }

            let helpers = self.helpers_for(main_depth, main_sel, max_depth, true);
            let n_helpers = helpers.len();
            let outcome = if result.is_valid() {
                self.run_with_deadline(deadline, |stop| {
                    self.run_pass(main_depth, main_sel, main_is_end_search, false, stop)
                })
            } else {
                let (res, pass_nodes) = self.run_pass(main_depth, main_sel, main_is_end_search, false, &self.stop);
                PassOutcome::Completed(res, pass_nodes)
            };
            nodes += helpers.finish();

            let (value, best_move) = match outcome {
                PassOutcome::Completed(res, pass_nodes) => {
                    nodes += pass_nodes;
                    res
                }
                PassOutcome::TimedOut(pass_nodes) => {
                    nodes += pass_nodes;
                    log::log!(self.log_level(), "passe depth {} interrompido pelo tempo", main_depth);
                    break;
                }
            };
            if value == SCORE_UNDEFINED {
                break;
            }

            let policy_changed = result.best_move != best_move;
            let value_changed = before_raw_value != Some(value);
            result = SearchResult::new(best_move, value, main_depth, main_sel);
            result.is_end_search = main_is_end_search;
            result.nodes = nodes;
            result.elapsed = start.elapsed();
            log::log!(self.log_level(), "{} helpers {} {}", result, n_helpers, self.tt_stats());

            let summary = PassSummary {
                depth: main_depth,
                is_end_search: main_is_end_search,
                elapsed: result.elapsed,
                nodes,
                policy_changed,
                value_changed,
            };
            if should_break_early(&summary, limit, config) {
                log::log!(self.log_level(), "paragem antecipada em depth {}", main_depth);
                break;
            }
            if !verified && should_verify_best_move(&summary, config) {
                verified = true;
                let verify_depth = (main_depth - config.verify_depth_reduction).max(1);
                let outcome = self.run_with_deadline(deadline, |stop| {
                    self.verify_best_move(best_move, value - config.verify_margin, verify_depth, main_sel, stop)
                });
                match outcome {
                    PassOutcome::Completed(true, n) => {
                        nodes += n;
                        log::log!(self.log_level(), "{} confirmada, paragem antecipada", cell_to_coord(best_move));
                        break;
                    }
                    PassOutcome::Completed(false, n) | PassOutcome::TimedOut(n) => nodes += n,
                }
            }
            before_raw_value = Some(value);

            match next_timed_pass(main_depth, main_sel, max_depth) {
                Some((d, s)) => {
                    main_depth = d;
                    main_sel = s;
                }
                None => {
                    log::log!(self.log_level(), "busca completa");
                    break;
                }
            }
        }

        result.nodes = nodes;
        result.elapsed = start.elapsed();
        result
    }

    /// Verifica com janelas nulas que nenhuma alternativa passa `threshold`.
    /// Devolve (confirmado, nós).
    fn verify_best_move(
        &self,
        best_move: u8,
        threshold: i32,
        depth: i32,
        selectivity: Selectivity,
        stop: &StopSignal,
    ) -> (bool, u64) {
        if threshold <= -SCORE_MAX || best_move >= MOVE_PASS {
            return (false, 0);
        }
        let mut search = Search::new(self.board, selectivity, self.use_multi_thread, Arc::clone(&self.shared));
        let others = search.board.legal_moves() & self.use_legal & !(1u64 << best_move);
        for pos in bits(others) {
            let flip = search.board.calc_flip(pos);
            search.apply(&flip);
            let v = -nega_alpha_ordering_nws(&mut search, -threshold - 1, depth - 1, false, None, false, stop);
            search.undo(&flip);
            if !stop.is_searching() || v > threshold {
                return (false, search.nodes);
            }
        }
        (true, search.nodes)
    }
}
