// Ficheiro: src/engine/ai.rs
// Descrição: Ponto de entrada do motor. Livro, passes, níveis, tempo,
// sugestões, ponder e pré-análise por self-play.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};
use rand::seq::{IteratorRandom, SliceRandom};
use rayon::prelude::*;

use crate::core::*;
use crate::engine::book::OpeningBook;
use crate::engine::config::EngineConfig;
use crate::engine::thread_pool::ThreadPool;
use crate::engine::tt::TranspositionTable;
use crate::error::Result;
use crate::intrinsics::{bits, popcount};
use crate::search::alpha_beta::nega_scout;
use crate::search::clog::{first_clog_search, ClogResult};
use crate::search::context::*;
use crate::search::evaluation::Evaluator;
use crate::search::level::{get_level, level_from_depth_selectivity};
use crate::search::parallel_search::{next_timed_pass, LazySmp};
use crate::search::time_manager::{calc_time_limit, should_run_preanalysis};

/// Lances máximos de cada linha de self-play da pré-análise
const SELF_PLAY_MAX_PLIES: usize = 8;

/// Como limitar uma busca
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchBudget {
    /// Nível 0..=60 da tabela de níveis
    Level(u8),
    /// Profundidade e seletividade explícitas
    Depth { depth: i32, selectivity: Selectivity },
    /// Tempo fixo para esta jogada
    Time(Duration),
    /// Relógio restante da partida; o tempo da jogada é calculado a partir dele
    Clock(Duration),
}

/// Jogada da análise em ponder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PonderMove {
    pub cell: u8,
    pub value: i32,
    pub depth: i32,
    /// Percentagem de confiança da seletividade atingida
    pub confidence: u8,
}

pub struct Engine {
    config: EngineConfig,
    shared: Arc<SearchShared>,
    book: Arc<dyn OpeningBook>,
    global: SearchFlag,
}

impl Engine {
    pub fn new(config: EngineConfig, evaluator: Arc<dyn Evaluator>, book: Arc<dyn OpeningBook>) -> Result<Self> {
        config.validate()?;
        // A thread que chama a busca também trabalha
        let workers = if config.use_multi_thread {
            config.threads.saturating_sub(1)
        } else {
            0
        };
        let shared = Arc::new(SearchShared {
            tt: TranspositionTable::new(config.tt_size_mb),
            evaluator,
            pool: ThreadPool::new(workers)?,
            options: SearchOptions {
                use_etc: config.use_etc,
                use_mpc: config.use_mpc,
            },
        });
        log::info!(
            "motor criado: {} threads, TT {} MB ({} entradas)",
            config.threads,
            config.tt_size_mb,
            shared.tt.size()
        );
        Ok(Engine {
            config,
            shared,
            book,
            global: SearchFlag::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.shared.tt
    }

    // ========================================================================
    // BUSCA
    // ========================================================================

    pub fn search(&self, board: &Board, budget: SearchBudget, use_book: bool, show_log: bool) -> SearchResult {
        self.search_with_legal_subset(board, board.legal_moves(), budget, use_book, show_log)
    }

    /// Busca restrita às jogadas de `use_legal`
    pub fn search_with_legal_subset(
        &self,
        board: &Board,
        use_legal: Bitboard,
        budget: SearchBudget,
        use_book: bool,
        show_log: bool,
    ) -> SearchResult {
        self.search_core(board, use_legal, budget, use_book, show_log, &SearchFlag::new(), true)
    }

    /// Busca que pode ser interrompida por `flag` (o último passe completo é devolvido)
    pub fn search_interruptible(
        &self,
        board: &Board,
        budget: SearchBudget,
        use_book: bool,
        show_log: bool,
        flag: &SearchFlag,
    ) -> SearchResult {
        self.search_core(board, board.legal_moves(), budget, use_book, show_log, flag, true)
    }

    #[allow(clippy::too_many_arguments)]
    fn search_core(
        &self,
        board: &Board,
        use_legal: Bitboard,
        budget: SearchBudget,
        use_book: bool,
        show_log: bool,
        local: &SearchFlag,
        allow_preanalysis: bool,
    ) -> SearchResult {
        let start = Instant::now();
        let stop = StopSignal::new(self.global.clone(), local.clone());
        self.shared.tt.new_search();

        let mut board = *board;
        let mut use_legal = use_legal;
        let mut passed = false;
        if board.legal_moves() == 0 {
            board.pass();
            if board.legal_moves() == 0 {
                // Ninguém joga: resultado final exato do ponto de vista de quem passou
                let mut res = SearchResult::new(MOVE_PASS, -board.end_score(), 0, Selectivity::Exact);
                res.is_end_search = true;
                return res;
            }
            passed = true;
            use_legal = board.legal_moves();
        }

        let mut res = self.search_position(&board, use_legal, budget, use_book, show_log, &stop, allow_preanalysis);
        if passed && res.is_valid() {
            res.value = -res.value;
            res.best_move = MOVE_PASS;
        }
        res.elapsed = start.elapsed();
        res
    }

    /// Busca numa posição em que o lado a jogar tem jogadas
    #[allow(clippy::too_many_arguments)]
    fn search_position(
        &self,
        board: &Board,
        use_legal: Bitboard,
        budget: SearchBudget,
        use_book: bool,
        show_log: bool,
        stop: &StopSignal,
        allow_preanalysis: bool,
    ) -> SearchResult {
        let legal = board.legal_moves();
        let use_legal = use_legal & legal;
        if use_legal == 0 {
            return SearchResult::undefined();
        }

        if use_book {
            if let Some(m) = self.lookup_book(board, use_legal) {
                log_at(show_log, format_args!("livro {} valor {}", cell_to_coord(m.0), m.1));
                let mut res = SearchResult::new(m.0, m.1, 0, Selectivity::Exact);
                res.is_book = true;
                return res;
            }
        }

        if popcount(legal) == 1 {
            return self.single_move_result(board, legal);
        }

        match budget {
            SearchBudget::Level(0) => {
                let mut rng = rand::thread_rng();
                let cell = bits(use_legal).choose(&mut rng).unwrap_or(MOVE_NONE);
                let value = self.shared.evaluator.evaluate(board).clamp(-SCORE_MAX, SCORE_MAX);
                SearchResult::new(cell, value, 0, Selectivity::Mpc74)
            }
            SearchBudget::Level(level) => {
                let (is_mid_search, depth, selectivity) = get_level(level, board.n_discs());
                log_at(
                    show_log,
                    format_args!(
                        "nível {} ({} discos): {} depth {}@{}",
                        level,
                        board.n_discs(),
                        if is_mid_search { "mid" } else { "end" },
                        depth,
                        selectivity
                    ),
                );
                let mut res = self.tree_search(board, use_legal, depth, selectivity, show_log, stop);
                if res.is_valid() {
                    res.level = Some(level);
                }
                res
            }
            SearchBudget::Depth { depth, selectivity } => {
                self.tree_search(board, use_legal, depth, selectivity, show_log, stop)
            }
            SearchBudget::Time(limit) => self.time_search(board, use_legal, limit, show_log, stop),
            SearchBudget::Clock(remaining) => {
                let limit = calc_time_limit(board, remaining, &self.config.time);
                log_at(show_log, format_args!("tempo para esta jogada: {} ms", limit.as_millis()));
                let mut main_limit = limit;
                if allow_preanalysis && should_run_preanalysis(board, remaining, &self.config.time) {
                    let spent = self.self_play_preanalysis(board, use_legal, limit, show_log, stop);
                    main_limit = limit.saturating_sub(spent).max(Duration::from_millis(1));
                }
                self.time_search(board, use_legal, main_limit, show_log, stop)
            }
        }
    }

    fn lookup_book(&self, board: &Board, use_legal: Bitboard) -> Option<(u8, i32)> {
        if let Some(m) = self.book.lookup_best(board, self.config.book_accuracy_level) {
            if (use_legal >> m.cell) & 1 == 1 {
                return Some((m.cell, m.value));
            }
        }
        self.book
            .lookup_all(board)
            .into_iter()
            .filter(|m| (use_legal >> m.cell) & 1 == 1)
            .max_by_key(|m| m.value)
            .map(|m| (m.cell, m.value))
    }

    /// Uma só jogada legal: devolvida sem busca
    fn single_move_result(&self, board: &Board, legal: Bitboard) -> SearchResult {
        let cell = first_cell(legal);
        let child = board.move_copy(&board.calc_flip(cell));
        if child.is_game_over() {
            let mut res = SearchResult::new(cell, -child.end_score(), 1, Selectivity::Exact);
            res.is_end_search = true;
            return res;
        }
        let value = -self.shared.evaluator.evaluate(&child).clamp(-SCORE_MAX, SCORE_MAX);
        SearchResult::new(cell, value, 1, Selectivity::Exact)
    }

    fn lazy_smp<'a>(
        &self,
        board: &Board,
        use_legal: Bitboard,
        clogs: &'a [ClogResult],
        show_log: bool,
        stop: &StopSignal,
    ) -> LazySmp<'a> {
        LazySmp {
            board: *board,
            shared: Arc::clone(&self.shared),
            clogs,
            use_legal,
            use_multi_thread: self.config.use_multi_thread,
            helper_max_main_depth: self.config.lazy_smp_max_main_depth,
            show_log,
            stop: stop.clone(),
        }
    }

    /// Profundidade e seletividade fixas
    fn tree_search(
        &self,
        board: &Board,
        use_legal: Bitboard,
        depth: i32,
        selectivity: Selectivity,
        show_log: bool,
        stop: &StopSignal,
    ) -> SearchResult {
        let depth = depth.clamp(1, board.n_empties() as i32);
        let mut clogs = Vec::new();
        let mut clog_nodes = 0;
        let clog_start = Instant::now();
        if !selectivity.is_exact() {
            (clogs, clog_nodes) = first_clog_search(board, use_legal);
            for clog in &clogs {
                log_at(show_log, format_args!("clog {} valor {}", cell_to_coord(clog.pos), clog.value));
            }
        }
        let clog_time = clog_start.elapsed();

        let mut res = self
            .lazy_smp(board, use_legal, &clogs, show_log, stop)
            .search_fixed(depth, selectivity);
        res.clog_nodes = clog_nodes;
        res.clog_time = clog_time;
        res
    }

    fn time_search(
        &self,
        board: &Board,
        use_legal: Bitboard,
        limit: Duration,
        show_log: bool,
        stop: &StopSignal,
    ) -> SearchResult {
        let clog_start = Instant::now();
        let (clogs, clog_nodes) = first_clog_search(board, use_legal);
        let clog_time = clog_start.elapsed();

        let mut res = self
            .lazy_smp(board, use_legal, &clogs, show_log, stop)
            .search_time_limit(limit.saturating_sub(clog_time), &self.config.time);
        res.clog_nodes = clog_nodes;
        res.clog_time = clog_time;
        if res.is_valid() {
            res.level = Some(level_from_depth_selectivity(board.n_discs(), res.depth, res.selectivity));
        }
        res
    }

    // ========================================================================
    // PRÉ-ANÁLISE POR SELF-PLAY
    // ========================================================================

    /// Joga linhas curtas a partir dos melhores candidatos para aquecer a TT.
    /// Devolve o tempo gasto.
    fn self_play_preanalysis(
        &self,
        board: &Board,
        use_legal: Bitboard,
        limit: Duration,
        show_log: bool,
        stop: &StopSignal,
    ) -> Duration {
        let start = Instant::now();
        let budget = limit.mul_f64(self.config.time.preanalysis_fraction);
        let flag = SearchFlag::new();
        let (done_tx, done_rx) = channel::bounded::<()>(0);

        let outcome = crossbeam::scope(|s| {
            let watchdog_flag = flag.clone();
            s.spawn(move |_| {
                if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(budget) {
                    watchdog_flag.cancel();
                }
            });

            let candidates = self.shallow_candidates(board, use_legal);
            let level = SearchBudget::Level(self.config.time.preanalysis_level);
            let mut n_moves = 0;
            for &cell in candidates.iter().take(self.config.time.preanalysis_candidates) {
                let mut line = board.move_copy(&board.calc_flip(cell));
                for _ in 0..SELF_PLAY_MAX_PLIES {
                    if !flag.is_active() || !stop.is_searching() || line.is_game_over() {
                        break;
                    }
                    let res = self.search_core(&line, line.legal_moves(), level, false, false, &flag, false);
                    if !res.is_valid() {
                        break;
                    }
                    if res.best_move == MOVE_PASS {
                        line.pass();
                    } else {
                        line = line.move_copy(&line.calc_flip(res.best_move));
                    }
                    n_moves += 1;
                }
            }
            drop(done_tx);
            n_moves
        });

        let spent = start.elapsed();
        match outcome {
            Ok(n_moves) => log_at(
                show_log,
                format_args!("pré-análise: {} lances em {} ms", n_moves, spent.as_millis()),
            ),
            Err(_) => log::error!("pré-análise terminou em pânico"),
        }
        spent
    }

    /// Jogadas ordenadas por uma busca rasa
    fn shallow_candidates(&self, board: &Board, use_legal: Bitboard) -> Vec<u8> {
        let stop = StopSignal::new(self.global.clone(), SearchFlag::new());
        let mut scored: Vec<(i32, u8)> = bits(board.legal_moves() & use_legal)
            .map(|cell| {
                let child = board.move_copy(&board.calc_flip(cell));
                let mut search = Search::new(child, Selectivity::Exact, false, Arc::clone(&self.shared));
                let v = -nega_scout(&mut search, -SCORE_MAX, SCORE_MAX, 2, false, None, false, &stop);
                (v, cell)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, cell)| cell).collect()
    }

    // ========================================================================
    // SUGESTÕES, ACEITAR PERDA, PONDER
    // ========================================================================

    /// As `n` melhores jogadas, por ordem, com buscas sucessivas sem a melhor anterior
    pub fn hint(&self, board: &Board, budget: SearchBudget, n: usize) -> Vec<SearchResult> {
        let mut results = Vec::with_capacity(n);
        if board.legal_moves() == 0 {
            results.push(self.search(board, budget, false, false));
            return results;
        }
        let mut use_legal = board.legal_moves();
        while results.len() < n && use_legal != 0 {
            let res = self.search_with_legal_subset(board, use_legal, budget, false, false);
            if !res.is_valid() || res.best_move >= MOVE_PASS {
                break;
            }
            use_legal &= !(1u64 << res.best_move);
            results.push(res);
        }
        results
    }

    /// Escolhe ao acaso entre as jogadas a no máximo `max_loss` da melhor
    pub fn accept_loss_move(&self, board: &Board, level: u8, max_loss: i32) -> SearchResult {
        let start = Instant::now();
        let legal = board.legal_moves();
        if legal == 0 {
            return self.search(board, SearchBudget::Level(level), true, false);
        }

        let mut nodes = 0;
        let moves: Vec<(i32, u8)> = bits(legal)
            .filter_map(|cell| {
                let child = board.move_copy(&board.calc_flip(cell));
                let res = self.search(&child, SearchBudget::Level(level), true, false);
                nodes += res.nodes;
                res.is_valid().then_some((-res.value, cell))
            })
            .collect();
        let Some(best) = moves.iter().map(|m| m.0).max() else {
            return SearchResult::undefined();
        };

        let acceptable: Vec<(i32, u8)> = moves.into_iter().filter(|m| m.0 >= best - max_loss).collect();
        let Some(&(value, cell)) = acceptable.choose(&mut rand::thread_rng()) else {
            return SearchResult::undefined();
        };
        let mut res = SearchResult::new(cell, value, 1, Selectivity::Exact);
        res.is_end_search = board.n_empties() == 1;
        res.nodes = nodes;
        res.elapsed = start.elapsed();
        res
    }

    /// Analisa todas as jogadas em paralelo, aprofundando até `flag` ser cancelada
    /// ou até `ponder_max_depth`. Devolve as jogadas ordenadas por valor.
    pub fn ponder(&self, board: &Board, flag: &SearchFlag) -> Vec<PonderMove> {
        let stop = StopSignal::new(self.global.clone(), flag.clone());
        let max_depth = board.n_empties() as i32;
        let mut moves: Vec<PonderMove> = bits(board.legal_moves())
            .map(|cell| PonderMove {
                cell,
                value: SCORE_UNDEFINED,
                depth: 0,
                confidence: 0,
            })
            .collect();
        if moves.is_empty() || max_depth == 0 {
            return moves;
        }

        let mut depth = 1;
        let mut selectivity = Selectivity::Exact;
        while stop.is_searching() && depth <= self.config.ponder_max_depth {
            let is_end_search = depth == max_depth;
            let results: Vec<Option<i32>> = moves
                .par_iter()
                .map(|m| {
                    let child = board.move_copy(&board.calc_flip(m.cell));
                    if child.is_game_over() {
                        return Some(-child.end_score());
                    }
                    let mut search = Search::new(child, selectivity, false, Arc::clone(&self.shared));
                    let v = nega_scout(&mut search, -SCORE_MAX, SCORE_MAX, depth - 1, false, None, is_end_search, &stop);
                    (v != SCORE_UNDEFINED && stop.is_searching()).then_some(-v)
                })
                .collect();

            // Profundidade interrompida: fica a anterior
            if results.iter().any(Option::is_none) {
                break;
            }
            for (m, v) in moves.iter_mut().zip(results) {
                m.value = v.unwrap_or(m.value);
                m.depth = depth;
                m.confidence = selectivity.percentage();
            }
            log::debug!("ponder depth {}@{} concluído", depth, selectivity);

            match next_timed_pass(depth, selectivity, max_depth) {
                Some((d, s)) => {
                    depth = d;
                    selectivity = s;
                }
                None => break,
            }
        }

        moves.sort_by(|a, b| b.value.cmp(&a.value));
        moves
    }

    // ========================================================================
    // CONTROLO
    // ========================================================================

    /// Limpa a tabela de transposição
    pub fn clear_cache(&self) {
        self.shared.tt.reset();
        log::info!("tabela de transposição limpa");
    }

    /// Para todas as buscas em curso e futuras até `resume`
    pub fn stop_all(&self) {
        self.global.cancel();
    }

    pub fn resume(&self) {
        self.global.resume();
    }

    /// Tempo que `Clock(remaining)` daria a esta posição
    pub fn time_budget(&self, board: &Board, remaining: Duration) -> Duration {
        calc_time_limit(board, remaining, &self.config.time)
    }
}

#[inline]
fn first_cell(legal: Bitboard) -> u8 {
    legal.trailing_zeros() as u8
}

fn log_at(show_log: bool, args: std::fmt::Arguments) {
    if show_log {
        log::info!("{}", args);
    } else {
        log::debug!("{}", args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::book::{MemoryBook, NoBook};
    use crate::search::evaluation::PositionalEvaluator;

    fn engine() -> Engine {
        Engine::new(
            EngineConfig::single_thread(),
            Arc::new(PositionalEvaluator),
            Arc::new(NoBook),
        )
        .unwrap()
    }

    #[test]
    fn test_opening_level_search() {
        let engine = engine();
        let board = Board::initial();
        let res = engine.search(&board, SearchBudget::Level(3), false, false);
        assert!(res.is_valid());
        assert!(board.is_legal(res.best_move));
        assert_eq!(res.depth, 3);
        assert!(!res.is_end_search);
    }

    #[test]
    fn test_level_zero_is_random_legal() {
        let engine = engine();
        let board = Board::initial();
        for _ in 0..8 {
            let res = engine.search(&board, SearchBudget::Level(0), false, false);
            assert!(board.is_legal(res.best_move));
            assert_eq!(res.depth, 0);
        }
    }

    #[test]
    fn test_book_move_is_used() {
        let mut book = MemoryBook::new();
        let board = Board::initial();
        book.insert(board, coord_to_cell("f5").unwrap(), 0);
        let engine = Engine::new(
            EngineConfig::single_thread(),
            Arc::new(PositionalEvaluator),
            Arc::new(book),
        )
        .unwrap();

        let res = engine.search(&board, SearchBudget::Level(5), true, false);
        assert!(res.is_book);
        assert_eq!(res.best_move, coord_to_cell("f5").unwrap());

        let res = engine.search(&board, SearchBudget::Level(5), false, false);
        assert!(!res.is_book);
    }

    #[test]
    fn test_accept_loss_on_last_empty_is_end_search() {
        // Só a1 vazia: pretas jogam a1, viram b1 e ficam com o tabuleiro todo
        let s = String::from("-OX") + &"X".repeat(61) + " X";
        let board: Board = s.parse().unwrap();
        let res = engine().accept_loss_move(&board, 5, 0);
        assert_eq!(res.best_move, 0);
        assert_eq!(res.value, 64);
        assert!(res.is_end_search);
    }

    #[test]
    fn test_stopped_engine_returns_undefined() {
        let engine = engine();
        engine.stop_all();
        let res = engine.search(&Board::initial(), SearchBudget::Level(5), false, false);
        assert!(!res.is_valid());
        engine.resume();
        let res = engine.search(&Board::initial(), SearchBudget::Level(2), false, false);
        assert!(res.is_valid());
    }
}
