// Estado partilhado e estado por busca

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::*;
use crate::engine::thread_pool::ThreadPool;
use crate::engine::tt::TranspositionTable;
use crate::search::evaluation::Evaluator;

// ============================================================================
// CANCELAMENTO
// ============================================================================

/// Flag "a procurar". Fica a `false` quando a busca deve parar.
#[derive(Clone, Debug)]
pub struct SearchFlag(Arc<AtomicBool>);

impl SearchFlag {
    pub fn new() -> Self {
        SearchFlag(Arc::new(AtomicBool::new(true)))
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Default for SearchFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Flag global do motor mais a cadeia de flags locais
/// (invocação, pontos de divisão do YBWC, passes com tempo).
#[derive(Clone, Debug)]
pub struct StopSignal {
    global: SearchFlag,
    locals: Vec<SearchFlag>,
}

impl StopSignal {
    pub fn new(global: SearchFlag, local: SearchFlag) -> Self {
        StopSignal {
            global,
            locals: vec![local],
        }
    }

    #[inline]
    pub fn is_searching(&self) -> bool {
        self.global.is_active() && self.locals.iter().all(SearchFlag::is_active)
    }

    /// Novo sinal que também para quando `local` for cancelada
    pub fn child(&self, local: SearchFlag) -> StopSignal {
        let mut locals = self.locals.clone();
        locals.push(local);
        StopSignal {
            global: self.global.clone(),
            locals,
        }
    }
}

// ============================================================================
// CONTEXTO DE BUSCA
// ============================================================================

/// Opções que alteram a árvore de busca
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub use_etc: bool,
    pub use_mpc: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            use_etc: true,
            use_mpc: true,
        }
    }
}

/// Tudo o que as threads de busca partilham
pub struct SearchShared {
    pub tt: TranspositionTable,
    pub evaluator: Arc<dyn Evaluator>,
    pub pool: ThreadPool,
    pub options: SearchOptions,
}

/// Estado de uma busca lógica. Cada tarefa paralela tem a sua cópia.
#[derive(Clone)]
pub struct Search {
    pub board: Board,
    pub n_discs: u32,
    pub nodes: u64,
    pub selectivity: Selectivity,
    pub use_multi_thread: bool,
    pub is_presearch: bool,
    pub shared: Arc<SearchShared>,
}

impl Search {
    pub fn new(board: Board, selectivity: Selectivity, use_multi_thread: bool, shared: Arc<SearchShared>) -> Self {
        Search {
            board,
            n_discs: board.n_discs(),
            nodes: 0,
            selectivity,
            use_multi_thread,
            is_presearch: false,
            shared,
        }
    }

    /// Cópia para uma tarefa paralela, com contador de nós próprio
    pub fn fork(&self) -> Search {
        Search {
            nodes: 0,
            ..self.clone()
        }
    }

    #[inline]
    pub fn apply(&mut self, flip: &Flip) {
        self.board.apply(flip);
        self.n_discs += 1;
    }

    #[inline]
    pub fn undo(&mut self, flip: &Flip) {
        self.board.undo(flip);
        self.n_discs -= 1;
    }

    #[inline]
    pub fn pass(&mut self) {
        self.board.pass();
    }

    #[inline]
    pub fn n_empties(&self) -> i32 {
        HW2 as i32 - self.n_discs as i32
    }

    /// Avaliação estática limitada a [-SCORE_MAX, SCORE_MAX]
    #[inline]
    pub fn evaluate(&self) -> i32 {
        self.shared.evaluator.evaluate(&self.board).clamp(-SCORE_MAX, SCORE_MAX)
    }

    #[inline]
    pub fn tt(&self) -> &TranspositionTable {
        &self.shared.tt
    }

    #[inline]
    pub fn options(&self) -> SearchOptions {
        self.shared.options
    }
}

// ============================================================================
// RESULTADO
// ============================================================================

/// Resultado de uma busca de topo. Imutável depois de construído.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Casa 0..63, ou `MOVE_PASS`
    pub best_move: u8,
    pub value: i32,
    pub depth: i32,
    pub selectivity: Selectivity,
    pub elapsed: Duration,
    pub nodes: u64,
    pub is_end_search: bool,
    pub is_book: bool,
    pub clog_nodes: u64,
    pub clog_time: Duration,
    /// Nível equivalente à profundidade e seletividade atingidas
    pub level: Option<u8>,
}

impl SearchResult {
    pub fn new(best_move: u8, value: i32, depth: i32, selectivity: Selectivity) -> Self {
        SearchResult {
            best_move,
            value,
            depth,
            selectivity,
            elapsed: Duration::ZERO,
            nodes: 0,
            is_end_search: false,
            is_book: false,
            clog_nodes: 0,
            clog_time: Duration::ZERO,
            level: None,
        }
    }

    /// Resultado de uma busca que não chegou a completar nenhum passe
    pub fn undefined() -> Self {
        Self::new(MOVE_NONE, SCORE_UNDEFINED, 0, Selectivity::Mpc74)
    }

    pub fn is_valid(&self) -> bool {
        self.value != SCORE_UNDEFINED && self.best_move != MOVE_NONE
    }

    /// Probabilidade (%) de o valor ser o exato
    pub fn probability(&self) -> u8 {
        self.selectivity.percentage()
    }

    pub fn nps(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.nodes as f64 / secs) as u64
        } else {
            0
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_book {
            return write!(f, "book {} value {}", cell_to_coord(self.best_move), self.value);
        }
        write!(
            f,
            "depth {}{}@{} move {} value {} nodes {} time {}ms nps {}",
            self.depth,
            if self.is_end_search { " (end)" } else { "" },
            self.selectivity,
            cell_to_coord(self.best_move),
            self.value,
            self.nodes,
            self.elapsed.as_millis(),
            self.nps()
        )?;
        if let Some(level) = self.level {
            write!(f, " level {}", level)?;
        }
        Ok(())
    }
}
