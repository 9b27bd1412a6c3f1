// Contrato do livro de aberturas. O formato de armazenamento é externo;
// aqui só interessa "jogada/valor para esta posição".

use rand::seq::SliceRandom;
use std::collections::HashMap;

use crate::core::{cell_to_coord, Board};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookMove {
    pub cell: u8,
    pub value: i32,
}

pub trait OpeningBook: Send + Sync {
    /// Uma jogada cujo valor está a no máximo `accuracy_level` do melhor
    fn lookup_best(&self, board: &Board, accuracy_level: u32) -> Option<BookMove>;

    fn lookup_all(&self, board: &Board) -> Vec<BookMove>;
}

/// Livro vazio
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBook;

impl OpeningBook for NoBook {
    fn lookup_best(&self, _board: &Board, _accuracy_level: u32) -> Option<BookMove> {
        None
    }

    fn lookup_all(&self, _board: &Board) -> Vec<BookMove> {
        Vec::new()
    }
}

/// Livro em memória, útil para testes e para livros carregados por outra camada
#[derive(Debug, Default, Clone)]
pub struct MemoryBook {
    entries: HashMap<Board, Vec<BookMove>>,
}

impl MemoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valor do ponto de vista de quem joga em `board`
    pub fn insert(&mut self, board: Board, cell: u8, value: i32) {
        let moves = self.entries.entry(board).or_default();
        match moves.iter_mut().find(|m| m.cell == cell) {
            Some(m) => m.value = value,
            None => moves.push(BookMove { cell, value }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OpeningBook for MemoryBook {
    fn lookup_best(&self, board: &Board, accuracy_level: u32) -> Option<BookMove> {
        let moves = self.entries.get(board)?;
        let legal = board.legal_moves();
        let candidates: Vec<BookMove> = moves
            .iter()
            .copied()
            .filter(|m| (legal >> m.cell) & 1 == 1)
            .collect();
        let best = candidates.iter().map(|m| m.value).max()?;
        let acceptable: Vec<BookMove> = candidates
            .into_iter()
            .filter(|m| best - m.value <= accuracy_level as i32)
            .collect();
        let chosen = acceptable.choose(&mut rand::thread_rng()).copied();
        if let Some(m) = chosen {
            log::debug!("livro: {} valor {}", cell_to_coord(m.cell), m.value);
        }
        chosen
    }

    fn lookup_all(&self, board: &Board) -> Vec<BookMove> {
        let mut moves = self.entries.get(board).cloned().unwrap_or_default();
        moves.sort_by(|a, b| b.value.cmp(&a.value));
        moves
    }
}
