// Ficheiro: src/search/evaluation.rs
// Descrição: Contrato do avaliador estático e avaliadores simples (posicional e de discos).

use crate::core::*;
use crate::intrinsics::{bits, popcount};

/// Avaliação estática, em discos, do ponto de vista de quem joga.
/// Tem de ser determinística e rápida: é chamada em todas as folhas.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, board: &Board) -> i32;
}

impl<F> Evaluator for F
where
    F: Fn(&Board) -> i32 + Send + Sync,
{
    fn evaluate(&self, board: &Board) -> i32 {
        self(board)
    }
}

// Tabela posicional clássica (simétrica nas 8 simetrias do tabuleiro)
#[rustfmt::skip]
const CELL_WEIGHT: [i32; 64] = [
    100, -25,  10,   5,   5,  10, -25, 100,
    -25, -50,  -2,  -2,  -2,  -2, -50, -25,
     10,  -2,   1,   1,   1,   1,  -2,  10,
      5,  -2,   1,   0,   0,   1,  -2,   5,
      5,  -2,   1,   0,   0,   1,  -2,   5,
     10,  -2,   1,   1,   1,   1,  -2,  10,
    -25, -50,  -2,  -2,  -2,  -2, -50, -25,
    100, -25,  10,   5,   5,  10, -25, 100,
];

const MOBILITY_WEIGHT: i32 = 8;
const SCALE: i32 = 10;

/// Avaliador simples: peso posicional + mobilidade
#[derive(Debug, Default, Clone, Copy)]
pub struct PositionalEvaluator;

impl PositionalEvaluator {
    fn weight(bb: Bitboard) -> i32 {
        bits(bb).map(|cell| CELL_WEIGHT[cell as usize]).sum()
    }
}

impl Evaluator for PositionalEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        let positional = Self::weight(board.player) - Self::weight(board.opponent);
        let mobility = popcount(board.legal_moves()) as i32
            - popcount(calc_legal(board.opponent, board.player)) as i32;
        let raw = positional + MOBILITY_WEIGHT * mobility;
        (raw / SCALE).clamp(-SCORE_MAX, SCORE_MAX)
    }
}

/// Diferença de discos pura
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscEvaluator;

impl Evaluator for DiscEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        board.disc_diff()
    }
}
