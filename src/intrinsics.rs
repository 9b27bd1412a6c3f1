// Sistema de intrinsics para operações de bitboard
// Performance crítica: chamadas em todos os nós da busca

use crate::core::Bitboard;

// ============================================================================
// OPERAÇÕES BÁSICAS
// ============================================================================

/// Conta o número de bits setados (popcount)
#[inline(always)]
pub fn popcount(bb: Bitboard) -> u32 {
    bb.count_ones()
}

/// Índice do bit menos significativo (64 se vazio)
#[inline(always)]
pub fn first_bit(bb: Bitboard) -> u32 {
    bb.trailing_zeros()
}

/// Remove e retorna o LSB
#[inline(always)]
pub fn pop_lsb(bb: &mut Bitboard) -> u32 {
    let lsb_index = bb.trailing_zeros();
    *bb &= bb.wrapping_sub(1);
    lsb_index
}

/// Iterador sobre as casas ocupadas de um bitboard, do LSB para o MSB.
#[derive(Debug, Clone, Copy)]
pub struct BitIter(Bitboard);

impl Iterator for BitIter {
    type Item = u8;

    #[inline(always)]
    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            None
        } else {
            Some(pop_lsb(&mut self.0) as u8)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = popcount(self.0) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitIter {}

#[inline(always)]
pub fn bits(bb: Bitboard) -> BitIter {
    BitIter(bb)
}
