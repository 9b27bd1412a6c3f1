// Hashing Zobrist por bytes para a tabela de transposição
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;

use super::types::Bitboard;

const ZOBRIST_SEED: u64 = 0x0BE1_10DA_5EED_2024;

/// Uma chave por valor de byte para cada um dos 8 bytes de cada bitboard.
pub struct ZobristKeys {
    pub player: [[u64; 256]; 8],
    pub opponent: [[u64; 256]; 8],
}

impl ZobristKeys {
    pub fn new() -> Self {
        let mut keys = ZobristKeys {
            player: [[0; 256]; 8],
            opponent: [[0; 256]; 8],
        };

        // Chaves determinísticas: o mesmo tabuleiro gera o mesmo hash entre execuções
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        for table in keys.player.iter_mut().chain(keys.opponent.iter_mut()) {
            for key in table.iter_mut() {
                *key = rng.gen::<u64>();
            }
            // Byte vazio não contribui para o hash
            table[0] = 0;
        }

        keys
    }

    #[inline]
    pub fn hash(&self, player: Bitboard, opponent: Bitboard) -> u64 {
        let mut h = 0u64;
        for i in 0..8 {
            h ^= self.player[i][((player >> (i * 8)) & 0xFF) as usize];
            h ^= self.opponent[i][((opponent >> (i * 8)) & 0xFF) as usize];
        }
        h
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

static ZOBRIST_KEYS: OnceLock<ZobristKeys> = OnceLock::new();

/// Instância global das chaves Zobrist
pub fn zobrist_keys() -> &'static ZobristKeys {
    ZOBRIST_KEYS.get_or_init(ZobristKeys::new)
}
