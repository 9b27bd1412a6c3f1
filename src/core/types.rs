// Ficheiro: src/core/types.rs
// Descrição: Tipos e constantes fundamentais do jogo e da busca.

use std::fmt;

// Um Bitboard é um inteiro de 64 bits sem sinal. Cada bit representa uma casa.
// Bit 0 = a1, Bit 1 = b1, ..., Bit 63 = h8.
pub type Bitboard = u64;

pub const HW: u8 = 8;
pub const HW2: u8 = 64;

// ============================================================================
// SCORES
// ============================================================================

/// Maior diferença de discos possível
pub const SCORE_MAX: i32 = 64;
/// Janela "infinita" usada para inicializar buscas
pub const SCORE_INF: i32 = 100;
/// Sentinela de busca cancelada. Nunca coincide com um valor real nem com o seu negativo.
pub const SCORE_UNDEFINED: i32 = -127;

// ============================================================================
// MOVIMENTOS
// ============================================================================

/// Jogada de passe (ou ausência de jogada legal)
pub const MOVE_PASS: u8 = 64;
/// Nenhuma jogada registada (ex.: entrada vazia da TT)
pub const MOVE_NONE: u8 = 65;

/// Converte índice de casa em coordenada ("a1".."h8").
pub fn cell_to_coord(cell: u8) -> String {
    match cell {
        MOVE_PASS => "pass".to_string(),
        c if c < HW2 => {
            let file = (b'a' + c % HW) as char;
            let rank = (b'1' + c / HW) as char;
            format!("{}{}", file, rank)
        }
        _ => "--".to_string(),
    }
}

/// Converte coordenada ("d3") em índice de casa.
pub fn coord_to_cell(coord: &str) -> Option<u8> {
    let bytes = coord.trim().as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = bytes[0].to_ascii_lowercase();
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Some((rank - b'1') * HW + (file - b'a'))
}

// ============================================================================
// SELETIVIDADE (MPC)
// ============================================================================

/// Nível de confiança do Multi-ProbCut. `Exact` desliga a poda probabilística.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Selectivity {
    Mpc74,
    Mpc88,
    Mpc93,
    Mpc98,
    Mpc99,
    Exact,
}

impl Selectivity {
    pub const ALL: [Selectivity; 6] = [
        Selectivity::Mpc74,
        Selectivity::Mpc88,
        Selectivity::Mpc93,
        Selectivity::Mpc98,
        Selectivity::Mpc99,
        Selectivity::Exact,
    ];

    /// Probabilidade (em %) de o resultado coincidir com a busca exata
    pub fn percentage(self) -> u8 {
        match self {
            Selectivity::Mpc74 => 74,
            Selectivity::Mpc88 => 88,
            Selectivity::Mpc93 => 93,
            Selectivity::Mpc98 => 98,
            Selectivity::Mpc99 => 99,
            Selectivity::Exact => 100,
        }
    }

    /// z-score usado quando a busca rasa tem profundidade 0
    pub fn mpct_single(self) -> f64 {
        match self {
            Selectivity::Mpc74 => 1.13,
            Selectivity::Mpc88 => 1.55,
            Selectivity::Mpc93 => 1.81,
            Selectivity::Mpc98 => 2.32,
            Selectivity::Mpc99 => 2.57,
            Selectivity::Exact => 9.99,
        }
    }

    /// z-score usado com busca de verificação
    pub fn mpct_multi(self) -> f64 {
        match self {
            Selectivity::Mpc74 => 0.75,
            Selectivity::Mpc88 => 1.21,
            Selectivity::Mpc93 => 1.49,
            Selectivity::Mpc98 => 2.05,
            Selectivity::Mpc99 => 2.32,
            Selectivity::Exact => 9.99,
        }
    }

    pub fn is_exact(self) -> bool {
        self == Selectivity::Exact
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Selectivity> {
        Self::ALL.get(index as usize).copied()
    }

    /// Próximo nível mais conservador, se existir
    pub fn next(self) -> Option<Selectivity> {
        Self::from_index(self.index() + 1)
    }
}

impl fmt::Display for Selectivity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_conversion() {
        assert_eq!(cell_to_coord(0), "a1");
        assert_eq!(cell_to_coord(19), "d3");
        assert_eq!(cell_to_coord(63), "h8");
        assert_eq!(cell_to_coord(MOVE_PASS), "pass");
        assert_eq!(coord_to_cell("d3"), Some(19));
        assert_eq!(coord_to_cell("H8"), Some(63));
        assert_eq!(coord_to_cell("i1"), None);
        assert_eq!(coord_to_cell("a9"), None);
    }

    #[test]
    fn test_selectivity_order() {
        assert!(Selectivity::Mpc74 < Selectivity::Mpc88);
        assert!(Selectivity::Mpc99 < Selectivity::Exact);
        assert_eq!(Selectivity::Mpc99.next(), Some(Selectivity::Exact));
        assert_eq!(Selectivity::Exact.next(), None);
        for s in Selectivity::ALL {
            assert_eq!(Selectivity::from_index(s.index()), Some(s));
            assert!(s.mpct_multi() <= s.mpct_single());
        }
    }

    #[test]
    fn test_undefined_sentinel_is_out_of_range() {
        assert!(SCORE_UNDEFINED < -SCORE_INF);
        assert!(-SCORE_UNDEFINED > SCORE_INF);
    }
}
