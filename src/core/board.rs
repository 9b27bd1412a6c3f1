// Ficheiro: src/core/board.rs
// Descrição: Tabuleiro de Othello em bitboards (jogador a mover / adversário),
// geração de jogadas legais, aplicação e reversão de jogadas.

use std::fmt;
use std::str::FromStr;

use super::types::*;
use super::zobrist::zobrist_keys;
use crate::error::{EngineError, Result};
use crate::intrinsics::{bits, popcount};

/// Exclui as colunas a e h (evita "wrap" nos deslocamentos horizontais e diagonais)
const MASK_INNER_COLS: Bitboard = 0x7E7E_7E7E_7E7E_7E7E;

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Discos capturados por uma jogada, mais a casa jogada.
/// Serve tanto para aplicar como para desfazer a jogada.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flip {
    pub pos: u8,
    pub flip: Bitboard,
}

impl Flip {
    #[inline]
    pub fn new(pos: u8, flip: Bitboard) -> Self {
        Flip { pos, flip }
    }
}

// A struct principal do tabuleiro. Sempre do ponto de vista de quem joga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    pub player: Bitboard,
    pub opponent: Bitboard,
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl Board {
    pub fn new(player: Bitboard, opponent: Bitboard) -> Self {
        debug_assert_eq!(player & opponent, 0, "bitboards sobrepostos");
        Board { player, opponent }
    }

    /// Posição inicial, pretas a jogar.
    pub fn initial() -> Self {
        // d4 e e5 brancas, e4 e d5 pretas
        Board {
            player: (1u64 << 28) | (1u64 << 35),
            opponent: (1u64 << 27) | (1u64 << 36),
        }
    }

    // ========================================================================
    // GERAÇÃO DE JOGADAS
    // ========================================================================

    #[inline]
    pub fn legal_moves(&self) -> Bitboard {
        calc_legal(self.player, self.opponent)
    }

    #[inline]
    pub fn calc_flip(&self, pos: u8) -> Flip {
        Flip::new(pos, calc_flip(self.player, self.opponent, pos))
    }

    #[inline]
    pub fn is_legal(&self, pos: u8) -> bool {
        pos < HW2 && (self.legal_moves() >> pos) & 1 == 1
    }

    // ========================================================================
    // APLICAÇÃO / REVERSÃO
    // ========================================================================

    /// Aplica a jogada e passa a vez. `flip` tem de vir de `calc_flip` nesta posição.
    #[inline]
    pub fn apply(&mut self, flip: &Flip) {
        debug_assert_eq!(self.opponent & flip.flip, flip.flip);
        debug_assert_eq!((self.player | self.opponent) & (1u64 << flip.pos), 0);
        let placed = 1u64 << flip.pos;
        let player = self.player ^ flip.flip ^ placed;
        self.player = self.opponent ^ flip.flip;
        self.opponent = player;
    }

    /// Inverso exato de `apply`.
    #[inline]
    pub fn undo(&mut self, flip: &Flip) {
        let placed = 1u64 << flip.pos;
        debug_assert_ne!(self.opponent & placed, 0, "undo de jogada não aplicada");
        debug_assert_eq!(self.opponent & flip.flip, flip.flip);
        let player = self.opponent ^ flip.flip ^ placed;
        self.opponent = self.player ^ flip.flip;
        self.player = player;
    }

    #[inline]
    pub fn move_copy(&self, flip: &Flip) -> Board {
        let mut next = *self;
        next.apply(flip);
        next
    }

    /// Passa a vez sem colocar disco
    #[inline]
    pub fn pass(&mut self) {
        std::mem::swap(&mut self.player, &mut self.opponent);
    }

    /// Jogada validada, para uso na fronteira (consola, testes, GUI)
    pub fn play_checked(&mut self, pos: u8) -> Result<Flip> {
        if !self.is_legal(pos) {
            return Err(EngineError::IllegalMove(cell_to_coord(pos)));
        }
        let flip = self.calc_flip(pos);
        self.apply(&flip);
        Ok(flip)
    }

    // ========================================================================
    // CONTAGEM / PONTUAÇÃO
    // ========================================================================

    #[inline]
    pub fn n_discs(&self) -> u32 {
        popcount(self.player | self.opponent)
    }

    #[inline]
    pub fn n_empties(&self) -> u32 {
        HW2 as u32 - self.n_discs()
    }

    #[inline]
    pub fn empties(&self) -> Bitboard {
        !(self.player | self.opponent)
    }

    /// Diferença de discos simples, do ponto de vista de quem joga
    #[inline]
    pub fn disc_diff(&self) -> i32 {
        popcount(self.player) as i32 - popcount(self.opponent) as i32
    }

    /// Resultado final: as casas vazias vão para o vencedor
    #[inline]
    pub fn end_score(&self) -> i32 {
        let diff = self.disc_diff();
        let empties = self.n_empties() as i32;
        if diff > 0 {
            diff + empties
        } else if diff < 0 {
            diff - empties
        } else {
            0
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.legal_moves() == 0 && calc_legal(self.opponent, self.player) == 0
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        zobrist_keys().hash(self.player, self.opponent)
    }

    /// Parse de uma posição com cores absolutas.
    /// 64 casas (X/B/* pretas, O/W brancas, -/. vazias) seguidas do lado a jogar.
    pub fn parse(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != HW2 as usize + 1 {
            return Err(EngineError::InvalidBoard(format!(
                "esperados 65 caracteres, encontrados {}",
                chars.len()
            )));
        }

        let mut black = 0u64;
        let mut white = 0u64;
        for (cell, ch) in chars[..HW2 as usize].iter().enumerate() {
            match ch.to_ascii_uppercase() {
                'X' | 'B' | '*' => black |= 1u64 << cell,
                'O' | 'W' => white |= 1u64 << cell,
                '-' | '.' => {}
                other => {
                    return Err(EngineError::InvalidBoard(format!(
                        "casa {} com caractere inválido '{}'",
                        cell_to_coord(cell as u8),
                        other
                    )))
                }
            }
        }

        match chars[HW2 as usize].to_ascii_uppercase() {
            'X' | 'B' | '*' => Ok(Board::new(black, white)),
            'O' | 'W' => Ok(Board::new(white, black)),
            other => Err(EngineError::InvalidBoard(format!(
                "lado a jogar inválido '{}'",
                other
            ))),
        }
    }
}

impl FromStr for Board {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Board::parse(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let legal = self.legal_moves();
        writeln!(f, "  a b c d e f g h")?;
        for rank in 0..HW {
            write!(f, "{}", rank + 1)?;
            for file in 0..HW {
                let bit = 1u64 << (rank * HW + file);
                let c = if self.player & bit != 0 {
                    'X'
                } else if self.opponent & bit != 0 {
                    'O'
                } else if legal & bit != 0 {
                    '*'
                } else {
                    '.'
                };
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "X = a jogar ({} discos), O = adversário ({} discos)",
            popcount(self.player), popcount(self.opponent))
    }
}

// ============================================================================
// FUNÇÕES DE BITBOARD
// ============================================================================

/// Propaga a partir de `p` sobre `mask` nos dois sentidos de uma direção
#[inline(always)]
fn directional_moves(p: Bitboard, mask: Bitboard, dir: u32) -> Bitboard {
    let mut l = mask & (p << dir);
    let mut r = mask & (p >> dir);
    for _ in 0..5 {
        l |= mask & (l << dir);
        r |= mask & (r >> dir);
    }
    (l << dir) | (r >> dir)
}

/// Casas onde `p` captura pelo menos uma linha de `o`
#[inline]
pub fn calc_legal(p: Bitboard, o: Bitboard) -> Bitboard {
    let inner = o & MASK_INNER_COLS;
    let moves = directional_moves(p, inner, 1)
        | directional_moves(p, o, 8)
        | directional_moves(p, inner, 7)
        | directional_moves(p, inner, 9);
    moves & !(p | o)
}

/// Discos de `o` capturados ao jogar em `pos`
pub fn calc_flip(p: Bitboard, o: Bitboard, pos: u8) -> Bitboard {
    let r0 = (pos / HW) as i32;
    let c0 = (pos % HW) as i32;
    let mut flipped = 0u64;

    for &(dr, dc) in DIRECTIONS.iter() {
        let mut line = 0u64;
        let mut r = r0 + dr;
        let mut c = c0 + dc;
        while (0..8).contains(&r) && (0..8).contains(&c) {
            let bit = 1u64 << (r * 8 + c);
            if o & bit != 0 {
                line |= bit;
            } else {
                if p & bit != 0 {
                    flipped |= line;
                }
                break;
            }
            r += dr;
            c += dc;
        }
    }

    flipped
}

/// Todas as jogadas legais como lista de `Flip`
pub fn generate_flips(board: &Board) -> Vec<Flip> {
    bits(board.legal_moves()).map(|pos| board.calc_flip(pos)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn legal_by_flips(board: &Board) -> Bitboard {
        let mut legal = 0u64;
        for pos in bits(board.empties()) {
            if calc_flip(board.player, board.opponent, pos) != 0 {
                legal |= 1u64 << pos;
            }
        }
        legal
    }

    #[test]
    fn test_initial_legal_moves() {
        let board = Board::initial();
        let expected = ["d3", "c4", "f5", "e6"]
            .iter()
            .map(|c| 1u64 << coord_to_cell(c).unwrap())
            .fold(0, |acc, b| acc | b);
        assert_eq!(board.legal_moves(), expected);
        assert_eq!(board.n_discs(), 4);
        assert_eq!(board.n_empties(), 60);
    }

    #[test]
    fn test_apply_flips_expected_disc() {
        let mut board = Board::initial();
        let d3 = coord_to_cell("d3").unwrap();
        let flip = board.calc_flip(d3);
        assert_eq!(flip.flip, 1u64 << coord_to_cell("d4").unwrap());
        board.apply(&flip);
        // agora as brancas jogam: 1 disco branco, 4 pretos
        assert_eq!(popcount(board.player), 1);
        assert_eq!(popcount(board.opponent), 4);
    }

    #[test]
    fn test_round_trip_random_games() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut board = Board::initial();
            loop {
                let legal = board.legal_moves();
                assert_eq!(legal, legal_by_flips(&board));
                if legal == 0 {
                    board.pass();
                    if board.legal_moves() == 0 {
                        break;
                    }
                    continue;
                }
                for flip in generate_flips(&board) {
                    let before = board;
                    board.apply(&flip);
                    assert_eq!(board.player & board.opponent, 0);
                    board.undo(&flip);
                    assert_eq!(board, before);
                }
                let moves: Vec<u8> = bits(legal).collect();
                let pos = moves[rng.gen_range(0..moves.len())];
                let flip = board.calc_flip(pos);
                board.apply(&flip);
            }
        }
    }

    #[test]
    fn test_pass_swaps_sides() {
        let mut board = Board::initial();
        let before = board;
        board.pass();
        assert_eq!(board.player, before.opponent);
        assert_eq!(board.opponent, before.player);
        board.pass();
        assert_eq!(board, before);
    }

    #[test]
    fn test_end_score() {
        // Tabuleiro cheio: 40 contra 24
        let player = (1u64 << 40) - 1;
        let board = Board::new(player, !player);
        assert!(board.is_game_over());
        assert_eq!(board.end_score(), 16);

        // Vazias vão para o vencedor
        let board = Board::new(0b111, 0b1000);
        assert_eq!(board.end_score(), 3 - 1 + 60);
        let mut swapped = board;
        swapped.pass();
        assert_eq!(swapped.end_score(), -62);
    }

    #[test]
    fn test_parse_and_display() {
        let s = "---------------------------OX------XO--------------------------- X";
        let board: Board = s.parse().unwrap();
        assert_eq!(board, Board::initial());

        let white: Board = s.replace(" X", " O").parse().unwrap();
        assert_eq!(white.player, Board::initial().opponent);

        assert!(Board::parse("XO").is_err());
        assert!(s.replace('X', "Z").parse::<Board>().is_err());
        assert!(format!("{}", board).contains("a b c d e f g h"));
    }

    #[test]
    fn test_play_checked_rejects_illegal() {
        let mut board = Board::initial();
        assert!(board.play_checked(0).is_err());
        assert!(board.play_checked(coord_to_cell("f5").unwrap()).is_ok());
    }
}
