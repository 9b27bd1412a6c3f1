// Tabela de transposição concorrente, sem locks.
// Cada entrada cabe num único AtomicU64; o registo é um merge monotónico via CAS.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::core::{Selectivity, MOVE_NONE, SCORE_MAX, SCORE_UNDEFINED};

/// Entradas por cluster
const CLUSTER_SIZE: usize = 2;
const MIN_CLUSTERS: usize = 1 << 10;

// Layout da palavra (LSB -> MSB):
// key16 | lower i8 | upper i8 | depth | selectivity | best_move | date
const KEY_SHIFT: u32 = 48;

/// Entrada descompactada
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TTEntry {
    pub key16: u16,
    pub lower: i32,
    pub upper: i32,
    pub depth: i32,
    pub selectivity: Selectivity,
    pub best_move: u8,
    pub date: u8,
}

impl TTEntry {
    #[inline]
    fn pack(&self) -> u64 {
        (self.key16 as u64)
            | ((self.lower as i8 as u8 as u64) << 16)
            | ((self.upper as i8 as u8 as u64) << 24)
            | ((self.depth as u8 as u64) << 32)
            | ((self.selectivity.index() as u64) << 40)
            | ((self.best_move as u64) << 48)
            | ((self.date as u64) << 56)
    }

    #[inline]
    fn unpack(data: u64) -> Option<TTEntry> {
        let date = (data >> 56) as u8;
        if date == 0 {
            return None;
        }
        Some(TTEntry {
            key16: data as u16,
            lower: (data >> 16) as u8 as i8 as i32,
            upper: (data >> 24) as u8 as i8 as i32,
            depth: ((data >> 32) & 0xFF) as i32,
            selectivity: Selectivity::from_index(((data >> 40) & 0xFF) as u8)?,
            best_move: (data >> 48) as u8,
            date,
        })
    }

    /// Força da entrada: profundidade primeiro, depois seletividade
    #[inline]
    fn strength(&self) -> (i32, Selectivity) {
        (self.depth, self.selectivity)
    }
}

#[inline]
fn key16(hash: u64) -> u16 {
    (hash >> KEY_SHIFT) as u16
}

/// Transposition Table partilhada entre todas as threads de busca
pub struct TranspositionTable {
    entries: Vec<AtomicU64>,
    n_clusters: usize,
    date: AtomicU8,
    probes: AtomicU64,
    hits: AtomicU64,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let wanted = bytes / (std::mem::size_of::<AtomicU64>() * CLUSTER_SIZE);
        // Potência de 2 para indexar com máscara
        let mut n_clusters = MIN_CLUSTERS;
        while n_clusters * 2 <= wanted {
            n_clusters *= 2;
        }

        let entries = (0..n_clusters * CLUSTER_SIZE).map(|_| AtomicU64::new(0)).collect();

        TranspositionTable {
            entries,
            n_clusters,
            date: AtomicU8::new(1),
            probes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    #[inline]
    fn cluster(&self, hash: u64) -> &[AtomicU64] {
        let start = (hash as usize & (self.n_clusters - 1)) * CLUSTER_SIZE;
        &self.entries[start..start + CLUSTER_SIZE]
    }

    #[inline]
    fn find(&self, hash: u64) -> Option<TTEntry> {
        let key = key16(hash);
        self.cluster(hash)
            .iter()
            .filter_map(|slot| TTEntry::unpack(slot.load(Ordering::Relaxed)))
            .find(|e| e.key16 == key)
    }

    /// Limites conhecidos para (depth, selectivity) ou mais forte.
    /// Sem entrada válida devolve a janela completa.
    pub fn get_bounds(&self, hash: u64, depth: i32, selectivity: Selectivity) -> (i32, i32) {
        self.probes.fetch_add(1, Ordering::Relaxed);
        match self.find(hash) {
            Some(e) if e.depth >= depth && e.selectivity >= selectivity => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                (e.lower, e.upper)
            }
            _ => (-SCORE_MAX, SCORE_MAX),
        }
    }

    /// Melhor jogada guardada, independentemente da profundidade
    pub fn get_best_move(&self, hash: u64) -> Option<u8> {
        self.find(hash)
            .map(|e| e.best_move)
            .filter(|&m| m != MOVE_NONE)
    }

    /// Regista o resultado de uma busca com janela (alpha, beta).
    /// value <= alpha: limite superior; value >= beta: limite inferior; senão exato.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        hash: u64,
        depth: i32,
        selectivity: Selectivity,
        alpha: i32,
        beta: i32,
        value: i32,
        best_move: u8,
    ) {
        if value == SCORE_UNDEFINED || depth < 0 {
            return;
        }
        let value = value.clamp(-SCORE_MAX, SCORE_MAX);
        let (lower, upper) = if value <= alpha {
            (-SCORE_MAX, value)
        } else if value >= beta {
            (value, SCORE_MAX)
        } else {
            (value, value)
        };

        let date = self.date.load(Ordering::Relaxed);
        let fresh = TTEntry {
            key16: key16(hash),
            lower,
            upper,
            depth: depth.min(u8::MAX as i32),
            selectivity,
            best_move,
            date,
        };

        let cluster = self.cluster(hash);

        // Mesma posição já presente: merge
        for slot in cluster {
            let mut current = slot.load(Ordering::Relaxed);
            loop {
                let existing = match TTEntry::unpack(current) {
                    Some(e) if e.key16 == fresh.key16 => e,
                    _ => break,
                };
                let merged = match Self::merge(&existing, &fresh) {
                    Some(m) => m,
                    None => return,
                };
                match slot.compare_exchange_weak(
                    current,
                    merged.pack(),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => return,
                    Err(actual) => current = actual,
                }
            }
        }

        // Substituição: vazia, depois antiga, depois a mais fraca
        let mut victim: Option<(&AtomicU64, u64, Option<TTEntry>)> = None;
        for slot in cluster {
            let data = slot.load(Ordering::Relaxed);
            let entry = TTEntry::unpack(data);
            let better = match (&victim, entry) {
                (None, _) => true,
                (Some((_, _, Some(_))), None) => true,
                (Some((_, _, None)), _) => false,
                (Some((_, _, Some(v))), Some(e)) => {
                    let v_stale = v.date != date;
                    let e_stale = e.date != date;
                    (e_stale && !v_stale) || (e_stale == v_stale && e.strength() < v.strength())
                }
            };
            if better {
                victim = Some((slot, data, entry));
            }
        }

        if let Some((slot, data, entry)) = victim {
            let replace = match entry {
                None => true,
                Some(e) => e.date != date || fresh.strength() >= e.strength(),
            };
            if replace {
                // Se outra thread escreveu entretanto, mantém a escrita dela
                let _ = slot.compare_exchange(data, fresh.pack(), Ordering::AcqRel, Ordering::Relaxed);
            }
        }
    }

    /// Combina uma entrada existente com um novo resultado da mesma posição.
    /// `None` significa que a entrada existente é mais forte e fica como está.
    fn merge(existing: &TTEntry, fresh: &TTEntry) -> Option<TTEntry> {
        if fresh.strength() > existing.strength() {
            return Some(*fresh);
        }
        if fresh.strength() < existing.strength() {
            if existing.date == fresh.date {
                return None;
            }
            // Renova a data para não ser tratada como antiga
            return Some(TTEntry { date: fresh.date, ..*existing });
        }

        // Cada lado guardado fica se não contradisser o resultado novo
        // (limites incompatíveis só surgem com poda probabilística)
        let lower = if existing.lower <= fresh.upper {
            existing.lower.max(fresh.lower)
        } else {
            fresh.lower
        };
        let upper = if existing.upper >= fresh.lower {
            existing.upper.min(fresh.upper)
        } else {
            fresh.upper
        };
        let best_move = if fresh.best_move != MOVE_NONE {
            fresh.best_move
        } else {
            existing.best_move
        };
        Some(TTEntry {
            lower,
            upper,
            best_move,
            date: fresh.date,
            ..*existing
        })
    }

    /// Nova busca: as entradas antigas passam a ser substituíveis
    pub fn new_search(&self) {
        let next = match self.date.load(Ordering::Relaxed).wrapping_add(1) {
            0 => 1,
            d => d,
        };
        self.date.store(next, Ordering::Relaxed);
    }

    /// Limpa toda a tabela (novo jogo / limpeza de cache)
    pub fn reset(&self) {
        for slot in &self.entries {
            slot.store(0, Ordering::Relaxed);
        }
        self.date.store(1, Ordering::Relaxed);
        self.probes.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Ocupação por mil, por amostragem das primeiras entradas
    pub fn hashfull(&self) -> u32 {
        let date = self.date.load(Ordering::Relaxed);
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample]
            .iter()
            .filter_map(|slot| TTEntry::unpack(slot.load(Ordering::Relaxed)))
            .filter(|e| e.date == date)
            .count();
        (used * 1000 / sample.max(1)) as u32
    }

    pub fn hit_rate(&self) -> f64 {
        let probes = self.probes.load(Ordering::Relaxed);
        if probes == 0 {
            0.0
        } else {
            self.hits.load(Ordering::Relaxed) as f64 / probes as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: u64 = 0xDEAD_BEEF_1234_5678;

    #[test]
    fn test_empty_table_returns_full_window() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.get_bounds(H, 0, Selectivity::Mpc74), (-SCORE_MAX, SCORE_MAX));
        assert_eq!(tt.get_best_move(H), None);
    }

    #[test]
    fn test_bound_classification() {
        let tt = TranspositionTable::new(1);
        tt.register(H, 5, Selectivity::Exact, -10, 10, -12, 3);
        assert_eq!(tt.get_bounds(H, 5, Selectivity::Exact), (-SCORE_MAX, -12));

        let tt = TranspositionTable::new(1);
        tt.register(H, 5, Selectivity::Exact, -10, 10, 14, 3);
        assert_eq!(tt.get_bounds(H, 5, Selectivity::Exact), (14, SCORE_MAX));

        let tt = TranspositionTable::new(1);
        tt.register(H, 5, Selectivity::Exact, -10, 10, 4, 3);
        assert_eq!(tt.get_bounds(H, 5, Selectivity::Exact), (4, 4));
        assert_eq!(tt.get_best_move(H), Some(3));
    }

    #[test]
    fn test_bounds_only_valid_for_deeper_or_more_selective() {
        let tt = TranspositionTable::new(1);
        tt.register(H, 6, Selectivity::Mpc88, -64, 64, 8, 10);
        assert_eq!(tt.get_bounds(H, 6, Selectivity::Mpc88), (8, 8));
        assert_eq!(tt.get_bounds(H, 4, Selectivity::Mpc74), (8, 8));
        assert_eq!(tt.get_bounds(H, 7, Selectivity::Mpc88), (-SCORE_MAX, SCORE_MAX));
        assert_eq!(tt.get_bounds(H, 6, Selectivity::Exact), (-SCORE_MAX, SCORE_MAX));
    }

    #[test]
    fn test_merge_tightens_same_depth() {
        let tt = TranspositionTable::new(1);
        tt.register(H, 8, Selectivity::Exact, 0, 1, 5, 20); // lower 5
        tt.register(H, 8, Selectivity::Exact, 9, 10, 7, MOVE_NONE); // upper 7
        assert_eq!(tt.get_bounds(H, 8, Selectivity::Exact), (5, 7));
        assert_eq!(tt.get_best_move(H), Some(20));
    }

    #[test]
    fn test_conflicting_bounds_keep_consistent_side() {
        let tt = TranspositionTable::new(1);
        tt.register(H, 8, Selectivity::Mpc88, 0, 1, 5, 20); // lower 5
        tt.register(H, 8, Selectivity::Mpc88, 9, 10, 7, MOVE_NONE); // upper 7
        // Limite superior novo abaixo do inferior guardado: o inferior cai, o superior aperta
        tt.register(H, 8, Selectivity::Mpc88, 3, 4, 3, MOVE_NONE);
        assert_eq!(tt.get_bounds(H, 8, Selectivity::Mpc88), (-SCORE_MAX, 3));
        // A jogada guardada sobrevive a um resultado sem jogada
        assert_eq!(tt.get_best_move(H), Some(20));

        // Valor exato fora dos limites guardados
        tt.register(H, 8, Selectivity::Mpc88, -64, 64, 12, MOVE_NONE);
        assert_eq!(tt.get_bounds(H, 8, Selectivity::Mpc88), (12, 12));
        assert_eq!(tt.get_best_move(H), Some(20));
    }

    #[test]
    fn test_weaker_write_does_not_overwrite() {
        let tt = TranspositionTable::new(1);
        tt.register(H, 10, Selectivity::Exact, -64, 64, 6, 1);
        tt.register(H, 3, Selectivity::Exact, -64, 64, -30, 2);
        tt.register(H, 10, Selectivity::Mpc74, -64, 64, -30, 2);
        assert_eq!(tt.get_bounds(H, 10, Selectivity::Exact), (6, 6));
        assert_eq!(tt.get_best_move(H), Some(1));
    }

    #[test]
    fn test_undefined_value_is_ignored() {
        let tt = TranspositionTable::new(1);
        tt.register(H, 4, Selectivity::Exact, -64, 64, SCORE_UNDEFINED, 1);
        assert_eq!(tt.get_bounds(H, 0, Selectivity::Mpc74), (-SCORE_MAX, SCORE_MAX));
    }

    #[test]
    fn test_reset_and_aging() {
        let tt = TranspositionTable::new(1);
        tt.register(H, 4, Selectivity::Exact, -64, 64, 2, 1);
        assert!(tt.hashfull() <= 1000);
        tt.new_search();
        // Entrada antiga ainda é legível
        assert_eq!(tt.get_bounds(H, 4, Selectivity::Exact), (2, 2));
        tt.reset();
        assert_eq!(tt.get_bounds(H, 4, Selectivity::Exact), (-SCORE_MAX, SCORE_MAX));
    }

    #[test]
    fn test_concurrent_registration_is_monotonic() {
        use std::sync::Arc;
        let tt = Arc::new(TranspositionTable::new(1));
        tt.register(H, 20, Selectivity::Exact, -64, 64, 0, 5);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tt = Arc::clone(&tt);
                std::thread::spawn(move || {
                    for d in 0..20 {
                        tt.register(H, d, Selectivity::Exact, -64, 64, t * 3 - 5, 9);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tt.get_bounds(H, 20, Selectivity::Exact), (0, 0));
    }
}
