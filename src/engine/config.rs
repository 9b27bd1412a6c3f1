// Configuração do motor e da gestão de tempo

use crate::error::{EngineError, Result};

/// Parâmetros da gestão de tempo. Todos calibrados empiricamente.
#[derive(Debug, Clone)]
pub struct TimeConfig {
    /// Modelo de crescimento: nós = a * exp(b * profundidade)
    pub node_model_a: f64,
    pub node_model_b: f64,
    /// Nós por segundo assumidos pelo modelo
    pub nps: f64,
    /// Fração do relógio gasta quando a busca completa cabe no tempo
    pub complete_search_fraction: f64,
    /// Reserva fixa por jogada (ms)
    pub per_move_overhead_ms: u64,
    /// Jogadas descontadas às restantes no divisor
    pub remaining_moves_offset: i64,
    pub min_moves_divisor: i64,

    // Paragem antecipada no modo com tempo
    pub early_break_min_depth: i32,
    pub early_break_time_fraction: f64,
    pub early_break_min_nodes: u64,

    // Verificação do segundo melhor lance
    pub verify_min_depth: i32,
    pub verify_margin: i32,
    pub verify_depth_reduction: i32,

    // Pré-análise por self-play
    pub preanalysis_min_remaining_ms: u64,
    pub preanalysis_min_empties: u32,
    pub preanalysis_fraction: f64,
    pub preanalysis_candidates: usize,
    pub preanalysis_level: u8,
}

impl Default for TimeConfig {
    fn default() -> Self {
        TimeConfig {
            node_model_a: 0.5,
            node_model_b: 0.8,
            nps: 1.2e8,
            complete_search_fraction: 0.8,
            per_move_overhead_ms: 200,
            remaining_moves_offset: 5,
            min_moves_divisor: 2,
            early_break_min_depth: 23,
            early_break_time_fraction: 0.35,
            early_break_min_nodes: 100_000_000,
            verify_min_depth: 21,
            verify_margin: 2,
            verify_depth_reduction: 2,
            preanalysis_min_remaining_ms: 30_000,
            preanalysis_min_empties: 34,
            preanalysis_fraction: 0.6,
            preanalysis_candidates: 2,
            preanalysis_level: 11,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub threads: usize,
    pub tt_size_mb: usize,
    pub use_multi_thread: bool,
    pub book_accuracy_level: u32,
    /// Threads auxiliares do Lazy SMP só até esta profundidade principal
    pub lazy_smp_max_main_depth: i32,
    pub use_etc: bool,
    pub use_mpc: bool,
    pub ponder_max_depth: i32,
    pub time: TimeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let threads = num_cpus::get();
        EngineConfig {
            threads,
            tt_size_mb: 64,
            use_multi_thread: threads > 1,
            book_accuracy_level: 0,
            lazy_smp_max_main_depth: 10,
            use_etc: true,
            use_mpc: true,
            ponder_max_depth: 60,
            time: TimeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Configuração de uma só thread (testes, análise determinística)
    pub fn single_thread() -> Self {
        EngineConfig {
            threads: 1,
            use_multi_thread: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(EngineError::InvalidConfig("threads deve ser >= 1".into()));
        }
        if self.tt_size_mb == 0 {
            return Err(EngineError::InvalidConfig("tt_size_mb deve ser >= 1".into()));
        }
        if !(1..=60).contains(&self.ponder_max_depth) {
            return Err(EngineError::InvalidConfig(format!(
                "ponder_max_depth fora de 1..=60: {}",
                self.ponder_max_depth
            )));
        }
        let t = &self.time;
        if t.nps <= 0.0 || t.node_model_a <= 0.0 || t.node_model_b <= 0.0 {
            return Err(EngineError::InvalidConfig("modelo de nós inválido".into()));
        }
        for (name, value) in [
            ("complete_search_fraction", t.complete_search_fraction),
            ("early_break_time_fraction", t.early_break_time_fraction),
            ("preanalysis_fraction", t.preanalysis_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} fora de [0, 1]: {}",
                    name, value
                )));
            }
        }
        if t.min_moves_divisor < 1 {
            return Err(EngineError::InvalidConfig("min_moves_divisor deve ser >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::single_thread().validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = EngineConfig::default();
        config.threads = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.time.preanalysis_fraction = 1.5;
        assert!(config.validate().is_err());
    }
}
