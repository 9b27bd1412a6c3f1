// Níveis de força: nível -> (profundidade, seletividade) em cada fase da partida

use crate::core::*;

pub const N_LEVEL: u8 = 61;

/// Configuração de um nível
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSetting {
    pub mid_depth: i32,
    pub mid_selectivity: Selectivity,
    /// Busca exata quando restam no máximo estas casas vazias
    pub exact_empties: i32,
    /// Busca de final seletiva quando restam no máximo estas casas vazias
    pub selective_empties: i32,
    pub end_selectivity: Selectivity,
}

pub fn level_setting(level: u8) -> LevelSetting {
    let level = level.min(N_LEVEL - 1) as i32;
    let mid_selectivity = match level {
        0..=10 => Selectivity::Exact,
        11..=15 => Selectivity::Mpc88,
        _ => Selectivity::Mpc74,
    };
    let exact_empties = if level <= 10 { level * 2 } else { (20 + (level - 10) / 2).min(30) };
    let (selective_empties, end_selectivity) = match level {
        0..=10 => (exact_empties, Selectivity::Exact),
        11..=20 => (exact_empties + 4, Selectivity::Mpc93),
        21..=30 => (exact_empties + 6, Selectivity::Mpc88),
        _ => ((exact_empties + 10).min(60), Selectivity::Mpc88),
    };
    LevelSetting {
        mid_depth: level,
        mid_selectivity,
        exact_empties,
        selective_empties,
        end_selectivity,
    }
}

/// (é meio-jogo, profundidade, seletividade) para o nível dado
pub fn get_level(level: u8, n_discs: u32) -> (bool, i32, Selectivity) {
    let setting = level_setting(level);
    let n_empties = HW2 as i32 - n_discs as i32;
    if n_empties <= setting.exact_empties {
        (false, n_empties, Selectivity::Exact)
    } else if n_empties <= setting.selective_empties {
        (false, n_empties, setting.end_selectivity)
    } else {
        (true, setting.mid_depth.min(n_empties), setting.mid_selectivity)
    }
}

/// Menor nível que nesta posição busca pelo menos (depth, selectivity)
pub fn level_from_depth_selectivity(n_discs: u32, depth: i32, selectivity: Selectivity) -> u8 {
    (1..N_LEVEL)
        .find(|&level| {
            let (_, d, s) = get_level(level, n_discs);
            d > depth || (d == depth && s >= selectivity)
        })
        .unwrap_or(N_LEVEL - 1)
}
