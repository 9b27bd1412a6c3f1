pub mod alpha_beta;
pub mod clog;
pub mod context;
pub mod endgame;
pub mod etc;
pub mod evaluation;
pub mod level;
pub mod move_ordering;
pub mod nws;
pub mod parallel_search;
pub mod probcut;
pub mod time_manager;
pub mod ybwc;

pub use context::*;
pub use evaluation::*;
pub use level::*;
pub use parallel_search::*;
pub use time_manager::*;

// ============================================================================
// PROFUNDIDADES DE TRANSIÇÃO
// ============================================================================

/// Abaixo disto (em casas vazias) a busca de final passa para o solver exato
pub const MID_TO_END_DEPTH: i32 = 12;
/// Profundidade a partir da qual a NWS usa ordenação completa, TT e MPC
pub const MID_SIMPLE_DEPTH: i32 = 3;
pub const MID_ETC_DEPTH: i32 = 5;

pub const YBWC_MID_SPLIT_MIN_DEPTH: i32 = 6;
pub const YBWC_END_SPLIT_MIN_DEPTH: i32 = 14;

pub const END_TT_MIN_DEPTH: i32 = 7;
/// O solver de final só consulta o cancelamento com pelo menos estas casas vazias
pub const END_POLL_MIN_DEPTH: i32 = 6;
