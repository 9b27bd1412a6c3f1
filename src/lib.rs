// Virada - Motor de busca de Othello/Reversi de alto desempenho

pub mod core;
pub mod engine;
pub mod error;
pub mod intrinsics;
pub mod search;

pub use crate::core::*;
pub use error::{EngineError, Result};
