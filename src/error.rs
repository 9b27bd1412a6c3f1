// Erros da fronteira do motor (parsing, configuração, threads).
// A busca recursiva nunca devolve erros: cancelamento é um valor sentinela.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("tabuleiro inválido: {0}")]
    InvalidBoard(String),

    #[error("coordenada inválida: {0}")]
    InvalidCoordinate(String),

    #[error("jogada ilegal: {0}")]
    IllegalMove(String),

    #[error("configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("falha ao criar thread de busca: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
