pub mod board;
pub mod types;
pub mod zobrist;

pub use board::*;
pub use types::*;
pub use zobrist::*;
