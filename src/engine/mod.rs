pub mod ai;
pub mod book;
pub mod config;
pub mod thread_pool;
pub mod tt;

pub use ai::*;
pub use book::*;
pub use config::*;
pub use thread_pool::*;
pub use tt::*;
