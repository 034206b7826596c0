// JobDeck Core - Swipe Deck Logic & Ports
// NO infrastructure dependencies (HTTP and terminal adapters live in other crates)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
