// Domain Layer - Pure entities and state machines

pub mod card;
pub mod error;
pub mod job;
pub mod stats;

// Re-exports
pub use card::{CardState, GestureOutcome, SwipeDirection};
pub use error::DomainError;
pub use job::{JobId, JobRecord};
pub use stats::{SwipeEvent, SwipeStats};
