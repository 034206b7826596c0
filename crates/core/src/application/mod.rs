// Application Layer - Deck use cases

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod deck;
pub mod gesture;
pub mod queue_store;
mod spawn;
pub mod stack_view;

// Re-exports
pub use config::{DeckConfig, GestureThresholds};
pub use coordinator::{CommitOutcome, SwipeCoordinator, SwipeReceipt};
pub use deck::{PointerUpOutcome, SwipeDeck};
pub use gesture::{GestureController, PointerSample};
pub use queue_store::{PrefetchOutcome, QueueSnapshot, QueueStore, SkipReason};
pub use stack_view::{build_stack, compute_window, layer_for, CardLayer, StackCard};
