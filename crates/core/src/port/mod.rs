// Port Layer - Interfaces for external collaborators

pub mod id_provider; // Session ids, deterministic in tests
pub mod job_feed;
pub mod preference_signal;
pub mod swipe_telemetry;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use job_feed::{FeedError, JobFeed, JobStats, PageRequest};
pub use preference_signal::{preference_channel, PreferenceNotifier, PreferenceSubscription};
pub use swipe_telemetry::{NoopSwipeTelemetry, SwipeTelemetry, TelemetryError};
pub use time_provider::TimeProvider;
