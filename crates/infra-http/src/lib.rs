// JobDeck Infrastructure - HTTP Adapter
// Implements: JobFeed, SwipeTelemetry against the job listing REST API

mod client;
mod job_feed;
mod swipe_telemetry;
mod wire;

pub use client::{ApiClient, HttpClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use job_feed::HttpJobFeed;
pub use swipe_telemetry::HttpSwipeTelemetry;
pub use wire::JobListResponse;

// Note: reqwest::Error conversion is handled by helper functions per adapter,
// since FeedError and TelemetryError live in core
