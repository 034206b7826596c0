// Job Feed Port (Interface)
// Paginated job listing service consumed by the QueueStore

use crate::domain::JobRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_size: usize,
    /// `None` for the first page, then 1, 2, ...
    pub page_token: Option<u32>,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        Self {
            page_size,
            page_token: None,
        }
    }

    pub fn next(page_size: usize, page_token: u32) -> Self {
        Self {
            page_size,
            page_token: Some(page_token),
        }
    }

    /// Zero-based page index, used to compute offsets.
    pub fn page_index(&self) -> usize {
        self.page_token.unwrap_or(0) as usize
    }
}

/// Informational catalogue stats (not required for deck correctness)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStats {
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default)]
    pub jobs_by_provider: BTreeMap<String, u64>,
    /// Any further fields the service reports
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Feed errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// Service answered with `success: false`
    #[error("Rejected by job service: {0}")]
    Rejected(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Job listing service
///
/// Returning fewer than `page_size` jobs signals the end of the data.
#[async_trait]
pub trait JobFeed: Send + Sync {
    /// Fetch one page of jobs
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<JobRecord>, FeedError>;

    /// Fetch catalogue stats
    async fn fetch_stats(&self) -> Result<JobStats, FeedError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Mock feed serving a synthetic catalogue by page offset.
    ///
    /// Scripted responses, when queued, take precedence over the catalogue.
    /// A gated feed parks every fetch until `release()` is called, which keeps
    /// a fetch "in flight" for as long as a test needs.
    pub struct MockJobFeed {
        catalog: Mutex<Vec<JobRecord>>,
        scripted: Mutex<VecDeque<Result<Vec<JobRecord>, FeedError>>>,
        requests: Mutex<Vec<PageRequest>>,
        gate: Option<Arc<Notify>>,
    }

    impl MockJobFeed {
        /// Catalogue of `total` jobs with ids `job-1` ..= `job-{total}`
        pub fn with_catalog(total: usize) -> Self {
            Self::from_jobs(catalog(1, total))
        }

        pub fn from_jobs(jobs: Vec<JobRecord>) -> Self {
            Self {
                catalog: Mutex::new(jobs),
                scripted: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        /// Feed that answers only from `responses`, then returns empty pages
        pub fn scripted(responses: Vec<Result<Vec<JobRecord>, FeedError>>) -> Self {
            let feed = Self::from_jobs(Vec::new());
            *feed.scripted.lock().unwrap() = responses.into_iter().collect();
            feed
        }

        pub fn gated(mut self) -> Self {
            self.gate = Some(Arc::new(Notify::new()));
            self
        }

        /// Let one parked fetch complete
        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.notify_one();
            }
        }

        pub fn push_response(&self, response: Result<Vec<JobRecord>, FeedError>) {
            self.scripted.lock().unwrap().push_back(response);
        }

        pub fn fail_next(&self, error: FeedError) {
            self.push_response(Err(error));
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobFeed for MockJobFeed {
        async fn fetch_page(&self, request: PageRequest) -> Result<Vec<JobRecord>, FeedError> {
            self.requests.lock().unwrap().push(request);

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            if let Some(response) = self.scripted.lock().unwrap().pop_front() {
                return response;
            }

            let catalog = self.catalog.lock().unwrap();
            let start = request.page_index() * request.page_size;
            Ok(catalog
                .iter()
                .skip(start)
                .take(request.page_size)
                .cloned()
                .collect())
        }

        async fn fetch_stats(&self) -> Result<JobStats, FeedError> {
            let catalog = self.catalog.lock().unwrap();
            let mut stats = JobStats {
                total_jobs: catalog.len() as u64,
                ..JobStats::default()
            };
            stats.jobs_by_provider.insert("mock".to_string(), catalog.len() as u64);
            Ok(stats)
        }
    }

    /// Jobs `job-{first}` ..= `job-{last}`
    pub fn catalog(first: usize, last: usize) -> Vec<JobRecord> {
        (first..=last)
            .map(|n| JobRecord::new_test(format!("job-{}", n)))
            .collect()
    }
}
