// HTTP JobFeed Implementation

use async_trait::async_trait;
use jobdeck_core::domain::JobRecord;
use jobdeck_core::port::{FeedError, JobFeed, JobStats, PageRequest};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::wire::JobListResponse;

// Helper to convert reqwest::Error into the port's error taxonomy
fn map_reqwest_error(err: reqwest::Error) -> FeedError {
    if err.is_decode() {
        FeedError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        FeedError::Http {
            status: status.as_u16(),
        }
    } else {
        FeedError::Transport(err.to_string())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FeedError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FeedError::Http {
            status: status.as_u16(),
        })
    }
}

/// `JobFeed` backed by `GET /jobs` and `GET /jobs/stats`
pub struct HttpJobFeed {
    client: ApiClient,
}

impl HttpJobFeed {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobFeed for HttpJobFeed {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<JobRecord>, FeedError> {
        let mut query = vec![("page_size", request.page_size.to_string())];
        if let Some(token) = request.page_token {
            query.push(("page_token", token.to_string()));
        }

        debug!(
            page_size = request.page_size,
            page_token = ?request.page_token,
            "GET /jobs"
        );

        let response = self
            .client
            .get("/jobs")
            .query(&query)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: JobListResponse = check_status(response)?
            .json()
            .await
            .map_err(map_reqwest_error)?;

        if !body.success {
            let message = body
                .message
                .unwrap_or_else(|| "listing service reported failure".to_string());
            warn!(message = %message, "Job listing request rejected");
            return Err(FeedError::Rejected(message));
        }

        debug!(returned = body.jobs.len(), "Job page received");
        Ok(body.jobs)
    }

    async fn fetch_stats(&self) -> Result<JobStats, FeedError> {
        let response = self
            .client
            .get("/jobs/stats")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response)?
            .json()
            .await
            .map_err(map_reqwest_error)
    }
}
