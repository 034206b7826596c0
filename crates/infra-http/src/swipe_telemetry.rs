// HTTP SwipeTelemetry Implementation

use async_trait::async_trait;
use jobdeck_core::domain::SwipeEvent;
use jobdeck_core::port::{SwipeTelemetry, TelemetryError};
use tracing::debug;

use crate::client::ApiClient;

/// Posts every committed swipe to `POST /jobs/swipes`
pub struct HttpSwipeTelemetry {
    client: ApiClient,
}

impl HttpSwipeTelemetry {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SwipeTelemetry for HttpSwipeTelemetry {
    async fn record_swipe(&self, event: &SwipeEvent) -> Result<(), TelemetryError> {
        let response = self
            .client
            .post("/jobs/swipes")
            .json(event)
            .send()
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Http {
                status: status.as_u16(),
            });
        }

        debug!(job_id = %event.job_id, direction = %event.direction, "Swipe reported");
        Ok(())
    }
}
