// Wire DTOs for the job listing API

use jobdeck_core::domain::JobRecord;
use serde::{Deserialize, Serialize};

fn default_success() -> bool {
    true
}

/// Body of `GET /jobs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
