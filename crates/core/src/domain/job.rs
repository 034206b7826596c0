// Job Domain Model

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Job ID (opaque string assigned by the listing service)
pub type JobId = String;

/// One job posting as served by the listing service.
///
/// Immutable once fetched. The deck never edits a record, it only moves the
/// cursor past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Missing ids decode as empty and are dropped by `validate`
    #[serde(default)]
    pub id: JobId,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub external_url: String,
    pub posted_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a record with the required fields; the rest start empty.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company: company.into(),
            location: String::new(),
            remote: false,
            salary_min: None,
            salary_max: None,
            snippet: String::new(),
            tags: Vec::new(),
            external_url: String::new(),
            posted_at,
        }
    }

    /// Create a deterministic record for tests.
    ///
    /// Title and company are derived from the id and `posted_at` is fixed, so
    /// two calls with the same id compare equal.
    pub fn new_test(id: impl Into<String>) -> Self {
        let id = id.into();
        let posted_at = Utc
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .unwrap_or_default();
        let mut job = Self::new(
            id.clone(),
            format!("Engineer {}", id),
            format!("Company {}", id),
            posted_at,
        );
        job.external_url = format!("https://jobs.example.com/{}", id);
        job
    }

    /// Reject records the deck cannot key on.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DomainError::ValidationError(format!(
                "job record '{}' has an empty id",
                self.title
            )));
        }
        Ok(())
    }

    /// Human readable salary range, `None` when the posting has no salary.
    pub fn salary_label(&self) -> Option<String> {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) if min == max => Some(format_salary(min)),
            (Some(min), Some(max)) => {
                Some(format!("{}–{}", format_salary(min), format_salary(max)))
            }
            (Some(min), None) => Some(format!("from {}", format_salary(min))),
            (None, Some(max)) => Some(format!("up to {}", format_salary(max))),
            (None, None) => None,
        }
    }
}

fn format_salary(amount: u32) -> String {
    if amount >= 1000 && amount % 1000 == 0 {
        format!("${}k", amount / 1000)
    } else if amount >= 1000 {
        format!("${:.1}k", amount as f64 / 1000.0)
    } else {
        format!("${}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_label_variants() {
        let mut job = JobRecord::new_test("a");
        assert_eq!(job.salary_label(), None);

        job.salary_min = Some(90_000);
        assert_eq!(job.salary_label().as_deref(), Some("from $90k"));

        job.salary_max = Some(120_000);
        assert_eq!(job.salary_label().as_deref(), Some("$90k–$120k"));

        job.salary_min = None;
        job.salary_max = Some(85_500);
        assert_eq!(job.salary_label().as_deref(), Some("up to $85.5k"));
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let job = JobRecord::new_test("  ");
        assert!(job.validate().is_err());
        assert!(JobRecord::new_test("job-1").validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_missing_optional_fields() {
        let job: JobRecord = serde_json::from_value(serde_json::json!({
            "id": "job-7",
            "title": "Backend Engineer",
            "company": "Acme",
            "posted_at": "2024-05-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(job.id, "job-7");
        assert!(!job.remote);
        assert!(job.tags.is_empty());
        assert_eq!(job.salary_min, None);
    }

    #[test]
    fn test_missing_id_decodes_but_fails_validation() {
        let job: JobRecord = serde_json::from_value(serde_json::json!({
            "title": "Backend Engineer",
            "company": "Acme",
            "posted_at": "2024-05-01T12:00:00Z"
        }))
        .unwrap();

        assert!(job.id.is_empty());
        assert!(job.validate().is_err());
    }
}
