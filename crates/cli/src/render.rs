// Terminal rendering: tables and the card stack

use colored::Colorize;
use jobdeck_core::application::StackCard;
use jobdeck_core::domain::{JobRecord, SwipeStats};
use jobdeck_core::port::JobStats;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct JobRow {
    id: String,
    title: String,
    company: String,
    location: String,
    salary: String,
    posted: String,
}

impl From<&JobRecord> for JobRow {
    fn from(job: &JobRecord) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            company: job.company.clone(),
            location: location_label(job),
            salary: job.salary_label().unwrap_or_else(|| "-".to_string()),
            posted: job.posted_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Tabled)]
struct ProviderRow {
    provider: String,
    jobs: u64,
}

fn location_label(job: &JobRecord) -> String {
    match (job.location.is_empty(), job.remote) {
        (true, true) => "Remote".to_string(),
        (true, false) => "-".to_string(),
        (false, true) => format!("{} (remote)", job.location),
        (false, false) => job.location.clone(),
    }
}

pub fn job_table(jobs: &[JobRecord]) -> String {
    Table::new(jobs.iter().map(JobRow::from)).to_string()
}

pub fn provider_table(stats: &JobStats) -> String {
    let rows = stats
        .jobs_by_provider
        .iter()
        .map(|(provider, jobs)| ProviderRow {
            provider: provider.clone(),
            jobs: *jobs,
        });
    Table::new(rows).to_string()
}

pub fn stats_line(stats: &SwipeStats) -> String {
    format!(
        "{} liked, {} passed",
        stats.liked.to_string().green().bold(),
        stats.passed.to_string().red().bold()
    )
}

/// Stack outline (back-to-front, indented by depth) followed by the top card
pub fn stack(window: &[StackCard]) -> String {
    let mut out = String::new();
    for card in window {
        let indent = "  ".repeat(card.layer.depth);
        if card.layer.interactive {
            out.push_str(&format!("{}▶ {}\n", indent, card.job.title.bold()));
        } else {
            out.push_str(&format!("{}· {}\n", indent, card.job.title.dimmed()));
        }
    }
    if let Some(top) = window.last() {
        out.push('\n');
        out.push_str(&top_card(&top.job));
    }
    out
}

fn top_card(job: &JobRecord) -> String {
    let mut out = format!(
        "  {}\n  {} · {}\n",
        job.title.cyan().bold(),
        job.company.bold(),
        location_label(job)
    );
    if let Some(salary) = job.salary_label() {
        out.push_str(&format!("  {}\n", salary.green()));
    }
    if !job.tags.is_empty() {
        out.push_str(&format!("  {}\n", job.tags.join(", ").yellow()));
    }
    if !job.snippet.is_empty() {
        out.push_str(&format!("\n  {}\n", job.snippet));
    }
    if !job.external_url.is_empty() {
        out.push_str(&format!("  {}\n", job.external_url.underline()));
    }
    out
}
