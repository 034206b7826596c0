//! JobDeck CLI - swipe through job listings from the terminal

mod browse;
mod logging;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use jobdeck_core::application::constants::*;
use jobdeck_core::application::{DeckConfig, GestureThresholds};
use jobdeck_core::port::{JobFeed, NoopSwipeTelemetry, PageRequest, SwipeTelemetry};
use jobdeck_infra_http::{
    ApiClient, HttpClientConfig, HttpJobFeed, HttpSwipeTelemetry, DEFAULT_API_URL,
    DEFAULT_TIMEOUT_SECS,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "jobdeck")]
#[command(about = "Swipe through job listings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Job listing API base URL
    #[arg(long, env = "JOBDECK_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Bearer token for the API
    #[arg(long, env = "JOBDECK_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "JOBDECK_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[command(flatten)]
    deck: DeckArgs,

    /// Do not report swipes to the API
    #[arg(long)]
    no_telemetry: bool,
}

#[derive(Args)]
struct DeckArgs {
    /// Jobs per page
    #[arg(long, env = "JOBDECK_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Cards rendered in the stack
    #[arg(long, env = "JOBDECK_WINDOW_SIZE", default_value_t = DEFAULT_WINDOW_SIZE)]
    window_size: usize,

    /// Prefetch the next page once this many cards or fewer remain
    #[arg(long, env = "JOBDECK_PREFETCH_THRESHOLD", default_value_t = DEFAULT_PREFETCH_THRESHOLD)]
    prefetch_threshold: usize,

    /// Horizontal drag (px) that commits a swipe
    #[arg(long, env = "JOBDECK_SWIPE_DISTANCE_PX", default_value_t = DEFAULT_DISTANCE_THRESHOLD_PX)]
    swipe_distance: f64,

    /// Release velocity (px/s) that commits a swipe
    #[arg(long, env = "JOBDECK_SWIPE_VELOCITY_PX_S", default_value_t = DEFAULT_VELOCITY_THRESHOLD_PX_PER_S)]
    swipe_velocity: f64,
}

impl DeckArgs {
    fn to_config(&self) -> DeckConfig {
        DeckConfig {
            page_size: self.page_size,
            window_size: self.window_size,
            prefetch_threshold: self.prefetch_threshold,
            gesture: GestureThresholds {
                distance_px: self.swipe_distance,
                velocity_px_per_s: self.swipe_velocity,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalog totals per provider
    Stats,

    /// Print the first page of jobs
    Peek {
        /// Number of jobs to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Swipe through the deck interactively
    Browse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging().context("Failed to initialize logging")?;

    let client = ApiClient::new(HttpClientConfig {
        base_url: cli.api_url.clone(),
        api_token: cli.api_token.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
    })?;
    let feed: Arc<dyn JobFeed> = Arc::new(HttpJobFeed::new(client.clone()));
    let config = cli.deck.to_config();
    config.validate()?;

    info!(api_url = %client.base_url(), "jobdeck v{}", jobdeck_core::VERSION);

    match cli.command {
        Commands::Stats => {
            let stats = feed
                .fetch_stats()
                .await
                .context("Failed to fetch job stats")?;

            println!("{}", "Job Catalog".cyan().bold());
            println!();
            println!("  {} {}", "API URL:".bold(), client.base_url());
            println!("  {} {}", "Total Jobs:".bold(), stats.total_jobs);
            println!();
            println!("{}", render::provider_table(&stats));
        }

        Commands::Peek { limit } => {
            let jobs = feed
                .fetch_page(PageRequest::first(config.page_size))
                .await
                .context("Failed to load jobs")?;

            if jobs.is_empty() {
                println!("{}", "No jobs available".yellow());
            } else {
                let shown = limit.min(jobs.len());
                println!(
                    "{}",
                    format!("First {} of {} jobs", shown, jobs.len()).cyan().bold()
                );
                println!();
                println!("{}", render::job_table(&jobs[..shown]));
            }
        }

        Commands::Browse => {
            let telemetry: Arc<dyn SwipeTelemetry> = if cli.no_telemetry {
                Arc::new(NoopSwipeTelemetry)
            } else {
                Arc::new(HttpSwipeTelemetry::new(client))
            };
            browse::run(config, feed, telemetry).await?;
        }
    }

    Ok(())
}
