// Logging setup for the jobdeck binary

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FORMAT_ENV: &str = "JOBDECK_LOG_FORMAT";
const DEFAULT_LOG_FILTER: &str = "jobdeck=warn";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter; `JOBDECK_LOG_FORMAT=json` switches
/// to one JSON object per line. Output goes to stderr so it never mixes with
/// the deck on stdout.
pub fn init_logging() -> Result<()> {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
