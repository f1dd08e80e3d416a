// Logging setup

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting `json` or `pretty` output
pub const LOG_FORMAT_ENV: &str = "SENTIQ_LOG_FORMAT";

const DEFAULT_FILTER: &str = "sentiq=info";

/// Install the global subscriber
///
/// Logs go to stdout through a non-blocking writer; keep the returned guard
/// alive until exit or buffered lines are lost.
pub fn init() -> Result<WorkerGuard> {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow!("Failed to create env filter: {}", e))?;

    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .try_init()?;
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(writer))
                .try_init()?;
        }
    }

    Ok(guard)
}
