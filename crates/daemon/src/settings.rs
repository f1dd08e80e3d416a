// Daemon settings (TOML file layered under SENTIQ__* environment variables)

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use sentiq_core::application::worker::constants::DEFAULT_FETCH_TIMEOUT;
use sentiq_core::application::WorkerConfig;
use sentiq_core::domain::QueueRoutes;
use sentiq_core::{AppError, Result};
use sentiq_infra_http::DEFAULT_MAX_BODY_BYTES;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "SENTIQ_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "sentiq.toml";
const DEFAULT_DATABASE_URL: &str = "~/.sentiq/queue.db";

/// Extra gazetteer entries, added to the built-in lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GazetteerSettings {
    pub persons: Vec<String>,
    pub locations: Vec<String>,
    pub organizations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `sqlite:` URL or file path (`~` expanded)
    pub database_url: String,
    /// Manager to worker direction
    pub input_queue: String,
    /// Worker to manager direction
    pub output_queue: String,
    pub lease_duration_secs: u64,
    pub idle_poll_interval_ms: u64,
    pub error_recovery_interval_ms: u64,
    pub worker_count: usize,
    pub fetch_timeout_secs: u64,
    /// Bytes of a page body read while looking for its title
    pub fetch_max_body_bytes: usize,
    /// Redrive to `<input_queue>-dead` after this many receives (unset = never)
    pub max_receive_count: Option<u32>,
    pub gazetteer: GazetteerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let routes = QueueRoutes::default();
        let worker = WorkerConfig::default();
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            input_queue: routes.input,
            output_queue: routes.output,
            lease_duration_secs: worker.lease_duration.as_secs(),
            idle_poll_interval_ms: duration_millis(worker.idle_poll_interval),
            error_recovery_interval_ms: duration_millis(worker.error_recovery_interval),
            worker_count: 1,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            fetch_max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_receive_count: None,
            gazetteer: GazetteerSettings::default(),
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    /// Load from `$SENTIQ_CONFIG` (default `sentiq.toml`, optional) and the
    /// environment, then validate
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let explicit = std::env::var(CONFIG_PATH_ENV).is_ok();

        let builder = Config::builder()
            .add_source(File::with_name(&path).required(explicit))
            .add_source(
                Environment::with_prefix("SENTIQ")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("gazetteer.persons")
                    .with_list_parse_key("gazetteer.locations")
                    .with_list_parse_key("gazetteer.organizations"),
            );

        Self::from_builder(builder)
    }

    /// Parse settings from TOML text (no environment layer)
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| AppError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_queue.trim().is_empty() || self.output_queue.trim().is_empty() {
            return Err(AppError::Config("queue names must not be empty".to_string()));
        }
        if self.input_queue == self.output_queue {
            return Err(AppError::Config(
                "input_queue and output_queue must differ".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(AppError::Config("worker_count must be at least 1".to_string()));
        }
        if self.idle_poll_interval_ms == 0 {
            return Err(AppError::Config(
                "idle_poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 || self.fetch_timeout_secs >= self.lease_duration_secs {
            return Err(AppError::Config(format!(
                "fetch_timeout_secs ({}) must be positive and shorter than lease_duration_secs ({})",
                self.fetch_timeout_secs, self.lease_duration_secs
            )));
        }
        if self.fetch_max_body_bytes == 0 {
            return Err(AppError::Config(
                "fetch_max_body_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn routes(&self) -> QueueRoutes {
        QueueRoutes::new(self.input_queue.clone(), self.output_queue.clone())
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            lease_duration: Duration::from_secs(self.lease_duration_secs),
            idle_poll_interval: Duration::from_millis(self.idle_poll_interval_ms),
            error_recovery_interval: Duration::from_millis(self.error_recovery_interval_ms),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.input_queue, "manager_workers_queue");
        assert_eq!(settings.output_queue, "workers_manager_queue");
        assert_eq!(settings.worker_config().lease_duration, Duration::from_secs(300));
        assert_eq!(
            settings.worker_config().idle_poll_interval,
            Duration::from_millis(500)
        );
        assert_eq!(settings.fetch_timeout(), DEFAULT_FETCH_TIMEOUT);
    }

    #[test]
    fn test_toml_overrides() {
        let settings = Settings::from_toml_str(
            r#"
            database_url = "sqlite::memory:"
            input_queue = "jobs"
            output_queue = "results"
            worker_count = 4
            max_receive_count = 5

            [gazetteer]
            persons = ["Ada Lovelace"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.routes(), QueueRoutes::new("jobs", "results"));
        assert_eq!(settings.worker_count, 4);
        assert_eq!(settings.max_receive_count, Some(5));
        assert_eq!(settings.gazetteer.persons, vec!["Ada Lovelace"]);
        assert!(settings.gazetteer.locations.is_empty());
    }

    #[test]
    fn test_fetch_timeout_must_fit_in_lease() {
        let result = Settings::from_toml_str(
            r#"
            lease_duration_secs = 20
            fetch_timeout_secs = 30
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_same_queue_for_both_directions_is_rejected() {
        let result = Settings::from_toml_str(
            r#"
            input_queue = "q"
            output_queue = "q"
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        assert!(Settings::from_toml_str("worker_count = 0").is_err());
    }

    #[test]
    fn test_body_read_limit() {
        let settings = Settings::from_toml_str("fetch_max_body_bytes = 4096").unwrap();
        assert_eq!(settings.fetch_max_body_bytes, 4096);
        assert_eq!(Settings::default().fetch_max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert!(Settings::from_toml_str("fetch_max_body_bytes = 0").is_err());
    }
}
