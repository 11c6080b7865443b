use chrono::NaiveDate;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Prefix for environment variables, e.g. `CFWAF_EXPORT__RULE_ACTION`
const ENV_PREFIX: &str = "CFWAF";

/// Token variables honoured when `CFWAF_CLOUDFLARE__API_TOKEN` is not set,
/// first one set wins
const LEGACY_TOKEN_VARS: [&str; 2] = ["API_KEY", "CLOUDFLARE_API_TOKEN"];

/// Configuration settings for the rule export
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Cloudflare API configuration
    pub cloudflare: CloudflareConfig,
    /// What to export and where
    pub export: ExportConfig,
    /// Pagination and retry behaviour
    pub fetch: FetchConfig,
    /// Worker pool configuration
    pub worker: WorkerConfig,
}

/// Cloudflare-specific configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareConfig {
    /// Cloudflare API token for authentication
    pub api_token: String,
    /// Base URL of the Cloudflare v4 API
    pub base_url: String,
    /// Timeout applied to every HTTP request
    pub request_timeout_secs: u64,
}

/// Export target settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Account name a zone must belong to (exact match)
    pub account_name: String,
    /// Rule action to export, e.g. `skip`
    pub rule_action: String,
    /// Destination CSV file; date-stamped in the working directory when unset
    pub output_path: Option<PathBuf>,
}

/// Pagination and retry settings
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Zones requested per page
    pub per_page: u32,
    /// Attempts per request before a fetch counts as failed
    pub max_attempts: u32,
    /// Pause between attempts on a zone page
    pub zone_retry_delay_ms: u64,
    /// Pause between attempts on a zone's ruleset
    pub rule_retry_delay_ms: u64,
    /// Courtesy pause between successful zone pages
    pub page_delay_ms: u64,
    /// Starting value of the enumeration backoff delay
    pub backoff_initial_ms: u64,
    /// Enumeration stops once the backoff delay grows past this
    pub backoff_ceiling_ms: u64,
}

/// Worker pool settings
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of zones processed at once
    pub concurrency: usize,
    /// Hard limit on the whole fan-out; unlimited when unset
    pub run_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load configuration from defaults, `.env` and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Self::defaults()?;

        // Legacy token variables sit between the defaults and the prefixed env
        for var in LEGACY_TOKEN_VARS {
            if let Ok(token) = env::var(var) {
                builder = builder.set_default("cloudflare.api_token", token)?;
                break;
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        Self::from_builder(builder)
    }

    /// Builder pre-populated with every default value
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("cloudflare.base_url", "https://api.cloudflare.com/client/v4")?
            .set_default("cloudflare.request_timeout_secs", 30)?
            .set_default("export.account_name", "DXP Customers")?
            .set_default("export.rule_action", "skip")?
            .set_default("fetch.per_page", 1000)?
            .set_default("fetch.max_attempts", 3)?
            .set_default("fetch.zone_retry_delay_ms", 5000)?
            .set_default("fetch.rule_retry_delay_ms", 500)?
            .set_default("fetch.page_delay_ms", 1000)?
            .set_default("fetch.backoff_initial_ms", 1000)?
            .set_default("fetch.backoff_ceiling_ms", 60_000)?
            .set_default("worker.concurrency", 10)
    }

    /// Build, deserialize and validate
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cloudflare.api_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "cloudflare.api_token must not be empty".to_string(),
            ));
        }
        if self.fetch.per_page == 0 {
            return Err(ConfigError::Message("fetch.per_page must be at least 1".to_string()));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Message(
                "fetch.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.worker.concurrency == 0 {
            return Err(ConfigError::Message(
                "worker.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl CloudflareConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ExportConfig {
    /// Output file for a run on `date`
    pub fn resolved_output_path(&self, date: NaiveDate) -> PathBuf {
        self.output_path.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "firewall_custom_rules_{}.csv",
                date.format("%Y-%m-%d")
            ))
        })
    }
}

impl FetchConfig {
    pub fn zone_retry_delay(&self) -> Duration {
        Duration::from_millis(self.zone_retry_delay_ms)
    }

    pub fn rule_retry_delay(&self) -> Duration {
        Duration::from_millis(self.rule_retry_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn backoff_initial(&self) -> Duration {
        Duration::from_millis(self.backoff_initial_ms)
    }

    pub fn backoff_ceiling(&self) -> Duration {
        Duration::from_millis(self.backoff_ceiling_ms)
    }
}

impl WorkerConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}
