use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// Upper bound for `analytics.max_period_days`: a century of orders.
pub const MAX_PERIOD_DAYS_LIMIT: i64 = 36_500;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the file; missing sections fall back to their defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analytics.top_items_limit == 0 {
            return Err(ConfigError::ValidationError(
                "analytics.top_items_limit must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_PERIOD_DAYS_LIMIT).contains(&self.analytics.max_period_days) {
            return Err(ConfigError::ValidationError(format!(
                "analytics.max_period_days must be between 1 and {}",
                MAX_PERIOD_DAYS_LIMIT
            )));
        }
        if self.analytics.fallback_category.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "analytics.fallback_category must not be empty".to_string(),
            ));
        }
        if self.server.event_channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "server.event_channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "0.0.0.0:3000".
    pub listen_addr: String,
    /// Buffer size of the broadcast channel carrying order events to WebSocket clients.
    pub event_channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            event_channel_capacity: 256,
        }
    }
}

/// Connection pool settings. The URL itself comes from `DATABASE_URL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Whether cancelled orders count toward the revenue-bearing figures of a report.
///
/// Analytics historically counted every status while the admin dashboard excluded
/// cancelled orders. The choice is left to the operator rather than unified silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CancelledOrderPolicy {
    #[default]
    Include,
    Exclude,
}

/// Tunables of the analytics engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Applies to the time series, the summary, item and revenue insights.
    pub cancelled_orders: CancelledOrderPolicy,
    /// Length of the "top items by revenue" list.
    pub top_items_limit: usize,
    /// Category label for lines whose menu item is gone or uncategorised.
    pub fallback_category: String,
    /// Longest window a single report may cover. The working set is held in memory.
    pub max_period_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cancelled_orders: CancelledOrderPolicy::Include,
            top_items_limit: 5,
            fallback_category: "Other".to_string(),
            max_period_days: 366,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "canteen.log".to_string(),
        }
    }
}
