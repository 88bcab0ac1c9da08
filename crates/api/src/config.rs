//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::{StaleEntryPolicy, Timeouts};
use lifecycle::{LifecycleConfig, MAX_ADVANCE_INTERVAL};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for plain text
/// - `DATABASE_URL`: PostgreSQL journal; in-memory when unset
/// - `STATUS_ADVANCE_INTERVAL_SECS`: time between status advances (default: `60`,
///   at most one year)
/// - `SCHEDULER_POLL_MS`: lifecycle worker poll interval (default: `1000`)
/// - `STORE_TIMEOUT_MS`: journal call timeout (default: `5000`)
/// - `CATALOG_TIMEOUT_MS`: catalog call timeout (default: `2000`)
/// - `NOTIFY_TIMEOUT_MS`: notification delivery timeout (default: `5000`)
/// - `STALE_CART_ENTRIES`: `retain` or `purge` (default: `retain`)
///
/// Unparseable values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub status_advance_interval: Duration,
    pub scheduler_poll: Duration,
    pub store_timeout: Duration,
    pub catalog_timeout: Duration,
    pub notify_timeout: Duration,
    pub stale_cart_entries: StaleEntryPolicy,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            status_advance_interval: number("STATUS_ADVANCE_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .filter(|interval| *interval <= MAX_ADVANCE_INTERVAL)
                .unwrap_or(defaults.status_advance_interval),
            scheduler_poll: number("SCHEDULER_POLL_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.scheduler_poll),
            store_timeout: number("STORE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            catalog_timeout: number("CATALOG_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.catalog_timeout),
            notify_timeout: number("NOTIFY_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.notify_timeout),
            stale_cart_entries: lookup("STALE_CART_ENTRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stale_cart_entries),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the journal and catalog timeouts.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            journal: self.store_timeout,
            catalog: self.catalog_timeout,
        }
    }

    /// Returns the lifecycle engine settings.
    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig::default()
            .with_advance_interval(self.status_advance_interval)
            .with_poll_interval(self.scheduler_poll)
            .with_notify_timeout(self.notify_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        let lifecycle = LifecycleConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            status_advance_interval: lifecycle.advance_interval,
            scheduler_poll: lifecycle.poll_interval,
            store_timeout: timeouts.journal,
            catalog_timeout: timeouts.catalog,
            notify_timeout: lifecycle.notify_timeout,
            stale_cart_entries: StaleEntryPolicy::default(),
        }
    }
}
