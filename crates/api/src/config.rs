//! Application configuration loaded from environment variables.

use std::time::Duration;

use remote::RetryPolicy;
use saga::Endpoints;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `PAYMENTS_URL`, `PURCHASES_URL`, `STOCK_URL`, `CATALOG_URL`: collaborator base URLs
/// - `REMOTE_MAX_ATTEMPTS` (default: `3`), `REMOTE_RETRY_DELAY_MS` (default: `2000`),
///   `REMOTE_TIMEOUT_MS` (default: `10000`)
/// - `SAGA_DEADLINE_MS`: bound on a run's forward phase (default: none)
/// - `PREFLIGHT_ENABLED`: check stock before the first step (default: `true`)
/// - `LOCK_TTL_SECS` (default: `10`), `CACHE_TTL_SECS` (default: `60`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub payments_url: String,
    pub purchases_url: String,
    pub stock_url: String,
    pub catalog_url: String,
    pub remote_max_attempts: u32,
    pub remote_retry_delay: Duration,
    pub remote_timeout: Duration,
    pub saga_deadline: Option<Duration>,
    pub preflight_enabled: bool,
    pub lock_ttl: Duration,
    pub cache_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup; unset or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            payments_url: lookup("PAYMENTS_URL").unwrap_or(defaults.payments_url),
            purchases_url: lookup("PURCHASES_URL").unwrap_or(defaults.purchases_url),
            stock_url: lookup("STOCK_URL").unwrap_or(defaults.stock_url),
            catalog_url: lookup("CATALOG_URL").unwrap_or(defaults.catalog_url),
            remote_max_attempts: parsed("REMOTE_MAX_ATTEMPTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.remote_max_attempts),
            remote_retry_delay: parsed("REMOTE_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_retry_delay),
            remote_timeout: parsed("REMOTE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_timeout),
            saga_deadline: parsed("SAGA_DEADLINE_MS").map(Duration::from_millis),
            preflight_enabled: lookup("PREFLIGHT_ENABLED")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(defaults.preflight_enabled),
            lock_ttl: parsed("LOCK_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.lock_ttl),
            cache_ttl: parsed("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            payments: self.payments_url.clone(),
            purchases: self.purchases_url.clone(),
            stock: self.stock_url.clone(),
            catalog: self.catalog_url.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.remote_max_attempts)
            .with_delay(self.remote_retry_delay)
            .with_timeout(self.remote_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            payments_url: "http://localhost:5001/payments".to_string(),
            purchases_url: "http://localhost:5002/purchases".to_string(),
            stock_url: "http://localhost:3000/stocks".to_string(),
            catalog_url: "http://localhost:5003/products".to_string(),
            remote_max_attempts: 3,
            remote_retry_delay: Duration::from_secs(2),
            remote_timeout: Duration::from_secs(10),
            saga_deadline: None,
            preflight_enabled: true,
            lock_ttl: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
        }
    }
}
