//! Server configuration from environment variables.

use std::time::Duration;

/// Resolved configuration. Every value has a default; the environment
/// overrides field by field.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address the server binds, e.g. "0.0.0.0:5000".
    pub listen_addr: String,
    /// Allowed CORS origin; "*" for permissive.
    pub cors_origin: String,
    /// Deadline for the price source.
    pub price_timeout: Duration,
    /// Deadline for the structured secondary-metrics source.
    pub metrics_timeout: Duration,
    /// Deadline for the scrape fallback.
    pub scrape_timeout: Duration,
    /// Cache lifetime for resolved quotes and the assembled portfolio.
    pub quote_ttl: Duration,
    /// Cache lifetime for exhausted fetches.
    pub error_ttl: Duration,
    /// Cache lifetime for the holdings list.
    pub holdings_ttl: Duration,
    /// Upper bound on symbols per batch request.
    pub max_batch_size: usize,
    /// Retries after the initial fetch attempt.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub backoff_base: Duration,
    /// Rate limiter replenish interval per request slot.
    pub rate_limit_replenish_ms: u64,
    /// Rate limiter burst capacity; 0 disables the limiter.
    pub rate_limit_burst: u32,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            listen_addr: env_string("FV_LISTEN_ADDR", "0.0.0.0:5000"),
            cors_origin: env_string("FV_CORS_ORIGIN", "http://localhost:5173"),
            price_timeout: env_millis("FV_PRICE_TIMEOUT_MS", 10_000),
            metrics_timeout: env_millis("FV_METRICS_TIMEOUT_MS", 10_000),
            scrape_timeout: env_millis("FV_SCRAPE_TIMEOUT_MS", 5_000),
            quote_ttl: env_millis("FV_QUOTE_TTL_MS", 60_000),
            error_ttl: env_millis("FV_ERROR_TTL_MS", 10_000),
            holdings_ttl: env_millis("FV_HOLDINGS_TTL_MS", 300_000),
            max_batch_size: env_parsed("FV_MAX_BATCH_SIZE", 50),
            max_retries: env_parsed("FV_MAX_RETRIES", 3),
            backoff_base: env_millis("FV_BACKOFF_BASE_MS", 1_000),
            // 100 requests per minute: one slot every 600ms, burst of 100.
            rate_limit_replenish_ms: env_parsed("FV_RATE_LIMIT_REPLENISH_MS", 600),
            rate_limit_burst: env_parsed("FV_RATE_LIMIT_BURST", 100),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_millis(key: &str, default: u64) -> Duration {
    Duration::from_millis(env_parsed(key, default))
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
