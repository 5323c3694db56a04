use std::time::Duration;

use tracing::{info, warn};

use crate::coalescer::{CoalescePolicy, DEFAULT_NOTIFY_EVERY};

pub const DEFAULT_USER_AGENT: &str = concat!(
    "source-metadata/",
    env!("CARGO_PKG_VERSION"),
    " (citation title and favicon resolver)"
);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolver configuration. Loaded from environment variables; every value has a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataConfig {
    /// Sent as `User-Agent` on every page fetch.
    pub user_agent: String,
    pub request_timeout: Duration,
    pub coalesce: CoalescePolicy,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            coalesce: CoalescePolicy::EveryN(DEFAULT_NOTIFY_EVERY),
        }
    }
}

impl MetadataConfig {
    /// Read `SOURCE_META_*` variables (after loading `.env` if present).
    ///
    /// `SOURCE_META_NOTIFY_INTERVAL_MS` switches coalescing to time-based and
    /// takes precedence over `SOURCE_META_NOTIFY_EVERY`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        config.log();
        config
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let user_agent = lookup("SOURCE_META_USER_AGENT")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.user_agent);

        let request_timeout = parse_var::<u64>(&lookup, "SOURCE_META_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let coalesce = match parse_var::<u64>(&lookup, "SOURCE_META_NOTIFY_INTERVAL_MS") {
            Some(ms) => CoalescePolicy::Interval(Duration::from_millis(ms)),
            None => parse_var::<u64>(&lookup, "SOURCE_META_NOTIFY_EVERY")
                .map(CoalescePolicy::EveryN)
                .unwrap_or(defaults.coalesce),
        };

        Self {
            user_agent,
            request_timeout,
            coalesce,
        }
    }

    fn log(&self) {
        info!(
            user_agent = self.user_agent.as_str(),
            timeout_secs = self.request_timeout.as_secs(),
            coalesce = ?self.coalesce,
            "Source metadata config loaded"
        );
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw.as_str(), "Ignoring unparseable config value");
            None
        }
    }
}
