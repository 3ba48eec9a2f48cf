//! Server configuration — loaded from environment variables.

/// Default request body limit: 64 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Largest accepted upload request, in bytes.
    pub max_upload_bytes: usize,
    /// Size of the Postgres connection pool.
    pub db_max_connections: usize,
    /// Serve `/metrics` in Prometheus text format.
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            db_max_connections: 10,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let max_upload_bytes =
            parse_or("RESULTS_MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes);
        let db_max_connections =
            parse_or("RESULTS_DB_MAX_CONNECTIONS", &lookup, defaults.db_max_connections);
        let metrics_enabled = match lookup("RESULTS_METRICS").as_deref().map(str::trim) {
            None => defaults.metrics_enabled,
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"),
        };

        if !metrics_enabled {
            tracing::warn!("RESULTS_METRICS disabled -- /metrics will not be served");
        }

        Self {
            max_upload_bytes,
            db_max_connections,
            metrics_enabled,
        }
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
    }
}
