use anyhow::{Context, Result};

/// Largest `content` string accepted by the artifact endpoints (256 KiB).
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 256 * 1024;
/// Wall-clock budget for one analysis call.
pub const DEFAULT_ANALYSIS_TIMEOUT_MS: u64 = 2_000;

/// Application configuration loaded from environment variables.
/// Every variable is optional; a malformed value fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub max_content_bytes: usize,
    pub analysis_timeout_ms: u64,
    /// Enables the engine's overlap resolver.
    pub resolve_overlaps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            analysis_timeout_ms: DEFAULT_ANALYSIS_TIMEOUT_MS,
            resolve_overlaps: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_content_bytes: parse_env("MAX_CONTENT_BYTES", defaults.max_content_bytes)?,
            analysis_timeout_ms: parse_env("ANALYSIS_TIMEOUT_MS", defaults.analysis_timeout_ms)?,
            resolve_overlaps: parse_env("RESOLVE_OVERLAPS", defaults.resolve_overlaps)?,
        })
    }

    /// Limit for the whole request body. Larger than `max_content_bytes` so an
    /// oversized `content` field reaches the handler and gets a JSON error.
    pub fn request_body_limit(&self) -> usize {
        self.max_content_bytes
            .saturating_mul(4)
            .saturating_add(64 * 1024)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
