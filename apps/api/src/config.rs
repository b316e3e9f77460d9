use std::time::Duration;

use anyhow::{Context, Result};

use crate::fetch::DEFAULT_USER_AGENT;

/// Application configuration loaded from environment variables.
/// Every value has a default; unparsable values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// When absent, field parsing falls back to the deterministic heuristic backend.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub fetch_timeout: Duration,
    pub backend_timeout: Duration,
    pub fetch_max_bytes: usize,
    pub fetch_user_agent: String,
    /// Per-field floor applied to backend output before it is merged.
    pub min_field_confidence: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            port: 8080,
            rust_log: "info".to_string(),
            fetch_timeout: Duration::from_secs(10),
            backend_timeout: Duration::from_secs(30),
            fetch_max_bytes: 2 * 1024 * 1024,
            fetch_user_agent: DEFAULT_USER_AGENT.to_string(),
            min_field_confidence: 0.5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let min_field_confidence: f32 =
            parse_env("MIN_FIELD_CONFIDENCE", defaults.min_field_confidence)?;
        if !(0.0..=1.0).contains(&min_field_confidence) {
            anyhow::bail!("MIN_FIELD_CONFIDENCE must be between 0 and 1");
        }

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", defaults.port).context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            fetch_timeout: Duration::from_secs(parse_env("FETCH_TIMEOUT_SECS", 10u64)?),
            backend_timeout: Duration::from_secs(parse_env("BACKEND_TIMEOUT_SECS", 30u64)?),
            fetch_max_bytes: parse_env("FETCH_MAX_BYTES", defaults.fetch_max_bytes)?,
            fetch_user_agent: optional_env("FETCH_USER_AGENT").unwrap_or(defaults.fetch_user_agent),
            min_field_confidence,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
