use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;
use warp::http::uri::Authority;

/// Origins allowed to call the API with credentials when
/// `CORS_ALLOWED_ORIGINS` is not set.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:5174",
    "http://localhost:5173",
    "http://127.0.0.1:5174",
    "http://127.0.0.1:5173",
];

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// What the resolver does when persisting a generated plan fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistencePolicy {
    /// Two independent statements; failures are logged and swallowed.
    #[default]
    BestEffort,
    /// User upsert and plan insert share one transaction; failure fails the request.
    Transactional,
}

impl FromStr for PersistencePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "transactional" => Ok(Self::Transactional),
            other => anyhow::bail!("unknown persistence policy '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_timeout: Duration,
    pub persistence_policy: PersistencePolicy,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Config {
            port: parse_or(get("PORT"), "PORT", 8081)?,
            database_url: get("POSTGRES_URL").or_else(|| get("SUPABASE_DB_URL")),
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout: Duration::from_secs(parse_or(
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                "DB_ACQUIRE_TIMEOUT_SECS",
                5,
            )?),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_timeout: Duration::from_secs(parse_or(
                get("OPENAI_TIMEOUT_SECS"),
                "OPENAI_TIMEOUT_SECS",
                60,
            )?),
            persistence_policy: parse_or(
                get("PERSISTENCE_POLICY"),
                "PERSISTENCE_POLICY",
                PersistencePolicy::BestEffort,
            )?,
            allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        for origin in &config.allowed_origins {
            validate_origin(origin)?;
        }

        Ok(config)
    }

    /// Mock plans are served whenever no credential is configured.
    pub fn mock_mode(&self) -> bool {
        self.openai_api_key.is_none()
    }
}

/// Accepts `scheme://authority` with an http(s) scheme, the same shape the
/// CORS layer parses each allowed origin into.
fn validate_origin(origin: &str) -> Result<()> {
    let (scheme, authority) = origin
        .split_once("://")
        .with_context(|| format!("invalid CORS origin '{}': missing scheme", origin))?;

    if scheme != "http" && scheme != "https" {
        anyhow::bail!("invalid CORS origin '{}': expected http:// or https://", origin);
    }

    authority
        .parse::<Authority>()
        .map_err(|e| anyhow::anyhow!("invalid CORS origin '{}': {}", origin, e))?;

    Ok(())
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", key, value)),
        None => Ok(default),
    }
}
