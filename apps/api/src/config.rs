use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use crate::llm_client::DEFAULT_API_BASE;
use crate::scoring::aggregate::BandThresholds;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub upload_dir: String,
    /// Admin stats count profiles created on or after this date.
    pub term_start: NaiveDate,
    pub bands: BandThresholds,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let bands = BandThresholds {
            low_max: parse_env("BAND_LOW_MAX", 30)?,
            moderate_max: parse_env("BAND_MODERATE_MAX", 40)?,
        };
        if bands.low_max >= bands.moderate_max {
            bail!(
                "BAND_LOW_MAX ({}) must be below BAND_MODERATE_MAX ({})",
                bands.low_max,
                bands.moderate_max
            );
        }

        let term_start = optional_env("TERM_START", "2024-06-01");
        let term_start = NaiveDate::parse_from_str(&term_start, "%Y-%m-%d")
            .with_context(|| format!("TERM_START '{term_start}' must be a YYYY-MM-DD date"))?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_hours: parse_env("JWT_TTL_HOURS", 24)?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_api_base: optional_env("OPENAI_API_BASE", DEFAULT_API_BASE),
            upload_dir: optional_env("UPLOAD_DIR", "uploads"),
            term_start,
            bands,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }

    #[cfg(test)]
    pub fn for_tests(upload_dir: &str) -> Self {
        Config {
            database_url: "postgres://localhost/insighted_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_ttl_hours: 1,
            openai_api_key: "test-key".to_string(),
            openai_api_base: DEFAULT_API_BASE.to_string(),
            upload_dir: upload_dir.to_string(),
            term_start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            bands: BandThresholds::default(),
            port: 8080,
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
