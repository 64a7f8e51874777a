use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_VPIC_BASE_URL: &str = "https://vpic.nhtsa.dot.gov/api/vehicles";

/// Application configuration loaded from environment variables.
/// Every variable has a default; a missing OpenAI key only disables description generation.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub vpic_base_url: String,
    pub http_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            vpic_base_url: optional_env("VPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_VPIC_BASE_URL.to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a whole number of seconds")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Blank values count as unset so an empty `OPENAI_API_KEY=` line in `.env` behaves
/// the same as leaving it out.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
