use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub openai_api_key: String,
    pub admin_base_url: String,
    pub admin_panel: String,
    pub admin_login_email: Option<String>,
    pub admin_login_password: Option<String>,
    pub tool_log_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            admin_base_url: require_env("ADMIN_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            admin_panel: optional_env("ADMIN_PANEL").unwrap_or_else(|| "admin".to_string()),
            admin_login_email: optional_env("ADMIN_LOGIN_EMAIL"),
            admin_login_password: optional_env("ADMIN_LOGIN_PASSWORD"),
            tool_log_dir: optional_env("TOOL_LOG_DIR").unwrap_or_else(|| "./logs".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns the variable trimmed, or `None` when unset or blank.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
