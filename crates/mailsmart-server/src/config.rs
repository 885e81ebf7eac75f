use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Session lifetime bounds, in hours (one hour to one year).
const SESSION_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=24 * 365;

pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
    pub api_url: String,
    pub api_timeout: Duration,
    pub admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("MAILSMART_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MAILSMART_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("MAILSMART_HOST", "0.0.0.0");
        let port: u16 = var("MAILSMART_PORT", "8000")
            .parse()
            .context("MAILSMART_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("MAILSMART_HOST/MAILSMART_PORT do not form a socket address")?;

        let session_hours: i64 = var("MAILSMART_SESSION_HOURS", "12")
            .parse()
            .context("MAILSMART_SESSION_HOURS must be an integer")?;
        if !SESSION_HOURS_RANGE.contains(&session_hours) {
            bail!(
                "MAILSMART_SESSION_HOURS must be between {} and {}",
                SESSION_HOURS_RANGE.start(),
                SESSION_HOURS_RANGE.end()
            );
        }
        let timeout_secs: u64 = var("MAILSMART_API_TIMEOUT_SECS", "30")
            .parse()
            .context("MAILSMART_API_TIMEOUT_SECS must be an integer")?;
        if timeout_secs == 0 {
            bail!("MAILSMART_API_TIMEOUT_SECS must be at least 1");
        }

        let admin = match (get("MAILSMART_ADMIN_EMAIL"), get("MAILSMART_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                name: var("MAILSMART_ADMIN_NAME", "Administrator"),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            addr,
            db_path: var("MAILSMART_DB_PATH", "mailsmart.db").into(),
            jwt_secret,
            session_ttl: chrono::Duration::hours(session_hours),
            api_url: var("MAILSMART_API_URL", "http://localhost:8080"),
            api_timeout: Duration::from_secs(timeout_secs),
            admin,
        })
    }
}
