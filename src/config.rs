//! Runtime configuration loaded from `NOTEKEEPER_*` environment variables.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Two weeks, counted from the last request of the session.
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 14);

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP server binds to (from NOTEKEEPER_BIND).
    pub bind: IpAddr,
    /// Port the HTTP server listens on (from NOTEKEEPER_PORT).
    pub port: u16,
    /// SQLite file (from NOTEKEEPER_DATABASE). `None` uses the platform data directory.
    pub database: Option<PathBuf>,
    /// Mark the session cookie `Secure` (from NOTEKEEPER_SECURE_COOKIES).
    pub secure_cookies: bool,
    /// Session lifetime measured from the last request (from NOTEKEEPER_SESSION_TTL_SECS).
    pub session_ttl: Duration,
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: env_or("NOTEKEEPER_BIND", defaults.bind),
            port: env_or("NOTEKEEPER_PORT", defaults.port),
            database: std::env::var("NOTEKEEPER_DATABASE").ok().map(PathBuf::from),
            secure_cookies: env_or("NOTEKEEPER_SECURE_COOKIES", defaults.secure_cookies),
            session_ttl: Duration::from_secs(env_or(
                "NOTEKEEPER_SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            database: None,
            secure_cookies: false,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
        Err(_) => default,
    }
}
