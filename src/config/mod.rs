//! Configuration module for the RWU admin core.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key required on every record-store request (auth disabled when unset)
    pub api_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the record-store service to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL of the record store used by admin clients
    pub store_url: String,
    /// File backing the persisted admin session
    pub session_path: PathBuf,
    /// Lifetime of a freshly signed-in session
    pub session_ttl: Duration,
    /// Quiescence delay before a typed search is queried
    pub search_debounce: Duration,
    /// Admin account created at startup when both values are set
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the first admin account.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_key = env::var("RWU_API_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("RWU_DB_PATH")
            .unwrap_or_else(|_| "./data/rwu.sqlite".to_string())
            .into();

        let bind_addr = env::var("RWU_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid RWU_BIND_ADDR format");

        let log_level = env::var("RWU_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let store_url =
            env::var("RWU_STORE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let session_path = env::var("RWU_SESSION_PATH")
            .unwrap_or_else(|_| "./data/session.json".to_string())
            .into();

        let ttl_hours = env::var("RWU_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(24);

        let debounce_ms = env::var("RWU_SEARCH_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);

        let bootstrap_admin = match (
            env::var("RWU_ADMIN_EMAIL").ok(),
            env::var("RWU_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        Self {
            api_key,
            db_path,
            bind_addr,
            log_level,
            store_url,
            session_path,
            session_ttl: session_ttl_from_hours(ttl_hours),
            search_debounce: Duration::from_millis(debounce_ms),
            bootstrap_admin,
        }
    }
}

/// Hours to a TTL, saturating instead of overflowing on huge values.
fn session_ttl_from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for key in [
            "RWU_API_KEY",
            "RWU_DB_PATH",
            "RWU_BIND_ADDR",
            "RWU_LOG_LEVEL",
            "RWU_STORE_URL",
            "RWU_SESSION_PATH",
            "RWU_SESSION_TTL_HOURS",
            "RWU_SEARCH_DEBOUNCE_MS",
            "RWU_ADMIN_EMAIL",
            "RWU_ADMIN_PASSWORD",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env();

        assert!(config.api_key.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/rwu.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.store_url, "http://127.0.0.1:8080");
        assert_eq!(config.session_path, PathBuf::from("./data/session.json"));
        assert_eq!(config.session_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_huge_session_ttl_saturates() {
        assert_eq!(session_ttl_from_hours(2), Duration::from_secs(7200));
        assert_eq!(session_ttl_from_hours(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
