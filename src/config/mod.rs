//! Configuration module for the catalog admin backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Where category documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Remote CouchDB database
    Couch {
        url: String,
        username: Option<String>,
        password: Option<String>,
    },
    /// Local SQLite file
    Sqlite { path: PathBuf },
}

impl StoreBackend {
    /// Short description for logs, without credentials.
    pub fn describe(&self) -> String {
        match self {
            StoreBackend::Couch { url, username, .. } => match username {
                Some(user) => format!("CouchDB at {} as {}", url, user),
                None => format!("CouchDB at {}", url),
            },
            StoreBackend::Sqlite { path } => format!("SQLite at {}", path.display()),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Document store backend
    pub store: StoreBackend,
    /// Per-request timeout for store calls
    pub store_timeout: Duration,
    /// Base URL of the external collector service
    pub collector_url: Option<String>,
    /// Upper bound on a single collection job
    pub job_timeout: Option<Duration>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_psk = non_empty_var("CATALOG_API_PSK");

        let store = match non_empty_var("CATALOG_STORE_URL") {
            Some(url) => StoreBackend::Couch {
                url,
                username: non_empty_var("CATALOG_STORE_USERNAME"),
                password: non_empty_var("CATALOG_STORE_PASSWORD"),
            },
            None => StoreBackend::Sqlite {
                path: env::var("CATALOG_DB_PATH")
                    .unwrap_or_else(|_| "./data/catalog.sqlite".to_string())
                    .into(),
            },
        };

        let store_timeout = Duration::from_secs(
            env::var("CATALOG_STORE_TIMEOUT_SECS")
                .unwrap_or_else(|_| Self::DEFAULT_STORE_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| "CATALOG_STORE_TIMEOUT_SECS must be a valid number".to_string())?,
        );

        let collector_url = non_empty_var("CATALOG_COLLECTOR_URL");

        let job_timeout = match non_empty_var("CATALOG_JOB_TIMEOUT_SECS") {
            Some(secs) => Some(Duration::from_secs(secs.parse::<u64>().map_err(|_| {
                "CATALOG_JOB_TIMEOUT_SECS must be a valid number".to_string()
            })?)),
            None => None,
        };

        let bind_addr = env::var("CATALOG_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid CATALOG_BIND_ADDR format: {}", e))?;

        let log_level = env::var("CATALOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = match non_empty_var("CATALOG_LOG_FORMAT").as_deref() {
            None | Some("pretty") => false,
            Some("json") => true,
            Some(other) => {
                return Err(format!(
                    "CATALOG_LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                    other
                ))
            }
        };

        Ok(Self {
            api_psk,
            store,
            store_timeout,
            collector_url,
            job_timeout,
            bind_addr,
            log_level,
            log_json,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
