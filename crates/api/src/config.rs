use std::time::Duration;

use labtrack_core::types::Units;
use labtrack_ledger::ServiceConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Bound on waiting for a reservation key's critical section, in
    /// milliseconds (default: `2000`).
    pub lock_wait_ms: u64,
    /// Hardware kinds seeded into every new project, as (name, capacity).
    pub default_kinds: Vec<(String, Units)>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `LOCK_WAIT_MS`         | `2000`                     |
    /// | `DEFAULT_KINDS`        | `HWSet1:100,HWSet2:100`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let lock_wait_ms: u64 = std::env::var("LOCK_WAIT_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("LOCK_WAIT_MS must be a valid u64");

        let default_kinds = std::env::var("DEFAULT_KINDS")
            .map(|raw| parse_default_kinds(&raw))
            .unwrap_or_else(|_| {
                vec![("HWSet1".to_string(), 100), ("HWSet2".to_string(), 100)]
            });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            lock_wait_ms,
            default_kinds,
        }
    }

    /// Derive the reservation service's tunables from this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            lock_wait: Duration::from_millis(self.lock_wait_ms),
            default_kinds: self.default_kinds.clone(),
        }
    }
}

/// Parse a `name:capacity,name:capacity` list.
///
/// Malformed entries abort startup: misconfiguration should fail fast,
/// not silently seed the wrong pool.
fn parse_default_kinds(raw: &str) -> Vec<(String, Units)> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (name, capacity) = entry
                .split_once(':')
                .unwrap_or_else(|| panic!("DEFAULT_KINDS entry '{entry}' must be name:capacity"));
            let capacity: Units = capacity
                .trim()
                .parse()
                .unwrap_or_else(|_| panic!("DEFAULT_KINDS capacity in '{entry}' must be a number"));
            (name.trim().to_string(), capacity)
        })
        .collect()
}
