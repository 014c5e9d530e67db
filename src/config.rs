//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.
//! Cache and prefetch policy numbers are compile-time constants and are not
//! configurable here.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const APP_DIR: &str = "feed_prefetch";

/// Service configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Directory holding the persisted cache snapshot
    pub snapshot_dir: PathBuf,
    /// Per-fetch timeout in seconds
    pub fetch_timeout: u64,
    /// Expiry sweep interval in seconds
    pub sweep_interval: u64,
    /// Seconds to wait for in-flight warm-up passes at shutdown
    pub shutdown_grace: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SNAPSHOT_DIR` - Snapshot directory (default: platform cache dir)
    /// - `FETCH_TIMEOUT` - Per-fetch timeout in seconds (default: 15)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 300)
    /// - `SHUTDOWN_GRACE` - Shutdown drain window in seconds (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            snapshot_dir: env::var_os("SNAPSHOT_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_dir),
            fetch_timeout: parse_var("FETCH_TIMEOUT").unwrap_or(defaults.fetch_timeout),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            shutdown_grace: parse_var("SHUTDOWN_GRACE").unwrap_or(defaults.shutdown_grace),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            snapshot_dir: default_snapshot_dir(),
            fetch_timeout: 15,
            sweep_interval: 300,
            shutdown_grace: 5,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn default_snapshot_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(15));
        assert_eq!(config.sweep_interval, 300);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert!(config.snapshot_dir.ends_with(APP_DIR) || config.snapshot_dir.ends_with("data"));
    }

    #[test]
    fn test_config_from_env() {
        // Env vars are process-global, so all cases live in one test
        env::remove_var("SERVER_PORT");
        env::remove_var("SNAPSHOT_DIR");
        env::remove_var("FETCH_TIMEOUT");
        env::remove_var("SWEEP_INTERVAL");
        env::remove_var("SHUTDOWN_GRACE");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.snapshot_dir, default_snapshot_dir());

        env::set_var("SERVER_PORT", "8080");
        env::set_var("SNAPSHOT_DIR", "/tmp/feed");
        env::set_var("FETCH_TIMEOUT", "not-a-number");
        env::set_var("SWEEP_INTERVAL", " 60 ");

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.snapshot_dir, PathBuf::from("/tmp/feed"));
        assert_eq!(config.fetch_timeout, 15);
        assert_eq!(config.sweep_interval, 60);

        env::remove_var("SERVER_PORT");
        env::remove_var("SNAPSHOT_DIR");
        env::remove_var("FETCH_TIMEOUT");
        env::remove_var("SWEEP_INTERVAL");
    }
}
