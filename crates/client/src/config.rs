//! Service endpoint configuration.

use std::time::Duration;

/// Endpoints and timeouts for one intake service instance.
///
/// All fields have defaults suitable for a locally running service.
/// Override via environment variables in other deployments.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the service (default: `http://localhost:5000`).
    pub base_url: String,
    /// Path of the multipart submission endpoint (default: `/start`).
    pub submit_path: String,
    /// Path of the live log event stream (default: `/logs`).
    pub logs_path: String,
    /// Path of the cleanup endpoint (default: `/cleanup`).
    pub cleanup_path: String,
    /// Timeout for submit and cleanup requests, in seconds
    /// (default: `30`). The log stream is deliberately not subject to
    /// any timeout: absence of messages is not an error.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            submit_path: "/start".into(),
            logs_path: "/logs".into(),
            cleanup_path: "/cleanup".into(),
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `INTAKE_BASE_URL`             | `http://localhost:5000` |
    /// | `INTAKE_SUBMIT_PATH`          | `/start`                |
    /// | `INTAKE_LOGS_PATH`            | `/logs`                 |
    /// | `INTAKE_CLEANUP_PATH`         | `/cleanup`              |
    /// | `INTAKE_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let request_timeout_secs: u64 = std::env::var("INTAKE_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.request_timeout_secs.to_string())
            .parse()
            .expect("INTAKE_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url: std::env::var("INTAKE_BASE_URL").unwrap_or(defaults.base_url),
            submit_path: std::env::var("INTAKE_SUBMIT_PATH").unwrap_or(defaults.submit_path),
            logs_path: std::env::var("INTAKE_LOGS_PATH").unwrap_or(defaults.logs_path),
            cleanup_path: std::env::var("INTAKE_CLEANUP_PATH").unwrap_or(defaults.cleanup_path),
            request_timeout_secs,
        }
    }

    pub fn submit_url(&self) -> String {
        format!("{}{}", self.base_url, self.submit_path)
    }

    pub fn logs_url(&self) -> String {
        format!("{}{}", self.base_url, self.logs_path)
    }

    pub fn cleanup_url(&self) -> String {
        format!("{}{}", self.base_url, self.cleanup_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let config = ServiceConfig::default();
        assert_eq!(config.submit_url(), "http://localhost:5000/start");
        assert_eq!(config.logs_url(), "http://localhost:5000/logs");
        assert_eq!(config.cleanup_url(), "http://localhost:5000/cleanup");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn urls_follow_overridden_base() {
        let config = ServiceConfig {
            base_url: "https://intake.example.com".into(),
            ..Default::default()
        };
        assert_eq!(config.logs_url(), "https://intake.example.com/logs");
    }
}
