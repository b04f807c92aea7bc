//! Client configuration loaded from environment variables.
//!
//! Loaded once at process start; the API base address never changes after
//! the HTTP client has been built.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// API origin, e.g. `https://api.react.nos-apps.com/api`
    pub api_base_url: String,
    /// Group prefix inserted before every endpoint path
    pub api_group: String,
    /// Location of the persistent client store (JSON file)
    pub store_path: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Delay between logout and the redirect to the login screen
    pub logout_redirect_delay: Duration,
    /// Legacy admin account name, checked last when resolving the admin role
    pub admin_display_name: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| "https://api.react.nos-apps.com/api".to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid("API_BASE_URL", api_base_url));
        }

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_group: env::var("API_GROUP")
                .map(|g| g.trim_matches('/').to_string())
                .unwrap_or_else(|_| "groupe-8".to_string()),
            store_path: env::var("STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".etab-client/store.json")),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),
            logout_redirect_delay: Duration::from_millis(parse_or(
                "LOGOUT_REDIRECT_DELAY_MS",
                100,
            )?),
            admin_display_name: env::var("ADMIN_DISPLAY_NAME")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Config pointing at a local mock server, for tests.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:9".to_string(),
            api_group: "groupe-8".to_string(),
            store_path: PathBuf::from("target/test-store.json"),
            request_timeout: Duration::from_secs(5),
            logout_redirect_delay: Duration::from_millis(10),
            admin_display_name: None,
        }
    }

    /// Root URL every endpoint path is appended to.
    pub fn api_root(&self) -> String {
        if self.api_group.is_empty() {
            self.api_base_url.clone()
        } else {
            format!("{}/{}", self.api_base_url, self.api_group)
        }
    }
}

fn parse_or(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, v)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("API_BASE_URL", "http://localhost:8000/api/");
        env::set_var("API_GROUP", "/groupe-3/");
        env::set_var("REQUEST_TIMEOUT_SECS", "12");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.api_root(), "http://localhost:8000/api/groupe-3");
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(config.logout_redirect_delay, Duration::from_millis(100));

        env::remove_var("API_BASE_URL");
        env::remove_var("API_GROUP");
        env::remove_var("REQUEST_TIMEOUT_SECS");
    }
}
