//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ApiError, ApiResult};

/// Connection and browser settings for a test run.
///
/// Loaded from a TOML file, then overridden from `BUILDPROBE_*` environment
/// variables so CI can point the same file at another server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Server host, optionally with scheme and port
    pub host: String,

    /// Super-user authentication token (empty username)
    pub super_user_token: String,

    /// Browser for UI scenarios
    pub browser: String,

    /// Remote Playwright endpoint (ws://...), if browsers run elsewhere
    pub remote: Option<String>,

    /// Run browsers headless
    pub headless: bool,

    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8111".to_string(),
            super_user_token: String::new(),
            browser: "chrome".to_string(),
            remote: None,
            headless: true,
            request_timeout_secs: 30,
        }
    }
}

impl ProbeConfig {
    pub const ENV_HOST: &'static str = "BUILDPROBE_HOST";
    pub const ENV_SUPER_USER_TOKEN: &'static str = "BUILDPROBE_SUPER_USER_TOKEN";
    pub const ENV_BROWSER: &'static str = "BUILDPROBE_BROWSER";
    pub const ENV_REMOTE: &'static str = "BUILDPROBE_REMOTE";

    /// Load configuration from file (missing file means defaults), then apply env overrides
    pub fn load(path: &Path) -> ApiResult<Self> {
        let config = Self::from_file(path)?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> ApiResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(Self::ENV_HOST) {
            self.host = host;
        }
        if let Some(token) = lookup(Self::ENV_SUPER_USER_TOKEN) {
            self.super_user_token = token;
        }
        if let Some(browser) = lookup(Self::ENV_BROWSER) {
            self.browser = browser;
        }
        if let Some(remote) = lookup(Self::ENV_REMOTE) {
            self.remote = if remote.is_empty() { None } else { Some(remote) };
        }
        self
    }

    /// Base URL of the server; `http://` is assumed when the host has no scheme
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.host.trim().is_empty() {
            return Err(ApiError::Config("host must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ApiError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use test_case::test_case;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProbeConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ProbeConfig::default());
    }

    #[test]
    fn test_file_values_and_defaults_merge() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"ci.example:8111\"\nsuper_user_token = \"123\"").unwrap();

        let config = ProbeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "ci.example:8111");
        assert_eq!(config.super_user_token, "123");
        assert_eq!(config.browser, "chrome");
        assert!(config.headless);
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("BUILDPROBE_HOST", "10.0.0.5:8111"),
            ("BUILDPROBE_BROWSER", "firefox"),
            ("BUILDPROBE_REMOTE", "ws://grid:3000"),
        ]
        .into_iter()
        .collect();

        let config = ProbeConfig::default().with_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.host, "10.0.0.5:8111");
        assert_eq!(config.browser, "firefox");
        assert_eq!(config.remote.as_deref(), Some("ws://grid:3000"));
        assert_eq!(config.super_user_token, "");
    }

    #[test_case("localhost:8111", "http://localhost:8111" ; "bare host")]
    #[test_case("https://ci.example/", "https://ci.example" ; "scheme kept")]
    #[test_case("http://127.0.0.1:1234", "http://127.0.0.1:1234" ; "mock server url")]
    fn test_base_url(host: &str, expected: &str) {
        let config = ProbeConfig {
            host: host.to_string(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), expected);
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let config = ProbeConfig {
            host: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ApiError::Config(_))));
    }
}
