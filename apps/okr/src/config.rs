//! # Server Configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! | Variable               | Field                  | Default                  |
//! |------------------------|------------------------|--------------------------|
//! | `OKR_HOST`             | `host`                 | `127.0.0.1`              |
//! | `OKR_PORT`             | `port`                 | `4000`                   |
//! | `OKR_JWT_SECRET`       | `jwt_secret`           | (required)               |
//! | `JWT_SECRET`           | `jwt_secret` fallback  |                          |
//! | `OKR_TOKEN_TTL_DAYS`   | `token_ttl_days`       | `7`                      |
//! | `FRONTEND_URL`         | `frontend_url`         | `http://localhost:3000`  |
//! | `OKR_CORS_ORIGINS`     | `cors_origins`         | localhost only           |
//! | `OKR_RATE_LIMIT`       | `rate_limit`           | `100` (0 disables)       |
//! | `GITHUB_CLIENT_ID`     | `github.client_id`     |                          |
//! | `GITHUB_CLIENT_SECRET` | `github.client_secret` |                          |
//! | `GITHUB_CALLBACK_URL`  | `github.callback_url`  |                          |

use okr_core::OkrError;
use serde::Deserialize;
use std::path::Path;

/// Default port of the API server.
pub const DEFAULT_PORT: u16 = 4000;

/// Default bearer token lifetime.
pub const DEFAULT_TOKEN_TTL_DAYS: u32 = 7;

/// Accepted bearer token lifetimes, in days.
pub const TOKEN_TTL_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=3650;

/// Default global rate limit, requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// HS256 signing secret. The server refuses to start without one.
    pub jwt_secret: Option<String>,
    pub token_ttl_days: u32,
    /// Where the web client lives; OAuth redirects land here.
    pub frontend_url: String,
    /// `*`, a comma-separated origin list, or unset for localhost only.
    pub cors_origins: Option<String>,
    pub rate_limit: u32,
    pub github: GithubConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            jwt_secret: None,
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            frontend_url: "http://localhost:3000".to_string(),
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            github: GithubConfig::default(),
        }
    }
}

/// GitHub OAuth application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Must match the callback registered with the GitHub application.
    pub callback_url: Option<String>,
    /// Base of the authorize and token endpoints.
    pub oauth_url: String,
    /// Base of the REST API.
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            callback_url: None,
            oauth_url: "https://github.com".to_string(),
            api_url: "https://api.github.com".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from an optional TOML file, then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, OkrError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, OkrError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            OkrError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, OkrError> {
        let config: Self = toml::from_str(text).map_err(|e| OkrError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `lookup`. Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), OkrError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("OKR_HOST") {
            self.host = host;
        }
        if let Some(port) = get("OKR_PORT") {
            self.port = parse_number("OKR_PORT", &port)?;
        }
        if let Some(secret) = get("OKR_JWT_SECRET").or_else(|| get("JWT_SECRET")) {
            self.jwt_secret = Some(secret);
        }
        if let Some(ttl) = get("OKR_TOKEN_TTL_DAYS") {
            self.token_ttl_days = parse_number("OKR_TOKEN_TTL_DAYS", &ttl)?;
        }
        if let Some(url) = get("FRONTEND_URL") {
            self.frontend_url = url;
        }
        if let Some(origins) = get("OKR_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        if let Some(limit) = get("OKR_RATE_LIMIT") {
            self.rate_limit = parse_number("OKR_RATE_LIMIT", &limit)?;
        }
        if let Some(id) = get("GITHUB_CLIENT_ID") {
            self.github.client_id = Some(id);
        }
        if let Some(secret) = get("GITHUB_CLIENT_SECRET") {
            self.github.client_secret = Some(secret);
        }
        if let Some(url) = get("GITHUB_CALLBACK_URL") {
            self.github.callback_url = Some(url);
        }
        self.validate()
    }

    /// Range checks that parsing alone does not cover.
    pub fn validate(&self) -> Result<(), OkrError> {
        if !TOKEN_TTL_DAYS_RANGE.contains(&self.token_ttl_days) {
            return Err(OkrError::Config(format!(
                "token_ttl_days must be between {} and {}, got {}",
                TOKEN_TTL_DAYS_RANGE.start(),
                TOKEN_TTL_DAYS_RANGE.end(),
                self.token_ttl_days
            )));
        }
        Ok(())
    }

    /// The signing secret, or a configuration error if none is set.
    pub fn require_jwt_secret(&self) -> Result<&str, OkrError> {
        self.jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                OkrError::Config(
                    "JWT secret is not set (OKR_JWT_SECRET or JWT_SECRET)".to_string(),
                )
            })
    }

    /// `host:port` for binding.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Frontend URL without a trailing slash.
    #[must_use]
    pub fn frontend_base(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, OkrError> {
    value
        .trim()
        .parse()
        .map_err(|_| OkrError::Config(format!("{} must be a number, got '{}'", key, value)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:4000");
        assert_eq!(config.token_ttl_days, 7);
        assert_eq!(config.rate_limit, 100);
        assert!(config.require_jwt_secret().is_err());
    }

    #[test]
    fn toml_then_env() {
        let mut config = ServerConfig::from_toml(
            r#"
            port = 5000
            jwt_secret = "from-file"
            frontend_url = "https://okr.example.com/"

            [github]
            client_id = "abc"
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.port, 5000);
        assert_eq!(config.github.client_id.as_deref(), Some("abc"));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.frontend_base(), "https://okr.example.com");

        config
            .apply_env(env(&[("OKR_PORT", "6000"), ("JWT_SECRET", "legacy")]))
            .expect("env");
        assert_eq!(config.port, 6000);
        assert_eq!(config.require_jwt_secret().expect("secret"), "legacy");
    }

    #[test]
    fn okr_secret_wins_over_legacy_name() {
        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[("OKR_JWT_SECRET", "new"), ("JWT_SECRET", "old")]))
            .expect("env");
        assert_eq!(config.jwt_secret.as_deref(), Some("new"));
    }

    #[test]
    fn bad_number_is_config_error() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env(env(&[("OKR_RATE_LIMIT", "lots")]))
            .expect_err("invalid");
        assert!(matches!(err, OkrError::Config(_)));
    }

    #[test]
    fn token_ttl_out_of_range_rejected() {
        for ttl in ["0", "3651", "4294967295"] {
            let mut config = ServerConfig::default();
            let err = config
                .apply_env(env(&[("OKR_TOKEN_TTL_DAYS", ttl)]))
                .expect_err(ttl);
            assert!(matches!(err, OkrError::Config(_)), "{ttl}");
        }
        assert!(ServerConfig::from_toml("token_ttl_days = 0").is_err());

        let mut config = ServerConfig::default();
        config
            .apply_env(env(&[("OKR_TOKEN_TTL_DAYS", "3650")]))
            .expect("upper bound");
        assert_eq!(config.token_ttl_days, 3650);
    }

    #[test]
    fn unknown_toml_key_rejected() {
        assert!(ServerConfig::from_toml("colour = \"blue\"").is_err());
    }
}
