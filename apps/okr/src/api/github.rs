//! # GitHub OAuth Client
//!
//! Authorization-code flow against GitHub:
//! 1. Redirect the browser to `{oauth_url}/login/oauth/authorize`
//! 2. Exchange the returned `code` at `{oauth_url}/login/oauth/access_token`
//! 3. Read the profile from `{api_url}/user`, and the primary verified
//!    address from `{api_url}/user/emails` when the profile hides it

use crate::config::GithubConfig;
use okr_core::GithubProfile;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;

const SCOPE: &str = "user:email";
const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("cannot reach GitHub: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GitHub refused the code: {0}")]
    Denied(String),

    #[error("invalid GitHub URL: {0}")]
    Url(String),
}

/// Token endpoint reply. GitHub answers 200 with an `error` field on
/// failure.
#[derive(Debug, Deserialize)]
struct TokenExchange {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// HTTP client for one registered GitHub OAuth application.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: Option<String>,
    oauth_url: String,
    api_url: String,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("client_id", &self.client_id)
            .field("oauth_url", &self.oauth_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl GithubClient {
    /// `Ok(None)` when no client id/secret is configured.
    pub fn from_config(config: &GithubConfig) -> Result<Option<Self>, GithubError> {
        let (Some(client_id), Some(client_secret)) =
            (config.client_id.clone(), config.client_secret.clone())
        else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("okr/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Some(Self {
            http,
            client_id,
            client_secret,
            callback_url: config.callback_url.clone(),
            oauth_url: config.oauth_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }))
    }

    /// Where to send the browser to start signing in.
    pub fn authorize_url(&self) -> Result<String, GithubError> {
        let mut params = vec![("client_id", self.client_id.as_str()), ("scope", SCOPE)];
        if let Some(callback) = &self.callback_url {
            params.push(("redirect_uri", callback.as_str()));
        }
        let url = reqwest::Url::parse_with_params(
            &format!("{}/login/oauth/authorize", self.oauth_url),
            &params,
        )
        .map_err(|e| GithubError::Url(e.to_string()))?;
        Ok(url.into())
    }

    /// Exchange the callback code and read the signed-in profile.
    pub async fn sign_in(&self, code: &str) -> Result<GithubProfile, GithubError> {
        let access_token = self.exchange_code(code).await?;
        self.fetch_profile(access_token).await
    }

    async fn exchange_code(&self, code: &str) -> Result<String, GithubError> {
        let mut body = serde_json::json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "code": code,
        });
        if let Some(callback) = &self.callback_url {
            body["redirect_uri"] = serde_json::Value::String(callback.clone());
        }

        let resp = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_url))
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;
        let exchange: TokenExchange = check_status(resp).await?.json().await?;

        match (exchange.access_token, exchange.error) {
            (Some(token), None) => Ok(token),
            (_, error) => Err(GithubError::Denied(
                exchange
                    .error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )),
        }
    }

    async fn fetch_profile(&self, access_token: String) -> Result<GithubProfile, GithubError> {
        let resp = self
            .http
            .get(format!("{}/user", self.api_url))
            .header(ACCEPT, GITHUB_JSON)
            .bearer_auth(&access_token)
            .send()
            .await?;
        let user: GithubUser = check_status(resp).await?.json().await?;

        let email = match user.email.filter(|e| !e.trim().is_empty()) {
            Some(email) => Some(email),
            None => match self.primary_email(&access_token).await {
                Ok(email) => email,
                Err(e) => {
                    tracing::warn!(login = %user.login, error = %e, "cannot read GitHub emails");
                    None
                }
            },
        };

        Ok(GithubProfile {
            github_id: user.id.to_string(),
            login: user.login,
            name: user.name,
            email,
            access_token,
        })
    }

    async fn primary_email(&self, access_token: &str) -> Result<Option<String>, GithubError> {
        let resp = self
            .http
            .get(format!("{}/user/emails", self.api_url))
            .header(ACCEPT, GITHUB_JSON)
            .bearer_auth(access_token)
            .send()
            .await?;
        let emails: Vec<GithubEmail> = check_status(resp).await?.json().await?;
        Ok(pick_email(emails))
    }
}

/// Primary and verified first, then any verified address.
fn pick_email(emails: Vec<GithubEmail>) -> Option<String> {
    let mut fallback = None;
    for email in emails.into_iter().filter(|e| e.verified) {
        if email.primary {
            return Some(email.email);
        }
        fallback.get_or_insert(email.email);
    }
    fallback
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GithubError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(GithubError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GithubConfig {
        GithubConfig {
            client_id: Some("abc123".to_string()),
            client_secret: Some("shh".to_string()),
            callback_url: Some("http://localhost:4000/api/auth/github/callback".to_string()),
            ..GithubConfig::default()
        }
    }

    #[test]
    fn unconfigured_is_none() {
        let client = GithubClient::from_config(&GithubConfig::default()).expect("build");
        assert!(client.is_none());
    }

    #[test]
    fn authorize_url_carries_client_scope_and_callback() {
        let client = GithubClient::from_config(&configured())
            .expect("build")
            .expect("configured");
        let url = client.authorize_url().expect("url");

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=abc123"));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A4000"));
    }

    #[test]
    fn primary_verified_email_wins() {
        let emails = vec![
            GithubEmail {
                email: "old@example.com".to_string(),
                primary: false,
                verified: true,
            },
            GithubEmail {
                email: "unverified@example.com".to_string(),
                primary: true,
                verified: false,
            },
            GithubEmail {
                email: "main@example.com".to_string(),
                primary: true,
                verified: true,
            },
        ];
        assert_eq!(pick_email(emails).as_deref(), Some("main@example.com"));
    }

    #[test]
    fn falls_back_to_first_verified() {
        let emails = vec![
            GithubEmail {
                email: "a@example.com".to_string(),
                primary: false,
                verified: true,
            },
            GithubEmail {
                email: "b@example.com".to_string(),
                primary: false,
                verified: true,
            },
        ];
        assert_eq!(pick_email(emails).as_deref(), Some("a@example.com"));
        assert_eq!(pick_email(Vec::new()), None);
    }
}
