//! # Bearer Tokens
//!
//! Compact HS256 JWTs carrying `{id, iat, exp}`.
//!
//! ```text
//! base64url(header) . base64url(claims) . base64url(HMAC-SHA256(secret, header.claims))
//! ```
//!
//! Only `HS256` is accepted. Signatures are compared in constant time.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use okr_core::UserId;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id.
    pub id: u64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expires at, seconds since the epoch.
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Why a token was not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("bad signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid signing key")]
    Key,

    #[error("token lifetime out of range")]
    Lifetime,
}

impl TokenError {
    /// Short machine-readable reason for auth failure logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed_token",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::BadSignature => "bad_signature",
            Self::Expired => "token_expired",
            Self::Key => "invalid_key",
            Self::Lifetime => "invalid_lifetime",
        }
    }
}

/// Signs and verifies bearer tokens with one shared secret.
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_days", &self.ttl.num_days())
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_days: u32) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::days(i64::from(ttl_days)),
        }
    }

    pub fn issue(&self, user: UserId) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::Lifetime)?;
        let claims = Claims {
            id: user.0,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let header = encode_segment(&header)?;
        let claims = encode_segment(&claims)?;
        let signing_input = format!("{}.{}", header, claims);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes())?);
        Ok(format!("{}.{}", signing_input, signature))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let decoded: Header = decode_segment(header)?;
        if decoded.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(decoded.alg));
        }

        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let expected = self.sign(format!("{}.{}", header, claims).as_bytes())?;
        if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            return Err(TokenError::BadSignature);
        }

        let claims: Claims = decode_segment(claims)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::Key)?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|_| TokenError::Malformed)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

// =============================================================================
// TESTS
// =============================================================================
