// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless session tokens.
//!
//! A session is an HS256-signed JWT carrying three claims:
//!
//! - `aud` → the user ID the session belongs to
//! - `iat` → issue time (Unix seconds)
//! - `exp` → `iat` + session lifetime
//!
//! Nothing is stored server-side. A token is valid while its signature
//! matches the shared secret and `now < exp`; it cannot be revoked early,
//! so the lifetime is kept short.
//!
//! ## Verification order
//!
//! 1. `Authorization` value must be exactly `<scheme> <token>`
//! 2. The header must declare `HS256`; any other algorithm, `none`
//!    included, is treated as a bad signature
//! 3. Signature check against the shared secret
//! 4. Expiry check
//! 5. `aud` must be present and a string

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SessionSecret, DEFAULT_SESSION_TTL_SECS};

/// The only algorithm sessions are signed or accepted with.
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

const SESSION_ALGORITHM_NAME: &str = "HS256";

/// Why a session could not be issued or verified.
///
/// Verification variants are for logs only: callers see a single
/// Unauthorized response whatever the reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("authorization header is not '<scheme> <token>'")]
    MalformedHeader,
    #[error("token is not a well-formed JWT")]
    MalformedToken,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token claims are malformed: {0}")]
    MalformedClaims(&'static str),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Claims written into every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// User ID
    pub aud: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
}

/// Claims as read back from a presented token, before validation.
#[derive(Debug, Clone, Deserialize)]
struct PresentedClaims {
    #[serde(default)]
    aud: Option<serde_json::Value>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Only the field needed to reject algorithm confusion up front.
#[derive(Debug, Deserialize)]
struct DeclaredHeader {
    alg: String,
}

/// Issues and verifies session tokens with one shared secret.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl SessionManager {
    /// Create a manager with the default one hour lifetime.
    pub fn new(secret: &SessionSecret) -> Self {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        // expiry is checked against an explicit clock in `verify_at`
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime: Duration::seconds(i64::from(DEFAULT_SESSION_TTL_SECS)),
        }
    }

    /// Override the session lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Issue a session for `user_id`, valid from now.
    pub fn issue(&self, user_id: &str) -> Result<String, SessionError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a session for `user_id` as if the current time were `now`.
    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = SessionClaims {
            aud: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::warn!(error = %e, "Failed to sign session token");
            SessionError::Signing(e.to_string())
        })
    }

    /// Verify an `Authorization` header value and return the user ID.
    pub fn verify(&self, authorization: &str) -> Result<String, SessionError> {
        self.verify_at(authorization, Utc::now())
    }

    /// Verify an `Authorization` header value against the clock `now`.
    pub fn verify_at(&self, authorization: &str, now: DateTime<Utc>) -> Result<String, SessionError> {
        let token = split_authorization(authorization)?;

        let declared = declared_algorithm(token)?;
        if declared != SESSION_ALGORITHM_NAME {
            tracing::warn!(alg = %declared, "session token declares unexpected algorithm");
            return Err(SessionError::InvalidSignature);
        }

        let data = decode::<PresentedClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    SessionError::InvalidSignature
                }
                ErrorKind::Json(_) => SessionError::MalformedClaims("claims are not valid JSON"),
                ErrorKind::MissingRequiredClaim(_) => {
                    SessionError::MalformedClaims("missing required claim")
                }
                _ => SessionError::MalformedToken,
            })?;
        let claims = data.claims;

        let exp = claims.exp.ok_or(SessionError::MalformedClaims("missing exp"))?;
        if now.timestamp() >= exp {
            return Err(SessionError::Expired);
        }

        match claims.aud {
            Some(serde_json::Value::String(user_id)) => Ok(user_id),
            Some(_) => Err(SessionError::MalformedClaims("aud is not a string")),
            None => Err(SessionError::MalformedClaims("missing aud")),
        }
    }
}

/// Split `<scheme> <token>` into the token.
///
/// The scheme itself is not interpreted. Any run of whitespace separates the
/// parts, and a value that is not exactly two parts is rejected.
fn split_authorization(authorization: &str) -> Result<&str, SessionError> {
    let mut parts = authorization.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_scheme), Some(token), None) => Ok(token),
        _ => Err(SessionError::MalformedHeader),
    }
}

/// Read the `alg` a token declares, without trusting anything else in it.
fn declared_algorithm(token: &str) -> Result<String, SessionError> {
    let segment = token.split('.').next().unwrap_or_default();
    let raw = Base64UrlUnpadded::decode_vec(segment).map_err(|_| SessionError::MalformedToken)?;
    let header: DeclaredHeader =
        serde_json::from_slice(&raw).map_err(|_| SessionError::MalformedToken)?;
    Ok(header.alg)
}
