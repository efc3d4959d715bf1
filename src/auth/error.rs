// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::permissions::Permission;

/// Authentication and authorization outcomes returned to callers.
///
/// Session verification failures carry no detail: the reason is logged
/// where it happens and every variant that maps to 401 renders the same
/// body, so callers cannot tell an expired token from a forged one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing, malformed, expired or forged session, or unknown user
    Unauthorized,
    /// Username/password pair did not match an account
    InvalidCredentials,
    /// Identity known but the role lacks a permission
    Forbidden(Permission),
    /// Server-side fault (signing, storage)
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthorized | AuthError::InvalidCredentials => "unauthorized",
            AuthError::Forbidden(_) => "insufficient_permissions",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthorized | AuthError::InvalidCredentials => {
                write!(f, "Authentication required")
            }
            AuthError::Forbidden(permission) => {
                write!(f, "Insufficient permissions: {permission} required")
            }
            AuthError::Internal(_) => write!(f, "Internal server error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal authentication error");
        }

        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: AuthError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let (status, body) = body_of(AuthError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "unauthorized");
    }

    #[tokio::test]
    async fn bad_credentials_look_like_any_other_401() {
        let unauthorized = body_of(AuthError::Unauthorized).await;
        let credentials = body_of(AuthError::InvalidCredentials).await;
        assert_eq!(unauthorized, credentials);
    }

    #[tokio::test]
    async fn forbidden_returns_403_with_permission() {
        let (status, body) = body_of(AuthError::Forbidden(Permission::ModifyAllUsers)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "insufficient_permissions");
        assert!(body["error"].as_str().unwrap().contains("modify_all_users"));
    }

    #[tokio::test]
    async fn internal_detail_is_not_echoed() {
        let (status, body) = body_of(AuthError::Internal("HMAC key rejected".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("HMAC"));
    }
}
