// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;
use crate::storage::{StorageError, UserRepository, UserStore};

/// Extractor for authenticated users.
///
/// Reuses the identity `require_session` put in the request extensions if
/// present, otherwise verifies the `Authorization` header itself.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_user(
///     Auth(caller): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<UserView>, ApiError> {
///     // caller.role decides what is allowed
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let user = authenticate(&parts.headers, state).await?;
        Ok(Auth(user))
    }
}

/// Authentication for endpoints that also serve anonymous callers.
///
/// No `Authorization` header yields `None`. A header that is present but
/// does not verify is still rejected with 401.
pub struct MaybeAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(MaybeAuth(Some(user)));
        }

        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeAuth(None));
        }

        let user = authenticate(&parts.headers, state).await?;
        Ok(MaybeAuth(Some(user)))
    }
}

/// Resolve the caller from the `Authorization` header.
///
/// Every failure is `Unauthorized`; the specific reason is only logged.
pub async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthenticatedUser, AuthError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        tracing::debug!("Request has no Authorization header");
        return Err(AuthError::Unauthorized);
    };

    let Ok(value) = header.to_str() else {
        tracing::warn!("Authorization header is not valid ASCII");
        return Err(AuthError::Unauthorized);
    };

    let user_id = state.sessions.verify(value).map_err(|e| {
        tracing::warn!(reason = %e, "Session rejected");
        AuthError::Unauthorized
    })?;

    let storage = state.storage.read().await;
    match UserRepository::new(&storage).find_by_id(&user_id) {
        Ok(user) => Ok(user.into()),
        Err(StorageError::NotFound(_)) => {
            tracing::warn!(user_id = %user_id, "Session for unknown user");
            Err(AuthError::Unauthorized)
        }
        Err(e) => Err(AuthError::Internal(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{password::password_digest, Role, SessionManager};
    use crate::config::SessionSecret;
    use crate::storage::{DocumentStore, StoragePaths, StoredUser};
    use axum::http::Request;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, AppState, StoredUser) {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let mut storage = DocumentStore::new(StoragePaths::new(temp.path()));
        storage.initialize().expect("Failed to initialize storage");

        let user = StoredUser::new("foo", "foo@example.com", password_digest("bar"), Role::USER);
        UserRepository::new(&storage).insert(&user).unwrap();

        let sessions = SessionManager::new(&SessionSecret::new("test_secret").unwrap());
        (temp, AppState::new(storage, sessions), user)
    }

    fn parts_with(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_requires_header() {
        let (_temp, state, _) = setup().await;
        let result = Auth::from_request_parts(&mut parts_with(None), &state).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn auth_resolves_session_to_stored_user() {
        let (_temp, state, user) = setup().await;
        let token = state.sessions.issue(&user.id).unwrap();

        let header = format!("Bearer {token}");
        let Auth(caller) = Auth::from_request_parts(&mut parts_with(Some(&header)), &state)
            .await
            .unwrap();
        assert_eq!(caller.user_id, user.id);
        assert_eq!(caller.username, "foo");
        assert_eq!(caller.role, Role::USER);
    }

    #[tokio::test]
    async fn auth_rejects_session_of_deleted_user() {
        let (_temp, state, user) = setup().await;
        let token = state.sessions.issue(&user.id).unwrap();
        {
            let storage = state.storage.write().await;
            UserRepository::new(&storage).delete(&user.id).unwrap();
        }

        let header = format!("Bearer {token}");
        let result = Auth::from_request_parts(&mut parts_with(Some(&header)), &state).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn auth_prefers_extensions() {
        let (_temp, state, user) = setup().await;
        let mut parts = parts_with(None);
        let injected: AuthenticatedUser = user.into();
        parts.extensions.insert(injected.clone());

        let Auth(caller) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(caller, injected);
    }

    #[tokio::test]
    async fn maybe_auth_without_header_is_anonymous() {
        let (_temp, state, _) = setup().await;
        let MaybeAuth(caller) = MaybeAuth::from_request_parts(&mut parts_with(None), &state)
            .await
            .unwrap();
        assert!(caller.is_none());
    }

    #[tokio::test]
    async fn maybe_auth_with_bad_header_is_rejected() {
        let (_temp, state, _) = setup().await;
        let result = MaybeAuth::from_request_parts(&mut parts_with(Some("Bearer nope")), &state).await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
    }
}
