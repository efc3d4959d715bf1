// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use base64ct::{Base64, Encoding};

use crate::{
    auth::{service, AuthError},
    models::SessionResponse,
    state::AppState,
    storage::{AuditEvent, AuditEventType, AuditRepository, UserRepository},
};

/// Username and password from an `Authorization: Basic` header.
#[derive(Debug, PartialEq, Eq)]
struct BasicCredentials {
    username: String,
    password: String,
}

fn basic_credentials(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = Base64::decode_vec(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Exchange basic credentials for a session token.
#[utoipa::path(
    get,
    path = "/api/v1/login",
    tag = "Session",
    security(("basic" = [])),
    responses(
        (status = 200, body = SessionResponse),
        (status = 401, description = "Missing or invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AuthError> {
    let Some(credentials) = basic_credentials(&headers) else {
        tracing::debug!("Login without usable basic credentials");
        return Err(AuthError::Unauthorized);
    };

    let storage = state.storage.read().await;
    let audit = AuditRepository::new(&storage);

    match service::login(
        &UserRepository::new(&storage),
        &state.sessions,
        &credentials.username,
        &credentials.password,
    ) {
        Ok(login) => {
            audit.record(AuditEvent::new(AuditEventType::LoginSucceeded).with_actor(&login.user.id));
            Ok(Json(SessionResponse {
                session: login.session,
            }))
        }
        Err(e) => {
            audit.record(
                AuditEvent::new(AuditEventType::LoginFailed)
                    .with_details(serde_json::json!({ "username": credentials.username }))
                    .failed(e.error_code()),
            );
            Err(e)
        }
    }
}
