// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Everything that crosses
//! the wire derives `ToSchema` for the OpenAPI document.
//!
//! Stored records ([`StoredUser`]) never leave the server as-is: responses
//! use [`UserView`], which has no password digest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::Role;
use crate::storage::StoredUser;

// =============================================================================
// Users
// =============================================================================

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Permission bitmask
    #[schema(value_type = u32)]
    pub role: Role,
}

impl From<StoredUser> for UserView {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// A required request field that was missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} field is required as {expected}")]
pub struct ValidationError {
    pub field: &'static str,
    pub expected: &'static str,
}

impl ValidationError {
    fn string(field: &'static str) -> Self {
        Self {
            field,
            expected: "string",
        }
    }
}

fn require_string(field: &'static str, value: &Option<String>) -> Result<String, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::string(field)),
    }
}

/// Passwords are kept verbatim: login digests the raw Basic password.
fn require_password(value: &Option<String>) -> Result<String, ValidationError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::string("password")),
    }
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Only honoured when the caller may modify all users
    #[schema(value_type = Option<u32>)]
    pub role: Option<Role>,
}

/// A `CreateUserRequest` whose required fields are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
}

impl CreateUserRequest {
    /// Check required fields in `email`, `username`, `password` order.
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        Ok(NewUser {
            email: require_string("email", &self.email)?,
            username: require_string("username", &self.username)?,
            password: require_password(&self.password)?,
            role: self.role,
        })
    }
}

/// Body of `PATCH /users/{user}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Current password of the target; required to change the password
    /// without the `modify_all_users` permission
    #[serde(rename = "oldPassword")]
    pub old_password: Option<String>,
    #[schema(value_type = Option<u32>)]
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    /// Present fields must not be blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("username", &self.username), ("email", &self.email)] {
            if value.is_some() {
                require_string(field, value)?;
            }
        }
        if self.password.is_some() {
            require_password(&self.password)?;
        }
        Ok(())
    }
}

/// Body of `GET /users`: a list, or an object keyed by id when `mapped`.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum UserList {
    List(Vec<UserView>),
    Mapped(BTreeMap<String, UserView>),
}

impl UserList {
    pub fn new(users: Vec<StoredUser>, mapped: bool) -> Self {
        let views = users.into_iter().map(UserView::from);
        if mapped {
            UserList::Mapped(views.map(|v| (v.id.clone(), v)).collect())
        } else {
            UserList::List(views.collect())
        }
    }
}

/// Query of `GET /users`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct UserListQuery {
    /// Return an object keyed by user id instead of a list
    #[serde(default)]
    pub mapped: bool,
}

// =============================================================================
// Sessions
// =============================================================================

/// Body returned by `GET /login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SessionResponse {
    /// Bearer token for subsequent requests
    pub session: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> CreateUserRequest {
        CreateUserRequest {
            email: Some("foo@example.com".into()),
            username: Some("foo".into()),
            password: Some("bar".into()),
            role: None,
        }
    }

    #[test]
    fn create_request_validates() {
        let user = full_request().validate().unwrap();
        assert_eq!(user.username, "foo");
        assert_eq!(user.role, None);
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let err = CreateUserRequest::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "email field is required as string");

        let mut request = full_request();
        request.username = Some("   ".into());
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "username field is required as string"
        );

        let mut request = full_request();
        request.password = None;
        assert_eq!(request.validate().unwrap_err().field, "password");
    }

    #[test]
    fn password_is_kept_verbatim() {
        let mut request = full_request();
        request.username = Some("  foo ".into());
        request.password = Some(" pw ".into());
        let user = request.validate().unwrap();
        assert_eq!(user.username, "foo");
        assert_eq!(user.password, " pw ");

        let mut request = full_request();
        request.password = Some(String::new());
        assert_eq!(request.validate().unwrap_err().field, "password");
    }

    #[test]
    fn update_request_reads_camel_case_old_password() {
        let request: UpdateUserRequest =
            serde_json::from_str(r#"{"password":"new","oldPassword":"old","role":15}"#).unwrap();
        assert_eq!(request.old_password.as_deref(), Some("old"));
        assert_eq!(request.role, Some(Role::from_bits(15)));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn update_request_rejects_blank_fields() {
        let request = UpdateUserRequest {
            email: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(request.validate().unwrap_err().field, "email");
    }

    #[test]
    fn user_list_shapes() {
        let users = vec![
            StoredUser::new("foo", "foo@example.com", "d", Role::USER),
            StoredUser::new("bar", "bar@example.com", "d", Role::ADMIN),
        ];

        let list = serde_json::to_value(UserList::new(users.clone(), false)).unwrap();
        assert_eq!(list.as_array().unwrap().len(), 2);

        let mapped = serde_json::to_value(UserList::new(users.clone(), true)).unwrap();
        assert_eq!(mapped[&users[1].id]["username"], "bar");
    }

    #[test]
    fn user_view_hides_digest() {
        let stored = StoredUser::new("foo", "foo@example.com", "secret-digest", Role::USER);
        let json = serde_json::to_string(&UserView::from(stored)).unwrap();
        assert!(!json.contains("secret-digest"));
        assert!(json.contains(r#""role":2"#));
    }
}
