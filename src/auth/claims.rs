// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated user representation.

use serde::Serialize;
use utoipa::ToSchema;

use super::error::AuthError;
use super::permissions::Permission;
use super::roles::Role;
use crate::storage::StoredUser;

/// The caller of a request, resolved from a verified session token.
///
/// This is the primary type handlers use to represent the authenticated
/// user. It is built from the stored record, so role changes take effect
/// on the next request rather than at the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Stored user id (the token's `aud` claim)
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// `Forbidden` unless the role grants `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), AuthError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                role = %self.role,
                permission = %permission,
                "Permission denied"
            );
            Err(AuthError::Forbidden(permission))
        }
    }

    /// Whether a path segment (id or username) names this user.
    pub fn is_target(&self, id_or_username: &str) -> bool {
        self.user_id == id_or_username || self.username == id_or_username
    }
}

impl From<StoredUser> for AuthenticatedUser {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}
