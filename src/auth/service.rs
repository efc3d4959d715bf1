// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and admin bootstrap.

use super::password::password_digest;
use super::session::SessionManager;
use super::{AuthError, Role};
use crate::config::{AdminAccount, SessionSecret};
use crate::storage::{StorageError, StorageResult, StoredUser, UserStore};

/// A successful login.
#[derive(Debug, Clone)]
pub struct Login {
    pub user: StoredUser,
    /// Signed session token for `user`
    pub session: String,
}

/// Exchange a username and clear-text password for a session.
///
/// An unknown username and a wrong password are both `InvalidCredentials`.
pub fn login(
    store: &impl UserStore,
    sessions: &SessionManager,
    username: &str,
    password: &str,
) -> Result<Login, AuthError> {
    let user = match store.find_by_credentials(username, &password_digest(password)) {
        Ok(user) => user,
        Err(StorageError::NotFound(_)) => {
            tracing::info!(username = %username, "Login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(AuthError::Internal(e.to_string())),
    };

    let session = sessions
        .issue(&user.id)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "Session issued");
    Ok(Login { user, session })
}

/// Create the bootstrap admin account unless one already exists.
///
/// The admin's password is the session signing secret. Holding the secret
/// already allows forging an admin session, so this adds no new power; it
/// gives operators a way in on a fresh data directory.
///
/// Returns the created account, or `None` if the username was taken.
pub fn ensure_admin_exists(
    store: &impl UserStore,
    admin: &AdminAccount,
    secret: &SessionSecret,
) -> StorageResult<Option<StoredUser>> {
    match store.find_by_username(&admin.username) {
        Ok(existing) => {
            tracing::debug!(user_id = %existing.id, "Admin account already present");
            return Ok(None);
        }
        Err(StorageError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let user = StoredUser::new(
        admin.username.clone(),
        admin.email.clone(),
        password_digest(secret.expose()),
        Role::ADMIN,
    );
    store.insert(&user)?;

    tracing::info!(user_id = %user.id, username = %user.username, "Bootstrap admin created");
    Ok(Some(user))
}
