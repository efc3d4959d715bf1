// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Each account is stored as a separate JSON file under `users/{id}.json`.
//! Usernames are unique; uniqueness is checked by scanning, so callers must
//! hold the store's write lock across `insert` and `update`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{DocumentStore, StorageError, StorageResult};
use crate::auth::Role;

/// User account as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Unique login name
    pub username: String,
    pub email: String,
    /// `base64(sha256(password))`
    pub password_digest: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// New account with a fresh id. `password_digest` must already be digested.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_digest: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password_digest: password_digest.into(),
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields to change on an existing user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_digest: Option<String>,
    pub role: Option<Role>,
}

/// Credential and identity lookups needed by the auth layer.
pub trait UserStore {
    /// Account whose username and password digest both match.
    fn find_by_credentials(&self, username: &str, password_digest: &str)
        -> StorageResult<StoredUser>;

    fn find_by_id(&self, user_id: &str) -> StorageResult<StoredUser>;

    fn find_by_username(&self, username: &str) -> StorageResult<StoredUser>;

    /// Persist a new account; `Conflict` if the username is taken.
    fn insert(&self, user: &StoredUser) -> StorageResult<()>;
}

/// Repository for user operations on the document store.
pub struct UserRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    pub fn exists(&self, user_id: &str) -> bool {
        self.storage.exists(self.storage.paths().user(user_id))
    }

    /// List all users, ordered by id.
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let user_ids = self
            .storage
            .list_files(self.storage.paths().users_dir(), "json")?;

        let mut users = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            match self.find_by_id(&id) {
                Ok(user) => users.push(user),
                Err(e) => tracing::warn!(user_id = %id, error = %e, "Skipping unreadable user record"),
            }
        }

        Ok(users)
    }

    /// Resolve a path segment that may be either a username or an id.
    pub fn resolve(&self, id_or_username: &str) -> StorageResult<StoredUser> {
        match self.find_by_username(id_or_username) {
            Err(StorageError::NotFound(_)) => self.find_by_id(id_or_username),
            other => other,
        }
    }

    /// Apply a patch and return the updated record.
    pub fn update(&self, user_id: &str, patch: UserPatch) -> StorageResult<StoredUser> {
        let mut user = self.find_by_id(user_id)?;

        if let Some(username) = patch.username {
            if username != user.username {
                self.ensure_username_free(&username)?;
                user.username = username;
            }
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(digest) = patch.password_digest {
            user.password_digest = digest;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        self.storage
            .write_json(self.storage.paths().user(user_id), &user)?;
        Ok(user)
    }

    /// Delete a user and return the removed record.
    pub fn delete(&self, user_id: &str) -> StorageResult<StoredUser> {
        let user = self.find_by_id(user_id)?;
        self.storage.delete(self.storage.paths().user(user_id))?;
        Ok(user)
    }

    fn ensure_username_free(&self, username: &str) -> StorageResult<()> {
        match self.find_by_username(username) {
            Ok(_) => Err(StorageError::Conflict {
                kind: "user",
                field: "username",
                value: username.to_string(),
            }),
            Err(StorageError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn find_first(&self, predicate: impl Fn(&StoredUser) -> bool) -> StorageResult<Option<StoredUser>> {
        Ok(self.list_all()?.into_iter().find(|user| predicate(user)))
    }
}

impl UserStore for UserRepository<'_> {
    fn find_by_credentials(
        &self,
        username: &str,
        password_digest: &str,
    ) -> StorageResult<StoredUser> {
        self.find_first(|u| u.username == username && u.password_digest == password_digest)?
            .ok_or_else(|| StorageError::NotFound(format!("User {username}")))
    }

    fn find_by_id(&self, user_id: &str) -> StorageResult<StoredUser> {
        let path = self.storage.paths().user(user_id);
        // Ids come from URLs and tokens; never let one escape the users dir.
        if user_id.is_empty() || user_id.contains(['/', '\\', '.']) || !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(path)
    }

    fn find_by_username(&self, username: &str) -> StorageResult<StoredUser> {
        self.find_first(|u| u.username == username)?
            .ok_or_else(|| StorageError::NotFound(format!("User {username}")))
    }

    fn insert(&self, user: &StoredUser) -> StorageResult<()> {
        self.ensure_username_free(&user.username)?;

        if self.exists(&user.id) {
            return Err(StorageError::Conflict {
                kind: "user",
                field: "id",
                value: user.id.clone(),
            });
        }

        self.storage
            .write_json(self.storage.paths().user(&user.id), user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, DocumentStore) {
        let temp = TempDir::new().unwrap();
        let mut storage = DocumentStore::new(StoragePaths::new(temp.path()));
        storage.initialize().expect("Failed to initialize");
        (temp, storage)
    }

    fn test_user(username: &str) -> StoredUser {
        StoredUser::new(username, format!("{username}@example.com"), "digest", Role::USER)
    }

    #[test]
    fn insert_and_find() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);

        let user = test_user("foo");
        repo.insert(&user).unwrap();

        assert_eq!(repo.find_by_id(&user.id).unwrap(), user);
        assert_eq!(repo.find_by_username("foo").unwrap(), user);
        assert_eq!(repo.find_by_credentials("foo", "digest").unwrap(), user);
    }

    #[test]
    fn credentials_require_both_fields() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);
        repo.insert(&test_user("foo")).unwrap();

        assert!(matches!(
            repo.find_by_credentials("foo", "other"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            repo.find_by_credentials("bar", "digest"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_username_conflicts() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);
        repo.insert(&test_user("foo")).unwrap();

        let err = repo.insert(&test_user("foo")).unwrap_err();
        assert_eq!(err.to_string(), "user with username as foo already exists");
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn resolve_accepts_id_or_username() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);
        let user = test_user("foo");
        repo.insert(&user).unwrap();

        assert_eq!(repo.resolve("foo").unwrap().id, user.id);
        assert_eq!(repo.resolve(&user.id).unwrap().username, "foo");
        assert!(matches!(repo.resolve("nobody"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn path_like_ids_are_not_found() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);

        for id in ["", "../users", "a/b", ".."] {
            assert!(matches!(repo.find_by_id(id), Err(StorageError::NotFound(_))));
        }
    }

    #[test]
    fn update_applies_patch() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);
        let user = test_user("foo");
        repo.insert(&user).unwrap();

        let updated = repo
            .update(
                &user.id,
                UserPatch {
                    email: Some("new@example.com".to_string()),
                    role: Some(Role::MANAGER),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.role, Role::MANAGER);
        assert_eq!(updated.username, "foo");
        assert!(updated.updated_at >= user.updated_at);
        assert_eq!(repo.find_by_id(&user.id).unwrap(), updated);
    }

    #[test]
    fn update_to_taken_username_conflicts() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);
        let foo = test_user("foo");
        repo.insert(&foo).unwrap();
        repo.insert(&test_user("bar")).unwrap();

        let patch = UserPatch {
            username: Some("bar".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(&foo.id, patch),
            Err(StorageError::Conflict { field: "username", .. })
        ));

        // Renaming to the current name is a no-op, not a conflict.
        let same = UserPatch {
            username: Some("foo".to_string()),
            ..Default::default()
        };
        assert!(repo.update(&foo.id, same).is_ok());
    }

    #[test]
    fn delete_returns_removed_user() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);
        let user = test_user("foo");
        repo.insert(&user).unwrap();

        assert_eq!(repo.delete(&user.id).unwrap(), user);
        assert!(!repo.exists(&user.id));
        assert!(matches!(repo.delete(&user.id), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn role_is_stored_as_integer() {
        let (_temp, storage) = test_storage();
        let repo = UserRepository::new(&storage);
        let mut user = test_user("boss");
        user.role = Role::ADMIN;
        repo.insert(&user).unwrap();

        let raw = std::fs::read_to_string(storage.paths().user(&user.id)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["role"], serde_json::json!(Role::ADMIN.bits()));
    }
}
