// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage as plain JSON documents on the local filesystem,
//! rooted at `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! <DATA_DIR>/
//!   users/
//!     {user_id}.json       # One account per file
//!   audit/
//!     {date}/events.jsonl  # Daily audit logs
//! ```
//!
//! The store is shared as `Arc<RwLock<DocumentStore>>`. Every mutation runs
//! under the write lock, which is what keeps usernames unique.

pub mod audit;
pub mod document_store;
pub mod paths;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use document_store::{DocumentStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{StoredUser, UserPatch, UserRepository, UserStore};
