// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::SessionManager;
use crate::storage::DocumentStore;

/// Shared handler state.
///
/// `storage` is behind a lock because username uniqueness is a
/// check-then-write: handlers that mutate users hold the write guard for
/// the whole operation. `sessions` is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<RwLock<DocumentStore>>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(storage: DocumentStore, sessions: SessionManager) -> Self {
        Self {
            storage: Arc::new(RwLock::new(storage)),
            sessions: Arc::new(sessions),
        }
    }
}
