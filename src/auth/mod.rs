// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens and the role model for the user service.
//!
//! ## Auth Flow
//!
//! 1. Client calls `GET /login` with `Authorization: Basic base64(user:pass)`
//! 2. Server digests the password, looks up the account and returns
//!    `{"session": "<jwt>"}`, an HS256 token whose `aud` is the user id
//! 3. Client sends `Authorization: Bearer <jwt>` on every other call
//! 4. Server verifies the token, reloads the user and hands handlers an
//!    [`AuthenticatedUser`] whose [`Role`] decides what is allowed
//!
//! ## Security
//!
//! - Only HS256 is accepted; any other declared algorithm is rejected
//! - No clock skew tolerance: a session is dead at `exp`
//! - All verification failures return the same 401 body
//! - 401 (who are you?) and 403 (not allowed) are never conflated

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod service;
pub mod session;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{Auth, MaybeAuth};
pub use middleware::require_session;
pub use permissions::Permission;
pub use roles::{has_permission, Role};
pub use session::{SessionError, SessionManager};
