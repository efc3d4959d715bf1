// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational User Service - Account & Session Microservice
//!
//! Authenticates users with basic credentials, hands out HS256-signed
//! session tokens and serves role-checked CRUD over user accounts.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bitmask roles, session tokens, login and request authentication
//! - `storage` - JSON document store and audit log on the local filesystem
//! - `config` - Environment configuration
//! - `telemetry` - Tracing setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;
