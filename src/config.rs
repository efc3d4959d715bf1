// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into an
//! immutable [`Config`]. Nothing reads the environment after that.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SECRET` | Session signing secret, also the bootstrap admin password | Required |
//! | `DATA_DIR` | Root directory for the user document store | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8888` |
//! | `CORS_ORIGIN` | Browser origin allowed to call the API | `https://localhost:8889` |
//! | `ADMIN_USERNAME` | Username of the bootstrap admin account | `admin` |
//! | `ADMIN_EMAIL` | Email of the bootstrap admin account | `admin@localhost` |
//! | `SESSION_TTL_SECS` | Session token lifetime in seconds | `3600` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | Unset |
//! | `TLS_KEY_PATH` | PEM private key | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::paths::DATA_ROOT;
use crate::telemetry::LogFormat;

pub const SECRET_ENV: &str = "SECRET";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const CORS_ORIGIN_ENV: &str = "CORS_ORIGIN";
pub const ADMIN_USERNAME_ENV: &str = "ADMIN_USERNAME";
pub const ADMIN_EMAIL_ENV: &str = "ADMIN_EMAIL";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8888;
const DEFAULT_CORS_ORIGIN: &str = "https://localhost:8889";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@localhost";

/// Default session lifetime (one hour).
pub const DEFAULT_SESSION_TTL_SECS: u32 = 3600;

/// Configuration errors. Any of these stops the process before it serves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SECRET must be set to a non-empty value")]
    MissingSecret,
    #[error("{name} has invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// The shared secret used to sign and verify session tokens.
///
/// Guaranteed non-empty. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The secret in clear text.
    ///
    /// Only the admin bootstrap needs this: the bootstrap admin's password
    /// is the signing secret, so anyone able to forge sessions can already
    /// log in as admin and vice versa.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionSecret(***)")
    }
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Well-known bootstrap admin account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub secret: SessionSecret,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub admin: AdminAccount,
    pub session_ttl_secs: u32,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let secret = SessionSecret::new(get(SECRET_ENV).unwrap_or_default())?;

        let port = match get(PORT_ENV) {
            Some(raw) => parse_number(PORT_ENV, raw)?,
            None => DEFAULT_PORT,
        };

        let session_ttl_secs = match get(SESSION_TTL_ENV) {
            Some(raw) => parse_number(SESSION_TTL_ENV, raw)?,
            None => DEFAULT_SESSION_TTL_SECS,
        };
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: SESSION_TTL_ENV,
                value: "0".to_string(),
            });
        }

        let tls = match (get(TLS_CERT_ENV), get(TLS_KEY_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            secret,
            data_dir: get(DATA_DIR_ENV)
                .unwrap_or_else(|| DATA_ROOT.to_string())
                .into(),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cors_origin: get(CORS_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            admin: AdminAccount {
                username: get(ADMIN_USERNAME_ENV)
                    .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
                email: get(ADMIN_EMAIL_ENV).unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            },
            session_ttl_secs,
            tls,
            log_format: LogFormat::parse(get(LOG_FORMAT_ENV).as_deref()),
        })
    }

    /// `host:port` as given.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value: raw })
}
