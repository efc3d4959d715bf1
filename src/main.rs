// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, time::Duration};

use axum::{extract::Request, http::HeaderValue, ServiceExt};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use thiserror::Error;

use relational_user_service::{
    api,
    auth::{service, SessionManager},
    config::{Config, LOG_FORMAT_ENV},
    state::AppState,
    storage::{
        AuditEvent, AuditEventType, AuditRepository, DocumentStore, StorageError, StoragePaths,
        UserRepository,
    },
    telemetry::{self, LogFormat},
};

/// Grace period for in-flight requests after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum StartupError {
    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid bind address {0:?}")]
    Address(String),
    #[error("invalid CORS origin {0:?}")]
    CorsOrigin(String),
    #[error("failed to load TLS certificate: {0}")]
    Tls(std::io::Error),
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            telemetry::init(LogFormat::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref()));
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    telemetry::init(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    let mut storage = DocumentStore::new(StoragePaths::new(&config.data_dir));
    storage.initialize()?;
    tracing::info!(data_dir = %config.data_dir.display(), "Document store ready");

    let repo = UserRepository::new(&storage);
    if let Some(admin) = service::ensure_admin_exists(&repo, &config.admin, &config.secret)? {
        AuditRepository::new(&storage).record(
            AuditEvent::new(AuditEventType::AdminBootstrapped).with_target(&admin.id),
        );
    }

    let sessions = SessionManager::new(&config.secret)
        .with_lifetime(chrono::Duration::seconds(i64::from(config.session_ttl_secs)));

    let cors_origin = HeaderValue::from_str(&config.cors_origin)
        .map_err(|_| StartupError::CorsOrigin(config.cors_origin.clone()))?;

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|_| StartupError::Address(config.bind_address()))?;

    let app = api::app(AppState::new(storage, sessions), cors_origin);
    let make_service = ServiceExt::<Request>::into_make_service(app);

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    match &config.tls {
        Some(tls) => {
            // Must happen before any rustls config is built.
            let _ = rustls::crypto::ring::default_provider().install_default();
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .map_err(StartupError::Tls)?;

            tracing::info!(%addr, "Relational user service listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(make_service)
                .await
                .map_err(StartupError::Serve)
        }
        None => {
            tracing::warn!(%addr, "TLS not configured; listening on plain http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(make_service)
                .await
                .map_err(StartupError::Serve)
        }
    }
}

async fn shutdown_on_ctrl_c(handle: Handle<std::net::SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutting down");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
