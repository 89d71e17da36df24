// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mandato360 local API server
//!
//! Serves the onboarding, roster and profile operations to the UI shell
//! running on the same device.

use mandato360::{
    config::Config,
    db::{FirestoreDb, TimedStore},
    services::{FileLoginMarker, FirebaseStorage, FirebaseTokenVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Mandato360 API");

    // Initialize Firestore database, every call bounded by the store timeout
    let db = FirestoreDb::new(&config.firebase_project_id).await?;
    let store = Arc::new(TimedStore::new(db, config.store_timeout));
    tracing::info!(
        timeout_secs = config.store_timeout.as_secs(),
        "Document store ready"
    );

    let login_marker = Arc::new(FileLoginMarker::new(&config.data_dir));
    tracing::info!(path = %login_marker.path().display(), "Login marker location");

    let photo_storage = Arc::new(FirebaseStorage::new(&config)?);
    let token_verifier = Arc::new(FirebaseTokenVerifier::from_config(&config)?);

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        login_marker,
        photo_storage,
        token_verifier,
    ));

    // Build router
    let app = mandato360::routes::create_router(state);

    // Local API: loopback only
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mandato360=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
