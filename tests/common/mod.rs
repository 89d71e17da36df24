// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mandato360::config::Config;
use mandato360::db::{FirestoreDb, MemoryStore};
use mandato360::models::cabinet::{BLUE, TEAL};
use mandato360::models::{Cabinet, User};
use mandato360::routes::create_router;
use mandato360::services::{FirebaseTokenVerifier, MemoryLoginMarker, MemoryPhotoStorage};
use mandato360::AppState;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique suffix for test isolation against a shared emulator.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// In-memory dependencies behind a test app.
#[allow(dead_code)]
pub struct TestDeps {
    pub store: Arc<MemoryStore>,
    pub marker: Arc<MemoryLoginMarker>,
    pub photos: Arc<MemoryPhotoStorage>,
}

/// Create a test app backed by in-memory store, marker and photo storage.
/// Returns the router, the shared state and handles to the fakes.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TestDeps) {
    let config = Config::test_default();
    let secret = config
        .auth_dev_secret
        .clone()
        .expect("test config carries a dev secret");
    let verifier = Arc::new(
        FirebaseTokenVerifier::new_with_shared_secret(&config, &secret)
            .expect("verifier should build"),
    );

    let deps = TestDeps {
        store: Arc::new(MemoryStore::new()),
        marker: Arc::new(MemoryLoginMarker::default()),
        photos: Arc::new(MemoryPhotoStorage::new()),
    };

    let state = Arc::new(AppState::new(
        config,
        deps.store.clone(),
        deps.marker.clone(),
        deps.photos.clone(),
        verifier,
    ));

    (create_router(state.clone()), state, deps)
}

/// Create an ID token for `user_id` accepted by the test app.
#[allow(dead_code)]
pub fn id_token(user_id: &str) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        iss: String,
        aud: String,
        iat: u64,
        exp: u64,
    }

    let config = Config::test_default();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = Claims {
        sub: user_id,
        iss: format!("https://securetoken.google.com/{}", config.firebase_project_id),
        aud: config.firebase_project_id.clone(),
        iat: now,
        exp: now + 3600,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.auth_dev_secret.unwrap()),
    )
    .unwrap()
}

/// Build a request, optionally authenticated as `user_id`, with a JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", id_token(user_id)));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A user record with a display name.
#[allow(dead_code)]
pub fn user(id: &str, name: &str) -> User {
    let mut user = User::new(id, chrono::Utc::now());
    user.name = name.to_string();
    user.email = format!("{}@example.com", id);
    user
}

/// A cabinet with default colors.
#[allow(dead_code)]
pub fn cabinet(code: &str, role: &str, members: &[&str]) -> Cabinet {
    Cabinet {
        code: code.to_string(),
        role: role.to_string(),
        primary_color: TEAL,
        secondary_color: BLUE,
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}
