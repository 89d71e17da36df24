// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile photo upload.
//!
//! Photos go to `profile_images/{uid}.jpg` in the project's storage bucket.
//! Once the upload returns a download URL, it is written to the user's
//! `photoUrl`. A failed upload leaves the user record untouched.

use crate::config::Config;
use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::User;
use anyhow::Context;
use async_trait::async_trait;
use axum::body::Bytes;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest accepted photo.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Object path of a user's profile photo.
pub fn photo_object_path(user_id: &str) -> String {
    format!("profile_images/{}.jpg", user_id)
}

/// Object storage for profile photos.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Store `bytes` as the user's photo and return its download URL.
    ///
    /// `id_token` is the caller's own token; storage rules authorize the
    /// write against it.
    async fn upload(
        &self,
        user_id: &str,
        id_token: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String>;
}

/// Firebase Storage over its REST endpoint.
pub struct FirebaseStorage {
    http_client: reqwest::Client,
    base_url: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    /// For local development, set FIREBASE_STORAGE_EMULATOR_HOST.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = match std::env::var("FIREBASE_STORAGE_EMULATOR_HOST") {
            Ok(host) => format!("http://{}", host.trim_end_matches('/')),
            Err(_) => STORAGE_BASE_URL.to_string(),
        };

        let http_client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .context("failed building storage HTTP client")?;

        tracing::info!(bucket = %config.storage_bucket, base_url = %base_url, "Photo storage configured");

        Ok(Self {
            http_client,
            base_url,
            bucket: config.storage_bucket.clone(),
        })
    }

    fn download_url(&self, object: &UploadResponse) -> String {
        let mut url = format!(
            "{}/v0/b/{}/o/{}?alt=media",
            self.base_url,
            self.bucket,
            urlencoding::encode(&object.name)
        );
        // Several tokens may be listed; any of them grants read access.
        if let Some(token) = object
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
        {
            url.push_str("&token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}

#[async_trait]
impl PhotoStorage for FirebaseStorage {
    async fn upload(
        &self,
        user_id: &str,
        id_token: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String> {
        let object_path = photo_object_path(user_id);
        let url = format!(
            "{}/v0/b/{}/o?name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(&object_path)
        );

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Firebase {}", id_token))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(user_id, status = %status, body = %body, "Photo upload rejected");
            return Err(AppError::Upload(format!("Storage returned {}: {}", status, body)));
        }

        let object: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Invalid upload response: {}", e)))?;

        Ok(self.download_url(&object))
    }
}

/// In-memory storage for tests and offline runs.
#[derive(Default)]
pub struct MemoryPhotoStorage {
    objects: DashMap<String, Bytes>,
    fail: AtomicBool,
}

impl MemoryPhotoStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, path: &str) -> Option<Bytes> {
        self.objects.get(path).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl PhotoStorage for MemoryPhotoStorage {
    async fn upload(
        &self,
        user_id: &str,
        _id_token: &str,
        _content_type: &str,
        bytes: Bytes,
    ) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Upload(
                "simulated upload failure (memory storage)".to_string(),
            ));
        }
        let path = photo_object_path(user_id);
        self.objects.insert(path.clone(), bytes);
        Ok(format!("memory://{}", path))
    }
}

/// Upload a new profile photo and point the user's `photoUrl` at it.
pub async fn update_profile_photo(
    store: &dyn DocumentStore,
    storage: &dyn PhotoStorage,
    user_id: &str,
    id_token: &str,
    content_type: &str,
    bytes: Bytes,
) -> Result<User> {
    if bytes.is_empty() {
        return Err(AppError::Validation("photo is empty".to_string()));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(AppError::Validation(format!(
            "photo exceeds {} bytes",
            MAX_PHOTO_BYTES
        )));
    }
    if !content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "unsupported content type: {}",
            content_type
        )));
    }

    let mut user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

    let size = bytes.len();
    let url = storage.upload(user_id, id_token, content_type, bytes).await?;

    user.photo_url = Some(url);
    store.set_user(&user).await?;

    tracing::info!(user_id, size, "Profile photo updated");
    Ok(user)
}
