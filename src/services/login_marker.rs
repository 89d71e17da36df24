// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local persistence of the last sign-in time.
//!
//! The timestamp lives on the device, next to the auth provider's own
//! session, and is read once at launch to decide whether that session has
//! expired.

use crate::error::AppError;
use crate::time_utils::from_epoch_millis;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const MARKER_FILE: &str = "session.json";

/// Key-value store holding a single `lastLogin` value.
#[async_trait]
pub trait LoginMarker: Send + Sync {
    async fn last_login(&self) -> Result<Option<DateTime<Utc>>, AppError>;
    async fn record(&self, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkerFile {
    last_login: i64,
}

/// JSON file in the data directory.
pub struct FileLoginMarker {
    path: PathBuf,
}

impl FileLoginMarker {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(MARKER_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LoginMarker for FileLoginMarker {
    async fn last_login(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice::<MarkerFile>(&raw) {
            Ok(marker) => Ok(from_epoch_millis(marker.last_login)),
            Err(e) => {
                // A corrupt marker is treated like a missing one: the session
                // is considered expired and the user signs in again.
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt login marker");
                Ok(None)
            }
        }
    }

    async fn record(&self, at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let body = serde_json::to_vec(&MarkerFile {
            last_login: at.timestamp_millis(),
        })
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;

        tokio::fs::write(&self.path, body).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to write {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// In-memory marker for tests.
#[derive(Default)]
pub struct MemoryLoginMarker {
    value: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryLoginMarker {
    pub fn new(initial: Option<DateTime<Utc>>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    pub fn get(&self) -> Option<DateTime<Utc>> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, value: Option<DateTime<Utc>>) {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

#[async_trait]
impl LoginMarker for MemoryLoginMarker {
    async fn last_login(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        Ok(self.get())
    }

    async fn record(&self, at: DateTime<Utc>) -> Result<(), AppError> {
        self.set(Some(at));
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.set(None);
        Ok(())
    }
}
