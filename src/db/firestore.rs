// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, cabinet link, last login)
//! - Cabinets (identity and member list)

use crate::db::{collections, DocumentStore};
use crate::error::AppError;
use crate::models::{Cabinet, CabinetIdentity, User};
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use futures_util::{stream, StreamExt, TryStreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::StoreRead(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::StoreRead(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::StoreRead("Database not connected (offline mode)".to_string())
        })
    }

    /// Like `get_client`, but reported as a write failure.
    fn get_write_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::StoreWrite("Database not connected (offline mode)".to_string())
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))
    }

    async fn set_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_write_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::StoreWrite(e.to_string()))?;
        Ok(())
    }

    /// Reads are issued concurrently (bounded) and re-assembled in input order.
    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.get_client()?;

        let resolved: Vec<Option<User>> = stream::iter(user_ids.to_vec())
            .map(|user_id| async move {
                client
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj::<User>()
                    .one(&user_id)
                    .await
                    .map_err(|e| AppError::StoreRead(e.to_string()))
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .try_collect()
            .await?;

        Ok(resolved.into_iter().flatten().collect())
    }

    // ─── Cabinet Operations ──────────────────────────────────────

    async fn get_cabinet(&self, code: &str) -> Result<Option<Cabinet>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CABINETS)
            .obj()
            .one(code)
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))
    }

    async fn set_cabinet(&self, cabinet: &Cabinet) -> Result<(), AppError> {
        let _: () = self
            .get_write_client()?
            .fluent()
            .update()
            .in_col(collections::CABINETS)
            .document_id(&cabinet.code)
            .object(cabinet)
            .execute()
            .await
            .map_err(|e| AppError::StoreWrite(e.to_string()))?;
        Ok(())
    }

    /// Insert-only write: the server rejects it when the document exists, so
    /// two creators racing on one code cannot both win.
    async fn create_cabinet(&self, identity: &CabinetIdentity) -> Result<bool, AppError> {
        let cabinet = identity.clone().into_cabinet();
        let inserted: Result<Cabinet, FirestoreError> = self
            .get_write_client()?
            .fluent()
            .insert()
            .into(collections::CABINETS)
            .document_id(&cabinet.code)
            .object(&cabinet)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::debug!(code = %cabinet.code, "Cabinet already exists, not created");
                Ok(false)
            }
            Err(e) => Err(AppError::StoreWrite(e.to_string())),
        }
    }

    /// Server-side array union on `members`.
    ///
    /// The existence check is a plain read: cabinets are never deleted, so it
    /// cannot race with a removal. The union itself is atomic on the server,
    /// which keeps concurrent joins from losing each other's IDs.
    async fn add_cabinet_member(&self, code: &str, user_id: &str) -> Result<bool, AppError> {
        if self.get_cabinet(code).await?.is_none() {
            tracing::debug!(code, user_id, "Cabinet does not exist, member not added");
            return Ok(false);
        }

        let client = self.get_write_client()?;

        let mut transaction = client.begin_transaction().await.map_err(|e| {
            AppError::StoreWrite(format!("Failed to begin transaction: {}", e))
        })?;

        client
            .fluent()
            .update()
            .in_col(collections::CABINETS)
            .document_id(code)
            .transforms(|t| {
                t.fields([t
                    .field("members")
                    .append_missing_elements([user_id.to_string()])])
            })
            .only_transform()
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::StoreWrite(format!("Failed to add member transform: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::StoreWrite(format!("Member union commit failed: {}", e)))?;

        tracing::debug!(code, user_id, "Cabinet member union committed");

        Ok(true)
    }
}
