//! Database layer: the remote document store and its backends.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Cabinet, CabinetIdentity, User};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CABINETS: &str = "cabinets";
}

/// Typed access to the `users` and `cabinets` collections.
///
/// Every call is a single remote round trip (or none) and never retries;
/// failures come back as `StoreRead` / `StoreWrite` and are never
/// collapsed into "absent".
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Create or overwrite a user document.
    async fn set_user(&self, user: &User) -> Result<(), AppError>;

    /// Resolve several users at once, keeping input order.
    ///
    /// IDs without a document are omitted. An empty input returns an empty
    /// list without touching the backend.
    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError>;

    async fn get_cabinet(&self, code: &str) -> Result<Option<Cabinet>, AppError>;

    /// Create or overwrite a whole cabinet document.
    async fn set_cabinet(&self, cabinet: &Cabinet) -> Result<(), AppError>;

    /// Create a cabinet with an empty member list unless one with the same
    /// code exists.
    ///
    /// Returns whether this call created it. An existing cabinet is never
    /// modified.
    async fn create_cabinet(&self, identity: &CabinetIdentity) -> Result<bool, AppError>;

    /// Atomically add `user_id` to the cabinet's members unless present.
    ///
    /// Returns `false` (and writes nothing) when the cabinet does not exist.
    async fn add_cabinet_member(&self, code: &str, user_id: &str) -> Result<bool, AppError>;
}

/// Shared handle to whichever store backend is configured.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Store decorator that bounds every operation with a timeout.
pub struct TimedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: DocumentStore> TimedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(AppError::Timeout(operation.to_string()))
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for TimedStore<S> {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.bounded("get_user", self.inner.get_user(user_id)).await
    }

    async fn set_user(&self, user: &User) -> Result<(), AppError> {
        self.bounded("set_user", self.inner.set_user(user)).await
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError> {
        self.bounded("get_users", self.inner.get_users(user_ids))
            .await
    }

    async fn get_cabinet(&self, code: &str) -> Result<Option<Cabinet>, AppError> {
        self.bounded("get_cabinet", self.inner.get_cabinet(code))
            .await
    }

    async fn set_cabinet(&self, cabinet: &Cabinet) -> Result<(), AppError> {
        self.bounded("set_cabinet", self.inner.set_cabinet(cabinet))
            .await
    }

    async fn create_cabinet(&self, identity: &CabinetIdentity) -> Result<bool, AppError> {
        self.bounded("create_cabinet", self.inner.create_cabinet(identity))
            .await
    }

    async fn add_cabinet_member(&self, code: &str, user_id: &str) -> Result<bool, AppError> {
        self.bounded(
            "add_cabinet_member",
            self.inner.add_cabinet_member(code, user_id),
        )
        .await
    }
}
