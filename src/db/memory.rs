// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Backs offline development and the test suites. Membership updates take
//! the per-key map lock, so concurrent joins behave like the server-side
//! set-union of the Firestore backend. Failure injection switches let tests
//! exercise the store error paths.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{Cabinet, CabinetIdentity, User};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory `users` / `cabinets` collections.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    cabinets: DashMap<String, Cabinet>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    latency_ms: AtomicU64,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user without counting it as a write.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Seed a cabinet without counting it as a write.
    pub fn insert_cabinet(&self, cabinet: Cabinet) {
        self.cabinets.insert(cabinet.code.clone(), cabinet);
    }

    /// Make every subsequent read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every operation, to exercise timeouts.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn before_read(&self) -> Result<(), AppError> {
        self.simulate_latency().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::StoreRead(
                "simulated read failure (memory store)".to_string(),
            ));
        }
        Ok(())
    }

    async fn before_write(&self) -> Result<(), AppError> {
        self.simulate_latency().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoreWrite(
                "simulated write failure (memory store)".to_string(),
            ));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn count_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.before_read().await?;
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn set_user(&self, user: &User) -> Result<(), AppError> {
        self.before_write().await?;
        self.users.insert(user.id.clone(), user.clone());
        self.count_write();
        Ok(())
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.before_read().await?;
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }

    async fn get_cabinet(&self, code: &str) -> Result<Option<Cabinet>, AppError> {
        self.before_read().await?;
        Ok(self.cabinets.get(code).map(|c| c.clone()))
    }

    async fn set_cabinet(&self, cabinet: &Cabinet) -> Result<(), AppError> {
        self.before_write().await?;
        self.cabinets.insert(cabinet.code.clone(), cabinet.clone());
        self.count_write();
        Ok(())
    }

    async fn create_cabinet(&self, identity: &CabinetIdentity) -> Result<bool, AppError> {
        self.before_write().await?;
        match self.cabinets.entry(identity.code.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(identity.clone().into_cabinet());
                self.count_write();
                Ok(true)
            }
        }
    }

    async fn add_cabinet_member(&self, code: &str, user_id: &str) -> Result<bool, AppError> {
        self.before_write().await?;
        let Some(mut cabinet) = self.cabinets.get_mut(code) else {
            return Ok(false);
        };
        cabinet.add_member(user_id);
        self.count_write();
        Ok(true)
    }
}
