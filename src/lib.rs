// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Mandato360: cabinet coordination for elected officials and their staff.
//!
//! This crate is the client core behind the mobile UI: it decides which
//! screen to show after launch and sign-in, runs the cabinet create/join
//! protocol, resolves the team roster and uploads profile photos. The UI
//! shell talks to it through a small local HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod onboarding;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::SharedStore;
use onboarding::{Onboarding, OnboardingDriver};
use services::{FirebaseTokenVerifier, LoginMarker, PhotoStorage};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    pub driver: OnboardingDriver,
    pub photo_storage: Arc<dyn PhotoStorage>,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    /// The one session this process serves. Handlers hold the lock for the
    /// whole transition so signals are applied one at a time.
    pub session: Mutex<Onboarding>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: SharedStore,
        login_marker: Arc<dyn LoginMarker>,
        photo_storage: Arc<dyn PhotoStorage>,
        token_verifier: Arc<FirebaseTokenVerifier>,
    ) -> Self {
        Self {
            config,
            driver: OnboardingDriver::new(store.clone(), login_marker),
            store,
            photo_storage,
            token_verifier,
            session: Mutex::new(Onboarding::new()),
        }
    }
}
