// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle routes: launch, sign-in result and sign-out.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::onboarding::{Notice, Onboarding, Outcome, Screen, SessionContext};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Routes that need no token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/auth-failed", post(auth_failed))
        .route("/session/sign-out", post(sign_out))
}

/// Launch takes the provider's current user from an optional bearer token.
/// The optional-auth middleware is applied in routes/mod.rs.
pub fn launch_routes() -> Router<Arc<AppState>> {
    Router::new().route("/session/launch", post(launch))
}

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/session/authenticated", post(authenticated))
}

/// What the UI shell should render.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ScreenView {
    pub screen: Screen,
    pub session: SessionContext,
    pub notices: Vec<Notice>,
    /// The shell must drop the auth provider's session.
    pub sign_out: bool,
}

impl ScreenView {
    pub fn of(machine: &Onboarding) -> Self {
        Self {
            screen: machine.screen(),
            session: machine.session().clone(),
            notices: Vec::new(),
            sign_out: false,
        }
    }
}

impl From<Outcome> for ScreenView {
    fn from(outcome: Outcome) -> Self {
        Self {
            screen: outcome.machine.screen(),
            session: outcome.machine.session().clone(),
            notices: outcome.notices,
            sign_out: outcome.sign_out,
        }
    }
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<ScreenView> {
    let machine = state.session.lock().await;
    Json(ScreenView::of(&machine))
}

async fn launch(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
) -> Result<Json<ScreenView>> {
    let mut machine = state.session.lock().await;
    let user_id = user.map(|Extension(user)| user.user_id);

    tracing::info!(signed_in = user_id.is_some(), "Launch");

    let outcome = state.driver.launch(machine.clone(), user_id).await;
    *machine = outcome.machine.clone();
    Ok(Json(outcome.into()))
}

async fn authenticated(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ScreenView>> {
    let mut machine = state.session.lock().await;

    tracing::info!(user_id = %user.user_id, "Sign-in completed");

    let outcome = state
        .driver
        .authenticated(machine.clone(), user.user_id)
        .await;
    *machine = outcome.machine.clone();
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct AuthFailedRequest {
    #[serde(default)]
    pub reason: String,
}

async fn auth_failed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuthFailedRequest>,
) -> Result<Json<ScreenView>> {
    let mut machine = state.session.lock().await;

    let reason = if body.reason.trim().is_empty() {
        "sign-in failed".to_string()
    } else {
        body.reason
    };
    tracing::info!(reason = %reason, "Sign-in failed");

    let outcome = state.driver.auth_failed(machine.clone(), reason).await;
    *machine = outcome.machine.clone();
    Ok(Json(outcome.into()))
}

async fn sign_out(State(state): State<Arc<AppState>>) -> Result<Json<ScreenView>> {
    let mut machine = state.session.lock().await;

    tracing::info!(user_id = machine.user_id().unwrap_or("-"), "Sign-out");

    let outcome = state.driver.sign_out(machine.clone()).await;
    *machine = outcome.machine.clone();
    Ok(Json(outcome.into()))
}
