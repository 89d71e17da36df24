//! Role-selection screen routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::cabinet::{BLUE, PRIMARY_PALETTE, ROLE_OPTIONS, SECONDARY_PALETTE, TEAL};
use crate::models::PackedColor;
use crate::routes::session::ScreenView;
use crate::services::RoleSelection;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/onboarding/options", get(get_options))
}

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/onboarding/role", post(submit_role))
}

/// Choices offered on the role-selection screen.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingOptions {
    pub roles: Vec<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub primary_palette: Vec<PackedColor>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number[]"))]
    pub secondary_palette: Vec<PackedColor>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub default_primary_color: PackedColor,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub default_secondary_color: PackedColor,
}

async fn get_options() -> Json<OnboardingOptions> {
    Json(OnboardingOptions {
        roles: ROLE_OPTIONS.iter().map(|r| r.to_string()).collect(),
        primary_palette: PRIMARY_PALETTE.to_vec(),
        secondary_palette: SECONDARY_PALETTE.to_vec(),
        default_primary_color: TEAL,
        default_secondary_color: BLUE,
    })
}

/// Run the create-or-join protocol for the signed-in user.
///
/// On any failure the session stays on role selection so the form can be
/// submitted again.
async fn submit_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(selection): Json<RoleSelection>,
) -> Result<Json<ScreenView>> {
    let mut machine = state.session.lock().await;
    user.ensure_session_user(&machine)?;

    tracing::info!(
        user_id = %user.user_id,
        create_new = selection.create_new,
        "Role selection submitted"
    );

    let outcome = state
        .driver
        .submit_role_selection(machine.clone(), &selection)
        .await?;
    *machine = outcome.machine.clone();
    Ok(Json(outcome.into()))
}
