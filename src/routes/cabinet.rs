//! Dashboard routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::CabinetIdentity;
use crate::onboarding::{Event, Screen, SessionContext};
use crate::services::{Roster, RosterEntry};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/cabinet/roster", get(get_roster))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    pub cabinet: CabinetIdentity,
    pub members: Vec<RosterEntry>,
    /// Session after re-reading the cabinet's shared identity.
    pub session: SessionContext,
}

/// Current members of the user's cabinet. Read fresh on every call.
async fn get_roster(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RosterView>> {
    let mut machine = state.session.lock().await;
    user.ensure_session_user(&machine)?;

    if machine.screen() != Screen::Dashboard {
        return Err(AppError::Conflict(format!(
            "roster is only available on the dashboard, not {:?}",
            machine.screen()
        )));
    }

    let code = machine.session().generated_team_code.clone();
    let roster = Roster::load(state.store.as_ref(), &code).await?;

    let outcome = state
        .driver
        .dispatch(machine.clone(), Event::CabinetFetched(Some(roster.cabinet.clone())))
        .await;
    *machine = outcome.machine;

    Ok(Json(RosterView {
        cabinet: roster.cabinet.identity(),
        members: roster.entries(&user.user_id),
        session: machine.session().clone(),
    }))
}
