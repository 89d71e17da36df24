//! Profile routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::photo::{update_profile_photo, MAX_PHOTO_BYTES};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap},
    routing::put,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/profile/photo",
        put(upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
    )
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub photo_url: String,
}

/// Replace the caller's profile photo with the raw image in the body.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PhotoResponse>> {
    {
        let machine = state.session.lock().await;
        user.ensure_session_user(&machine)?;
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg");

    let updated = update_profile_photo(
        state.store.as_ref(),
        state.photo_storage.as_ref(),
        &user.user_id,
        &user.id_token,
        content_type,
        body,
    )
    .await?;

    Ok(Json(PhotoResponse {
        photo_url: updated.photo_url.unwrap_or_default(),
    }))
}
