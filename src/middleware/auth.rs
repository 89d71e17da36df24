// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ID token authentication middleware.

use crate::error::AppError;
use crate::onboarding::Onboarding;
use crate::services::AuthTokenError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated caller extracted from a verified ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    /// The raw token, forwarded to storage so its rules see the caller.
    pub id_token: String,
}

impl AuthUser {
    /// Reject callers other than the user the session has settled on.
    pub fn ensure_session_user(&self, machine: &Onboarding) -> Result<(), AppError> {
        match machine.user_id() {
            Some(user_id) if user_id == self.user_id => Ok(()),
            Some(_) => {
                tracing::warn!(
                    caller = %self.user_id,
                    "Token does not belong to the signed-in user"
                );
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}

/// Middleware that requires a valid bearer ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request.headers().get(header::AUTHORIZATION).cloned();
    let auth_user = authenticate(&state, auth_header).await?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Like `require_auth`, but lets requests without an Authorization header
/// through unauthenticated. A header that is present must still verify.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION).cloned() {
        let auth_user = authenticate(&state, Some(auth_header)).await?;
        request.extensions_mut().insert(auth_user);
    }
    Ok(next.run(request).await)
}

async fn authenticate(
    state: &AppState,
    auth_header: Option<HeaderValue>,
) -> Result<AuthUser, AppError> {
    let has_header = auth_header.is_some();
    let (user, id_token) = state
        .token_verifier
        .verify_header(auth_header.as_ref())
        .await
        .map_err(|e| match e {
            AuthTokenError::Rejected(reason) => {
                tracing::debug!(reason = %reason, "Bearer token rejected");
                if has_header {
                    AppError::InvalidToken
                } else {
                    AppError::Unauthorized
                }
            }
            AuthTokenError::Transient(reason) => {
                AppError::Internal(anyhow::anyhow!("token verification unavailable: {}", reason))
            }
        })?;

    Ok(AuthUser {
        user_id: user.user_id,
        id_token,
    })
}
