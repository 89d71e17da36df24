// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cabinet create-or-join protocol.
//!
//! Handles:
//! - Input validation (done before any store call)
//! - Join code generation and normalization
//! - Idempotent member insertion via the store's set-union
//! - The follow-up user write (`cabinetCode`, `role`, `lastLogin`)

use crate::db::SharedStore;
use crate::error::{AppError, Result};
use crate::models::cabinet::{BLUE, TEAL};
use crate::models::{Cabinet, CabinetIdentity, PackedColor, User};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Length of generated join codes.
pub const JOIN_CODE_LEN: usize = 6;

/// Symbols used in generated codes; no 0/O or 1/I look-alikes.
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const MAX_CODE_LEN: usize = 32;

/// Role-selection form as submitted by the UI.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleSelection {
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub role: String,
    /// Existing cabinet code to join, or an explicit code for a new cabinet.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub team_code: Option<String>,
    #[serde(default)]
    pub create_new: bool,
    #[serde(default = "default_primary_color")]
    pub primary_color: PackedColor,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: PackedColor,
}

fn default_primary_color() -> PackedColor {
    TEAL
}

fn default_secondary_color() -> PackedColor {
    BLUE
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// What a validated selection will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipIntent {
    Create(CabinetIdentity),
    Join { code: String },
}

/// A validated role selection, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipPlan {
    pub role: String,
    pub intent: MembershipIntent,
}

impl MembershipPlan {
    pub fn code(&self) -> &str {
        match &self.intent {
            MembershipIntent::Create(identity) => &identity.code,
            MembershipIntent::Join { code } => code,
        }
    }
}

impl RoleSelection {
    /// Validate the form and settle the join code. No I/O.
    pub fn plan<R: Rng>(&self, rng: &mut R) -> Result<MembershipPlan> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let role = self.role.trim().to_string();
        let supplied = self
            .team_code
            .as_deref()
            .map(normalize_join_code)
            .transpose()?
            .flatten();

        let intent = if self.create_new {
            let code = supplied.unwrap_or_else(|| generate_join_code(rng));
            MembershipIntent::Create(CabinetIdentity {
                code,
                role: role.clone(),
                primary_color: self.primary_color,
                secondary_color: self.secondary_color,
            })
        } else {
            let code = supplied.ok_or_else(|| {
                AppError::Validation("a cabinet code is required to join".to_string())
            })?;
            MembershipIntent::Join { code }
        };

        Ok(MembershipPlan { role, intent })
    }
}

/// Generate a fixed-length join code, uniform over the code alphabet.
pub fn generate_join_code<R: Rng>(rng: &mut R) -> String {
    (0..JOIN_CODE_LEN)
        .map(|_| JOIN_CODE_ALPHABET[rng.random_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Trim and upper-case a user-entered code.
///
/// Returns `Ok(None)` for a blank code. Codes become document IDs, so only
/// ASCII letters, digits and `-` are accepted.
pub fn normalize_join_code(raw: &str) -> Result<Option<String>> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Ok(None);
    }

    if code.len() > MAX_CODE_LEN {
        return Err(AppError::Validation(format!(
            "cabinet code must be at most {} characters",
            MAX_CODE_LEN
        )));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AppError::Validation(
            "cabinet code may only contain letters, digits and '-'".to_string(),
        ));
    }

    Ok(Some(code))
}

/// Runs the membership protocol against the document store.
#[derive(Clone)]
pub struct MembershipService {
    store: SharedStore,
}

impl MembershipService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Create or join a cabinet for `user_id` and link the user to it.
    ///
    /// Returns the cabinet whose identity the session should adopt. Nothing is
    /// written when validation fails or when joining an unknown code.
    ///
    /// A cabinet is created once, by whoever first claims its code. Creating
    /// with a code that is already taken joins that cabinet instead, keeping
    /// its role and colors.
    ///
    /// The cabinet write happens before the user write and is not rolled back
    /// if the latter fails. Both writes are idempotent, so submitting again
    /// repairs the link.
    pub async fn commit(
        &self,
        user_id: &str,
        selection: &RoleSelection,
        now: DateTime<Utc>,
    ) -> Result<Cabinet> {
        let plan = selection.plan(&mut rand::rng())?;
        let code = plan.code().to_string();

        let mut cabinet = match plan.intent {
            MembershipIntent::Create(identity) => {
                if self.store.create_cabinet(&identity).await? {
                    if !self.store.add_cabinet_member(&code, user_id).await? {
                        return Err(AppError::StoreWrite(format!(
                            "cabinet {} vanished right after creation",
                            code
                        )));
                    }
                    tracing::info!(user_id, code = %code, "Cabinet created");
                    identity.into_cabinet()
                } else {
                    tracing::info!(user_id, code = %code, "Cabinet code taken, joining it");
                    self.join(user_id, &code).await?
                }
            }
            MembershipIntent::Join { ref code } => self.join(user_id, code).await?,
        };
        cabinet.add_member(user_id);

        let mut user = self
            .store
            .get_user(user_id)
            .await?
            .unwrap_or_else(|| User::new(user_id, now));
        user.cabinet_code = Some(code.clone());
        user.role = Some(plan.role);
        user.last_login = now;

        if let Err(e) = self.store.set_user(&user).await {
            tracing::warn!(
                user_id,
                code = %code,
                error = %e,
                "Cabinet lists the user but the user record was not linked"
            );
            return Err(e);
        }

        Ok(cabinet)
    }

    /// Add `user_id` to an existing cabinet and return it as stored.
    async fn join(&self, user_id: &str, code: &str) -> Result<Cabinet> {
        let Some(cabinet) = self.store.get_cabinet(code).await? else {
            tracing::info!(user_id, code, "Join rejected: unknown cabinet");
            return Err(AppError::CabinetNotFound(code.to_string()));
        };
        if !self.store.add_cabinet_member(code, user_id).await? {
            return Err(AppError::CabinetNotFound(code.to_string()));
        }
        tracing::info!(user_id, code, "Cabinet joined");
        Ok(cabinet)
    }
}
