//! Dashboard team roster.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{Cabinet, User};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A cabinet with its members resolved to user records.
#[derive(Debug, Clone)]
pub struct Roster {
    pub cabinet: Cabinet,
    /// In cabinet member order; IDs without a user document are left out.
    pub members: Vec<User>,
}

impl Roster {
    /// Load `code` and batch-resolve its members.
    pub async fn load(store: &dyn DocumentStore, code: &str) -> Result<Self> {
        let cabinet = store
            .get_cabinet(code)
            .await?
            .ok_or_else(|| AppError::CabinetNotFound(code.to_string()))?;

        let members = store.get_users(&cabinet.members).await?;
        if members.len() < cabinet.members.len() {
            tracing::debug!(
                code,
                listed = cabinet.members.len(),
                resolved = members.len(),
                "Skipping cabinet members without a user record"
            );
        }

        Ok(Self { cabinet, members })
    }

    /// Project the members into dashboard rows for `current_user_id`.
    pub fn entries(&self, current_user_id: &str) -> Vec<RosterEntry> {
        self.members
            .iter()
            .map(|user| RosterEntry::from_user(user, current_user_id))
            .collect()
    }
}

/// One row in the dashboard member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub photo_url: Option<String>,
    /// Shown in place of a missing photo.
    pub initial: String,
    pub is_current_user: bool,
    /// Only the current user can fix their own missing photo.
    pub needs_photo: bool,
}

impl RosterEntry {
    fn from_user(user: &User, current_user_id: &str) -> Self {
        let is_current_user = user.id == current_user_id;
        let photo_url = user.photo_url.clone().filter(|url| !url.trim().is_empty());
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            needs_photo: is_current_user && photo_url.is_none(),
            photo_url,
            initial: display_initial(&user.name, &user.email),
            is_current_user,
        }
    }
}

/// First letter of the name, else of the email, upper-cased.
fn display_initial(name: &str, email: &str) -> String {
    name.trim()
        .chars()
        .chain(email.trim().chars())
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}
