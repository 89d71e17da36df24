//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore (`users/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Auth provider user ID (also used as document ID).
    /// Older documents carry it as `uid`.
    #[serde(alias = "uid")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Download URL of the profile photo
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Cabinet the user belongs to, once onboarding is complete
    #[serde(default)]
    pub cabinet_code: Option<String>,
    /// Free-text role label, e.g. "Secretário"
    #[serde(default)]
    pub role: Option<String>,
    /// Last successful authentication, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds", default)]
    pub last_login: DateTime<Utc>,
}

impl User {
    /// A fresh record for a first-time sign-in.
    pub fn new(id: impl Into<String>, last_login: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: String::new(),
            photo_url: None,
            cabinet_code: None,
            role: None,
            last_login,
        }
    }

    /// The cabinet code, ignoring blank values left by older clients.
    pub fn cabinet(&self) -> Option<&str> {
        self.cabinet_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}
