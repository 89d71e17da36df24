//! Process-scoped session context.

use crate::models::cabinet::{BLUE, TEAL};
use crate::models::{Cabinet, PackedColor};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// What the UI needs about the signed-in user without another store read.
///
/// Owned by the `Onboarding` value; every transition hands back an updated
/// copy instead of mutating shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub user_id: Option<String>,
    pub role: String,
    pub generated_team_code: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub primary_color: PackedColor,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub secondary_color: PackedColor,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            user_id: None,
            role: String::new(),
            generated_team_code: String::new(),
            primary_color: TEAL,
            secondary_color: BLUE,
        }
    }
}

impl SessionContext {
    /// Session for a signed-in user whose cabinet is not known yet.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Take role, code and colors from the cabinet, which owns the shared
    /// identity. The user's own record is not consulted.
    pub fn hydrate(&mut self, cabinet: &Cabinet) {
        self.role = cabinet.role.clone();
        self.generated_team_code = cabinet.code.clone();
        self.primary_color = cabinet.primary_color;
        self.secondary_color = cabinet.secondary_color;
    }

    pub fn has_cabinet(&self) -> bool {
        !self.generated_team_code.is_empty()
    }
}
