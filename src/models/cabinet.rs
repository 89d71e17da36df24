// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cabinet (team) model and its shared visual identity.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Packed ARGB color value as produced by the mobile clients.
pub type PackedColor = i64;

/// Brand teal, the default primary color.
pub const TEAL: PackedColor = 0xFF00_897B;
/// Brand blue, the default secondary color.
pub const BLUE: PackedColor = 0xFF15_65C0;
pub const MAGENTA: PackedColor = 0xFFFF_00FF;
pub const CYAN: PackedColor = 0xFF00_FFFF;

/// Colors offered by the identity picker, primary choice first.
pub const PRIMARY_PALETTE: [PackedColor; 4] = [TEAL, BLUE, MAGENTA, CYAN];
pub const SECONDARY_PALETTE: [PackedColor; 4] = [BLUE, TEAL, MAGENTA, CYAN];

/// Role labels offered on the role-selection screen.
pub const ROLE_OPTIONS: [&str; 8] = [
    "Vereador",
    "Deputado Estadual",
    "Deputado Federal",
    "Senador",
    "Prefeito",
    "Secretário",
    "Assessor Parlamentar",
    "Outros",
];

/// A political office team stored in Firestore (`cabinets/{code}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cabinet {
    /// Join code (also used as document ID)
    pub code: String,
    /// Role chosen by the creator
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub primary_color: PackedColor,
    #[serde(default)]
    pub secondary_color: PackedColor,
    /// Member user IDs in join order, without duplicates
    #[serde(default)]
    pub members: Vec<String>,
}

impl Cabinet {
    /// Identity fields of this cabinet.
    pub fn identity(&self) -> CabinetIdentity {
        CabinetIdentity {
            code: self.code.clone(),
            role: self.role.clone(),
            primary_color: self.primary_color,
            secondary_color: self.secondary_color,
        }
    }

    /// Append a member unless already present. Returns whether it was added.
    pub fn add_member(&mut self, user_id: &str) -> bool {
        if self.members.iter().any(|m| m == user_id) {
            return false;
        }
        self.members.push(user_id.to_string());
        true
    }
}

/// Cabinet fields written on creation, everything except `members`.
///
/// Kept separate so identity writes can never clobber the member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CabinetIdentity {
    pub code: String,
    pub role: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub primary_color: PackedColor,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub secondary_color: PackedColor,
}

impl CabinetIdentity {
    /// A new cabinet document holding this identity and no members yet.
    pub fn into_cabinet(self) -> Cabinet {
        Cabinet {
            code: self.code,
            role: self.role,
            primary_color: self.primary_color,
            secondary_color: self.secondary_color,
            members: Vec::new(),
        }
    }
}
