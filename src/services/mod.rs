// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod firebase_auth;
pub mod login_marker;
pub mod membership;
pub mod photo;
pub mod roster;

pub use firebase_auth::{AuthTokenError, FirebaseTokenVerifier, VerifiedUser};
pub use login_marker::{FileLoginMarker, LoginMarker, MemoryLoginMarker};
pub use membership::{generate_join_code, MembershipService, RoleSelection};
pub use photo::{FirebaseStorage, MemoryPhotoStorage, PhotoStorage};
pub use roster::{Roster, RosterEntry};
