// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod cabinet;
pub mod user;

pub use cabinet::{Cabinet, CabinetIdentity, PackedColor};
pub use user::User;
