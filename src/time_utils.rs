// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::config::SESSION_MAX_AGE_HOURS;

/// Convert epoch milliseconds (the stored `lastLogin` format) to a timestamp.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Whether a login recorded at `last_login` has outlived the session window.
///
/// A missing timestamp counts as expired.
pub fn is_session_expired(last_login: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_login {
        Some(at) => now - at > Duration::hours(SESSION_MAX_AGE_HOURS),
        None => true,
    }
}
