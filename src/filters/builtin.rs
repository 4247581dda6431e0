// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Built-in error filters.

use once_cell::sync::Lazy;
use regex::Regex;

use super::CapturedError;
use crate::error::ValidationError;

/// Messages known to be benign operational noise.
///
/// Matched case-insensitively against the full message. The list covers the
/// heartbeat timeout the transport emits on idle disconnects and the
/// browser's INVALID_STATE_ERR (code 11) raised by half-closed sockets.
static COMMON_NOISE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)connection timeout\. no (client|server) heartbeat received",
        r"(?i)invalid_state_err(\s*[-:]\s*11)?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static noise pattern compiles"))
    .collect()
});

/// Suppress errors raised deliberately as user-facing validation failures.
///
/// These carry a [`ValidationError`] payload; they are application flow
/// control, not faults worth reporting.
pub fn validation_filter(error: &CapturedError) -> bool {
    error.payload.downcast_ref::<ValidationError>().is_none()
}

/// Suppress messages matching the known-benign noise patterns.
pub fn common_noise_filter(error: &CapturedError) -> bool {
    !COMMON_NOISE.iter().any(|re| re.is_match(&error.message))
}
