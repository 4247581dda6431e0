// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the Pulse instrumentation layer.
//!
//! This module provides strongly-typed errors for different parts of the crate,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error
//! propagation inside job callbacks.

use thiserror::Error;

/// Errors surfaced by the telemetry core's remote job-control API.
///
/// The bridge propagates these verbatim to whichever call shape was used;
/// nothing in this crate retries or translates them.
#[derive(Error, Debug)]
pub enum JobControlError {
    #[error("Remote call rejected: {message}")]
    Rejected {
        message: String,
        code: Option<String>,
    },

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response parsing error: {0}")]
    ParseError(String),
}

impl JobControlError {
    /// Create a rejection with an error code.
    pub fn rejected(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create a rejection without an error code.
    pub fn rejected_message(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            code: None,
        }
    }

    /// Check if this error indicates the job simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::JobNotFound(_))
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}

/// Errors that can occur while initializing telemetry output.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Subscriber already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Invalid filter directive: {0}")]
    InvalidFilter(String),
}

/// The host's well-known user-facing error kind.
///
/// Validation errors are raised deliberately by application code to reject
/// bad input; they are part of the application's normal operation, not
/// faults. The built-in validation filter suppresses them so they never
/// reach the telemetry core's error pipeline.
#[derive(Error, Debug, Clone)]
#[error("Validation failed ({reason}): {details}")]
pub struct ValidationError {
    /// Machine-readable reason code.
    pub reason: String,

    /// Human-readable detail message.
    pub details: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(reason: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            details: details.into(),
        }
    }
}
