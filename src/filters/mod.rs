// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error filter chain.
//!
//! Before the telemetry core transmits a captured error, it consults this
//! chain. Filters are named predicates composed by conjunction: an error is
//! reported only if every registered filter votes `true`. An empty chain
//! reports everything, and a panicking filter counts as `true`, so the
//! chain itself can never become a source of lost telemetry.

mod builtin;

pub use builtin::{common_noise_filter, validation_filter};

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use tracing::warn;

/// One error as captured by the host's reporting pipeline.
#[derive(Clone)]
pub struct CapturedError {
    /// Error kind name, e.g. `"Error"` or `"ValidationError"`.
    pub error_type: String,

    /// Full error message.
    pub message: String,

    /// The thrown value itself, downcastable to its concrete type.
    pub payload: Arc<dyn Any + Send + Sync>,
}

impl CapturedError {
    /// Capture an error from its type name and message, with no payload.
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            payload: Arc::new(()),
        }
    }

    /// Attach the thrown value, builder-style.
    pub fn with_payload(mut self, payload: Arc<dyn Any + Send + Sync>) -> Self {
        self.payload = payload;
        self
    }
}

impl std::fmt::Debug for CapturedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedError")
            .field("error_type", &self.error_type)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A named reporting predicate: `true` means eligible for reporting.
pub type FilterPredicate = Box<dyn Fn(&CapturedError) -> bool + Send + Sync>;

/// Chain of named error filters, composed by logical AND.
///
/// The map is populated at setup time and read-only afterwards; `register`
/// replaces an existing name without complaint (last write wins).
pub struct FilterChain {
    filters: RwLock<HashMap<String, FilterPredicate>>,
}

impl FilterChain {
    /// Create an empty chain. An empty chain reports every error.
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(HashMap::new()),
        }
    }

    /// Create a chain pre-loaded with the built-in filters.
    pub fn with_defaults() -> Self {
        let chain = Self::new();
        chain.register("suppress-validation-errors", validation_filter);
        chain.register("suppress-common-noise", common_noise_filter);
        chain
    }

    /// Add or replace a named filter.
    pub fn register<F>(&self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&CapturedError) -> bool + Send + Sync + 'static,
    {
        self.filters
            .write()
            .unwrap()
            .insert(name.into(), Box::new(predicate));
    }

    /// Number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.read().unwrap().len()
    }

    /// Whether the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.read().unwrap().is_empty()
    }

    /// Evaluate the chain: `true` iff every filter votes `true`.
    ///
    /// A panicking filter is contained and counted as `true` (fail-open).
    pub fn evaluate(&self, error: &CapturedError) -> bool {
        let filters = self.filters.read().unwrap();
        for (name, predicate) in filters.iter() {
            let vote = catch_unwind(AssertUnwindSafe(|| predicate(error))).unwrap_or_else(|_| {
                warn!(filter = %name, "Error filter panicked; treating as reportable");
                true
            });
            if !vote {
                return false;
            }
        }
        true
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_empty_chain_reports_everything() {
        let chain = FilterChain::new();
        assert!(chain.evaluate(&CapturedError::new("Error", "anything at all")));
    }

    #[test]
    fn test_conjunction() {
        let chain = FilterChain::new();
        chain.register("always-report", |_| true);
        assert!(chain.evaluate(&CapturedError::new("Error", "ok")));

        chain.register("never-report", |_| false);
        assert!(!chain.evaluate(&CapturedError::new("Error", "ok")));
    }

    #[test]
    fn test_register_last_write_wins() {
        let chain = FilterChain::new();
        chain.register("mine", |_| false);
        chain.register("mine", |_| true);

        assert_eq!(chain.len(), 1);
        assert!(chain.evaluate(&CapturedError::new("Error", "ok")));
    }

    #[test]
    fn test_panicking_filter_fails_open() {
        let chain = FilterChain::new();
        chain.register("broken", |_| panic!("filter bug"));

        assert!(chain.evaluate(&CapturedError::new("Error", "still reported")));
    }

    #[test]
    fn test_default_chain_suppresses_heartbeat_noise() {
        let chain = FilterChain::with_defaults();

        let noise = CapturedError::new(
            "Error",
            "connection timeout. no client heartbeat received",
        );
        assert!(!chain.evaluate(&noise));

        let real = CapturedError::new("Error", "some other message");
        assert!(chain.evaluate(&real));
    }

    #[test]
    fn test_default_chain_suppresses_validation_errors() {
        let chain = FilterChain::with_defaults();

        let err = ValidationError::new("bad-input", "missing field");
        let captured = CapturedError::new("ValidationError", err.to_string())
            .with_payload(Arc::new(err));
        assert!(!chain.evaluate(&captured));
    }
}
