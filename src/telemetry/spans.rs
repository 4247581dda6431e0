// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span helpers for consistent instrumentation.

use std::time::Instant;
use tracing::{info_span, Span};

/// Extension trait for enhanced span functionality.
pub trait SpanExt {
    /// Record the result of an operation (success/error).
    fn record_result<T, E>(&self, result: &Result<T, E>);

    /// Record a string value.
    fn record_str(&self, name: &'static str, value: &str);
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>) {
        self.record("success", result.is_ok());
        self.record("error", result.is_err());
    }

    fn record_str(&self, name: &'static str, value: &str) {
        self.record(name, value);
    }
}

/// RAII guard for timing one traced job invocation.
///
/// Opens a named span when started; records the duration and outcome to the
/// span and to global job metrics when finished. The span itself is handed
/// to the wrapped callback's future via `Instrument`, so the interval covers
/// asynchronous completion, not just the synchronous return.
pub struct JobSpan {
    job_name: String,
    start: Instant,
    span: Span,
}

impl JobSpan {
    /// Start a new job span.
    pub fn start(job_name: &str) -> Self {
        let span = info_span!(
            "job",
            job = %job_name,
            duration_ms = tracing::field::Empty,
            success = tracing::field::Empty,
        );

        Self {
            job_name: job_name.to_string(),
            start: Instant::now(),
            span,
        }
    }

    /// Get the underlying tracing span.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Finish the span, recording duration and outcome.
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        let duration_ms = duration.as_secs_f64() * 1000.0;

        self.span.record("duration_ms", duration_ms);
        self.span.record("success", success);

        super::metrics::GLOBAL_METRICS.record_job(&self.job_name, duration, success);

        tracing::debug!(
            parent: &self.span,
            "Job invocation complete"
        );
    }

    /// Finish with a result, automatically determining success.
    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) {
        self.finish(result.is_ok());
    }
}
