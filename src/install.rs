// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Startup wiring.
//!
//! The host calls [`attach`] once, after optional collaborators have
//! registered their capabilities. Attach order mirrors the layer's
//! dependency order: the task constructor seam first, then job tracing,
//! then the error filter chain handed back for the host's reporting
//! pipeline.

use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use crate::capability::CapabilityRegistry;
use crate::config::InstrumentConfig;
use crate::filters::FilterChain;
use crate::instrument::install_task_instrumentation;
use crate::scheduler::install_tracing;
use crate::telemetry::MetricsTimingSink;

/// What [`attach`] installed.
#[derive(Debug)]
pub struct AttachReport {
    /// Whether the measuring task constructor was installed by this call.
    pub task_instrumentation: bool,

    /// Number of scheduler jobs wrapped in trace spans.
    pub traced_jobs: usize,

    /// Number of filters in the returned chain.
    pub filters: usize,
}

/// Wire the instrumentation layer into the host process.
///
/// Idempotence follows each component's own rules: the task instrumentor
/// installs at most once per process; job tracing wraps whatever the
/// scheduler lists at call time, so the host must not call attach twice.
/// Returns the error filter chain for the host's reporting pipeline.
pub fn attach(config: &InstrumentConfig, registry: &CapabilityRegistry) -> (FilterChain, AttachReport) {
    let task_instrumentation = if config.instrument_tasks {
        install_task_instrumentation(Arc::new(MetricsTimingSink::new()))
    } else {
        false
    };

    let traced_jobs = if config.trace_jobs {
        install_tracing(registry)
    } else {
        0
    };

    let chain = FilterChain::with_defaults();
    register_configured_noise(&chain, &config.extra_noise_patterns);

    let report = AttachReport {
        task_instrumentation,
        traced_jobs,
        filters: chain.len(),
    };
    info!(
        task_instrumentation = report.task_instrumentation,
        traced_jobs = report.traced_jobs,
        filters = report.filters,
        "Instrumentation layer attached"
    );
    (chain, report)
}

/// Register one extra filter covering all configured noise patterns.
///
/// Patterns were validated at config load; one that still fails to compile
/// is skipped with a warning rather than taking down attach.
fn register_configured_noise(chain: &FilterChain, patterns: &[String]) {
    if patterns.is_empty() {
        return;
    }

    let compiled: Vec<Regex> = patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern = %p, error = %err, "Skipping invalid noise pattern");
                None
            }
        })
        .collect();

    if compiled.is_empty() {
        return;
    }

    chain.register("suppress-configured-noise", move |error| {
        !compiled.iter().any(|re| re.is_match(&error.message))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::CapturedError;

    #[test]
    fn test_attach_with_empty_registry() {
        let config = InstrumentConfig {
            instrument_tasks: false,
            ..Default::default()
        };
        let registry = CapabilityRegistry::new();

        let (chain, report) = attach(&config, &registry);
        assert!(!report.task_instrumentation);
        assert_eq!(report.traced_jobs, 0);
        assert_eq!(report.filters, 2);
        assert!(chain.evaluate(&CapturedError::new("Error", "real failure")));
    }

    #[test]
    fn test_attach_registers_configured_noise() {
        let config = InstrumentConfig {
            instrument_tasks: false,
            trace_jobs: false,
            extra_noise_patterns: vec!["(?i)socket hang up".to_string()],
            ..Default::default()
        };
        let registry = CapabilityRegistry::new();

        let (chain, report) = attach(&config, &registry);
        assert_eq!(report.filters, 3);
        assert!(!chain.evaluate(&CapturedError::new("Error", "Socket hang up mid-read")));
        assert!(chain.evaluate(&CapturedError::new("Error", "disk quota exceeded")));
    }

    #[test]
    fn test_invalid_pattern_skipped_not_fatal() {
        let chain = FilterChain::new();
        register_configured_noise(&chain, &["(valid)".to_string(), "(unclosed".to_string()]);

        assert_eq!(chain.len(), 1);
        assert!(!chain.evaluate(&CapturedError::new("Error", "valid")));
    }
}
