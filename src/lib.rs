// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Pulse - lightweight APM instrumentation for host processes.
//!
//! Pulse attaches to a running host, observes a few well-chosen runtime
//! operations, and reports timing and identity metadata to a telemetry core
//! without altering the host's observable behavior.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`instrument`] - Measuring task-constructor seam with correlation ids
//! - [`scheduler`] - Scheduler integration surface and job tracing
//! - [`bridge`] - Sync/async/callback shapes over the remote job-control API
//! - [`filters`] - Error filter chain consulted before error transmission
//! - [`dispatch`] - Best-effort remote profiling-job dispatch
//! - [`capability`] - Registry of optional collaborators
//! - [`telemetry`] - Telemetry-core seams, spans, metrics, log bootstrap
//! - [`config`] - Configuration loading and env overrides
//! - [`install`] - One-call startup wiring
//! - [`error`] - Error types
//!
//! # Wiring
//!
//! ```rust,ignore
//! use pulse::capability::GLOBAL_CAPABILITIES;
//! use pulse::config::load_config;
//! use pulse::telemetry::init_telemetry;
//!
//! let config = load_config(std::path::Path::new("."))?;
//! let _guard = init_telemetry(&config.telemetry_config())?;
//!
//! // Optional collaborators register themselves first, then:
//! let (filter_chain, report) = pulse::install::attach(&config, &GLOBAL_CAPABILITIES);
//! ```
//!
//! After attach, the host constructs tasks through [`instrument::spawn`] and
//! consults `filter_chain.evaluate` before shipping any captured error.

pub mod bridge;
pub mod capability;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filters;
pub mod install;
pub mod instrument;
pub mod scheduler;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use bridge::JobControlBridge;
pub use capability::{CapabilityRegistry, GLOBAL_CAPABILITIES};
pub use error::{ConfigError, JobControlError, TelemetryError, ValidationError};
pub use filters::{CapturedError, FilterChain};
pub use install::{attach, AttachReport};
pub use instrument::{install_task_instrumentation, spawn, TaskInstrumentor};
pub use scheduler::{install_tracing, JobCallback, SchedulerIntegration};
pub use telemetry::{init_telemetry, JobControlApi, JobRecord, TelemetryConfig, TimingSink};

/// Pulse version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
