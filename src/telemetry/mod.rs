// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry seams and local aggregation.
//!
//! The telemetry core lives outside this crate; this module defines the
//! narrow client-side contracts the instrumentation layer talks through:
//!
//! - **Timing sink**: paired start/end marks keyed by label, emitted by the
//!   task instrumentor
//! - **Job control**: pass-through reads and writes against the core's
//!   remote job store
//! - **Spans**: named trace intervals for job invocations, covering the
//!   asynchronous tail of each callback
//! - **Metrics**: in-process aggregation of observed jobs and latencies
//!
//! Initialize diagnostic output at host startup:
//!
//! ```rust,ignore
//! use pulse::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::production())?;
//! ```

mod init;
pub mod job_control;
pub mod metrics;
mod spans;
pub mod timing;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use job_control::{ChangeSet, JobControlApi, JobRecord};
pub use metrics::{
    Histogram, JobMetrics, LatencyMetrics, Metrics, MetricsSnapshot, GLOBAL_METRICS,
};
pub use spans::{JobSpan, SpanExt};
pub use timing::{MemorySink, MetricsTimingSink, TimingSink};
