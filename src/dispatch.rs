// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Remote profiling-job dispatch.
//!
//! When the telemetry core hands the host a profiling job (typically a
//! record fetched through the job-control bridge), this helper triggers the
//! optional profiling extension with the job's parameters.
//! Dispatch is best-effort and fire-and-forget: a payload with no job id or
//! a host with no extension installed logs a diagnostic and moves on. No
//! failure propagates to the caller and nothing is retried.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::capability::{CapabilityRegistry, PROFILER_CAPABILITY};

/// Profile duration used when the payload does not name one.
pub const DEFAULT_PROFILE_DURATION_SECS: u64 = 10;

/// What the profiling extension should sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileMode {
    Cpu,
    Allocation,
}

impl std::fmt::Display for ProfileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Allocation => write!(f, "allocation"),
        }
    }
}

/// The optional profiling extension's remote procedure.
///
/// Registered in the capability registry under [`PROFILER_CAPABILITY`].
pub trait ProfilingExtension: Send + Sync {
    /// Extension name, for diagnostics only.
    fn name(&self) -> &str;

    /// Start a profile run of `duration_secs` attributed to `job_id`.
    fn profile(&self, duration_secs: u64, job_id: &str, mode: ProfileMode);
}

/// A received profiling job payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileJobPayload {
    /// Job identifier, as assigned by the telemetry core.
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    /// Job parameters.
    #[serde(default)]
    pub data: ProfileJobData,
}

/// Parameter bag carried by a profiling job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileJobData {
    /// Requested profile duration in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

impl ProfileJobPayload {
    /// Parse a payload from the wire shape.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Build a payload from a job record fetched through the bridge.
    ///
    /// The record's `data` field is the parameter bag; anything malformed
    /// degrades to an empty bag rather than failing the dispatch.
    pub fn from_record(record: &crate::telemetry::JobRecord) -> Self {
        let data = record
            .field("data")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        Self {
            id: Some(record.id.clone()),
            data,
        }
    }

    /// The effective profile duration.
    pub fn duration_secs(&self) -> u64 {
        self.data.duration.unwrap_or(DEFAULT_PROFILE_DURATION_SECS)
    }
}

/// Trigger a CPU profile for a received job payload, best-effort.
///
/// Returns `true` if the extension was invoked. Missing job id and absent
/// extension both log and return `false`; neither is an error.
pub fn dispatch_profiling_job(registry: &CapabilityRegistry, payload: &ProfileJobPayload) -> bool {
    let Some(job_id) = payload.id.as_deref() else {
        warn!("Profiling job payload carries no job id; dispatch skipped");
        return false;
    };

    let Some(profiler) = registry.profiler(PROFILER_CAPABILITY) else {
        debug!(job_id, "No profiling extension installed; dispatch skipped");
        return false;
    };

    let duration_secs = payload.duration_secs();
    debug!(
        job_id,
        duration_secs,
        extension = profiler.name(),
        "Dispatching profiling job"
    );
    profiler.profile(duration_secs, job_id, ProfileMode::Cpu);
    true
}
