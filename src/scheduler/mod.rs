// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Scheduler integration surface and job tracing.
//!
//! External job schedulers own their job tables; this layer only observes
//! them. An integration exposes its registered job names and a decorate-once
//! hook through [`SchedulerIntegration`]; the tracer in [`tracer`] wraps
//! each callback in a named span at install time.

pub mod tracer;

pub use tracer::install_tracing;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

/// The eventual outcome of one job invocation.
pub type JobFuture =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, anyhow::Error>> + Send>>;

/// A scheduler-invoked unit of work.
///
/// Takes the scheduler's payload and returns the job's eventual result.
/// Cloning shares the underlying callable.
pub type JobCallback = Arc<dyn Fn(serde_json::Value) -> JobFuture + Send + Sync>;

/// A decorator mapping a job's current callback to its replacement.
pub type JobDecorator<'a> = &'a dyn Fn(JobCallback) -> JobCallback;

/// Contract a job-scheduler integration exposes to this layer.
///
/// Implementations register themselves in the capability registry under one
/// of the well-known scheduler capability ids.
pub trait SchedulerIntegration: Send + Sync {
    /// Integration name, for diagnostics only.
    fn name(&self) -> &str;

    /// Names of all currently-registered jobs.
    fn job_names(&self) -> Vec<String>;

    /// Replace the named job's callback with `decorator(current)`.
    ///
    /// Returns `false` if no job by that name exists. The integration calls
    /// the decorator at most once per invocation and must hand it the
    /// callback currently in the slot, so the original survives by capture
    /// inside the replacement.
    fn decorate(&self, job_name: &str, decorator: JobDecorator<'_>) -> bool;
}

/// A ready-made job table integrations can embed.
///
/// Maps job names to callback slots behind a lock and implements the
/// integration contract directly. `invoke` drives whatever callback is in
/// the slot at call time, which after tracing install is the wrapped one.
pub struct JobTable {
    name: String,
    jobs: RwLock<HashMap<String, JobCallback>>,
}

impl JobTable {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a job. Replaces any existing callback under the same name.
    pub fn register_job(&self, job_name: impl Into<String>, callback: JobCallback) {
        self.jobs.write().unwrap().insert(job_name.into(), callback);
    }

    /// Invoke the named job with a payload.
    ///
    /// Returns `None` if no job by that name is registered. The callback is
    /// cloned out of the slot before invocation, so a concurrent re-entry of
    /// the same job is legal and runs the same callback.
    pub fn invoke(&self, job_name: &str, payload: serde_json::Value) -> Option<JobFuture> {
        let callback = self.jobs.read().unwrap().get(job_name).cloned()?;
        Some(callback(payload))
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    /// Whether the table has no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.read().unwrap().is_empty()
    }
}

impl SchedulerIntegration for JobTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    fn decorate(&self, job_name: &str, decorator: JobDecorator<'_>) -> bool {
        let mut jobs = self.jobs.write().unwrap();
        match jobs.get(job_name).cloned() {
            Some(current) => {
                jobs.insert(job_name.to_string(), decorator(current));
                true
            }
            None => false,
        }
    }
}
