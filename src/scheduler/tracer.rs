// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Job tracing installation.
//!
//! At host startup, [`install_tracing`] probes the capability registry for a
//! supported scheduler integration and wraps every job registered at that
//! moment in a named trace span. Jobs registered afterwards are not
//! instrumented; a second install call wraps everything again. Both are
//! accepted limitations of the install-once model, and the host's startup
//! sequencing is expected to call this exactly once.

use std::sync::Arc;

use tracing::{debug, info, Instrument};

use super::{JobCallback, SchedulerIntegration};
use crate::capability::CapabilityRegistry;
use crate::telemetry::JobSpan;

/// Probe for a supported scheduler and wrap its registered jobs in spans.
///
/// Returns the number of jobs wrapped. With no supported scheduler present
/// this is a no-op returning 0; absence is not an error.
pub fn install_tracing(registry: &CapabilityRegistry) -> usize {
    let Some((capability, scheduler)) = registry.probe_scheduler() else {
        debug!("No supported scheduler integration present; job tracing skipped");
        return 0;
    };

    let wrapped = wrap_all_jobs(scheduler.as_ref());
    info!(
        capability,
        scheduler = scheduler.name(),
        jobs = wrapped,
        "Job tracing installed"
    );
    wrapped
}

fn wrap_all_jobs(scheduler: &dyn SchedulerIntegration) -> usize {
    let mut wrapped = 0;
    for job_name in scheduler.job_names() {
        if scheduler.decorate(&job_name, &|original| traced_callback(&job_name, original)) {
            wrapped += 1;
        } else {
            debug!(job = %job_name, "Job disappeared between listing and decoration");
        }
    }
    wrapped
}

/// Build the span-wrapping replacement for one job callback.
///
/// Each invocation of the replacement opens its own [`JobSpan`], so
/// overlapping invocations of the same job produce overlapping spans with
/// the same name. The original's future is instrumented with the span and
/// the guard is finished only once the future completes, so the recorded
/// interval covers the job's asynchronous tail, not just its synchronous
/// return. The original's output passes through verbatim.
fn traced_callback(job_name: &str, original: JobCallback) -> JobCallback {
    let job_name = job_name.to_string();
    Arc::new(move |payload| {
        let guard = JobSpan::start(&job_name);
        let span = guard.span().clone();
        let fut = original(payload).instrument(span);
        Box::pin(async move {
            let result = fut.await;
            guard.finish_with_result(&result);
            result
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::capability::{CapabilityRegistry, SCHEDULER_CAPABILITIES};
    use crate::scheduler::JobTable;
    use crate::telemetry::GLOBAL_METRICS;

    fn counting_callback(counter: Arc<AtomicUsize>) -> JobCallback {
        Arc::new(move |_| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                // Yield so the span demonstrably survives a suspension point
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::Value::Null)
            })
        })
    }

    #[test]
    fn test_install_without_scheduler_is_noop() {
        let registry = CapabilityRegistry::new();
        assert_eq!(install_tracing(&registry), 0);
    }

    #[tokio::test]
    async fn test_install_wraps_registered_jobs() {
        let registry = CapabilityRegistry::new();
        let table = Arc::new(JobTable::new("cron"));
        let runs_a = Arc::new(AtomicUsize::new(0));
        let runs_b = Arc::new(AtomicUsize::new(0));

        table.register_job("tracer-job-a", counting_callback(Arc::clone(&runs_a)));
        table.register_job("tracer-job-b", counting_callback(Arc::clone(&runs_b)));
        registry.register_scheduler(SCHEDULER_CAPABILITIES[0], Arc::clone(&table) as _);

        assert_eq!(install_tracing(&registry), 2);

        // Invoking A runs the original exactly once and records one span for
        // A only; B stays untouched.
        table
            .invoke("tracer-job-a", serde_json::Value::Null)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(runs_a.load(Ordering::SeqCst), 1);
        assert_eq!(runs_b.load(Ordering::SeqCst), 0);

        let metrics = GLOBAL_METRICS
            .job_metrics("tracer-job-a")
            .expect("span recorded for A");
        assert_eq!(metrics.invocations, 1);
        assert_eq!(metrics.successes, 1);
        assert!(GLOBAL_METRICS.job_metrics("tracer-job-b").is_none());
    }

    #[tokio::test]
    async fn test_traced_callback_propagates_failure() {
        let original: JobCallback =
            Arc::new(|_| Box::pin(async { Err(anyhow::anyhow!("worker crashed")) }));
        let traced = traced_callback("tracer-failing-job", original);

        let err = traced(serde_json::Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "worker crashed");

        let metrics = GLOBAL_METRICS
            .job_metrics("tracer-failing-job")
            .expect("failure recorded");
        assert_eq!(metrics.failures, 1);
    }

    #[tokio::test]
    async fn test_jobs_registered_after_install_are_not_wrapped() {
        let registry = CapabilityRegistry::new();
        let table = Arc::new(JobTable::new("cron"));
        registry.register_scheduler(SCHEDULER_CAPABILITIES[1], Arc::clone(&table) as _);

        assert_eq!(install_tracing(&registry), 0);

        let runs = Arc::new(AtomicUsize::new(0));
        table.register_job("tracer-late-job", counting_callback(Arc::clone(&runs)));

        table
            .invoke("tracer-late-job", serde_json::Value::Null)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(GLOBAL_METRICS.job_metrics("tracer-late-job").is_none());
    }
}
