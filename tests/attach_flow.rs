// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end attach flow: capability registration, one-shot install,
//! task construction marks, traced job invocation, dispatch, and the
//! returned filter chain.
//!
//! Everything here shares the process-global instrumentor and metrics, so
//! the whole scenario lives in a single test function.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pulse::capability::{CapabilityRegistry, PROFILER_CAPABILITY, SCHEDULER_CAPABILITIES};
use pulse::config::InstrumentConfig;
use pulse::dispatch::{dispatch_profiling_job, ProfileJobPayload, ProfileMode, ProfilingExtension};
use pulse::filters::CapturedError;
use pulse::scheduler::{JobCallback, JobTable};
use pulse::telemetry::GLOBAL_METRICS;

struct CountingProfiler {
    calls: AtomicUsize,
    last: Mutex<Option<(u64, String, ProfileMode)>>,
}

impl CountingProfiler {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }
}

impl ProfilingExtension for CountingProfiler {
    fn name(&self) -> &str {
        "counting"
    }

    fn profile(&self, duration_secs: u64, job_id: &str, mode: ProfileMode) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((duration_secs, job_id.to_string(), mode));
    }
}

fn async_job(runs: Arc<AtomicUsize>) -> JobCallback {
    Arc::new(move |payload| {
        let runs = Arc::clone(&runs);
        Box::pin(async move {
            // Force the span across a suspension point
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(payload)
        })
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_attach_flow() {
    // Collaborators register first
    let registry = CapabilityRegistry::new();
    let table = Arc::new(JobTable::new("synced-cron"));
    let runs_a = Arc::new(AtomicUsize::new(0));
    let runs_b = Arc::new(AtomicUsize::new(0));
    table.register_job("flow-job-a", async_job(Arc::clone(&runs_a)));
    table.register_job("flow-job-b", async_job(Arc::clone(&runs_b)));
    registry.register_scheduler(SCHEDULER_CAPABILITIES[0], Arc::clone(&table) as _);

    let profiler = Arc::new(CountingProfiler::new());
    registry.register_profiler(PROFILER_CAPABILITY, Arc::clone(&profiler) as _);

    // First attach installs everything; a second attach cannot re-install
    // the task instrumentor.
    let config = InstrumentConfig::default();
    let (chain, report) = pulse::attach(&config, &registry);
    assert!(report.task_instrumentation);
    assert_eq!(report.traced_jobs, 2);
    assert_eq!(report.filters, 2);

    let (_, second) = pulse::attach(&config, &registry);
    assert!(!second.task_instrumentation);

    // Task constructions flow through the installed seam: dense ids,
    // paired marks resolved into latency metrics, values untouched.
    let mut handles = Vec::new();
    for i in 0..3u64 {
        handles.push(pulse::spawn(async move { i * 2 }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), i as u64 * 2);
    }

    let instrumentor = pulse::instrument::installed().expect("installed by attach");
    assert!(instrumentor.is_measuring());
    assert_eq!(instrumentor.constructions(), 3);
    for id in 1..=3u64 {
        let label = pulse::instrument::construction_label(id);
        let latency = GLOBAL_METRICS
            .latency_metrics(&label)
            .unwrap_or_else(|| panic!("latency recorded for {label}"));
        assert_eq!(latency.count, 1);
    }

    // Traced job: span covers the async tail, original still runs, the
    // sibling job is untouched.
    let result = table
        .invoke("flow-job-a", serde_json::json!({"tick": 1}))
        .expect("job registered")
        .await
        .unwrap();
    assert_eq!(result, serde_json::json!({"tick": 1}));
    assert_eq!(runs_a.load(Ordering::SeqCst), 1);
    assert_eq!(runs_b.load(Ordering::SeqCst), 0);

    let job_a = GLOBAL_METRICS
        .job_metrics("flow-job-a")
        .expect("span recorded");
    assert_eq!(job_a.invocations, 1);
    assert!(job_a.min_duration >= std::time::Duration::from_millis(2));
    assert!(GLOBAL_METRICS.job_metrics("flow-job-b").is_none());

    // Dispatch: full payload triggers the extension, id-less payload does not.
    let payload = ProfileJobPayload::from_value(serde_json::json!({
        "_id": "prof-1",
        "data": { "duration": 20 }
    }))
    .unwrap();
    assert!(dispatch_profiling_job(&registry, &payload));
    assert_eq!(profiler.calls.load(Ordering::SeqCst), 1);
    let (duration, job_id, mode) = profiler.last.lock().unwrap().clone().unwrap();
    assert_eq!((duration, job_id.as_str(), mode), (20, "prof-1", ProfileMode::Cpu));

    let missing_id = ProfileJobPayload::from_value(serde_json::json!({"data": {}})).unwrap();
    assert!(!dispatch_profiling_job(&registry, &missing_id));
    assert_eq!(profiler.calls.load(Ordering::SeqCst), 1);

    // The returned chain suppresses built-in noise and reports the rest.
    assert!(!chain.evaluate(&CapturedError::new(
        "Error",
        "connection timeout. no client heartbeat received",
    )));
    assert!(chain.evaluate(&CapturedError::new("Error", "real failure")));
}
