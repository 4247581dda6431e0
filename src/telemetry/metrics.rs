// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Metrics collection for the instrumentation layer.
//!
//! Provides lightweight in-process aggregation of what the layer observes:
//! per-job invocation metrics from the job tracer and per-label latency
//! metrics from the task instrumentor. No external dependencies; suitable
//! for an agent that must not drag an observability stack into its host.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Central metrics collection.
#[derive(Debug)]
pub struct Metrics {
    /// Job invocation metrics by job name.
    jobs: RwLock<HashMap<String, JobMetrics>>,

    /// Latency metrics by measurement label.
    latencies: RwLock<HashMap<String, LatencyMetrics>>,

    /// Start time for calculating uptime.
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            latencies: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one traced job invocation.
    pub fn record_job(&self, name: &str, duration: Duration, success: bool) {
        let mut jobs = self.jobs.write().unwrap();
        let metrics = jobs.entry(name.to_string()).or_insert_with(JobMetrics::new);
        metrics.record(duration, success);
    }

    /// Record a latency sample under a label.
    pub fn record_latency(&self, label: &str, duration: Duration) {
        let mut latencies = self.latencies.write().unwrap();
        let metrics = latencies
            .entry(label.to_string())
            .or_insert_with(LatencyMetrics::new);
        metrics.record(duration);
    }

    /// Get metrics for a specific job.
    pub fn job_metrics(&self, name: &str) -> Option<JobMetrics> {
        self.jobs.read().unwrap().get(name).cloned()
    }

    /// Get latency metrics for a specific label.
    pub fn latency_metrics(&self, label: &str) -> Option<LatencyMetrics> {
        self.latencies.read().unwrap().get(label).cloned()
    }

    /// Get uptime since metrics were initialized.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs: self.jobs.read().unwrap().clone(),
            latencies: self.latencies.read().unwrap().clone(),
            uptime: self.uptime(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.jobs.write().unwrap().clear();
        self.latencies.write().unwrap().clear();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for one traced job.
#[derive(Debug, Clone)]
pub struct JobMetrics {
    /// Total number of invocations.
    pub invocations: u64,

    /// Number of invocations that completed without error.
    pub successes: u64,

    /// Number of invocations that returned an error.
    pub failures: u64,

    /// Total time spent in this job.
    pub total_duration: Duration,

    /// Shortest observed invocation.
    pub min_duration: Duration,

    /// Longest observed invocation.
    pub max_duration: Duration,
}

impl JobMetrics {
    /// Create new empty job metrics.
    pub fn new() -> Self {
        Self {
            invocations: 0,
            successes: 0,
            failures: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
        }
    }

    /// Record one invocation.
    pub fn record(&mut self, duration: Duration, success: bool) {
        self.invocations += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
    }

    /// Calculate average invocation time.
    pub fn avg_duration(&self) -> Duration {
        if self.invocations == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.invocations as u32
        }
    }

    /// Calculate success rate (0.0 to 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.invocations == 0 {
            1.0
        } else {
            self.successes as f64 / self.invocations as f64
        }
    }
}

impl Default for JobMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency metrics with a bucketed distribution.
#[derive(Debug, Clone)]
pub struct LatencyMetrics {
    /// Number of samples.
    pub count: u64,

    /// Total duration across samples.
    pub total_duration: Duration,

    /// Minimum sample.
    pub min_duration: Duration,

    /// Maximum sample.
    pub max_duration: Duration,

    /// Histogram buckets for the distribution.
    pub histogram: Histogram,
}

impl LatencyMetrics {
    /// Create new latency metrics.
    pub fn new() -> Self {
        Self {
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    /// Record a sample.
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    /// Calculate average sample duration.
    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }
}

impl Default for LatencyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple histogram with fixed buckets.
///
/// The default buckets are tuned for task-construction latency, which is
/// expected in the tens of microseconds; the overflow bucket catches
/// anything pathological.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Bucket boundaries in microseconds.
    buckets: Vec<u64>,

    /// Count per bucket, plus one overflow slot.
    counts: Vec<u64>,
}

impl Histogram {
    /// Create a histogram with custom bucket boundaries (in microseconds).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    /// Record a duration value.
    pub fn record(&mut self, duration: Duration) {
        let micros = duration.as_micros() as u64;
        let bucket_idx = self
            .buckets
            .iter()
            .position(|&b| micros <= b)
            .unwrap_or(self.buckets.len());
        self.counts[bucket_idx] += 1;
    }

    /// Get counts for each bucket.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Get bucket boundaries.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Calculate approximate percentile (p50, p95, p99, etc.).
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0u64;

        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                // Bucket boundary, or a large value for the overflow bucket
                let micros = if i < self.buckets.len() {
                    self.buckets[i]
                } else {
                    self.buckets.last().copied().unwrap_or(0) * 10
                };
                return Duration::from_micros(micros);
            }
        }

        Duration::ZERO
    }

    /// Get p50 (median) latency.
    pub fn p50(&self) -> Duration {
        self.percentile(50.0)
    }

    /// Get p95 latency.
    pub fn p95(&self) -> Duration {
        self.percentile(95.0)
    }

    /// Get p99 latency.
    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        // 10us, 50us, 100us, 500us, 1ms, 10ms
        Self::with_buckets(vec![10, 50, 100, 500, 1_000, 10_000])
    }
}

/// A snapshot of all metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Job metrics by name.
    pub jobs: HashMap<String, JobMetrics>,

    /// Latency metrics by label.
    pub latencies: HashMap<String, LatencyMetrics>,

    /// Uptime when snapshot was taken.
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Instrumentation Report ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n\n", self.uptime));

        if !self.jobs.is_empty() {
            report.push_str("Traced Jobs:\n");
            for (name, metrics) in &self.jobs {
                report.push_str(&format!(
                    "  {}: {} runs, {:.1}% success, avg {:.2?}\n",
                    name,
                    metrics.invocations,
                    metrics.success_rate() * 100.0,
                    metrics.avg_duration()
                ));
            }
            report.push('\n');
        }

        if !self.latencies.is_empty() {
            report.push_str("Latencies:\n");
            for (label, metrics) in &self.latencies {
                report.push_str(&format!(
                    "  {}: {} samples, avg {:.2?}, p99 {:.2?}\n",
                    label,
                    metrics.count,
                    metrics.avg_duration(),
                    metrics.histogram.p99()
                ));
            }
        }

        report
    }
}

/// Convenience function to record a job invocation to global metrics.
pub fn record_job(name: &str, duration: Duration, success: bool) {
    GLOBAL_METRICS.record_job(name, duration, success);
}

/// Convenience function to record a latency sample to global metrics.
pub fn record_latency(label: &str, duration: Duration) {
    GLOBAL_METRICS.record_latency(label, duration);
}
