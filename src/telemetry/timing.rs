// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Timing-sink seam for the telemetry core.
//!
//! The task instrumentor emits paired start/end marks keyed by a label
//! string; where those marks go is the telemetry core's concern. This module
//! defines the narrow [`TimingSink`] contract plus two local
//! implementations: one that folds marks into the in-process metrics
//! registry, and one that keeps raw marks in memory for inspection.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Instant;

use tracing::debug;

use super::metrics::GLOBAL_METRICS;

/// Destination for paired start/end timing marks.
///
/// Implementations must tolerate marks for labels they have never seen;
/// correlation-id labels are unique per construction and never reused.
pub trait TimingSink: Send + Sync {
    /// Record the start of the interval identified by `label`.
    fn start_mark(&self, label: &str);

    /// Record the end of the interval identified by `label`.
    fn end_mark(&self, label: &str);
}

/// Sink that resolves mark pairs into latency samples in [`GLOBAL_METRICS`].
///
/// An end mark with no matching start is dropped with a debug diagnostic;
/// it cannot produce a sample.
#[derive(Debug, Default)]
pub struct MetricsTimingSink {
    pending: RwLock<HashMap<String, Instant>>,
}

impl MetricsTimingSink {
    /// Create a new sink.
    pub fn new() -> Self {
        Self {
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Number of start marks still awaiting their end mark.
    pub fn pending_marks(&self) -> usize {
        self.pending.read().unwrap().len()
    }
}

impl TimingSink for MetricsTimingSink {
    fn start_mark(&self, label: &str) {
        self.pending
            .write()
            .unwrap()
            .insert(label.to_string(), Instant::now());
    }

    fn end_mark(&self, label: &str) {
        let started = self.pending.write().unwrap().remove(label);
        match started {
            Some(start) => GLOBAL_METRICS.record_latency(label, start.elapsed()),
            None => debug!(label, "Dropping end mark with no matching start"),
        }
    }
}

/// A single recorded mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Start,
    End,
}

/// Sink that keeps every mark in memory, in arrival order.
///
/// Used for manual inspection and in tests that assert on the exact mark
/// sequence the instrumentor emits.
#[derive(Debug, Default)]
pub struct MemorySink {
    marks: Mutex<Vec<(String, Mark, Instant)>>,
}

impl MemorySink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self {
            marks: Mutex::new(Vec::new()),
        }
    }

    /// All marks recorded so far, in arrival order.
    pub fn marks(&self) -> Vec<(String, Mark, Instant)> {
        self.marks.lock().unwrap().clone()
    }

    /// Labels that have received both a start and an end mark.
    pub fn completed_labels(&self) -> Vec<String> {
        let marks = self.marks.lock().unwrap();
        let mut starts: HashMap<&str, Instant> = HashMap::new();
        let mut completed = Vec::new();
        for (label, mark, at) in marks.iter() {
            match mark {
                Mark::Start => {
                    starts.insert(label.as_str(), *at);
                }
                Mark::End => {
                    if let Some(start) = starts.get(label.as_str()) {
                        debug_assert!(*start <= *at);
                        completed.push(label.clone());
                    }
                }
            }
        }
        completed
    }
}

impl TimingSink for MemorySink {
    fn start_mark(&self, label: &str) {
        self.marks
            .lock()
            .unwrap()
            .push((label.to_string(), Mark::Start, Instant::now()));
    }

    fn end_mark(&self, label: &str) {
        self.marks
            .lock()
            .unwrap()
            .push((label.to_string(), Mark::End, Instant::now()));
    }
}
