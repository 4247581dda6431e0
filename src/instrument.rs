// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Async-task construction instrumentation.
//!
//! The host process constructs tasks through the [`spawn`] seam instead of
//! calling the runtime's ambient spawn directly. At wiring time, exactly one
//! [`TaskInstrumentor`] is installed process-wide: the measuring
//! implementation assigns each construction a correlation identifier and
//! emits a paired start/end mark around the constructor call; the
//! passthrough implementation (and the uninstalled state) delegates
//! untouched. Either way the caller gets back the runtime's own
//! [`JoinHandle`], so everything downstream behaves exactly as if the seam
//! were not there.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::telemetry::TimingSink;

static INSTALLED: OnceCell<TaskInstrumentor> = OnceCell::new();

/// Build the timing label for one construction.
///
/// The correlation id ties the start/end pair to exactly one construction;
/// ids are never reused, so labels are unique for the process lifetime.
pub fn construction_label(correlation_id: u64) -> String {
    format!("task.construct.{correlation_id}")
}

/// Task constructor with optional construction-latency measurement.
pub struct TaskInstrumentor {
    mode: Mode,
}

enum Mode {
    Measuring {
        counter: AtomicU64,
        sink: Arc<dyn TimingSink>,
    },
    Passthrough,
}

impl TaskInstrumentor {
    /// Constructor that measures each construction into `sink`.
    pub fn measuring(sink: Arc<dyn TimingSink>) -> Self {
        Self {
            mode: Mode::Measuring {
                counter: AtomicU64::new(0),
                sink,
            },
        }
    }

    /// Constructor that delegates untouched.
    pub fn passthrough() -> Self {
        Self {
            mode: Mode::Passthrough,
        }
    }

    /// Whether this instrumentor measures constructions.
    pub fn is_measuring(&self) -> bool {
        matches!(self.mode, Mode::Measuring { .. })
    }

    /// Correlation ids handed out so far.
    pub fn constructions(&self) -> u64 {
        match &self.mode {
            Mode::Measuring { counter, .. } => counter.load(Ordering::Relaxed),
            Mode::Passthrough => 0,
        }
    }

    /// Construct a task from the caller's future.
    ///
    /// The future is handed to the runtime unmodified, so panics and
    /// resolution behave exactly as with a direct spawn, and the returned
    /// handle is the runtime's own. The mark pair brackets only the
    /// constructor call, not the task's eventual completion.
    pub fn construct<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match &self.mode {
            Mode::Passthrough => tokio::spawn(future),
            Mode::Measuring { counter, sink } => {
                let correlation_id = counter.fetch_add(1, Ordering::Relaxed) + 1;
                let label = construction_label(correlation_id);
                sink.start_mark(&label);
                let handle = tokio::spawn(future);
                sink.end_mark(&label);
                handle
            }
        }
    }
}

/// Install the measuring instrumentor process-wide.
///
/// Returns `false` if an instrumentor is already installed; installation
/// happens at most once for the process lifetime and is never replaced.
pub fn install_task_instrumentation(sink: Arc<dyn TimingSink>) -> bool {
    let installed = INSTALLED.set(TaskInstrumentor::measuring(sink)).is_ok();
    if installed {
        info!("Task construction instrumentation installed");
    } else {
        debug!("Task instrumentor already installed; keeping the existing one");
    }
    installed
}

/// Install the passthrough instrumentor process-wide.
pub fn install_passthrough() -> bool {
    INSTALLED.set(TaskInstrumentor::passthrough()).is_ok()
}

/// The installed instrumentor, if any.
pub fn installed() -> Option<&'static TaskInstrumentor> {
    INSTALLED.get()
}

/// Construct an async task through the installed instrumentor.
///
/// This is the process-wide constructor seam: drop-in for the runtime's
/// spawn, with identical semantics whether or not anything is installed.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match INSTALLED.get() {
        Some(instrumentor) => instrumentor.construct(future),
        None => tokio::spawn(future),
    }
}
