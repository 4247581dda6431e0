// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Capability registry for optional collaborators.
//!
//! The layer instruments third-party integrations only if they are present,
//! but must not import them at compile time. Instead, collaborators register
//! themselves here under well-known capability ids at their own startup, and
//! the core probes the registry. An absent capability is never an error.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::dispatch::ProfilingExtension;
use crate::scheduler::SchedulerIntegration;

/// Scheduler capability ids probed by the job tracer, in priority order.
///
/// The two supported integrations are mutually exclusive; the first one
/// present wins.
pub const SCHEDULER_CAPABILITIES: [&str; 2] = ["cron.synced", "cron.queue"];

/// Capability id of the optional profiling extension.
pub const PROFILER_CAPABILITY: &str = "profiler.cpu";

/// Process-global capability registry.
pub static GLOBAL_CAPABILITIES: Lazy<CapabilityRegistry> = Lazy::new(CapabilityRegistry::new);

/// Named lookup table of optional collaborators.
pub struct CapabilityRegistry {
    schedulers: RwLock<HashMap<String, Arc<dyn SchedulerIntegration>>>,
    profilers: RwLock<HashMap<String, Arc<dyn ProfilingExtension>>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            schedulers: RwLock::new(HashMap::new()),
            profilers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a scheduler integration under a capability id.
    pub fn register_scheduler(
        &self,
        capability: impl Into<String>,
        integration: Arc<dyn SchedulerIntegration>,
    ) {
        self.schedulers
            .write()
            .unwrap()
            .insert(capability.into(), integration);
    }

    /// Register a profiling extension under a capability id.
    pub fn register_profiler(
        &self,
        capability: impl Into<String>,
        extension: Arc<dyn ProfilingExtension>,
    ) {
        self.profilers
            .write()
            .unwrap()
            .insert(capability.into(), extension);
    }

    /// Look up a scheduler integration.
    pub fn scheduler(&self, capability: &str) -> Option<Arc<dyn SchedulerIntegration>> {
        self.schedulers.read().unwrap().get(capability).cloned()
    }

    /// Look up a profiling extension.
    pub fn profiler(&self, capability: &str) -> Option<Arc<dyn ProfilingExtension>> {
        self.profilers.read().unwrap().get(capability).cloned()
    }

    /// Probe the supported scheduler capabilities in priority order.
    pub fn probe_scheduler(&self) -> Option<(&'static str, Arc<dyn SchedulerIntegration>)> {
        for capability in SCHEDULER_CAPABILITIES {
            if let Some(integration) = self.scheduler(capability) {
                return Some((capability, integration));
            }
        }
        None
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
