// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Client-side seam for the telemetry core's remote job store.
//!
//! Job records live in the telemetry core; this layer never caches or
//! mutates them locally. Every read and write is a pass-through request
//! through [`JobControlApi`], and every failure surfaces verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::JobControlError;

/// A set of field updates to apply to a remote job record.
pub type ChangeSet = serde_json::Map<String, serde_json::Value>;

/// One job record as held by the telemetry core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Opaque job identifier.
    pub id: String,

    /// Arbitrary record fields.
    #[serde(default, flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl JobRecord {
    /// Create a record with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }

    /// Set a field, builder-style.
    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

/// The telemetry core's job-control API.
///
/// `get_job` resolves to `None` for an unknown id; `update_job` applies a
/// change-set and returns the updated record. Failures carry an
/// implementation-defined [`JobControlError`] payload.
#[async_trait]
pub trait JobControlApi: Send + Sync {
    /// Fetch a job record by id.
    async fn get_job(&self, id: &str) -> Result<Option<JobRecord>, JobControlError>;

    /// Apply a change-set to a job record and return the updated record.
    async fn update_job(&self, id: &str, changes: ChangeSet)
        -> Result<JobRecord, JobControlError>;
}
