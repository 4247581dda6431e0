// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sync/async bridge over the remote job-control API.
//!
//! Application code reaches the telemetry core's job store through whichever
//! call shape fits its context: the async form for async callers, the
//! callback form for callback-driven code, and the blocking form for code
//! that must have the answer before its next statement. All three shapes
//! delegate to the same [`JobControlApi`] calls; failures surface verbatim
//! through each shape's native idiom, with no retries and no translation.

use std::sync::Arc;

use crate::error::JobControlError;
use crate::telemetry::{ChangeSet, JobControlApi, JobRecord};

/// Bridge exposing a [`JobControlApi`] in three call shapes.
pub struct JobControlBridge<A: JobControlApi + ?Sized> {
    api: Arc<A>,
}

impl<A: JobControlApi + ?Sized> Clone for JobControlBridge<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: JobControlApi + ?Sized + 'static> JobControlBridge<A> {
    /// Wrap a shared job-control API handle.
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Async form of the job read: direct pass-through.
    pub async fn get_async(&self, id: &str) -> Result<Option<JobRecord>, JobControlError> {
        self.api.get_job(id).await
    }

    /// Async form of the job update: direct pass-through.
    pub async fn set_async(
        &self,
        id: &str,
        changes: ChangeSet,
    ) -> Result<JobRecord, JobControlError> {
        self.api.update_job(id, changes).await
    }

    /// Callback form of the job read.
    ///
    /// The callback fires exactly once, with either the record or the
    /// verbatim remote error.
    pub fn get_with_callback<F>(&self, id: &str, callback: F)
    where
        F: FnOnce(Result<Option<JobRecord>, JobControlError>) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let id = id.to_string();
        let _detached = crate::instrument::spawn(async move {
            callback(api.get_job(&id).await);
        });
    }

    /// Callback form of the job update.
    pub fn set_with_callback<F>(&self, id: &str, changes: ChangeSet, callback: F)
    where
        F: FnOnce(Result<JobRecord, JobControlError>) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let id = id.to_string();
        let _detached = crate::instrument::spawn(async move {
            callback(api.update_job(&id, changes).await);
        });
    }

    /// Blocking form of the job read.
    ///
    /// Caller contract, not enforced: call only from a thread that may
    /// legally block (a dedicated or blocking-pool thread with a runtime
    /// handle available, never a runtime worker). The wait is unbounded; if
    /// the remote call never resolves, neither does this.
    pub fn get_blocking(&self, id: &str) -> Result<Option<JobRecord>, JobControlError> {
        tokio::runtime::Handle::current().block_on(self.get_async(id))
    }

    /// Blocking form of the job update. Same caller contract as
    /// [`get_blocking`](Self::get_blocking).
    pub fn set_blocking(&self, id: &str, changes: ChangeSet) -> Result<JobRecord, JobControlError> {
        tokio::runtime::Handle::current().block_on(self.set_async(id, changes))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;

    /// Job-control fake: records stored in memory, optional forced failure.
    struct FakeJobControl {
        records: Mutex<HashMap<String, JobRecord>>,
        fail_with: Option<String>,
        calls: AtomicUsize,
    }

    impl FakeJobControl {
        fn with_record(record: JobRecord) -> Self {
            let mut records = HashMap::new();
            records.insert(record.id.clone(), record);
            Self {
                records: Mutex::new(records),
                fail_with: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
                fail_with: Some(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl JobControlApi for FakeJobControl {
        async fn get_job(&self, id: &str) -> Result<Option<JobRecord>, JobControlError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_with {
                return Err(JobControlError::rejected_message(message.clone()));
            }
            Ok(self.records.lock().unwrap().get(id).cloned())
        }

        async fn update_job(
            &self,
            id: &str,
            changes: ChangeSet,
        ) -> Result<JobRecord, JobControlError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_with {
                return Err(JobControlError::rejected_message(message.clone()));
            }
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(id)
                .ok_or_else(|| JobControlError::JobNotFound(id.to_string()))?;
            for (field, value) in changes {
                record.fields.insert(field, value);
            }
            Ok(record.clone())
        }
    }

    fn record_x() -> JobRecord {
        JobRecord::new("x").with_field("a", serde_json::json!(1))
    }

    #[tokio::test]
    async fn test_async_form_passes_through() {
        let bridge = JobControlBridge::new(Arc::new(FakeJobControl::with_record(record_x())));

        let found = bridge.get_async("x").await.unwrap().unwrap();
        assert_eq!(found.field("a"), Some(&serde_json::json!(1)));

        assert!(bridge.get_async("y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_async_form_propagates_rejection() {
        let bridge = JobControlBridge::new(Arc::new(FakeJobControl::failing("E")));
        let err = bridge.get_async("x").await.unwrap_err();
        assert!(err.to_string().contains("E"));
    }

    #[tokio::test]
    async fn test_callback_form_success_fires_exactly_once() {
        let bridge = JobControlBridge::new(Arc::new(FakeJobControl::with_record(record_x())));
        let (tx, rx) = oneshot::channel();

        // FnOnce consuming the sender: a second invocation is unrepresentable.
        bridge.get_with_callback("x", move |result| {
            tx.send(result).unwrap();
        });

        let result = rx.await.expect("callback fired");
        let record = result.unwrap().unwrap();
        assert_eq!(record.field("a"), Some(&serde_json::json!(1)));
    }

    #[tokio::test]
    async fn test_callback_form_failure_carries_error_only() {
        let bridge = JobControlBridge::new(Arc::new(FakeJobControl::failing("E")));
        let (tx, rx) = oneshot::channel();

        bridge.get_with_callback("x", move |result| {
            tx.send(result).unwrap();
        });

        let result = rx.await.expect("callback fired");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("E"));
    }

    #[tokio::test]
    async fn test_set_with_callback_updates_record() {
        let bridge = JobControlBridge::new(Arc::new(FakeJobControl::with_record(record_x())));
        let (tx, rx) = oneshot::channel();

        let mut changes = ChangeSet::new();
        changes.insert("state".to_string(), serde_json::json!("done"));
        bridge.set_with_callback("x", changes, move |result| {
            tx.send(result).unwrap();
        });

        let updated = rx.await.unwrap().unwrap();
        assert_eq!(updated.field("state"), Some(&serde_json::json!("done")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_form_returns_value() {
        let bridge = JobControlBridge::new(Arc::new(FakeJobControl::with_record(record_x())));

        // Blocking form must run off the async scheduling context.
        let result = tokio::task::spawn_blocking(move || bridge.get_blocking("x"))
            .await
            .unwrap();
        assert!(result.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_form_raises_error() {
        let bridge = JobControlBridge::new(Arc::new(FakeJobControl::failing("E")));

        let result = tokio::task::spawn_blocking(move || {
            let mut changes = ChangeSet::new();
            changes.insert("state".to_string(), serde_json::json!("done"));
            bridge.set_blocking("x", changes)
        })
        .await
        .unwrap();
        assert!(result.is_err());
    }
}
