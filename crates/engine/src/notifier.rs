//! Fire-and-forget progress/terminal signal to observers (spec §4.1 "Notifier",
//! §6 "Notifier contract").

use async_trait::async_trait;
use wf_core::JobRun;

/// `JobProgress`/`JobFailed`/`JobDone` — errors are ignored by callers.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn job_progress(&self, owner: &str, row: &JobRun, stage: &str, pct: u8, msg: &str);
    async fn job_failed(&self, owner: &str, row: &JobRun, stage: &str, msg: &str);
    async fn job_done(&self, owner: &str, row: &JobRun);
}

/// Default notifier: logs structured events, sends nothing anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn job_progress(&self, owner: &str, row: &JobRun, stage: &str, pct: u8, msg: &str) {
        tracing::info!(%owner, job_id = %row.id, %stage, pct, %msg, "job progress");
    }

    async fn job_failed(&self, owner: &str, row: &JobRun, stage: &str, msg: &str) {
        tracing::warn!(%owner, job_id = %row.id, %stage, %msg, "job failed");
    }

    async fn job_done(&self, owner: &str, row: &JobRun) {
        tracing::info!(%owner, job_id = %row.id, "job done");
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum NotifierCall {
        Progress { stage: String, pct: u8, msg: String },
        Failed { stage: String, msg: String },
        Done,
    }

    struct FakeNotifierState {
        calls: Vec<NotifierCall>,
    }

    /// Records every call for test assertions.
    #[derive(Clone)]
    pub struct RecordingNotifier {
        inner: Arc<Mutex<FakeNotifierState>>,
    }

    impl Default for RecordingNotifier {
        fn default() -> Self {
            Self { inner: Arc::new(Mutex::new(FakeNotifierState { calls: Vec::new() })) }
        }
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<NotifierCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn job_progress(&self, _owner: &str, _row: &JobRun, stage: &str, pct: u8, msg: &str) {
            self.inner.lock().calls.push(NotifierCall::Progress {
                stage: stage.to_string(),
                pct,
                msg: msg.to_string(),
            });
        }

        async fn job_failed(&self, _owner: &str, _row: &JobRun, stage: &str, msg: &str) {
            self.inner
                .lock()
                .calls
                .push(NotifierCall::Failed { stage: stage.to_string(), msg: msg.to_string() });
        }

        async fn job_done(&self, _owner: &str, _row: &JobRun) {
            self.inner.lock().calls.push(NotifierCall::Done);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{NotifierCall, RecordingNotifier};

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
