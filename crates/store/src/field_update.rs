//! Partial-update DTO for `update_fields`/`update_fields_unless_status`
//! (spec §4.1 "Job Record Store").

use chrono::{DateTime, Utc};
use serde_json::Value;
use wf_core::{JobStatus, StageHistoryEntry};

/// A sparse patch applied to a [`wf_core::JobRun`] row.
///
/// Every field is `None` by default, meaning "leave unchanged". Fields that
/// are themselves optional on the row (`message`, `error`, `locked_at`,
/// `heartbeat_at`, `last_error_at`) wrap twice: the outer `Option` says
/// whether this update touches the field at all, the inner one carries the
/// new (possibly null) value — so a caller can explicitly clear a field
/// without that being indistinguishable from "don't touch it".
#[derive(Debug, Clone, Default)]
pub struct FieldUpdate {
    pub status: Option<JobStatus>,
    pub stage: Option<String>,
    pub progress: Option<u8>,
    pub message: Option<Option<String>>,
    pub error: Option<Option<String>>,
    pub result: Option<Value>,
    pub metadata: Option<Value>,
    pub stage_history: Option<Vec<StageHistoryEntry>>,
    pub locked_at: Option<Option<DateTime<Utc>>>,
    pub heartbeat_at: Option<Option<DateTime<Utc>>>,
    pub last_error_at: Option<Option<DateTime<Utc>>>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, v: JobStatus) -> Self {
        self.status = Some(v);
        self
    }

    pub fn stage(mut self, v: impl Into<String>) -> Self {
        self.stage = Some(v.into());
        self
    }

    pub fn progress(mut self, v: u8) -> Self {
        self.progress = Some(v);
        self
    }

    pub fn message(mut self, v: impl Into<String>) -> Self {
        self.message = Some(Some(v.into()));
        self
    }

    pub fn clear_message(mut self) -> Self {
        self.message = Some(None);
        self
    }

    pub fn error(mut self, v: impl Into<String>) -> Self {
        self.error = Some(Some(v.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    pub fn result(mut self, v: Value) -> Self {
        self.result = Some(v);
        self
    }

    pub fn metadata(mut self, v: Value) -> Self {
        self.metadata = Some(v);
        self
    }

    pub fn stage_history(mut self, v: Vec<StageHistoryEntry>) -> Self {
        self.stage_history = Some(v);
        self
    }

    pub fn locked_at(mut self, v: DateTime<Utc>) -> Self {
        self.locked_at = Some(Some(v));
        self
    }

    pub fn clear_locked_at(mut self) -> Self {
        self.locked_at = Some(None);
        self
    }

    pub fn heartbeat_at(mut self, v: DateTime<Utc>) -> Self {
        self.heartbeat_at = Some(Some(v));
        self
    }

    pub fn last_error_at(mut self, v: DateTime<Utc>) -> Self {
        self.last_error_at = Some(Some(v));
        self
    }
}
