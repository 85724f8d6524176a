//! Job run status — the top-level state machine from the data model.

use serde::{Deserialize, Serialize};

/// Status of a job run (spec §3).
///
/// Spellings are part of the external contract (spec §6) and MUST NOT change
/// across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    WaitingChild,
    WaitingUser,
    Succeeded,
    Failed,
    Canceled,
}

impl JobStatus {
    /// Terminal statuses never transition out (invariant 3).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// Only `queued` rows are claimable (§4.1).
    pub fn is_claimable(self) -> bool {
        matches!(self, Self::Queued)
    }

    pub fn is_waiting(self) -> bool {
        matches!(self, Self::WaitingChild | Self::WaitingUser)
    }
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        WaitingChild => "waiting_child",
        WaitingUser => "waiting_user",
        Succeeded => "succeeded",
        Failed => "failed",
        Canceled => "canceled",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
