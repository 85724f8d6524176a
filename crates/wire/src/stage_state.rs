//! Stage Sub-State enums (spec §3 "Stage Sub-State").

use serde::{Deserialize, Serialize};

/// How a stage is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMode {
    Inline,
    Child,
}

wf_core::simple_display! {
    StageMode {
        Inline => "inline",
        Child => "child",
    }
}

/// Status of one stage within an Orchestrator State (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    WaitingChild,
    Succeeded,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    /// Deps satisfied once in {succeeded, skipped} (spec §4.4.2 step 5).
    pub fn satisfies_dependency(self) -> bool {
        matches!(self, Self::Succeeded | Self::Skipped)
    }
}

wf_core::simple_display! {
    StageStatus {
        Pending => "pending",
        Running => "running",
        WaitingChild => "waiting_child",
        Succeeded => "succeeded",
        Failed => "failed",
        Skipped => "skipped",
    }
}

#[cfg(test)]
#[path = "stage_state_tests.rs"]
mod tests;
