//! Status line
//!
//! Snapshot of the supervisor state as the operator sees it.

use serde::Serialize;

use sortbay_core::orchestrator::{SortTask, SystemState};

/// Active targeted sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub slot: u8,
    pub color: String,
}

/// One status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub mode: &'static str,
    /// Occupancy of slots 1 to 6, 1 meaning occupied
    pub inventory: [u8; 6],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub parked: bool,
}

impl From<&SortTask> for TaskSnapshot {
    fn from(task: &SortTask) -> Self {
        Self {
            slot: task.slot.get(),
            color: task.color.as_str().to_string(),
        }
    }
}

impl From<&SystemState> for StatusSnapshot {
    fn from(state: &SystemState) -> Self {
        Self {
            mode: state.mode.label(),
            inventory: state.inventory.as_array().map(u8::from),
            task: state.current_task.as_ref().map(TaskSnapshot::from),
            message: state.last_message.as_ref().map(|m| m.as_str().to_string()),
            parked: state.parked,
        }
    }
}

impl StatusSnapshot {
    /// Encode as a single JSON line
    pub fn to_json_line(&self) -> String {
        // Plain data with string keys, so encoding cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
