//! Events emitted by the orchestrator
//!
//! Each tick returns the events it produced so the runtime can log them.

use crate::inventory::SlotId;
use crate::motion::{Job, Waypoint};
use crate::state::Mode;
use crate::traits::ArmError;

use super::CommandError;

/// Why a command had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Entry failed validation
    Invalid(CommandError),
    /// Every slot is already occupied
    WarehouseFull,
    /// Requested slot is occupied
    SlotOccupied(SlotId),
    /// Command not accepted in the current mode
    WrongMode(Mode),
    /// Emergency stop must be cleared with the reset line first
    EmergencyActive,
    /// A worker already owns the arm
    ArmBusy,
    /// Start-permission is not asserted
    NoPermission,
}

/// What triggered an emergency stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopCause {
    /// Worker aborted its own motion
    WorkerAbort,
    /// Supervisor saw permission drop inside the guard window
    PermissionLost,
}

/// Something observable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    ModeChanged { from: Mode, to: Mode },
    JobDispatched(Job),
    JobCompleted(Job),
    JobFaulted { job: Job, error: ArmError },
    /// Fail-open timeout during a completed job
    ArrivalUnconfirmed { waypoint: Waypoint, max_error: Option<f32> },
    EmergencyStop(StopCause),
    CommandRejected(Rejection),
    InventoryOverride,
    LivenessLost,
    WarehouseFull,
    BufferUnavailable,
}
