//! Inputs to the mode state machine

/// Things that can change the supervisor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    // Operator commands
    /// `start` accepted
    Start,
    /// `stop` accepted
    Stop,
    /// `sort` accepted
    SortAccepted,

    // Dispatches
    /// Auto-mode store dispatched
    DispatchAuto,
    /// Matching item dispatched to the sort target
    DispatchTarget,
    /// Non-matching item dispatched to a buffer slot
    DispatchBuffer,
    /// Return-to-rest dispatched; resumes the current mode
    DispatchRehome,
    /// Recovery from emergency stop dispatched
    DispatchRecover,

    // Worker completion
    /// Worker finished normally
    WorkerDone,
    /// Worker hit an arm fault
    WorkerFault,
    /// Recovery run failed
    RecoverFailed,
    /// Worker aborted on lost permission
    WorkerEmergency,

    // Supervision
    /// Permission lost while the guard window was open
    PermissionLost,
    /// Operator link silent for longer than the liveness window
    LivenessLost,
    /// Every slot is occupied
    WarehouseFull,
    /// Targeted sort has nowhere to put a non-matching item
    BufferUnavailable,
    /// Sort target became occupied before the item arrived
    TargetOccupied,
    /// A dispatched worker could not be started
    DispatchFailed,
}
