//! Mode definition
//!
//! Everything the supervisor is allowed to start is a function of the
//! current mode.

use super::trigger::Trigger;

/// Mode to return to when a worker finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resume {
    Idle,
    Auto,
    SortingTask,
}

impl From<Resume> for Mode {
    fn from(resume: Resume) -> Self {
        match resume {
            Resume::Idle => Mode::Idle,
            Resume::Auto => Mode::Auto,
            Resume::SortingTask => Mode::SortingTask,
        }
    }
}

/// Supervisor modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Waiting for operator commands
    Idle,
    /// Store every detected item in the first empty slot
    Auto,
    /// Store items of one color into one slot, buffering the rest
    SortingTask,
    /// A worker owns the arm
    Busy(Resume),
    /// Start-permission lost during hazardous motion; arm held
    EmergencyStop,
}

impl Mode {
    /// Short label for status output
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "IDLE",
            Mode::Auto => "AUTO",
            Mode::SortingTask => "SORTING_TASK",
            Mode::Busy(_) => "BUSY",
            Mode::EmergencyStop => "EMERGENCY_STOP",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Mode::Busy(_))
    }

    /// Modes the liveness watchdog pauses
    pub fn is_active(&self) -> bool {
        matches!(self, Mode::Auto | Mode::SortingTask | Mode::Busy(_))
    }

    /// Resume target for a rehome dispatched from this mode
    fn resume_point(self) -> Resume {
        match self {
            Mode::Auto => Resume::Auto,
            Mode::SortingTask => Resume::SortingTask,
            _ => Resume::Idle,
        }
    }

    /// Process a trigger and return the next mode
    pub fn transition(self, trigger: Trigger) -> Self {
        use Mode::*;
        use Trigger::*;

        match (self, trigger) {
            // Emergency entry wins from everywhere
            (_, WorkerEmergency) => EmergencyStop,
            (Busy(_), PermissionLost) => EmergencyStop,

            // Emergency exit
            (EmergencyStop, DispatchRecover) => Busy(Resume::Idle),

            // Idle transitions
            (Idle, Start) => Auto,
            (Idle, SortAccepted) => SortingTask,

            // Auto transitions
            (Auto, DispatchAuto) => Busy(Resume::Auto),
            (Auto, WarehouseFull) => Idle,

            // SortingTask transitions
            (SortingTask, SortAccepted) => SortingTask,
            (SortingTask, DispatchTarget) => Busy(Resume::Idle),
            (SortingTask, DispatchBuffer) => Busy(Resume::SortingTask),
            (SortingTask, BufferUnavailable) => Idle,
            (SortingTask, TargetOccupied) => Idle,

            // Rehome keeps whatever the operator had selected
            (Idle | Auto | SortingTask, DispatchRehome) => Busy(self.resume_point()),

            // Busy transitions
            (Busy(resume), WorkerDone) => resume.into(),
            (Busy(_), WorkerFault) => Idle,
            (Busy(_), DispatchFailed) => Idle,
            (Busy(_), RecoverFailed) => EmergencyStop,

            // Pause and stop never leave EmergencyStop
            (Auto | SortingTask | Busy(_), Stop) => Idle,
            (Auto | SortingTask | Busy(_), LivenessLost) => Idle,

            // Default: stay in current mode
            _ => self,
        }
    }
}
