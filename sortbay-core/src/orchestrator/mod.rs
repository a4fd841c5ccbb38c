//! Sort orchestrator
//!
//! The single owner of system state. Each fixed-cadence tick folds in the
//! worker's completion report, the operator link's liveness, the PLC's
//! occupancy truth, one command batch and the interlock, then decides
//! whether to hand the arm to a new worker.
//!
//! The orchestrator never blocks and never touches the arm. A dispatch
//! carries the motion lease; the caller moves it into the worker, which
//! releases it when the run ends.

pub mod commands;
pub mod events;

pub use commands::{ColorFilter, Command, CommandError, SlotSelector};
pub use events::{Event, Rejection, StopCause};

use core::fmt::Write;

use heapless::{String, Vec};

use crate::config::SupervisorConfig;
use crate::inventory::{Inventory, SlotId};
use crate::motion::{Job, JobOutcome, StorePurpose, WorkerReport};
use crate::safety::{DebouncedInput, GuardWindow, Interlock, LeaseGuard, MotionLease};
use crate::state::{Mode, Resume, Trigger};
use crate::traits::Detection;

/// Maximum operator message length
pub const MAX_MESSAGE_LEN: usize = 64;

/// Maximum events reported per tick
pub const MAX_EVENTS: usize = 16;

/// Operator-facing status line
pub type Message = String<MAX_MESSAGE_LEN>;

/// Accepted targeted sort
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SortTask {
    pub slot: SlotId,
    pub color: ColorFilter,
}

/// Everything the supervisor knows about the cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemState {
    pub mode: Mode,
    pub inventory: Inventory,
    pub current_task: Option<SortTask>,
    /// Last-message-wins status line
    pub last_message: Option<Message>,
    /// Last time the operator link showed signs of life
    pub last_liveness_ms: Option<u64>,
    /// Arm is known to be at rest, so vision results are trustworthy
    pub parked: bool,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            mode: Mode::Idle,
            inventory: Inventory::empty(),
            current_task: None,
            last_message: None,
            last_liveness_ms: None,
            parked: false,
        }
    }
}

/// Inputs gathered by the runtime for one tick
pub struct TickInput<'a> {
    pub now_ms: u64,
    /// Completion report from the last worker, if one arrived
    pub report: Option<WorkerReport>,
    /// PLC occupancy image; `None` keeps the current view
    pub plc_slots: Option<Inventory>,
    /// Command batch delivered since the previous tick
    pub batch: Option<&'a [Result<Command, CommandError>]>,
    /// Latest vision frame
    pub detection: Option<&'a Detection>,
    /// Interlock, already sampled for this tick
    pub interlock: &'a Interlock,
}

/// Instruction to start a worker
#[derive(Debug)]
pub struct Dispatch<'l> {
    pub job: Job,
    /// Move into the worker; dropping it frees the arm
    pub lease: LeaseGuard<'l>,
    /// Start-permission filter state at dispatch time
    pub permission: DebouncedInput,
}

/// Result of one tick
#[derive(Debug)]
pub struct TickOutput<'l> {
    pub dispatch: Option<Dispatch<'l>>,
    pub events: Vec<Event, MAX_EVENTS>,
}

impl TickOutput<'_> {
    fn new() -> Self {
        Self {
            dispatch: None,
            events: Vec::new(),
        }
    }

    /// Record an event; when full, an arrival warning makes room
    fn emit(&mut self, event: Event) {
        if self.events.is_full() && !matches!(event, Event::ArrivalUnconfirmed { .. }) {
            let warning = self
                .events
                .iter()
                .position(|e| matches!(e, Event::ArrivalUnconfirmed { .. }));
            if let Some(index) = warning {
                self.events.remove(index);
            }
        }
        let _ = self.events.push(event);
    }
}

/// Supervisory state machine
pub struct Orchestrator<'l> {
    state: SystemState,
    config: SupervisorConfig,
    lease: &'l MotionLease,
    window: &'l GuardWindow,
    started_ms: u64,
    /// Job of the worker currently holding the lease
    active_job: Option<Job>,
}

impl<'l> Orchestrator<'l> {
    pub fn new(
        config: SupervisorConfig,
        lease: &'l MotionLease,
        window: &'l GuardWindow,
        now_ms: u64,
    ) -> Self {
        Self {
            state: SystemState::default(),
            config,
            lease,
            window,
            started_ms: now_ms,
            active_job: None,
        }
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn active_job(&self) -> Option<Job> {
        self.active_job
    }

    /// Run one supervisory step
    pub fn tick(&mut self, input: TickInput<'_>) -> TickOutput<'l> {
        let mut out = TickOutput::new();

        if let Some(report) = input.report {
            self.apply_report(report, &mut out);
        }

        if input.batch.is_some() {
            self.state.last_liveness_ms = Some(input.now_ms);
        }
        self.check_liveness(input.now_ms, &mut out);

        if let Some(slots) = input.plc_slots {
            self.state.inventory = slots;
        }

        if let Some(batch) = input.batch {
            for entry in batch {
                match entry {
                    Ok(command) => self.apply_command(command, input.interlock, &mut out),
                    Err(e) => self.reject(
                        Rejection::Invalid(*e),
                        format_args!("Invalid command: {}", e),
                        &mut out,
                    ),
                }
            }
        }

        self.check_interlock(input.interlock, &mut out);
        self.check_warehouse(&mut out);
        self.check_triggers(input.detection, input.interlock, &mut out);

        out
    }

    /// A dispatched worker never started; give the mode back
    pub fn dispatch_failed(&mut self, job: Job) -> Vec<Event, MAX_EVENTS> {
        let mut out = TickOutput::new();
        self.active_job = None;
        let trigger = if job == Job::Recover {
            Trigger::RecoverFailed
        } else {
            Trigger::DispatchFailed
        };
        self.apply(trigger, &mut out);
        self.say(format_args!("Worker failed to start."));
        out.events
    }

    fn say(&mut self, args: core::fmt::Arguments<'_>) {
        let mut message = Message::new();
        // Overlong messages are truncated at the first fragment that does not fit.
        let _ = message.write_fmt(args);
        self.state.last_message = Some(message);
    }

    fn reject(&mut self, rejection: Rejection, args: core::fmt::Arguments<'_>, out: &mut TickOutput<'l>) {
        out.emit(Event::CommandRejected(rejection));
        self.say(args);
    }

    /// Apply a trigger to the mode, recording the change
    ///
    /// A sort task only survives in `SortingTask` or while a buffer run is
    /// on its way back there.
    fn apply(&mut self, trigger: Trigger, out: &mut TickOutput<'l>) {
        let from = self.state.mode;
        let to = from.transition(trigger);
        if to != from {
            self.state.mode = to;
            out.emit(Event::ModeChanged { from, to });
        }
        if !matches!(to, Mode::SortingTask | Mode::Busy(Resume::SortingTask)) {
            self.state.current_task = None;
        }
    }

    /// Hand the arm to a worker if the lease is free
    fn dispatch(
        &mut self,
        job: Job,
        trigger: Trigger,
        interlock: &Interlock,
        out: &mut TickOutput<'l>,
    ) -> bool {
        if out.dispatch.is_some() {
            return false;
        }
        let lease: &'l MotionLease = self.lease;
        let Some(guard) = lease.try_acquire() else {
            return false;
        };

        self.state.parked = false;
        self.active_job = Some(job);
        self.apply(trigger, out);
        out.emit(Event::JobDispatched(job));
        out.dispatch = Some(Dispatch {
            job,
            lease: guard,
            permission: interlock.start_input(),
        });
        true
    }

    fn apply_report(&mut self, report: WorkerReport, out: &mut TickOutput<'l>) {
        let job = report.job;
        self.state.parked = report.parked;
        self.active_job = None;

        match report.outcome {
            JobOutcome::Completed(sequence) => {
                out.emit(Event::JobCompleted(job));
                let halted = self.state.mode == Mode::EmergencyStop;
                match job {
                    // The PLC image still wins on the next read
                    Job::Store { slot, .. } => {
                        self.state.inventory.set(slot, true);
                        if !halted {
                            self.say(format_args!("Item stored in Slot {}.", slot));
                        }
                    }
                    Job::Rehome => self.say(format_args!("Arm RESET.")),
                    Job::Recover => self.say(format_args!("Arm recovered. System idle.")),
                }
                self.apply(Trigger::WorkerDone, out);
                for warning in sequence.unconfirmed.iter() {
                    out.emit(Event::ArrivalUnconfirmed {
                        waypoint: warning.waypoint,
                        max_error: warning.max_error,
                    });
                }
            }
            JobOutcome::Faulted(error) => {
                out.emit(Event::JobFaulted { job, error });
                self.say(format_args!("Error: {}", error));
                let trigger = if job == Job::Recover {
                    Trigger::RecoverFailed
                } else {
                    Trigger::WorkerFault
                };
                self.apply(trigger, out);
            }
            JobOutcome::EmergencyStopped => {
                if self.state.mode != Mode::EmergencyStop {
                    out.emit(Event::EmergencyStop(StopCause::WorkerAbort));
                }
                self.apply(Trigger::WorkerEmergency, out);
                self.say(format_args!("EMERGENCY STOP. Hold RESET to recover."));
            }
        }
    }

    fn liveness_stale(&self, now_ms: u64) -> bool {
        match self.state.last_liveness_ms {
            Some(seen) => now_ms.saturating_sub(seen) > u64::from(self.config.liveness_window_ms),
            None => now_ms.saturating_sub(self.started_ms) > u64::from(self.config.startup_grace_ms),
        }
    }

    /// A recovery run is never paused; only its own report ends it
    fn check_liveness(&mut self, now_ms: u64, out: &mut TickOutput<'l>) {
        if self.active_job == Some(Job::Recover) {
            return;
        }
        if self.state.mode.is_active() && self.liveness_stale(now_ms) {
            out.emit(Event::LivenessLost);
            self.apply(Trigger::LivenessLost, out);
            self.say(format_args!("Connection lost. System paused."));
        }
    }

    fn apply_command(&mut self, command: &Command, interlock: &Interlock, out: &mut TickOutput<'l>) {
        match command {
            Command::Heartbeat => {}
            Command::ClearAll => {
                self.state.inventory.set_all(false);
                out.emit(Event::InventoryOverride);
            }
            Command::InventoryUpdate { target, occupied } => {
                match target {
                    SlotSelector::All => self.state.inventory.set_all(*occupied),
                    SlotSelector::Slot(slot) => self.state.inventory.set(*slot, *occupied),
                }
                out.emit(Event::InventoryOverride);
            }
            Command::Sort { slot, color } => self.accept_sort(*slot, color, out),
            Command::Start => self.accept_start(out),
            Command::Stop => self.accept_stop(out),
            Command::Reset => self.accept_reset(interlock, out),
        }
    }

    fn accept_sort(&mut self, slot: SlotId, color: &ColorFilter, out: &mut TickOutput<'l>) {
        match self.state.mode {
            Mode::Idle | Mode::SortingTask => {}
            Mode::EmergencyStop => {
                return self.reject(
                    Rejection::EmergencyActive,
                    format_args!("Emergency stop active. Hold RESET."),
                    out,
                )
            }
            other => {
                return self.reject(
                    Rejection::WrongMode(other),
                    format_args!("Sort rejected: system busy."),
                    out,
                )
            }
        }
        if self.state.inventory.is_occupied(slot) {
            return self.reject(
                Rejection::SlotOccupied(slot),
                format_args!("Slot {} is FULL.", slot),
                out,
            );
        }

        self.state.current_task = Some(SortTask {
            slot,
            color: color.clone(),
        });
        self.apply(Trigger::SortAccepted, out);
        self.say(format_args!("Sorting {} to Slot {}.", color.as_str(), slot));
    }

    fn accept_start(&mut self, out: &mut TickOutput<'l>) {
        match self.state.mode {
            Mode::Idle => {}
            Mode::EmergencyStop => {
                return self.reject(
                    Rejection::EmergencyActive,
                    format_args!("Emergency stop active. Hold RESET."),
                    out,
                )
            }
            other => {
                return self.reject(
                    Rejection::WrongMode(other),
                    format_args!("Start rejected: already running."),
                    out,
                )
            }
        }
        if self.state.inventory.is_full() {
            return self.reject(
                Rejection::WarehouseFull,
                format_args!("Warehouse FULL. Cannot start."),
                out,
            );
        }

        self.apply(Trigger::Start, out);
        self.say(format_args!("Auto-mode ON."));
    }

    fn accept_stop(&mut self, out: &mut TickOutput<'l>) {
        if self.state.mode == Mode::EmergencyStop || self.active_job == Some(Job::Recover) {
            return self.reject(
                Rejection::EmergencyActive,
                format_args!("Emergency stop active. Hold RESET."),
                out,
            );
        }
        self.apply(Trigger::Stop, out);
        self.say(format_args!("System STOPPED."));
    }

    fn accept_reset(&mut self, interlock: &Interlock, out: &mut TickOutput<'l>) {
        if self.state.mode == Mode::EmergencyStop {
            return self.reject(
                Rejection::EmergencyActive,
                format_args!("Hold RESET on the panel to recover."),
                out,
            );
        }
        if !interlock.start_permitted() {
            return self.reject(
                Rejection::NoPermission,
                format_args!("Reset rejected: no start permission."),
                out,
            );
        }
        if !self.dispatch(Job::Rehome, Trigger::DispatchRehome, interlock, out) {
            return self.reject(
                Rejection::ArmBusy,
                format_args!("Reset rejected: arm busy."),
                out,
            );
        }
        self.say(format_args!("Resetting arm..."));
    }

    fn check_interlock(&mut self, interlock: &Interlock, out: &mut TickOutput<'l>) {
        if self.window.is_active() && !interlock.start_permitted() && self.state.mode.is_busy() {
            out.emit(Event::EmergencyStop(StopCause::PermissionLost));
            self.apply(Trigger::PermissionLost, out);
            self.say(format_args!("EMERGENCY STOP. Start permission lost."));
        }

        if self.state.mode == Mode::EmergencyStop
            && interlock.reset_ready()
            && self.dispatch(Job::Recover, Trigger::DispatchRecover, interlock, out)
        {
            self.say(format_args!("Recovering arm..."));
        }
    }

    fn check_warehouse(&mut self, out: &mut TickOutput<'l>) {
        if self.state.mode == Mode::Auto && self.state.inventory.is_full() {
            out.emit(Event::WarehouseFull);
            self.apply(Trigger::WarehouseFull, out);
            self.say(format_args!("Warehouse FULL. Auto-stop."));
        }
    }

    fn check_triggers(
        &mut self,
        detection: Option<&Detection>,
        interlock: &Interlock,
        out: &mut TickOutput<'l>,
    ) {
        let mode = self.state.mode;
        if !matches!(mode, Mode::Auto | Mode::SortingTask) {
            return;
        }
        if !interlock.start_permitted() || self.lease.is_held() || out.dispatch.is_some() {
            return;
        }

        // Vision is only trusted from the rest pose.
        if !self.state.parked {
            self.dispatch(Job::Rehome, Trigger::DispatchRehome, interlock, out);
            return;
        }
        let Some(detection) = detection.filter(|d| d.detected) else {
            return;
        };

        if mode == Mode::Auto {
            if let Some(slot) = self.state.inventory.first_empty() {
                let job = Job::Store {
                    slot,
                    purpose: StorePurpose::Auto,
                };
                self.dispatch(job, Trigger::DispatchAuto, interlock, out);
            }
        } else {
            self.sort_trigger(detection, interlock, out);
        }
    }

    fn sort_trigger(&mut self, detection: &Detection, interlock: &Interlock, out: &mut TickOutput<'l>) {
        let Some(task) = self.state.current_task.clone() else {
            return;
        };

        if self.state.inventory.is_occupied(task.slot) {
            self.apply(Trigger::TargetOccupied, out);
            self.say(format_args!("Slot {} is FULL. Task cancelled.", task.slot));
            return;
        }

        if task.color.matches(&detection.color) {
            let job = Job::Store {
                slot: task.slot,
                purpose: StorePurpose::Target,
            };
            if self.dispatch(job, Trigger::DispatchTarget, interlock, out) {
                self.say(format_args!(
                    "Target match ({}). Sorting to Slot {}.",
                    detection.color, task.slot
                ));
            }
        } else if let Some(buffer) = self.state.inventory.buffer_slot(task.slot) {
            let job = Job::Store {
                slot: buffer,
                purpose: StorePurpose::Buffer,
            };
            if self.dispatch(job, Trigger::DispatchBuffer, interlock, out) {
                self.say(format_args!("Moving obstruction ({})...", detection.color));
            }
        } else {
            out.emit(Event::BufferUnavailable);
            self.apply(Trigger::BufferUnavailable, out);
            self.say(format_args!("Buffer full. Task aborted."));
        }
    }
}
