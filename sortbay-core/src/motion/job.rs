//! Worker jobs
//!
//! A job is everything one worker run does with the arm. The worker hands
//! back exactly one report when it finishes.

use embedded_hal::delay::DelayNs;

use crate::inventory::SlotId;
use crate::traits::{ArmDriver, ArmError, Clock, PlcLink};

use super::{MotionExecutor, SequenceError, SequenceReport};

/// Why an item is being stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorePurpose {
    /// Auto mode, first empty slot
    Auto,
    /// Targeted sort, matching item into the requested slot
    Target,
    /// Targeted sort, non-matching item moved out of the way
    Buffer,
}

/// Work a worker performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Job {
    /// Pick at the pickup point, place into `slot`, return to rest
    Store { slot: SlotId, purpose: StorePurpose },
    /// Operator-requested return to rest
    Rehome,
    /// Return to rest after an emergency stop
    Recover,
}

/// How a worker run ended
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobOutcome {
    /// Sequence finished; the report carries fail-open warnings
    Completed(SequenceReport),
    /// Permission lost mid-motion; the arm is held where it stopped
    EmergencyStopped,
    /// Arm communication failed
    Faulted(ArmError),
}

/// Message from a finished worker to the orchestrator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WorkerReport {
    pub job: Job,
    pub outcome: JobOutcome,
    /// The closing return to rest completed
    pub parked: bool,
}

/// Execute `job` to completion on the calling thread
pub fn run_job<A, D, C, P>(
    exec: &mut MotionExecutor<'_, A, D, C>,
    plc: &mut P,
    job: Job,
) -> WorkerReport
where
    A: ArmDriver,
    D: DelayNs,
    C: Clock,
    P: PlcLink,
{
    match job {
        Job::Store { slot, .. } => store(exec, plc, job, slot),
        Job::Rehome | Job::Recover => match exec.go_rest() {
            Ok(report) => WorkerReport {
                job,
                outcome: JobOutcome::Completed(report),
                parked: true,
            },
            Err(e) => WorkerReport {
                job,
                outcome: failed(e),
                parked: false,
            },
        },
    }
}

fn failed(e: SequenceError) -> JobOutcome {
    match e {
        SequenceError::EmergencyStopped => JobOutcome::EmergencyStopped,
        SequenceError::Fault(e) => JobOutcome::Faulted(e),
    }
}

fn pick_and_place<A, D, C>(
    exec: &mut MotionExecutor<'_, A, D, C>,
    slot: SlotId,
) -> Result<SequenceReport, SequenceError>
where
    A: ArmDriver,
    D: DelayNs,
    C: Clock,
{
    let mut report = exec.pick()?;
    report.absorb(exec.place(slot)?);
    Ok(report)
}

fn store<A, D, C, P>(
    exec: &mut MotionExecutor<'_, A, D, C>,
    plc: &mut P,
    job: Job,
    slot: SlotId,
) -> WorkerReport
where
    A: ArmDriver,
    D: DelayNs,
    C: Clock,
    P: PlcLink,
{
    exec.begin_guarded();
    let placed = pick_and_place(exec, slot);
    exec.end_guarded();

    match placed {
        Ok(mut report) => {
            plc.pulse_dispense();
            let parked = match exec.go_rest() {
                Ok(rest) => {
                    report.absorb(rest);
                    true
                }
                Err(_) => false,
            };
            WorkerReport {
                job,
                outcome: JobOutcome::Completed(report),
                parked,
            }
        }
        Err(SequenceError::EmergencyStopped) => WorkerReport {
            job,
            outcome: JobOutcome::EmergencyStopped,
            parked: false,
        },
        Err(SequenceError::Fault(e)) => {
            let parked = exec.go_rest().is_ok();
            WorkerReport {
                job,
                outcome: JobOutcome::Faulted(e),
                parked,
            }
        }
    }
}
