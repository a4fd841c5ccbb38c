//! Cross-thread communication
//!
//! Static channels between the supervisory loop, the motion worker and the
//! command reader, plus the arm-ownership flags both sides consult.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use sortbay_core::motion::WorkerReport;
use sortbay_core::safety::{GuardWindow, MotionLease};
use sortbay_protocol::Batch;

/// Completion reports; at most one worker is alive, so one slot suffices
const REPORT_CHANNEL_SIZE: usize = 2;

/// Pending command batches, one consumed per tick
const COMMAND_CHANNEL_SIZE: usize = 8;

/// Worker completion reports
pub static WORKER_REPORTS: Channel<CriticalSectionRawMutex, WorkerReport, REPORT_CHANNEL_SIZE> =
    Channel::new();

/// Decoded operator command batches
pub static COMMAND_BATCHES: Channel<CriticalSectionRawMutex, Batch, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Arm ownership; held by the running worker
pub static MOTION_LEASE: MotionLease = MotionLease::new();

/// Open while the worker runs a permission-guarded sequence
pub static GUARD_WINDOW: GuardWindow = GuardWindow::new();
