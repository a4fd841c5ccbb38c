//! Motion worker
//!
//! One short-lived thread per dispatch. It owns the motion lease for its
//! whole life and releases it only after the report is queued, so the loop
//! never sees a free arm before it can see the outcome.

use std::thread;

use log::{error, info};

use sortbay_core::config::CellConfig;
use sortbay_core::motion::{run_job, MotionExecutor};
use sortbay_core::orchestrator::Dispatch;

use crate::channels::{GUARD_WINDOW, WORKER_REPORTS};
use crate::error::{Error, Result};
use crate::hardware::{EmbassyClock, Hardware, ThreadDelay};

/// Start a worker for `dispatch`
///
/// On failure the dispatch (and with it the lease) has already been
/// dropped.
pub fn spawn_worker(
    hardware: &'static Hardware,
    config: &'static CellConfig,
    dispatch: Dispatch<'static>,
) -> Result<()> {
    let Dispatch {
        job,
        lease,
        permission,
    } = dispatch;

    thread::Builder::new()
        .name("motion-worker".to_string())
        .spawn(move || {
            info!("worker: {:?} started", job);
            let mut exec = MotionExecutor::new(
                &hardware.arm,
                ThreadDelay,
                EmbassyClock,
                config,
                &GUARD_WINDOW,
                permission,
            );
            let mut plc = &hardware.plc;
            let report = run_job(&mut exec, &mut plc, job);
            info!("worker: {:?} finished, parked={}", job, report.parked);

            if WORKER_REPORTS.try_send(report).is_err() {
                error!("worker: report queue full, outcome lost");
            }
            drop(lease);
        })
        .map(|_| ())
        .map_err(|source| Error::Spawn {
            name: "motion-worker",
            source,
        })
}
