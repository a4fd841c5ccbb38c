//! Supervisory loop
//!
//! Fixed-cadence tick driving the orchestrator:
//! - Samples the permission lines through the arm
//! - Collects the worker report, PLC image, one command batch and a
//!   vision frame
//! - Starts a worker when the orchestrator dispatches
//! - Logs events and prints a status line whenever it changes

use embassy_time::{Duration, Ticker};
use log::{debug, error, info, warn};

use sortbay_core::orchestrator::{Event, Orchestrator, TickInput};
use sortbay_core::safety::Interlock;
use sortbay_core::traits::{Clock, PlcLink, VisionSource};
use sortbay_drivers::sim::SimVision;
use sortbay_protocol::StatusSnapshot;

use crate::channels::{COMMAND_BATCHES, GUARD_WINDOW, MOTION_LEASE, WORKER_REPORTS};
use crate::config::AppConfig;
use crate::hardware::{EmbassyClock, Hardware};

use super::spawn_worker;

/// Log one orchestrator event at its severity
pub fn log_event(event: &Event) {
    match event {
        Event::ModeChanged { from, to } => info!("mode: {} -> {}", from.label(), to.label()),
        Event::JobDispatched(job) => info!("dispatch: {:?}", job),
        Event::JobCompleted(job) => info!("completed: {:?}", job),
        Event::JobFaulted { job, error } => error!("fault during {:?}: {}", job, error),
        Event::ArrivalUnconfirmed {
            waypoint,
            max_error,
        } => match max_error {
            Some(e) => warn!("arrival at {:?} unconfirmed, error {:.1} deg", waypoint, e),
            None => warn!("arrival at {:?} unconfirmed, pose unreadable", waypoint),
        },
        Event::EmergencyStop(cause) => error!("EMERGENCY STOP: {:?}", cause),
        Event::CommandRejected(rejection) => warn!("command rejected: {:?}", rejection),
        Event::InventoryOverride => info!("inventory overridden by operator"),
        Event::LivenessLost => warn!("operator link lost"),
        Event::WarehouseFull => warn!("warehouse full"),
        Event::BufferUnavailable => warn!("no buffer slot available"),
    }
}

/// Run the supervisory loop forever
pub async fn supervise(app: &'static AppConfig, hardware: &'static Hardware, mut vision: SimVision) {
    let config = &app.cell;
    let clock = EmbassyClock;
    let mut interlock = Interlock::new(&config.interlock, &config.io);
    let mut orchestrator =
        Orchestrator::new(config.supervisor, &MOTION_LEASE, &GUARD_WINDOW, clock.now_ms());
    let mut last_status: Option<StatusSnapshot> = None;

    info!(
        "Supervisor running: tick {} ms, liveness window {} ms",
        config.supervisor.tick_ms, config.supervisor.liveness_window_ms
    );

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(config.supervisor.tick_ms)));
    loop {
        ticker.next().await;
        let now = clock.now_ms();

        let mut arm = &hardware.arm;
        interlock.sample_arm(&mut arm, now);

        let report = WORKER_REPORTS.try_receive().ok();
        let mut plc = &hardware.plc;
        let plc_slots = plc.read_slots();
        let batch = COMMAND_BATCHES.try_receive().ok();
        let detection = vision.detect();

        let out = orchestrator.tick(TickInput {
            now_ms: now,
            report,
            plc_slots,
            batch: batch.as_deref(),
            detection: detection.as_ref(),
            interlock: &interlock,
        });
        out.events.iter().for_each(log_event);

        if let Some(dispatch) = out.dispatch {
            let job = dispatch.job;
            if let Err(e) = spawn_worker(hardware, config, dispatch) {
                error!("{}", e);
                orchestrator.dispatch_failed(job).iter().for_each(log_event);
            }
        }

        let status = StatusSnapshot::from(orchestrator.state());
        if last_status.as_ref() != Some(&status) {
            debug!("status changed");
            println!("{}", status.to_json_line());
            last_status = Some(status);
        }
    }
}
