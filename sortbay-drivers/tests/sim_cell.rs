//! Job runner against the simulated cell, in real time

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use sortbay_core::config::{CellConfig, SpeedProfile};
use sortbay_core::inventory::{Inventory, SlotId};
use sortbay_core::motion::{run_job, Job, JobOutcome, MotionExecutor, StorePurpose};
use sortbay_core::safety::{DebouncedInput, GuardWindow};
use sortbay_core::traits::{ArmDriver, Clock, PlcLink, VisionSource};
use sortbay_drivers::sim::{JointSag, SimCell, SimConfig};

struct Sleep;

impl DelayNs for Sleep {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

struct Wall(Instant);

impl Clock for Wall {
    fn now_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

/// Cell timing scaled down so a full store takes well under a second
fn fast_config() -> CellConfig {
    let mut config = CellConfig::default();
    let motion = &mut config.motion;
    motion.fly = SpeedProfile {
        speed: 80,
        tolerance_deg: 6.0,
        timeout_ms: 1500,
    };
    motion.precision = SpeedProfile {
        speed: 50,
        tolerance_deg: 4.0,
        timeout_ms: 1500,
    };
    motion.settle_ms = 20;
    motion.poll_ms = 10;
    motion.guard_slice_ms = 5;
    motion.grip_dwell_ms = 20;
    motion.release_dwell_ms = 20;
    config
}

fn fast_sim() -> SimConfig {
    SimConfig {
        joint_rate_deg_s: 3000.0,
        start_revoke_ms: 200,
        ..SimConfig::default()
    }
}

fn permitted(config: &CellConfig) -> DebouncedInput {
    let mut input = DebouncedInput::new(config.interlock.start_hold_ms);
    input.update(true, 0);
    input.update(true, u64::from(config.interlock.start_hold_ms));
    input
}

fn store(slot: u8) -> Job {
    Job::Store {
        slot: SlotId::new(slot).unwrap(),
        purpose: StorePurpose::Auto,
    }
}

#[test]
fn test_store_lands_item_in_slot() {
    let config = fast_config();
    let cell = SimCell::new(&fast_sim(), &config);
    let window = GuardWindow::new();
    assert!(cell.vision().detect().unwrap().detected);

    let mut plc = cell.plc();
    let mut exec = MotionExecutor::new(
        cell.arm(),
        Sleep,
        Wall(Instant::now()),
        &config,
        &window,
        permitted(&config),
    );
    let report = run_job(&mut exec, &mut plc, store(2));

    assert!(matches!(report.outcome, JobOutcome::Completed(_)));
    assert!(report.parked);
    let slots = plc.read_slots().unwrap();
    assert!(slots.is_occupied(SlotId::new(2).unwrap()));
    assert!(!slots.is_occupied(SlotId::new(1).unwrap()));
    assert!(cell.pose().max_error(&config.poses.rest) <= 6.0);
}

#[test]
fn test_sagging_joint_settles_with_residual() {
    let config = fast_config();
    let sim = SimConfig {
        sag: Some(JointSag { joint: 1, deg: 5.0 }),
        ..fast_sim()
    };
    let cell = SimCell::new(&sim, &config);
    let window = GuardWindow::new();
    assert!(cell.vision().detect().unwrap().detected);

    let mut plc = cell.plc();
    let mut exec = MotionExecutor::new(
        cell.arm(),
        Sleep,
        Wall(Instant::now()),
        &config,
        &window,
        permitted(&config),
    );

    let report = run_job(&mut exec, &mut plc, store(5));
    match report.outcome {
        JobOutcome::Completed(sequence) => assert!(sequence.settled > 0),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(cell.inventory().is_occupied(SlotId::new(5).unwrap()));
}

#[test]
fn test_missing_permission_aborts_before_motion() {
    let config = fast_config();
    let cell = SimCell::new(&fast_sim(), &config);
    cell.set_start_line(false);
    let window = GuardWindow::new();
    let mut plc = cell.plc();
    let mut exec = MotionExecutor::new(
        cell.arm(),
        Sleep,
        Wall(Instant::now()),
        &config,
        &window,
        permitted(&config),
    );

    let report = run_job(&mut exec, &mut plc, store(1));
    assert_eq!(report.outcome, JobOutcome::EmergencyStopped);
    assert!(!report.parked);
    assert_eq!(cell.pose(), config.poses.rest);
    assert_eq!(cell.inventory(), Inventory::empty());
}

#[test]
fn test_dispense_pulse_drops_start_line() {
    let config = fast_config();
    let cell = SimCell::new(&fast_sim(), &config);
    let window = GuardWindow::new();
    let mut plc = cell.plc();
    let mut exec = MotionExecutor::new(
        cell.arm(),
        Sleep,
        Wall(Instant::now()),
        &config,
        &window,
        permitted(&config),
    );

    let report = run_job(&mut exec, &mut plc, Job::Rehome);
    assert!(report.parked);
    plc.pulse_dispense();

    let mut arm = cell.arm();
    assert!(!arm.digital_read(config.io.start_pin).unwrap());
    std::thread::sleep(Duration::from_millis(250));
    assert!(arm.digital_read(config.io.start_pin).unwrap());
}
