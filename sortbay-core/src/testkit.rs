//! Deterministic fakes for exercising the executor and orchestrator
//!
//! Time only advances when the fake delay sleeps, so every wait in a test
//! is exact and instantaneous.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::inventory::Inventory;
use crate::motion::JointAngles;
use crate::safety::GuardWindow;
use crate::traits::{ArmDriver, ArmError, Clock, PlcLink};

/// Shared fake time in nanoseconds
#[derive(Clone, Default)]
pub struct FakeClock(Rc<RefCell<u64>>);

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        *self.0.borrow() / 1_000_000
    }

    pub fn advance_ns(&self, ns: u64) {
        *self.0.borrow_mut() += ns;
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now()
    }
}

/// Delay that advances the fake clock instead of sleeping
pub struct FakeDelay(FakeClock);

impl FakeDelay {
    pub fn new(clock: &FakeClock) -> Self {
        Self(clock.clone())
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance_ns(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.advance_ns(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance_ns(u64::from(ms) * 1_000_000);
    }
}

struct ArmState {
    pose: JointAngles,
    /// Error left on joint 0 after every move
    offset: f32,
    start_low: Vec<(u64, u64)>,
    fail_reads: bool,
    fail_sends: bool,
    sent: Vec<(JointAngles, u8)>,
    writes: Vec<(u8, bool)>,
    hard_stops: u32,
}

/// Arm that reaches each target (plus a configurable error) immediately
#[derive(Clone)]
pub struct FakeArm {
    clock: FakeClock,
    state: Rc<RefCell<ArmState>>,
}

impl FakeArm {
    pub fn new(clock: &FakeClock, pose: JointAngles) -> Self {
        Self {
            clock: clock.clone(),
            state: Rc::new(RefCell::new(ArmState {
                pose,
                offset: 0.0,
                start_low: Vec::new(),
                fail_reads: false,
                fail_sends: false,
                sent: Vec::new(),
                writes: Vec::new(),
                hard_stops: 0,
            })),
        }
    }

    pub fn set_offset(&self, offset: f32) {
        self.state.borrow_mut().offset = offset;
    }

    /// Start-permission reads low in `[from_ms, to_ms)`
    pub fn drop_start_between(&self, from_ms: u64, to_ms: u64) {
        self.state.borrow_mut().start_low.push((from_ms, to_ms));
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state.borrow_mut().fail_sends = fail;
    }

    pub fn pose(&self) -> JointAngles {
        self.state.borrow().pose
    }

    pub fn sent(&self) -> Vec<(JointAngles, u8)> {
        self.state.borrow().sent.clone()
    }

    pub fn gripper_writes(&self) -> Vec<(u8, bool)> {
        self.state.borrow().writes.clone()
    }

    pub fn hard_stops(&self) -> u32 {
        self.state.borrow().hard_stops
    }

    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.sent.clear();
        state.writes.clear();
    }
}

impl ArmDriver for FakeArm {
    fn send_waypoint(&mut self, angles: &JointAngles, speed: u8) -> Result<(), ArmError> {
        let mut state = self.state.borrow_mut();
        if state.fail_sends {
            return Err(ArmError::CommunicationTimeout);
        }
        state.sent.push((*angles, speed));
        let mut pose = *angles;
        pose.0[0] += state.offset;
        state.pose = pose;
        Ok(())
    }

    fn read_angles(&mut self) -> Result<JointAngles, ArmError> {
        let state = self.state.borrow();
        if state.fail_reads {
            Err(ArmError::InvalidReading)
        } else {
            Ok(state.pose)
        }
    }

    fn digital_read(&mut self, _pin: u8) -> Result<bool, ArmError> {
        let now = self.clock.now();
        let state = self.state.borrow();
        Ok(!state
            .start_low
            .iter()
            .any(|&(from, to)| now >= from && now < to))
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), ArmError> {
        self.state.borrow_mut().writes.push((pin, high));
        Ok(())
    }

    fn hard_stop(&mut self) -> Result<(), ArmError> {
        self.state.borrow_mut().hard_stops += 1;
        Ok(())
    }
}

/// PLC that records whether the guard window was open at each pulse
pub struct FakePlc<'w> {
    window: &'w GuardWindow,
    pub slots: Option<Inventory>,
    pub pulses: Vec<bool>,
}

impl<'w> FakePlc<'w> {
    pub fn new(window: &'w GuardWindow) -> Self {
        Self {
            window,
            slots: None,
            pulses: Vec::new(),
        }
    }
}

impl PlcLink for FakePlc<'_> {
    fn read_slots(&mut self) -> Option<Inventory> {
        self.slots
    }

    fn pulse_dispense(&mut self) {
        self.pulses.push(self.window.is_active());
    }
}
