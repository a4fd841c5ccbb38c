//! Shared hardware handles
//!
//! The loop samples the interlock through the arm while a worker drives
//! it, so the arm and the PLC sit behind blocking mutexes. Each trait call
//! holds the lock only for that call.

use core::cell::RefCell;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;

use sortbay_core::inventory::Inventory;
use sortbay_core::motion::JointAngles;
use sortbay_core::traits::{ArmDriver, ArmError, Clock, PlcLink};
use sortbay_drivers::sim::{SimArm, SimCell, SimPlc};

/// A collaborator shared between threads
pub struct Shared<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<T>>,
}

impl<T> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<A: ArmDriver> ArmDriver for &Shared<A> {
    fn send_waypoint(&mut self, angles: &JointAngles, speed: u8) -> Result<(), ArmError> {
        self.with(|arm| arm.send_waypoint(angles, speed))
    }

    fn read_angles(&mut self) -> Result<JointAngles, ArmError> {
        self.with(|arm| arm.read_angles())
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool, ArmError> {
        self.with(|arm| arm.digital_read(pin))
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), ArmError> {
        self.with(|arm| arm.digital_write(pin, high))
    }

    fn hard_stop(&mut self) -> Result<(), ArmError> {
        self.with(|arm| arm.hard_stop())
    }
}

impl<P: PlcLink> PlcLink for &Shared<P> {
    fn read_slots(&mut self) -> Option<Inventory> {
        self.with(|plc| plc.read_slots())
    }

    fn pulse_dispense(&mut self) {
        self.with(|plc| plc.pulse_dispense())
    }
}

/// Arm and PLC as seen by the loop and the worker
pub struct Hardware {
    pub arm: Shared<SimArm>,
    pub plc: Shared<SimPlc>,
}

impl Hardware {
    pub fn new(cell: &SimCell) -> Self {
        Self {
            arm: Shared::new(cell.arm()),
            plc: Shared::new(cell.plc()),
        }
    }
}

/// Blocking delay that yields the worker thread
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Milliseconds since boot, shared by every thread
#[derive(Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortbay_core::config::CellConfig;
    use sortbay_drivers::sim::SimConfig;

    #[test]
    fn test_shared_arm_round_trip() {
        let config = CellConfig::default();
        let cell = SimCell::new(&SimConfig::default(), &config);
        let hardware = Hardware::new(&cell);

        let mut arm = &hardware.arm;
        assert!(arm.digital_read(config.io.start_pin).unwrap());
        assert_eq!(arm.read_angles().unwrap(), config.poses.rest);

        cell.set_start_line(false);
        assert!(!arm.digital_read(config.io.start_pin).unwrap());
    }

    #[test]
    fn test_shared_plc_reads_rack() {
        let cell = SimCell::new(&SimConfig::default(), &CellConfig::default());
        let hardware = Hardware::new(&cell);
        let mut plc = &hardware.plc;
        assert_eq!(plc.read_slots(), Some(Inventory::empty()));
    }
}
