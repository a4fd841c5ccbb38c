//! Simulated cell
//!
//! A kinematic stand-in for the arm, the PLC and the camera. All three
//! share one [`World`] behind a mutex, so the arm dropping an item into a
//! slot shows up in the PLC image and the feeder refilling the pickup point
//! shows up on camera.
//!
//! The arm moves every joint toward its target at a fixed rate scaled by
//! the commanded speed. An optional sag keeps one joint short of every
//! target, which exercises the executor's stall fallback. After each
//! dispense pulse the PLC drops start-permission for a while, like a real
//! feeder cycling its guard.

pub mod arm;
pub mod plc;
pub mod vision;

pub use arm::SimArm;
pub use plc::SimPlc;
pub use vision::SimVision;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use sortbay_core::config::{CellConfig, IoMap};
use sortbay_core::inventory::{Inventory, SlotId, SLOT_COUNT};
use sortbay_core::motion::{JointAngles, JOINTS};

use crate::plc::{decode_slot_image, encode_slot_image, set_slot_bit, SlotImage};

/// Joint that never quite reaches its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSag {
    /// Joint index, 0-based
    pub joint: usize,
    /// Shortfall in degrees
    pub deg: f32,
}

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Joint speed at commanded speed 100
    pub joint_rate_deg_s: f32,
    pub sag: Option<JointSag>,
    /// Delay before the feeder puts the next item at the pickup point
    pub feed_interval_ms: u64,
    /// How long start-permission stays low after a dispense pulse
    pub start_revoke_ms: u64,
    /// Distance at which the gripper counts as at the grab or a slot
    pub reach_deg: f32,
    /// Item colors, fed in rotation
    pub colors: Vec<String>,
    /// Rack occupancy at power-up
    pub initial_slots: [bool; SLOT_COUNT],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            joint_rate_deg_s: 180.0,
            sag: None,
            feed_interval_ms: 2000,
            start_revoke_ms: 1200,
            reach_deg: 8.0,
            colors: ["red", "blue", "yellow", "silver"]
                .into_iter()
                .map(String::from)
                .collect(),
            initial_slots: [false; SLOT_COUNT],
        }
    }
}

/// Shared simulation state
pub struct World {
    rate_deg_s: f32,
    sag: Option<JointSag>,
    feed_interval: Duration,
    start_revoke: Duration,
    reach_deg: f32,
    colors: Vec<String>,
    next_color: usize,

    io: IoMap,
    grab: JointAngles,
    slot_lows: [JointAngles; SLOT_COUNT],

    from: JointAngles,
    target: JointAngles,
    speed: u8,
    moved_at: Instant,

    gripper_closed: bool,
    held: Option<String>,
    at_pickup: Option<String>,
    feed_at: Option<Instant>,
    image: SlotImage,

    start_line: bool,
    reset_line: bool,
    start_revoked_until: Option<Instant>,
}

impl World {
    fn new(sim: &SimConfig, cell: &CellConfig, now: Instant) -> Self {
        let mut slot_lows = [JointAngles::ZERO; SLOT_COUNT];
        for slot in SlotId::all() {
            slot_lows[slot.index()] = cell.layout.waypoints(slot).low;
        }

        Self {
            rate_deg_s: sim.joint_rate_deg_s,
            sag: sim.sag,
            feed_interval: Duration::from_millis(sim.feed_interval_ms),
            start_revoke: Duration::from_millis(sim.start_revoke_ms),
            reach_deg: sim.reach_deg,
            colors: sim.colors.clone(),
            next_color: 0,
            io: cell.io,
            grab: cell.poses.grab,
            slot_lows,
            from: cell.poses.rest,
            target: cell.poses.rest,
            speed: 100,
            moved_at: now,
            gripper_closed: false,
            held: None,
            at_pickup: None,
            feed_at: Some(now),
            image: encode_slot_image(&Inventory::from_array(sim.initial_slots)),
            start_line: true,
            reset_line: false,
            start_revoked_until: None,
        }
    }

    /// Arm pose at `now`
    pub fn pose(&self, now: Instant) -> JointAngles {
        let elapsed = now.saturating_duration_since(self.moved_at).as_secs_f32();
        let travel = self.rate_deg_s * f32::from(self.speed) / 100.0 * elapsed;

        let mut pose = self.from;
        for i in 0..JOINTS {
            let delta = self.target.0[i] - self.from.0[i];
            pose.0[i] += delta.clamp(-travel, travel);
        }
        pose
    }

    fn command_move(&mut self, target: &JointAngles, speed: u8, now: Instant) {
        self.from = self.pose(now);
        self.target = *target;
        if let Some(sag) = self.sag.filter(|s| s.joint < JOINTS) {
            self.target.0[sag.joint] -= sag.deg;
        }
        self.speed = speed.clamp(1, 100);
        self.moved_at = now;
    }

    fn halt(&mut self, now: Instant) {
        self.from = self.pose(now);
        self.target = self.from;
        self.moved_at = now;
    }

    fn set_gripper(&mut self, closed: bool, now: Instant) {
        if closed == self.gripper_closed {
            return;
        }
        self.gripper_closed = closed;
        let pose = self.pose(now);

        if closed {
            if self.held.is_none() && pose.max_error(&self.grab) <= self.reach_deg {
                if let Some(item) = self.at_pickup.take() {
                    info!("sim: picked {} item", item);
                    self.held = Some(item);
                    self.feed_at = Some(now + self.feed_interval);
                }
            }
            return;
        }

        let Some(item) = self.held.take() else {
            return;
        };
        let target = SlotId::all().find(|slot| {
            pose.max_error(&self.slot_lows[slot.index()]) <= self.reach_deg
        });
        match target {
            Some(slot) => {
                info!("sim: {} item landed in slot {}", item, slot);
                set_slot_bit(&mut self.image, slot, true);
            }
            None => warn!("sim: {} item dropped outside the rack", item),
        }
    }

    fn start_level(&self, now: Instant) -> bool {
        let revoked = self.start_revoked_until.is_some_and(|until| now < until);
        self.start_line && !revoked
    }

    fn digital_read(&self, pin: u8, now: Instant) -> bool {
        if pin == self.io.start_pin {
            self.start_level(now)
        } else if pin == self.io.reset_pin {
            self.reset_line
        } else {
            false
        }
    }

    fn pulse_dispense(&mut self, now: Instant) {
        self.start_revoked_until = Some(now + self.start_revoke);
    }

    /// Put the next item at the pickup point once the feeder is due
    fn run_feeder(&mut self, now: Instant) {
        if self.at_pickup.is_some() || self.colors.is_empty() {
            return;
        }
        if self.feed_at.is_some_and(|due| now >= due) {
            let color = self.colors[self.next_color % self.colors.len()].clone();
            self.next_color = self.next_color.wrapping_add(1);
            self.at_pickup = Some(color);
            self.feed_at = None;
        }
    }

    pub fn inventory(&self) -> Inventory {
        decode_slot_image(&self.image)
    }

    pub fn item_at_pickup(&self) -> Option<&str> {
        self.at_pickup.as_deref()
    }

    pub fn held_item(&self) -> Option<&str> {
        self.held.as_deref()
    }
}

/// Handle to a simulated cell
#[derive(Clone)]
pub struct SimCell {
    world: Arc<Mutex<World>>,
}

impl SimCell {
    pub fn new(sim: &SimConfig, cell: &CellConfig) -> Self {
        Self {
            world: Arc::new(Mutex::new(World::new(sim, cell, Instant::now()))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the world at the current instant
    pub fn with<R>(&self, f: impl FnOnce(&mut World, Instant) -> R) -> R {
        let mut world = self.lock();
        f(&mut world, Instant::now())
    }

    pub fn arm(&self) -> SimArm {
        SimArm::new(self.clone())
    }

    pub fn plc(&self) -> SimPlc {
        SimPlc::new(self.clone())
    }

    pub fn vision(&self) -> SimVision {
        SimVision::new(self.clone())
    }

    /// Operator panel: start-permission line
    pub fn set_start_line(&self, high: bool) {
        self.lock().start_line = high;
    }

    /// Operator panel: reset line
    pub fn set_reset_line(&self, high: bool) {
        self.lock().reset_line = high;
    }

    /// Unload one slot, as an operator emptying the rack would
    pub fn unload(&self, slot: SlotId) {
        set_slot_bit(&mut self.lock().image, slot, false);
    }

    pub fn inventory(&self) -> Inventory {
        self.lock().inventory()
    }

    pub fn pose(&self) -> JointAngles {
        self.with(|world, now| world.pose(now))
    }
}
