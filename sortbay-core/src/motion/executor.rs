//! Closed-loop waypoint executor
//!
//! Issues joint-space moves and blocks until the arm arrives, settles with
//! an acceptable residual error, or the wait times out. Timeouts are
//! fail-open: the sequence continues and the arrival is reported as
//! unconfirmed.
//!
//! While the guard window is open every wait is cut into short slices and
//! start-permission is re-sampled before each one. Losing permission stops
//! the arm where it is and aborts the sequence.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::config::CellConfig;
use crate::inventory::SlotId;
use crate::safety::{read_level, ArmPin, DebouncedInput, GuardWindow};
use crate::traits::{ArmDriver, ArmError, Clock};

use super::JointAngles;

/// Maximum unconfirmed arrivals kept per sequence report
///
/// A store run makes at most 11 moves (pick 4, place 5, rest 2), so every
/// timeout of a job fits.
pub const MAX_UNCONFIRMED: usize = 16;

/// Speed class of a move; selects speed, tolerance and timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedClass {
    /// Transit between safe waypoints, loose tolerance
    Fly,
    /// Final approach to grab or release, tight tolerance
    Precision,
}

/// Named waypoint of the fixed sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waypoint {
    Rest,
    PickMid,
    Grab,
    SlotHigh(SlotId),
    SlotMid(SlotId),
    SlotLow(SlotId),
}

/// Result of a single move
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionOutcome {
    /// Max per-joint error within tolerance
    Arrived,
    /// Arm stopped moving short of the target, within the residual tolerance
    SettledWithResidualError { max_error: f32 },
    /// Neither condition met in time; `None` if no pose could be read
    TimedOut { max_error: Option<f32> },
    /// Start-permission lost inside the guard window
    EmergencyStopped,
}

impl MotionOutcome {
    /// Only an emergency stop ends the enclosing sequence
    pub fn is_fatal(&self) -> bool {
        matches!(self, MotionOutcome::EmergencyStopped)
    }
}

/// Why a sequence did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceError {
    EmergencyStopped,
    Fault(ArmError),
}

impl From<ArmError> for SequenceError {
    fn from(e: ArmError) -> Self {
        SequenceError::Fault(e)
    }
}

/// Arrival that timed out and was passed through
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnconfirmedArrival {
    pub waypoint: Waypoint,
    pub max_error: Option<f32>,
}

/// Warnings collected while running a sequence
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceReport {
    /// Moves accepted by the stall fallback
    pub settled: u8,
    /// Moves that timed out
    pub unconfirmed: Vec<UnconfirmedArrival, MAX_UNCONFIRMED>,
}

impl SequenceReport {
    /// Fold another report into this one
    pub fn absorb(&mut self, other: SequenceReport) {
        self.settled = self.settled.saturating_add(other.settled);
        for warning in other.unconfirmed {
            let _ = self.unconfirmed.push(warning);
        }
    }

    /// No move needed a fallback
    pub fn is_clean(&self) -> bool {
        self.settled == 0 && self.unconfirmed.is_empty()
    }
}

/// Drives one arm through waypoints on behalf of a single worker
pub struct MotionExecutor<'w, A, D, C> {
    arm: A,
    delay: D,
    clock: C,
    config: &'w CellConfig,
    window: &'w GuardWindow,
    /// Start-permission filter, seeded from the supervisor's snapshot
    permission: DebouncedInput,
    /// Set while running `go_rest`, which never trips the guard
    exempt: bool,
}

impl<'w, A, D, C> MotionExecutor<'w, A, D, C>
where
    A: ArmDriver,
    D: DelayNs,
    C: Clock,
{
    pub fn new(
        arm: A,
        delay: D,
        clock: C,
        config: &'w CellConfig,
        window: &'w GuardWindow,
        permission: DebouncedInput,
    ) -> Self {
        Self {
            arm,
            delay,
            clock,
            config,
            window,
            permission,
            exempt: false,
        }
    }

    /// Open the guard window; permission loss is fatal from here on
    pub fn begin_guarded(&mut self) {
        self.window.open();
    }

    /// Close the guard window
    pub fn end_guarded(&mut self) {
        self.window.close();
    }

    pub fn config(&self) -> &CellConfig {
        self.config
    }

    /// Re-sample start-permission if the guard applies
    fn permitted(&mut self) -> bool {
        if self.exempt || !self.window.is_active() {
            return true;
        }
        let raw = read_level(&mut ArmPin::new(&mut self.arm, self.config.io.start_pin));
        self.permission.update(raw, self.clock.now_ms())
    }

    fn halt(&mut self) {
        // The stop command is best effort; the abort stands either way.
        let _ = self.arm.hard_stop();
    }

    /// Sleep for `ms`, re-checking permission before every slice
    ///
    /// Returns `false` (after halting the arm) if permission was lost.
    fn guarded_wait(&mut self, ms: u32) -> bool {
        let slice = self.config.motion.guard_slice_ms.max(1);
        let mut remaining = ms;
        while remaining > 0 {
            if !self.permitted() {
                self.halt();
                return false;
            }
            let step = remaining.min(slice);
            self.delay.delay_ms(step);
            remaining -= step;
        }
        if !self.permitted() {
            self.halt();
            return false;
        }
        true
    }

    /// Move to `target` and wait for arrival under the class's tolerance
    pub fn move_to(
        &mut self,
        target: &JointAngles,
        class: SpeedClass,
    ) -> Result<MotionOutcome, ArmError> {
        let motion = &self.config.motion;
        let profile = *motion.profile(class);
        let settle_ms = motion.settle_ms;
        let poll_ms = motion.poll_ms;
        let stall_epsilon = motion.stall_epsilon_deg;
        let stall_polls = motion.stall_polls;
        let residual = motion.residual_tolerance_deg;

        if !self.permitted() {
            self.halt();
            return Ok(MotionOutcome::EmergencyStopped);
        }
        self.arm.send_waypoint(target, profile.speed)?;

        if !self.guarded_wait(settle_ms) {
            return Ok(MotionOutcome::EmergencyStopped);
        }

        let started = self.clock.now_ms();
        let mut last_error = None;
        let mut previous: Option<JointAngles> = None;
        let mut still_polls: u8 = 0;

        loop {
            if let Ok(current) = self.arm.read_angles() {
                let error = current.max_error(target);
                last_error = Some(error);

                if error <= profile.tolerance_deg {
                    return Ok(MotionOutcome::Arrived);
                }

                if let Some(prev) = previous {
                    if current.max_error(&prev) < stall_epsilon {
                        still_polls = still_polls.saturating_add(1);
                    } else {
                        still_polls = 0;
                    }
                    if still_polls >= stall_polls && error <= residual {
                        return Ok(MotionOutcome::SettledWithResidualError { max_error: error });
                    }
                }
                previous = Some(current);
            }

            if self.clock.now_ms().saturating_sub(started) >= u64::from(profile.timeout_ms) {
                return Ok(MotionOutcome::TimedOut {
                    max_error: last_error,
                });
            }

            if !self.guarded_wait(poll_ms) {
                return Ok(MotionOutcome::EmergencyStopped);
            }
        }
    }

    fn resolve(&self, waypoint: Waypoint) -> Option<JointAngles> {
        let poses = &self.config.poses;
        let layout = &self.config.layout;
        match waypoint {
            Waypoint::Rest => Some(poses.rest),
            Waypoint::PickMid => poses.pick_mid,
            Waypoint::Grab => Some(poses.grab),
            Waypoint::SlotHigh(slot) => Some(layout.waypoints(slot).high),
            Waypoint::SlotMid(slot) => layout.waypoints(slot).mid,
            Waypoint::SlotLow(slot) => Some(layout.waypoints(slot).low),
        }
    }

    /// Move to a named waypoint; optional waypoints that are not configured
    /// are skipped
    fn step(
        &mut self,
        waypoint: Waypoint,
        class: SpeedClass,
        report: &mut SequenceReport,
    ) -> Result<(), SequenceError> {
        let Some(target) = self.resolve(waypoint) else {
            return Ok(());
        };
        match self.move_to(&target, class)? {
            MotionOutcome::Arrived => {}
            MotionOutcome::SettledWithResidualError { .. } => {
                report.settled = report.settled.saturating_add(1);
            }
            MotionOutcome::TimedOut { max_error } => {
                let _ = report.unconfirmed.push(UnconfirmedArrival {
                    waypoint,
                    max_error,
                });
            }
            MotionOutcome::EmergencyStopped => return Err(SequenceError::EmergencyStopped),
        }
        Ok(())
    }

    fn set_gripper(&mut self, closed: bool) -> Result<(), SequenceError> {
        self.arm.digital_write(self.config.io.gripper_pin, closed)?;
        Ok(())
    }

    fn dwell(&mut self, ms: u32) -> Result<(), SequenceError> {
        if self.guarded_wait(ms) {
            Ok(())
        } else {
            Err(SequenceError::EmergencyStopped)
        }
    }

    /// Take the item from the pickup point and lift it back to rest
    pub fn pick(&mut self) -> Result<SequenceReport, SequenceError> {
        let mut report = SequenceReport::default();
        let grip_dwell = self.config.motion.grip_dwell_ms;

        self.set_gripper(false)?;
        self.step(Waypoint::PickMid, SpeedClass::Fly, &mut report)?;
        self.step(Waypoint::Grab, SpeedClass::Precision, &mut report)?;
        self.set_gripper(true)?;
        self.dwell(grip_dwell)?;
        self.step(Waypoint::PickMid, SpeedClass::Fly, &mut report)?;
        self.step(Waypoint::Rest, SpeedClass::Fly, &mut report)?;

        Ok(report)
    }

    /// Lower the held item into `slot`, release it and lift clear
    pub fn place(&mut self, slot: SlotId) -> Result<SequenceReport, SequenceError> {
        let mut report = SequenceReport::default();
        let release_dwell = self.config.motion.release_dwell_ms;

        self.step(Waypoint::SlotHigh(slot), SpeedClass::Fly, &mut report)?;
        self.step(Waypoint::SlotMid(slot), SpeedClass::Fly, &mut report)?;
        self.step(Waypoint::SlotLow(slot), SpeedClass::Precision, &mut report)?;
        self.set_gripper(false)?;
        self.dwell(release_dwell)?;
        self.step(Waypoint::SlotMid(slot), SpeedClass::Fly, &mut report)?;
        self.step(Waypoint::SlotHigh(slot), SpeedClass::Fly, &mut report)?;

        Ok(report)
    }

    /// Slot whose high waypoint is strictly closer than rest, if any
    fn rest_detour(&self, current: &JointAngles) -> Option<SlotId> {
        let mut best = current.distance_sq(&self.config.poses.rest);
        let mut detour = None;
        for slot in SlotId::all() {
            let high = self.config.layout.waypoints(slot).high;
            if high.is_zero() {
                continue;
            }
            let dist = current.distance_sq(&high);
            if dist < best {
                best = dist;
                detour = Some(slot);
            }
        }
        detour
    }

    /// Return to the rest pose, backing out through the nearest slot's high
    /// waypoint when that is closer than rest itself
    ///
    /// Never trips the guard.
    pub fn go_rest(&mut self) -> Result<SequenceReport, SequenceError> {
        self.exempt = true;
        let result = self.go_rest_inner();
        self.exempt = false;
        result
    }

    fn go_rest_inner(&mut self) -> Result<SequenceReport, SequenceError> {
        let mut report = SequenceReport::default();

        let detour = match self.arm.read_angles() {
            Ok(current) => self.rest_detour(&current),
            Err(_) => None,
        };
        if let Some(slot) = detour {
            self.step(Waypoint::SlotHigh(slot), SpeedClass::Fly, &mut report)?;
        }
        self.step(Waypoint::Rest, SpeedClass::Fly, &mut report)?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FakeArm, FakeClock, FakeDelay};

    fn executor<'w>(
        arm: &FakeArm,
        clock: &FakeClock,
        config: &'w CellConfig,
        window: &'w GuardWindow,
    ) -> MotionExecutor<'w, FakeArm, FakeDelay, FakeClock> {
        let mut permission = DebouncedInput::new(config.interlock.start_hold_ms);
        permission.update(true, 0);
        permission.update(true, u64::from(config.interlock.start_hold_ms));
        MotionExecutor::new(
            arm.clone(),
            FakeDelay::new(clock),
            clock.clone(),
            config,
            window,
            permission,
        )
    }

    #[test]
    fn test_arrival_within_tolerance() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        arm.set_offset(3.0);
        let mut exec = executor(&arm, &clock, &config, &window);

        let outcome = exec.move_to(&config.poses.grab, SpeedClass::Precision);
        assert_eq!(outcome, Ok(MotionOutcome::Arrived));
        assert_eq!(clock.now(), u64::from(config.motion.settle_ms));
        assert_eq!(arm.sent(), std::vec![(config.poses.grab, 50)]);
    }

    #[test]
    fn test_stall_fallback_accepts_residual_error() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        arm.set_offset(7.0);
        let mut exec = executor(&arm, &clock, &config, &window);

        let outcome = exec.move_to(&config.poses.grab, SpeedClass::Precision);
        assert_eq!(
            outcome,
            Ok(MotionOutcome::SettledWithResidualError { max_error: 7.0 })
        );
        // one reference read plus three still polls
        let expected = u64::from(config.motion.settle_ms) + 3 * u64::from(config.motion.poll_ms);
        assert_eq!(clock.now(), expected);
    }

    #[test]
    fn test_timeout_is_fail_open() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        arm.set_offset(20.0);
        let mut exec = executor(&arm, &clock, &config, &window);

        let outcome = exec.move_to(&config.poses.grab, SpeedClass::Fly);
        assert_eq!(
            outcome,
            Ok(MotionOutcome::TimedOut {
                max_error: Some(20.0)
            })
        );
        assert!(clock.now() >= u64::from(config.motion.settle_ms + config.motion.fly.timeout_ms));
    }

    #[test]
    fn test_timeout_without_readings() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        arm.fail_reads(true);
        let mut exec = executor(&arm, &clock, &config, &window);

        let outcome = exec.move_to(&config.poses.grab, SpeedClass::Fly);
        assert_eq!(outcome, Ok(MotionOutcome::TimedOut { max_error: None }));
    }

    #[test]
    fn test_permission_drop_stops_guarded_move() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        arm.set_offset(20.0);
        arm.drop_start_between(620, 630);
        let mut exec = executor(&arm, &clock, &config, &window);

        exec.begin_guarded();
        let outcome = exec.move_to(&config.poses.grab, SpeedClass::Precision);
        assert_eq!(outcome, Ok(MotionOutcome::EmergencyStopped));
        assert_eq!(arm.hard_stops(), 1);
        assert!(clock.now() < 640);
    }

    #[test]
    fn test_permission_drop_ignored_outside_window() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        arm.drop_start_between(0, 10_000);
        let mut exec = executor(&arm, &clock, &config, &window);

        let outcome = exec.move_to(&config.poses.grab, SpeedClass::Precision);
        assert_eq!(outcome, Ok(MotionOutcome::Arrived));
        assert_eq!(arm.hard_stops(), 0);
    }

    #[test]
    fn test_send_failure_is_a_fault() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        arm.fail_sends(true);
        let mut exec = executor(&arm, &clock, &config, &window);

        assert_eq!(
            exec.move_to(&config.poses.grab, SpeedClass::Fly),
            Err(ArmError::CommunicationTimeout)
        );
    }

    #[test]
    fn test_pick_sequence_order() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        let mut exec = executor(&arm, &clock, &config, &window);

        let report = exec.pick();
        assert_eq!(report.map(|r| r.is_clean()), Ok(true));

        let mid = config.poses.pick_mid.unwrap();
        let targets: std::vec::Vec<_> = arm.sent().into_iter().map(|(t, _)| t).collect();
        assert_eq!(targets, std::vec![mid, config.poses.grab, mid, config.poses.rest]);
        assert_eq!(
            arm.gripper_writes(),
            std::vec![(config.io.gripper_pin, false), (config.io.gripper_pin, true)]
        );
    }

    #[test]
    fn test_place_skips_missing_mid() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.rest);
        let mut exec = executor(&arm, &clock, &config, &window);
        let slot = SlotId::new(2).unwrap();
        let wp = config.layout.waypoints(slot).clone();
        assert!(wp.mid.is_none());

        exec.place(slot).unwrap();
        let sent: std::vec::Vec<_> = arm.sent().into_iter().collect();
        assert_eq!(
            sent,
            std::vec![(wp.high, 80), (wp.low, 50), (wp.high, 80)]
        );
    }

    #[test]
    fn test_go_rest_backs_out_through_nearest_high() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let slot = SlotId::new(5).unwrap();
        let low = config.layout.waypoints(slot).low;
        let arm = FakeArm::new(&clock, low);
        let mut exec = executor(&arm, &clock, &config, &window);

        exec.go_rest().unwrap();
        let targets: std::vec::Vec<_> = arm.sent().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            targets,
            std::vec![config.layout.waypoints(slot).high, config.poses.rest]
        );
    }

    #[test]
    fn test_go_rest_is_idempotent() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.layout.slots[0].low);
        let mut exec = executor(&arm, &clock, &config, &window);

        exec.go_rest().unwrap();
        let first = arm.pose();
        arm.clear_log();

        exec.go_rest().unwrap();
        assert_eq!(arm.pose(), first);
        assert_eq!(arm.sent(), std::vec![(config.poses.rest, 80)]);
    }

    #[test]
    fn test_go_rest_without_pose_goes_direct() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.layout.slots[2].low);
        arm.fail_reads(true);
        let mut exec = executor(&arm, &clock, &config, &window);

        let report = exec.go_rest().unwrap();
        assert_eq!(arm.sent(), std::vec![(config.poses.rest, 80)]);
        assert_eq!(report.unconfirmed.len(), 1);
    }

    #[test]
    fn test_go_rest_ignores_guard() {
        let config = CellConfig::default();
        let window = GuardWindow::new();
        let clock = FakeClock::new();
        let arm = FakeArm::new(&clock, config.poses.grab);
        arm.drop_start_between(0, 100_000);
        let mut exec = executor(&arm, &clock, &config, &window);

        exec.begin_guarded();
        assert!(exec.go_rest().is_ok());
        assert_eq!(arm.hard_stops(), 0);
    }
}
