//! Simulated arm
//!
//! Joint commands go straight into the shared world; reads report the
//! interpolated pose. The start and reset lines are wired to the arm's
//! digital inputs, the gripper to a digital output.

use log::{debug, warn};

use sortbay_core::motion::JointAngles;
use sortbay_core::traits::{ArmDriver, ArmError};

use super::SimCell;

pub struct SimArm {
    cell: SimCell,
    connected: bool,
}

impl SimArm {
    pub(crate) fn new(cell: SimCell) -> Self {
        Self {
            cell,
            connected: true,
        }
    }

    /// Pull the cable; every call fails until reconnected
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    fn link(&self) -> Result<(), ArmError> {
        if self.connected {
            Ok(())
        } else {
            Err(ArmError::NotConnected)
        }
    }
}

impl ArmDriver for SimArm {
    fn send_waypoint(&mut self, angles: &JointAngles, speed: u8) -> Result<(), ArmError> {
        self.link()?;
        debug!("sim arm: move to {:?} at speed {}", angles.0, speed);
        self.cell
            .with(|world, now| world.command_move(angles, speed, now));
        Ok(())
    }

    fn read_angles(&mut self) -> Result<JointAngles, ArmError> {
        self.link()?;
        Ok(self.cell.with(|world, now| world.pose(now)))
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool, ArmError> {
        self.link()?;
        Ok(self.cell.with(|world, now| world.digital_read(pin, now)))
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), ArmError> {
        self.link()?;
        self.cell.with(|world, now| {
            if pin == world.io.gripper_pin {
                world.set_gripper(high, now);
            }
        });
        Ok(())
    }

    fn hard_stop(&mut self) -> Result<(), ArmError> {
        self.link()?;
        warn!("sim arm: hard stop");
        self.cell.with(|world, now| world.halt(now));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimConfig;
    use sortbay_core::config::CellConfig;

    #[test]
    fn test_disconnected_arm_fails() {
        let cell = SimCell::new(&SimConfig::default(), &CellConfig::default());
        let mut arm = cell.arm();
        arm.set_connected(false);
        assert_eq!(arm.read_angles(), Err(ArmError::NotConnected));
        assert_eq!(
            arm.send_waypoint(&JointAngles::ZERO, 50),
            Err(ArmError::NotConnected)
        );
    }

    #[test]
    fn test_hard_stop_freezes_pose() {
        let config = CellConfig::default();
        let cell = SimCell::new(&SimConfig::default(), &config);
        let mut arm = cell.arm();
        arm.send_waypoint(&config.poses.grab, 100).unwrap();
        arm.hard_stop().unwrap();
        let held = arm.read_angles().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(arm.read_angles().unwrap(), held);
    }
}
