//! Arm driver trait
//!
//! Joint-space moves are issued non-blocking; arrival is detected by the
//! motion executor polling `read_angles`. The arm also carries the GPIO
//! block with the gripper output and the permission inputs.

use crate::motion::JointAngles;

/// Errors that can occur talking to the arm controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmError {
    /// Controller did not answer in time
    CommunicationTimeout,
    /// Controller answered with something that is not a 6-joint pose
    InvalidReading,
    /// No controller attached
    NotConnected,
}

impl core::fmt::Display for ArmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArmError::CommunicationTimeout => f.write_str("arm communication timeout"),
            ArmError::InvalidReading => f.write_str("invalid joint reading"),
            ArmError::NotConnected => f.write_str("arm not connected"),
        }
    }
}

/// Six-axis arm controller
pub trait ArmDriver {
    /// Start a move toward `angles` at `speed` (percent); returns immediately
    fn send_waypoint(&mut self, angles: &JointAngles, speed: u8) -> Result<(), ArmError>;

    /// Current joint angles in degrees
    fn read_angles(&mut self) -> Result<JointAngles, ArmError>;

    /// Read a GPIO input on the arm's controller
    fn digital_read(&mut self, pin: u8) -> Result<bool, ArmError>;

    /// Drive a GPIO output on the arm's controller
    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), ArmError>;

    /// Stop all joints where they are
    fn hard_stop(&mut self) -> Result<(), ArmError>;
}

impl<A: ArmDriver + ?Sized> ArmDriver for &mut A {
    fn send_waypoint(&mut self, angles: &JointAngles, speed: u8) -> Result<(), ArmError> {
        (**self).send_waypoint(angles, speed)
    }

    fn read_angles(&mut self) -> Result<JointAngles, ArmError> {
        (**self).read_angles()
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool, ArmError> {
        (**self).digital_read(pin)
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), ArmError> {
        (**self).digital_write(pin, high)
    }

    fn hard_stop(&mut self) -> Result<(), ArmError> {
        (**self).hard_stop()
    }
}
