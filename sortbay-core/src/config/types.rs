//! Motion, interlock and loop timing parameters

use crate::motion::SpeedClass;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for one speed class
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedProfile {
    /// Commanded speed (percent of controller maximum)
    pub speed: u8,
    /// Arrival tolerance (max per-joint error, degrees)
    pub tolerance_deg: f32,
    /// Give up waiting for arrival after this long
    pub timeout_ms: u32,
}

/// Closed-loop motion parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Transit moves between safe waypoints
    pub fly: SpeedProfile,
    /// Final approach to grab and place poses
    pub precision: SpeedProfile,
    /// Wait after issuing a move before polling
    pub settle_ms: u32,
    /// Interval between joint reads
    pub poll_ms: u32,
    /// Longest uninterrupted sleep inside a guarded wait
    pub guard_slice_ms: u32,
    /// Movement between polls below this counts as standing still
    pub stall_epsilon_deg: f32,
    /// Consecutive still polls before accepting a residual error
    pub stall_polls: u8,
    /// Largest residual error accepted for a stalled arm
    pub residual_tolerance_deg: f32,
    /// Dwell after closing the gripper
    pub grip_dwell_ms: u32,
    /// Dwell after opening the gripper
    pub release_dwell_ms: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            fly: SpeedProfile {
                speed: 80,
                tolerance_deg: 6.0,
                timeout_ms: 4_000,
            },
            precision: SpeedProfile {
                speed: 50,
                tolerance_deg: 4.0,
                timeout_ms: 6_000,
            },
            settle_ms: 500,
            poll_ms: 100,
            guard_slice_ms: 10,
            stall_epsilon_deg: 0.5,
            stall_polls: 3,
            residual_tolerance_deg: 8.5,
            grip_dwell_ms: 500,
            release_dwell_ms: 300,
        }
    }
}

impl MotionConfig {
    /// Tolerance/timeout lookup for a speed class
    pub fn profile(&self, class: SpeedClass) -> &SpeedProfile {
        match class {
            SpeedClass::Fly => &self.fly,
            SpeedClass::Precision => &self.precision,
        }
    }
}

/// Debounce hold times for the permission lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InterlockConfig {
    pub start_hold_ms: u32,
    pub reset_hold_ms: u32,
}

impl Default for InterlockConfig {
    fn default() -> Self {
        Self {
            start_hold_ms: 100,
            reset_hold_ms: 500,
        }
    }
}

/// Supervisory loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SupervisorConfig {
    /// Loop cadence
    pub tick_ms: u32,
    /// Operator link is considered lost after this long without traffic
    pub liveness_window_ms: u32,
    /// Liveness allowance after startup before any traffic has been seen
    pub startup_grace_ms: u32,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 30,
            liveness_window_ms: 5_000,
            startup_grace_ms: 15_000,
        }
    }
}
