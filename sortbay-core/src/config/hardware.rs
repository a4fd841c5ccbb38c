//! Cell geometry and GPIO assignment
//!
//! Waypoints are loaded once at startup and never change afterwards.

use crate::inventory::{SlotId, SLOT_COUNT};
use crate::motion::JointAngles;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pins on the arm controller's GPIO block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IoMap {
    /// Gripper output (high = closed)
    pub gripper_pin: u8,
    /// Start-permission input
    pub start_pin: u8,
    /// Reset-request input
    pub reset_pin: u8,
}

impl Default for IoMap {
    fn default() -> Self {
        Self {
            gripper_pin: 33,
            start_pin: 35,
            reset_pin: 36,
        }
    }
}

/// Fixed poses around the pickup point
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoseTable {
    /// Observation pose above the pickup point; the arm rests here
    pub rest: JointAngles,
    /// Optional approach pose between rest and grab
    pub pick_mid: Option<JointAngles>,
    /// Gripper around the item at the pickup point
    pub grab: JointAngles,
}

impl Default for PoseTable {
    fn default() -> Self {
        Self {
            rest: JointAngles::new([0.0, 10.0, -40.0, -50.0, 0.0, 45.0]),
            pick_mid: Some(JointAngles::new([0.0, -20.0, -60.0, -5.0, 0.0, 45.0])),
            grab: JointAngles::new([0.0, -45.0, -70.0, 25.0, 0.0, 45.0]),
        }
    }
}

/// Waypoints for one storage slot
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotWaypoints {
    /// Safe pose above the slot
    pub high: JointAngles,
    /// Optional intermediate pose
    #[cfg_attr(feature = "serde", serde(default))]
    pub mid: Option<JointAngles>,
    /// Release pose inside the slot
    pub low: JointAngles,
}

/// Waypoints for every slot, indexed by `SlotId::index`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SlotLayout {
    pub slots: [SlotWaypoints; SLOT_COUNT],
}

/// Layout problems detected at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// Rest or grab pose left at all zeros
    MissingPose,
    /// Slot has an all-zero high or low waypoint
    MissingWaypoint(SlotId),
}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LayoutError::MissingPose => f.write_str("rest or grab pose is not configured"),
            LayoutError::MissingWaypoint(slot) => {
                write!(f, "slot {} is missing its high or low waypoint", slot)
            }
        }
    }
}

fn row_slot(base: f32, lower: bool) -> SlotWaypoints {
    if lower {
        SlotWaypoints {
            high: JointAngles::new([base, -10.0, -20.0, -60.0, 0.0, 45.0]),
            mid: Some(JointAngles::new([base, -30.0, -40.0, -20.0, 0.0, 45.0])),
            low: JointAngles::new([base, -50.0, -60.0, 20.0, 0.0, 45.0]),
        }
    } else {
        SlotWaypoints {
            high: JointAngles::new([base, 0.0, -30.0, -60.0, 0.0, 45.0]),
            mid: None,
            low: JointAngles::new([base, -25.0, -45.0, -20.0, 0.0, 45.0]),
        }
    }
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            slots: [
                row_slot(60.0, false),
                row_slot(90.0, false),
                row_slot(120.0, false),
                row_slot(60.0, true),
                row_slot(90.0, true),
                row_slot(120.0, true),
            ],
        }
    }
}

impl SlotLayout {
    pub fn waypoints(&self, slot: SlotId) -> &SlotWaypoints {
        &self.slots[slot.index()]
    }

    /// Every slot needs a usable high and low waypoint
    pub fn validate(&self) -> Result<(), LayoutError> {
        for slot in SlotId::all() {
            let wp = self.waypoints(slot);
            if wp.high.is_zero() || wp.low.is_zero() {
                return Err(LayoutError::MissingWaypoint(slot));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        assert_eq!(SlotLayout::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_waypoint_rejected() {
        let mut layout = SlotLayout::default();
        layout.slots[3].low = JointAngles::ZERO;
        assert_eq!(
            layout.validate(),
            Err(LayoutError::MissingWaypoint(SlotId::new(4).unwrap()))
        );
    }
}
