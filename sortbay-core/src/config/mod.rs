//! Configuration types
//!
//! Board-agnostic configuration structures. The supervisor deserializes
//! them from TOML; every field has a default so partial files are fine.

pub mod hardware;
pub mod types;

pub use hardware::*;
pub use types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete cell configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CellConfig {
    /// Speed classes, tolerances and wait timing
    pub motion: MotionConfig,
    /// Permission line hold times
    pub interlock: InterlockConfig,
    /// Arm GPIO assignment
    pub io: IoMap,
    /// Rest, pick-approach and grab poses
    pub poses: PoseTable,
    /// Per-slot waypoints
    pub layout: SlotLayout,
    /// Supervisory loop timing
    pub supervisor: SupervisorConfig,
}

impl CellConfig {
    /// Check the parts of the configuration that have no safe default
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.poses.rest.is_zero() || self.poses.grab.is_zero() {
            return Err(LayoutError::MissingPose);
        }
        self.layout.validate()
    }
}
