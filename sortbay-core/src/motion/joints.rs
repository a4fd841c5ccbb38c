//! Joint-space poses

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of arm joints
pub const JOINTS: usize = 6;

/// Joint angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointAngles(pub [f32; JOINTS]);

fn abs(x: f32) -> f32 {
    if x < 0.0 {
        -x
    } else {
        x
    }
}

impl JointAngles {
    pub const ZERO: Self = Self([0.0; JOINTS]);

    pub const fn new(angles: [f32; JOINTS]) -> Self {
        Self(angles)
    }

    /// An all-zero pose marks an unconfigured waypoint
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&a| a == 0.0)
    }

    /// Largest absolute per-joint difference
    pub fn max_error(&self, other: &JointAngles) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| abs(a - b))
            .fold(0.0, |acc, e| if e > acc { e } else { acc })
    }

    /// Squared Euclidean distance in joint space
    ///
    /// Only used for comparisons, so the square root is never taken.
    pub fn distance_sq(&self, other: &JointAngles) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}
