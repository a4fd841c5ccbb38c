//! Simulated camera
//!
//! Reports whatever the feeder left at the pickup point.

use sortbay_core::traits::{Detection, VisionSource};

use super::SimCell;

pub struct SimVision {
    cell: SimCell,
}

impl SimVision {
    pub(crate) fn new(cell: SimCell) -> Self {
        Self { cell }
    }
}

impl VisionSource for SimVision {
    fn detect(&mut self) -> Option<Detection> {
        let detection = self.cell.with(|world, now| {
            world.run_feeder(now);
            match world.item_at_pickup() {
                Some(color) => Detection::item(color),
                None => Detection::nothing(),
            }
        });
        Some(detection)
    }
}
