//! Simulated PLC

use log::info;

use sortbay_core::inventory::Inventory;
use sortbay_core::traits::PlcLink;

use super::SimCell;
use crate::plc::decode_slot_image;

pub struct SimPlc {
    cell: SimCell,
    online: bool,
}

impl SimPlc {
    pub(crate) fn new(cell: SimCell) -> Self {
        Self { cell, online: true }
    }

    /// An offline PLC returns no image, so the supervisor keeps its view
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }
}

impl PlcLink for SimPlc {
    fn read_slots(&mut self) -> Option<Inventory> {
        if !self.online {
            return None;
        }
        Some(self.cell.with(|world, _| decode_slot_image(&world.image)))
    }

    fn pulse_dispense(&mut self) {
        info!("sim plc: dispense pulse");
        self.cell.with(|world, now| world.pulse_dispense(now));
    }
}
