//! PLC link trait
//!
//! The PLC owns the authoritative slot-occupancy image and consumes a
//! dispense pulse after every stored item.

use crate::inventory::Inventory;

pub trait PlcLink {
    /// Read the occupancy image
    ///
    /// Returns `None` when the read fails; callers keep their prior view.
    fn read_slots(&mut self) -> Option<Inventory>;

    /// Fire-and-forget handshake pulse after an item has been placed
    fn pulse_dispense(&mut self);
}
