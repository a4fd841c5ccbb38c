//! Slot identifiers and the occupancy map

/// Number of storage slots in the rack
pub const SLOT_COUNT: usize = 6;

/// Storage slot number, always in `1..=SLOT_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(u8);

impl SlotId {
    /// Validate a slot number
    pub const fn new(id: u8) -> Option<Self> {
        if id >= 1 && id as usize <= SLOT_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Slot number as shown to operators (1-based)
    pub const fn get(self) -> u8 {
        self.0
    }

    /// 0-based index into per-slot tables
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// All slots, ascending
    pub fn all() -> impl DoubleEndedIterator<Item = SlotId> {
        (1..=SLOT_COUNT as u8).map(SlotId)
    }
}

impl core::fmt::Display for SlotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Occupancy per slot (`true` = occupied)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Inventory {
    occupied: [bool; SLOT_COUNT],
}

impl Inventory {
    /// All slots empty
    pub const fn empty() -> Self {
        Self {
            occupied: [false; SLOT_COUNT],
        }
    }

    pub const fn from_array(occupied: [bool; SLOT_COUNT]) -> Self {
        Self { occupied }
    }

    pub fn is_occupied(&self, slot: SlotId) -> bool {
        self.occupied[slot.index()]
    }

    pub fn set(&mut self, slot: SlotId, occupied: bool) {
        self.occupied[slot.index()] = occupied;
    }

    pub fn set_all(&mut self, occupied: bool) {
        self.occupied = [occupied; SLOT_COUNT];
    }

    /// Every slot is occupied
    pub fn is_full(&self) -> bool {
        self.occupied.iter().all(|&o| o)
    }

    /// Lowest-numbered empty slot
    pub fn first_empty(&self) -> Option<SlotId> {
        SlotId::all().find(|&s| !self.is_occupied(s))
    }

    /// Empty slot to park an unwanted item in, searched from the highest id
    /// down and never the reserved target slot
    pub fn buffer_slot(&self, reserved: SlotId) -> Option<SlotId> {
        SlotId::all()
            .rev()
            .find(|&s| s != reserved && !self.is_occupied(s))
    }

    pub fn as_array(&self) -> [bool; SLOT_COUNT] {
        self.occupied
    }
}
