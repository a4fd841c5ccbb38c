//! PLC slot image
//!
//! Occupancy is published as two bytes. Slots 1 to 4 sit on bits 4 to 7 of
//! byte 0, slots 5 and 6 on bits 0 and 1 of byte 1. Every other bit belongs
//! to the PLC and is ignored.

use sortbay_core::inventory::{Inventory, SlotId, SLOT_COUNT};

/// Image length in bytes
pub const IMAGE_LEN: usize = 2;

/// Raw occupancy image as read from the PLC
pub type SlotImage = [u8; IMAGE_LEN];

/// Byte and bit carrying one slot
const fn bit_for(slot: SlotId) -> (usize, u8) {
    let index = slot.index();
    if index < 4 {
        (0, 4 + index as u8)
    } else {
        (1, (index - 4) as u8)
    }
}

/// Decode an image into an occupancy map
pub fn decode_slot_image(image: &SlotImage) -> Inventory {
    let mut occupied = [false; SLOT_COUNT];
    for slot in SlotId::all() {
        let (byte, bit) = bit_for(slot);
        occupied[slot.index()] = image[byte] & (1 << bit) != 0;
    }
    Inventory::from_array(occupied)
}

/// Set or clear one slot bit, leaving the rest of the image alone
pub fn set_slot_bit(image: &mut SlotImage, slot: SlotId, occupied: bool) {
    let (byte, bit) = bit_for(slot);
    if occupied {
        image[byte] |= 1 << bit;
    } else {
        image[byte] &= !(1 << bit);
    }
}

/// Encode an occupancy map
pub fn encode_slot_image(inventory: &Inventory) -> SlotImage {
    let mut image = [0u8; IMAGE_LEN];
    for slot in SlotId::all() {
        set_slot_bit(&mut image, slot, inventory.is_occupied(slot));
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> SlotId {
        SlotId::new(n).unwrap()
    }

    #[test]
    fn test_bit_layout() {
        let inventory = decode_slot_image(&[0b0001_0000, 0b0000_0010]);
        assert_eq!(
            inventory.as_array(),
            [true, false, false, false, false, true]
        );

        let inventory = decode_slot_image(&[0b1000_0000, 0b0000_0001]);
        assert!(inventory.is_occupied(slot(4)));
        assert!(inventory.is_occupied(slot(5)));
    }

    #[test]
    fn test_foreign_bits_ignored() {
        let inventory = decode_slot_image(&[0b0000_1111, 0b1111_1100]);
        assert_eq!(inventory, Inventory::empty());
    }

    #[test]
    fn test_set_bit_preserves_neighbours() {
        let mut image = [0b0000_0101, 0b1000_0000];
        set_slot_bit(&mut image, slot(3), true);
        set_slot_bit(&mut image, slot(6), true);
        assert_eq!(image, [0b0100_0101, 0b1000_0010]);
        set_slot_bit(&mut image, slot(3), false);
        assert_eq!(image, [0b0000_0101, 0b1000_0010]);
    }

    #[test]
    fn test_encode_full_rack() {
        let mut inventory = Inventory::empty();
        inventory.set_all(true);
        assert_eq!(encode_slot_image(&inventory), [0xF0, 0x03]);
    }
}
