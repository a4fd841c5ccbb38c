//! PLC link support
//!
//! The PLC owns occupancy truth. It is read as a raw two-byte image and
//! decoded here; transport is up to the implementation.

pub mod image;

pub use image::{decode_slot_image, encode_slot_image, set_slot_bit, SlotImage, IMAGE_LEN};
