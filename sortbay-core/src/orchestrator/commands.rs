//! Operator commands
//!
//! Commands are validated once, at ingestion. Everything past this point
//! works with typed values only.

use crate::inventory::SlotId;
use crate::traits::{ColorName, MAX_COLOR_LEN};

/// Which item colors a targeted sort accepts
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorFilter {
    Any,
    Named(ColorName),
}

impl ColorFilter {
    /// Parse an operator-supplied color; blank or "any" accepts everything
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("any") {
            return Ok(ColorFilter::Any);
        }
        let mut name = ColorName::new();
        for c in raw.chars() {
            name.push(c.to_ascii_lowercase())
                .map_err(|_| CommandError::ColorTooLong)?;
        }
        Ok(ColorFilter::Named(name))
    }

    /// Detected color satisfies the filter
    pub fn matches(&self, color: &str) -> bool {
        match self {
            ColorFilter::Any => true,
            ColorFilter::Named(name) => name.eq_ignore_ascii_case(color),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColorFilter::Any => "any",
            ColorFilter::Named(name) => name.as_str(),
        }
    }
}

/// Target of an inventory override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotSelector {
    All,
    Slot(SlotId),
}

/// A validated operator command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Enter auto mode
    Start,
    /// Return to idle; does not preempt motion
    Stop,
    /// Return the arm to rest
    Reset,
    /// Mark every slot empty until the PLC says otherwise
    ClearAll,
    /// Keep the operator link alive
    Heartbeat,
    /// Manual occupancy override
    InventoryUpdate { target: SlotSelector, occupied: bool },
    /// Store items of `color` into `slot`, buffering others
    Sort { slot: SlotId, color: ColorFilter },
}

/// Why a command entry was rejected at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Entry is not an object or has wrongly typed fields
    Malformed,
    /// Neither `action` nor `type` is present
    MissingKind,
    /// Unrecognised `action`
    UnknownAction,
    /// Unrecognised `type`
    UnknownType,
    /// Required field absent
    MissingField(&'static str),
    /// Slot id out of range
    InvalidSlot(i64),
    /// Occupancy status other than 0 or 1
    InvalidStatus(i64),
    /// Color name longer than the supported maximum
    ColorTooLong,
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::Malformed => f.write_str("malformed command"),
            CommandError::MissingKind => f.write_str("command has no action or type"),
            CommandError::UnknownAction => f.write_str("unknown action"),
            CommandError::UnknownType => f.write_str("unknown command type"),
            CommandError::MissingField(name) => write!(f, "missing field '{}'", name),
            CommandError::InvalidSlot(id) => write!(f, "invalid slot id {}", id),
            CommandError::InvalidStatus(s) => write!(f, "invalid slot status {}", s),
            CommandError::ColorTooLong => {
                write!(f, "color name longer than {} characters", MAX_COLOR_LEN)
            }
        }
    }
}

fn slot_from_raw(id: i64) -> Result<SlotId, CommandError> {
    u8::try_from(id)
        .ok()
        .and_then(SlotId::new)
        .ok_or(CommandError::InvalidSlot(id))
}

impl Command {
    /// Inventory override; slot id 0 addresses every slot
    pub fn inventory_update(slot_id: i64, status: i64) -> Result<Self, CommandError> {
        let target = if slot_id == 0 {
            SlotSelector::All
        } else {
            SlotSelector::Slot(slot_from_raw(slot_id)?)
        };
        let occupied = match status {
            0 => false,
            1 => true,
            other => return Err(CommandError::InvalidStatus(other)),
        };
        Ok(Command::InventoryUpdate { target, occupied })
    }

    /// Targeted sort into one slot
    pub fn sort(slot_id: i64, color: &str) -> Result<Self, CommandError> {
        Ok(Command::Sort {
            slot: slot_from_raw(slot_id)?,
            color: ColorFilter::parse(color)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_update_all() {
        assert_eq!(
            Command::inventory_update(0, 1),
            Ok(Command::InventoryUpdate {
                target: SlotSelector::All,
                occupied: true
            })
        );
    }

    #[test]
    fn test_inventory_update_rejects_bad_values() {
        assert_eq!(
            Command::inventory_update(7, 1),
            Err(CommandError::InvalidSlot(7))
        );
        assert_eq!(
            Command::inventory_update(2, 3),
            Err(CommandError::InvalidStatus(3))
        );
    }

    #[test]
    fn test_sort_requires_real_slot() {
        assert_eq!(Command::sort(0, "red"), Err(CommandError::InvalidSlot(0)));
        assert_eq!(Command::sort(-1, "red"), Err(CommandError::InvalidSlot(-1)));
    }

    #[test]
    fn test_color_filter() {
        let red = ColorFilter::parse(" Red ").unwrap();
        assert_eq!(red.as_str(), "red");
        assert!(red.matches("RED"));
        assert!(!red.matches("blue"));
        assert_eq!(ColorFilter::parse("ANY"), Ok(ColorFilter::Any));
        assert!(ColorFilter::Any.matches("silver"));
        assert_eq!(
            ColorFilter::parse("ultraviolet-magenta"),
            Err(CommandError::ColorTooLong)
        );
    }
}
