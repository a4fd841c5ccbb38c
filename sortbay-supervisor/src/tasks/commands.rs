//! Command reader
//!
//! Reads the operator link from stdin. Every line is a JSON command batch,
//! except lines starting with `!`, which drive the simulated operator
//! panel:
//!
//! ```text
//! !start on|off     start-permission line
//! !reset on|off     reset line
//! !unload <slot>    empty one rack slot
//! ```

use std::io::{self, BufRead};
use std::thread;

use log::{info, warn};

use sortbay_core::inventory::SlotId;
use sortbay_drivers::sim::SimCell;
use sortbay_protocol::decode_batch;

use crate::channels::COMMAND_BATCHES;
use crate::error::{Error, Result};

/// Operator panel action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    StartLine(bool),
    ResetLine(bool),
    Unload(SlotId),
}

fn parse_level(word: &str) -> Option<bool> {
    match word {
        "on" | "1" | "high" => Some(true),
        "off" | "0" | "low" => Some(false),
        _ => None,
    }
}

/// Parse a panel line without its leading `!`
pub fn parse_panel(line: &str) -> Option<PanelAction> {
    let mut words = line.split_whitespace();
    let action = match (words.next()?, words.next()?) {
        ("start", level) => PanelAction::StartLine(parse_level(level)?),
        ("reset", level) => PanelAction::ResetLine(parse_level(level)?),
        ("unload", slot) => PanelAction::Unload(slot.parse::<u8>().ok().and_then(SlotId::new)?),
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(action)
}

fn apply_panel(cell: &SimCell, action: PanelAction) {
    info!("panel: {:?}", action);
    match action {
        PanelAction::StartLine(high) => cell.set_start_line(high),
        PanelAction::ResetLine(high) => cell.set_reset_line(high),
        PanelAction::Unload(slot) => cell.unload(slot),
    }
}

fn handle_line(cell: &SimCell, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if let Some(panel) = line.strip_prefix('!') {
        match parse_panel(panel) {
            Some(action) => apply_panel(cell, action),
            None => warn!("panel: unrecognised '{}'", panel),
        }
        return;
    }

    match decode_batch(line) {
        Ok(batch) => {
            if COMMAND_BATCHES.try_send(batch).is_err() {
                warn!("commands: queue full, batch dropped");
            }
        }
        Err(e) => warn!("commands: {}", e),
    }
}

/// Start the stdin reader thread
pub fn spawn_command_reader(cell: SimCell) -> Result<()> {
    thread::Builder::new()
        .name("command-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => handle_line(&cell, &line),
                    Err(e) => {
                        warn!("commands: stdin read failed: {}", e);
                        break;
                    }
                }
            }
            info!("commands: stdin closed");
        })
        .map(|_| ())
        .map_err(|source| Error::Spawn {
            name: "command-reader",
            source,
        })
}
