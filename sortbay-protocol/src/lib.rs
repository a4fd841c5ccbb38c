//! Sortbay operator protocol
//!
//! This crate is the boundary between the operator link and the
//! supervisor. Commands arrive as one JSON batch per line:
//!
//! ```text
//! [{"type": "inventory_update", "slot_id": 0, "status": 1}, {"action": "start"}]
//! ```
//!
//! Control entries carry an `action` (`start`, `stop`, `reset`,
//! `clear_all`); data entries carry a `type` (`inventory_update`, `sort`,
//! `heartbeat`). Each entry is validated on its own, so one bad entry never
//! sinks the rest of the batch.
//!
//! Status goes the other way as a single JSON object per line.

pub mod command;
pub mod status;

use sortbay_core::orchestrator::{Command, CommandError};

pub use command::{decode_batch, DecodeError, RawEntry};
pub use status::{StatusSnapshot, TaskSnapshot};

/// Decoded batch, one result per entry in wire order
pub type Batch = Vec<Result<Command, CommandError>>;
