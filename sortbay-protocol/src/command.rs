//! Command batch decoding
//!
//! A line that is not JSON at all is a [`DecodeError`]. Anything that parses
//! becomes a batch, where every entry is either a validated [`Command`] or
//! the [`CommandError`] explaining why it was dropped.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use sortbay_core::orchestrator::{Command, CommandError};

use crate::Batch;

/// Whole-line decoding failure
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an object or an array of objects")]
    NotABatch,
}

/// One entry as it appears on the wire
#[derive(Debug, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub slot_id: Option<i64>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub color: Option<String>,
}

impl RawEntry {
    /// Validate into a typed command
    ///
    /// Data entries are matched on `type` first; an unrecognised `type`
    /// falls through to `action`, so `{"type": "sys", "action": "start"}`
    /// is a start.
    pub fn validate(&self) -> Result<Command, CommandError> {
        match self.kind.as_deref() {
            Some("inventory_update") => {
                let slot_id = self.slot_id.ok_or(CommandError::MissingField("slot_id"))?;
                let status = self.status.ok_or(CommandError::MissingField("status"))?;
                return Command::inventory_update(slot_id, status);
            }
            Some("sort") => {
                let slot_id = self.slot_id.ok_or(CommandError::MissingField("slot_id"))?;
                return Command::sort(slot_id, self.color.as_deref().unwrap_or("any"));
            }
            Some("heartbeat") => return Ok(Command::Heartbeat),
            _ => {}
        }

        match self.action.as_deref() {
            Some("start") => Ok(Command::Start),
            Some("stop") => Ok(Command::Stop),
            Some("reset") => Ok(Command::Reset),
            Some("clear_all") => Ok(Command::ClearAll),
            Some(_) => Err(CommandError::UnknownAction),
            None if self.kind.is_some() => Err(CommandError::UnknownType),
            None => Err(CommandError::MissingKind),
        }
    }
}

fn decode_entry(value: Value) -> Result<Command, CommandError> {
    if !value.is_object() {
        return Err(CommandError::Malformed);
    }
    let raw: RawEntry = serde_json::from_value(value).map_err(|_| CommandError::Malformed)?;
    raw.validate()
}

/// Decode one line into a command batch
pub fn decode_batch(line: &str) -> Result<Batch, DecodeError> {
    let value: Value = serde_json::from_str(line)?;
    match value {
        Value::Array(entries) => Ok(entries.into_iter().map(decode_entry).collect()),
        Value::Object(_) => Ok(vec![decode_entry(value)]),
        _ => Err(DecodeError::NotABatch),
    }
}
