//! Supervisor mode state machine
//!
//! The mode is explicit, finite and deterministic. The orchestrator decides
//! which trigger applies; this module only maps (mode, trigger) to the next
//! mode.

pub mod machine;
pub mod trigger;

pub use machine::{Mode, Resume};
pub use trigger::Trigger;
