//! Board-agnostic core logic for the Sortbay pick-and-place sorter
//!
//! This crate contains all supervision logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (arm, PLC link, vision, clock)
//! - Debounced interlocks and the motion lease
//! - Waypoint motion executor and job runner
//! - Sort orchestrator and mode state machine
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod inventory;
pub mod motion;
pub mod orchestrator;
pub mod safety;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod testkit;
