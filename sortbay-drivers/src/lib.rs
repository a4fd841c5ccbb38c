//! Collaborator implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in sortbay-core:
//!
//! - PLC slot image decoding
//! - A simulated cell (kinematic arm, PLC with feeder, camera) for host
//!   runs and integration tests

#![deny(unsafe_code)]

pub mod plc;
pub mod sim;
