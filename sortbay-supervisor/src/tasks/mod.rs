//! Supervisor threads and the loop
//!
//! The supervisory loop runs on the embassy executor. The motion worker
//! and the stdin command reader are plain threads that talk to it through
//! the static channels.

pub mod commands;
pub mod supervise;
pub mod worker;

pub use commands::spawn_command_reader;
pub use supervise::supervise;
pub use worker::spawn_worker;
