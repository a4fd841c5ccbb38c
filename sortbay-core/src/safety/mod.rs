//! Safety interlocks
//!
//! Debounced permission lines, the motion lease that keeps at most one
//! worker alive, and the guard window flag shared with the executor.

pub mod debounce;
pub mod interlock;
pub mod lease;

pub use debounce::DebouncedInput;
pub use interlock::{read_level, ArmPin, Interlock};
pub use lease::{GuardWindow, LeaseGuard, MotionLease};
