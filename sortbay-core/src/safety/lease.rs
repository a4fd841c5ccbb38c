//! Motion lease and guard window
//!
//! The lease is the single token that allows a worker to own the arm. The
//! guard window marks the span of a job during which losing
//! start-permission is an emergency.

use portable_atomic::{AtomicBool, Ordering};

/// Exclusive right to drive the arm
#[derive(Debug)]
pub struct MotionLease {
    held: AtomicBool,
}

impl Default for MotionLease {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionLease {
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Take the lease if nobody holds it
    pub fn try_acquire(&self) -> Option<LeaseGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LeaseGuard { lease: self })
    }

    /// A worker currently owns the arm
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Releases the lease when dropped
#[derive(Debug)]
pub struct LeaseGuard<'a> {
    lease: &'a MotionLease,
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        self.lease.held.store(false, Ordering::Release);
    }
}

/// Hazardous-motion window flag
#[derive(Debug)]
pub struct GuardWindow {
    active: AtomicBool,
}

impl Default for GuardWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardWindow {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    /// Enter the guarded window
    pub fn open(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Leave the guarded window
    pub fn close(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
