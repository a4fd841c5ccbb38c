//! Monotonic time source

/// Millisecond clock shared by the supervisory loop and the executor
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
