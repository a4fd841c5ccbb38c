//! Debounced digital input
//!
//! Slow to assert, instant to deassert. A level only counts as valid after
//! it has been continuously high for the hold time; the first low sample
//! invalidates it.

/// A digital input filtered into a stable boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebouncedInput {
    /// Required continuous high time before the input is valid
    hold_ms: u32,
    /// Most recent raw sample
    raw_level: bool,
    /// Timestamp of the first high sample in the current run
    stable_since: Option<u64>,
    /// Filtered output
    valid: bool,
}

impl DebouncedInput {
    /// Create an input that has never been sampled
    pub const fn new(hold_ms: u32) -> Self {
        Self {
            hold_ms,
            raw_level: false,
            stable_since: None,
            valid: false,
        }
    }

    /// Feed one raw sample taken at `now_ms`
    ///
    /// Returns the filtered level after the update. Never blocks.
    pub fn update(&mut self, raw: bool, now_ms: u64) -> bool {
        self.raw_level = raw;

        if raw {
            let since = *self.stable_since.get_or_insert(now_ms);
            if now_ms.saturating_sub(since) >= u64::from(self.hold_ms) {
                self.valid = true;
            }
        } else {
            self.stable_since = None;
            self.valid = false;
        }

        self.valid
    }

    /// Filtered level
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Last raw sample
    pub fn raw_level(&self) -> bool {
        self.raw_level
    }

    /// Start of the current high run, if any
    pub fn stable_since(&self) -> Option<u64> {
        self.stable_since
    }

    /// Configured hold time
    pub fn hold_ms(&self) -> u32 {
        self.hold_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_asserts_only_after_hold() {
        let mut input = DebouncedInput::new(100);
        assert!(!input.update(true, 0));
        assert!(!input.update(true, 99));
        assert!(input.update(true, 100));
        assert!(input.update(true, 250));
    }

    #[test]
    fn test_deasserts_on_first_low_sample() {
        let mut input = DebouncedInput::new(100);
        input.update(true, 0);
        input.update(true, 150);
        assert!(input.is_valid());

        assert!(!input.update(false, 160));
        assert_eq!(input.stable_since(), None);
    }

    #[test]
    fn test_low_sample_restarts_hold() {
        let mut input = DebouncedInput::new(100);
        input.update(true, 0);
        input.update(true, 90);
        input.update(false, 95);
        input.update(true, 100);
        assert!(!input.update(true, 150));
        assert!(input.update(true, 200));
    }

    #[test]
    fn test_zero_hold_is_immediate() {
        let mut input = DebouncedInput::new(0);
        assert!(input.update(true, 42));
        assert!(!input.update(false, 43));
    }

    proptest! {
        #[test]
        fn prop_short_pulse_never_valid(hold in 1u32..1000, len in 0u32..1000, step in 1u32..50) {
            prop_assume!(len < hold);
            let mut input = DebouncedInput::new(hold);
            let mut t = 0u32;
            while t <= len {
                prop_assert!(!input.update(true, u64::from(t)));
                t += step;
            }
            prop_assert!(!input.update(false, u64::from(t)));
        }

        #[test]
        fn prop_held_level_valid_after_hold(hold in 0u32..1000, extra in 0u32..500) {
            let mut input = DebouncedInput::new(hold);
            input.update(true, 0);
            prop_assert!(input.update(true, u64::from(hold) + u64::from(extra)));
        }

        #[test]
        fn prop_any_drop_invalidates(hold in 0u32..1000, at in 0u64..10_000) {
            let mut input = DebouncedInput::new(hold);
            input.update(true, 0);
            input.update(true, u64::from(hold) + at);
            prop_assert!(!input.update(false, u64::from(hold) + at + 1));
        }
    }
}
