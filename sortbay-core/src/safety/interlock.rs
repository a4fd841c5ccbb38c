//! Start/reset permission interlock
//!
//! Two independent debounced lines read from the arm's GPIO block:
//! start-permission must stay asserted for hazardous motion to begin or
//! continue, reset-request arms a recovery only while start-permission is
//! also valid.

use embedded_hal::digital::{self, InputPin};

use crate::config::{InterlockConfig, IoMap};
use crate::traits::{ArmDriver, ArmError};

use super::DebouncedInput;

/// Sample a pin, treating read failures as a low level
pub fn read_level<P: InputPin>(pin: &mut P) -> bool {
    pin.is_high().unwrap_or(false)
}

impl digital::Error for ArmError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// One input line on the arm's GPIO block, exposed as an `InputPin`
pub struct ArmPin<'a, A> {
    arm: &'a mut A,
    pin: u8,
}

impl<'a, A: ArmDriver> ArmPin<'a, A> {
    pub fn new(arm: &'a mut A, pin: u8) -> Self {
        Self { arm, pin }
    }
}

impl<A: ArmDriver> digital::ErrorType for ArmPin<'_, A> {
    type Error = ArmError;
}

impl<A: ArmDriver> InputPin for ArmPin<'_, A> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.arm.digital_read(self.pin)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.arm.digital_read(self.pin).map(|level| !level)
    }
}

/// Debounced start-permission and reset-request lines
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interlock {
    start: DebouncedInput,
    reset: DebouncedInput,
    start_pin: u8,
    reset_pin: u8,
}

impl Interlock {
    /// Create an interlock with both lines unsampled (invalid)
    pub fn new(config: &InterlockConfig, io: &IoMap) -> Self {
        Self {
            start: DebouncedInput::new(config.start_hold_ms),
            reset: DebouncedInput::new(config.reset_hold_ms),
            start_pin: io.start_pin,
            reset_pin: io.reset_pin,
        }
    }

    /// Feed raw levels for both lines
    pub fn update(&mut self, start_raw: bool, reset_raw: bool, now_ms: u64) {
        self.start.update(start_raw, now_ms);
        self.reset.update(reset_raw, now_ms);
    }

    /// Sample both lines from arbitrary input pins
    pub fn sample<S: InputPin, R: InputPin>(&mut self, start: &mut S, reset: &mut R, now_ms: u64) {
        let start_raw = read_level(start);
        let reset_raw = read_level(reset);
        self.update(start_raw, reset_raw, now_ms);
    }

    /// Sample both lines from the arm's GPIO block
    pub fn sample_arm<A: ArmDriver>(&mut self, arm: &mut A, now_ms: u64) {
        let start_raw = read_level(&mut ArmPin::new(arm, self.start_pin));
        let reset_raw = read_level(&mut ArmPin::new(arm, self.reset_pin));
        self.update(start_raw, reset_raw, now_ms);
    }

    /// Start-permission is currently valid
    pub fn start_permitted(&self) -> bool {
        self.start.is_valid()
    }

    /// Reset-request is valid while start-permission is valid
    pub fn reset_ready(&self) -> bool {
        self.reset.is_valid() && self.start.is_valid()
    }

    /// Copy of the start-permission filter, handed to a worker so it can
    /// keep re-checking the line during guarded motion
    pub fn start_input(&self) -> DebouncedInput {
        self.start
    }

    /// Arm GPIO pin carrying start-permission
    pub fn start_pin(&self) -> u8 {
        self.start_pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct Level(Result<bool, ArmError>);

    impl digital::ErrorType for Level {
        type Error = ArmError;
    }

    impl InputPin for Level {
        fn is_high(&mut self) -> Result<bool, ArmError> {
            self.0
        }

        fn is_low(&mut self) -> Result<bool, ArmError> {
            self.0.map(|l| !l)
        }
    }

    struct Fixed(bool);

    impl digital::ErrorType for Fixed {
        type Error = Infallible;
    }

    impl InputPin for Fixed {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    fn interlock() -> Interlock {
        Interlock::new(&InterlockConfig::default(), &IoMap::default())
    }

    #[test]
    fn test_read_error_counts_as_low() {
        assert!(!read_level(&mut Level(Err(ArmError::CommunicationTimeout))));
        assert!(read_level(&mut Level(Ok(true))));
    }

    #[test]
    fn test_reset_requires_start_permission() {
        let mut lock = interlock();
        let hold = u64::from(InterlockConfig::default().reset_hold_ms);

        lock.sample(&mut Fixed(false), &mut Fixed(true), 0);
        lock.sample(&mut Fixed(false), &mut Fixed(true), hold);
        assert!(!lock.reset_ready());

        lock.sample(&mut Fixed(true), &mut Fixed(true), hold + 1);
        lock.sample(&mut Fixed(true), &mut Fixed(true), 2 * hold + 1);
        assert!(lock.start_permitted());
        assert!(lock.reset_ready());
    }

    #[test]
    fn test_start_drop_is_immediate() {
        let mut lock = interlock();
        lock.update(true, false, 0);
        lock.update(true, false, 1_000);
        assert!(lock.start_permitted());

        lock.update(false, false, 1_010);
        assert!(!lock.start_permitted());
        assert!(!lock.start_input().is_valid());
    }
}
