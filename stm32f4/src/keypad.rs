//! ZLG7290 keypad controller.
//!
//! The controller scans the key matrix itself, raises INT when a key goes
//! down and holds the key number in its key register until read. The main
//! loop watches INT for a rising edge and reads the register over I2C.

use embedded_hal::i2c::I2c;
use tft_common::input::KeyCode;

/// 7-bit I2C address.
pub const ZLG7290_ADDRESS: u8 = 0x38;

/// Key value register.
const KEY_REGISTER: u8 = 0x01;

/// Keypad controller on an I2C bus.
pub struct Zlg7290<I> {
    i2c: I,
}

impl<I: I2c> Zlg7290<I> {
    pub const fn new(i2c: I) -> Self { Self { i2c } }

    /// Reads the key register. `None` when no key is latched.
    ///
    /// # Errors
    ///
    /// Bus errors from the I2C transaction.
    pub fn read_key(&mut self) -> Result<Option<KeyCode>, I::Error> {
        let mut value = [0u8];
        self.i2c.write_read(ZLG7290_ADDRESS, &[KEY_REGISTER], &mut value)?;
        Ok(match value[0] {
            0 => None,
            code => Some(code),
        })
    }

    /// Gives the bus back.
    pub fn release(self) -> I { self.i2c }
}

/// Debounced rising-edge detector for the INT line.
pub struct KeyInterrupt {
    was_high: bool,
    last_change_ms: Option<u64>,
    hold_off_ms: u64,
}

impl KeyInterrupt {
    pub const fn new(hold_off_ms: u64) -> Self {
        Self {
            was_high: false,
            last_change_ms: None,
            hold_off_ms,
        }
    }

    /// Feeds one sample of the line; true on an accepted rising edge.
    ///
    /// Level changes inside the hold-off window after the previous accepted
    /// change are ignored.
    pub fn rising_edge(
        &mut self,
        is_high: bool,
        now_ms: u64,
    ) -> bool {
        if is_high == self.was_high {
            return false;
        }
        if let Some(last) = self.last_change_ms
            && now_ms.saturating_sub(last) < self.hold_off_ms
        {
            return false;
        }
        self.was_high = is_high;
        self.last_change_ms = Some(now_ms);
        is_high
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use embedded_hal::i2c::{ErrorType, Operation};

    use super::*;

    /// Answers every read with the next queued byte and records writes.
    struct MockI2c {
        replies: Vec<u8>,
        writes: Vec<(u8, Vec<u8>)>,
    }

    impl ErrorType for MockI2c {
        type Error = core::convert::Infallible;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = if self.replies.is_empty() { 0 } else { self.replies.remove(0) };
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_read_key_selects_key_register() {
        let mut keypad = Zlg7290::new(MockI2c {
            replies: vec![19, 0],
            writes: Vec::new(),
        });
        assert_eq!(keypad.read_key(), Ok(Some(19)));
        assert_eq!(keypad.read_key(), Ok(None));

        let bus = keypad.release();
        assert_eq!(bus.writes, vec![(0x38, vec![0x01]), (0x38, vec![0x01])]);
    }

    #[test]
    fn test_rising_edge_once_per_press() {
        let mut int = KeyInterrupt::new(20);
        assert!(!int.rising_edge(false, 0));
        assert!(int.rising_edge(true, 5));
        assert!(!int.rising_edge(true, 10));
        // Falls, then rises again after the hold-off.
        assert!(!int.rising_edge(false, 40));
        assert!(int.rising_edge(true, 80));
    }

    #[test]
    fn test_bounce_inside_hold_off_is_ignored() {
        let mut int = KeyInterrupt::new(20);
        assert!(int.rising_edge(true, 100));
        // Contact bounce.
        assert!(!int.rising_edge(false, 105));
        assert!(!int.rising_edge(true, 110));
        assert!(!int.rising_edge(false, 130));
        assert!(int.rising_edge(true, 160));
    }
}
