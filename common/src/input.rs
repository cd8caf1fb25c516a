//! Keypad codes, the key queue and numeric entry.
//!
//! The keypad reports a scan code from 1 to 64 (0 means no key). Each screen
//! decodes the codes it understands into its own command type; everything
//! else is ignored.

use heapless::String;

use crate::Error;
use crate::fifo::RingBuffer;

/// Raw keypad scan code.
pub type KeyCode = u8;

/// Keys buffered between the keypad poller and the active screen.
pub const KEY_QUEUE_LEN: usize = 16;

/// Most digits a number entry accepts.
pub const MAX_DIGITS: usize = 10;

// =============================================================================
// Screen commands
// =============================================================================

/// Whether a screen keeps running after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flow {
    Continue,
    Exit,
}

/// Oscilloscope keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScopeCommand {
    NextTimeBase,
    NextCurrentRange,
    ShiftRight,
    ShiftLeft,
    ShiftUp,
    ShiftDown,
    TriggerUp,
    TriggerDown,
    ResetFrontEnd,
    ToggleGain,
    Exit,
}

impl ScopeCommand {
    pub const fn from_key(code: KeyCode) -> Option<Self> {
        Some(match code {
            1 => Self::NextTimeBase,
            2 => Self::NextCurrentRange,
            3 => Self::ShiftRight,
            11 => Self::ShiftLeft,
            4 => Self::ShiftUp,
            12 => Self::ShiftDown,
            5 => Self::TriggerUp,
            13 => Self::TriggerDown,
            33 => Self::ResetFrontEnd,
            34 => Self::ToggleGain,
            37 => Self::Exit,
            _ => return None,
        })
    }
}

/// Frequency-sweep keys while the sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SweepCommand {
    Normalize,
    EditRange,
    NextAmplitudeStep,
    AmplitudeDown,
    AmplitudeUp,
    SwapCursor,
    CursorLeft,
    CursorRight,
    Exit,
}

impl SweepCommand {
    pub const fn from_key(code: KeyCode) -> Option<Self> {
        Some(match code {
            9 => Self::Normalize,
            17 => Self::EditRange,
            25 => Self::NextAmplitudeStep,
            26 => Self::AmplitudeDown,
            27 => Self::AmplitudeUp,
            33 => Self::SwapCursor,
            34 => Self::CursorLeft,
            35 => Self::CursorRight,
            37 => Self::Exit,
            _ => return None,
        })
    }
}

/// Keys while a sweep parameter is selected for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditCommand {
    Previous,
    Next,
    EnterValue,
    Commit,
}

impl EditCommand {
    pub const fn from_key(code: KeyCode) -> Option<Self> {
        Some(match code {
            18 => Self::Previous,
            19 => Self::Next,
            20 => Self::EnterValue,
            17 => Self::Commit,
            _ => return None,
        })
    }
}

/// Keys of the numeric pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryKey {
    Digit(u8),
    Dot,
    Backspace,
    Cancel,
    Confirm,
}

impl EntryKey {
    pub const fn from_key(code: KeyCode) -> Option<Self> {
        Some(match code {
            2 => Self::Digit(1),
            3 => Self::Digit(2),
            4 => Self::Digit(3),
            10 => Self::Digit(4),
            11 => Self::Digit(5),
            12 => Self::Digit(6),
            18 => Self::Digit(7),
            19 => Self::Digit(8),
            20 => Self::Digit(9),
            27 => Self::Digit(0),
            28 => Self::Dot,
            5 => Self::Backspace,
            13 => Self::Cancel,
            21 => Self::Confirm,
            _ => return None,
        })
    }
}

// =============================================================================
// Key queue
// =============================================================================

/// FIFO of pending key codes.
pub struct KeyQueue {
    fifo: RingBuffer<KeyCode, KEY_QUEUE_LEN>,
}

impl KeyQueue {
    /// # Errors
    ///
    /// Only if [`KEY_QUEUE_LEN`] stops being a power of two.
    pub fn new() -> Result<Self, Error> { Ok(Self { fifo: RingBuffer::new()? }) }

    /// Queues a key; 0 (no key) is ignored. Returns `false` if the queue is full.
    pub fn push(
        &mut self,
        code: KeyCode,
    ) -> bool {
        code == 0 || self.fifo.push(code)
    }

    pub fn pop(&mut self) -> Option<KeyCode> { self.fifo.pop() }

    pub fn clear(&mut self) { self.fifo.reset(); }
}

// =============================================================================
// Number entry
// =============================================================================

/// What a key did to a [`NumberEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryState {
    Editing,
    Cancelled,
    Confirmed,
}

/// Digits typed on the keypad.
#[derive(Debug, Clone)]
pub struct NumberEntry {
    text: String<16>,
    integer: bool,
}

impl NumberEntry {
    /// Entry that accepts one decimal point.
    pub const fn decimal() -> Self {
        Self {
            text: String::new(),
            integer: false,
        }
    }

    /// Entry for whole numbers only.
    pub const fn integer() -> Self {
        Self {
            text: String::new(),
            integer: true,
        }
    }

    /// What has been typed so far.
    pub fn as_str(&self) -> &str { &self.text }

    fn digits(&self) -> usize { self.text.bytes().filter(u8::is_ascii_digit).count() }

    /// Applies one key.
    pub fn press(
        &mut self,
        key: EntryKey,
    ) -> EntryState {
        match key {
            EntryKey::Digit(digit) if digit < 10 && self.digits() < MAX_DIGITS => {
                let _ = self.text.push(char::from(b'0' + digit));
            }
            EntryKey::Dot if !self.integer && !self.text.contains('.') => {
                let _ = self.text.push('.');
            }
            EntryKey::Backspace => {
                self.text.pop();
            }
            EntryKey::Cancel => return EntryState::Cancelled,
            EntryKey::Confirm => return EntryState::Confirmed,
            _ => {}
        }
        EntryState::Editing
    }

    /// The typed value; `None` if nothing parseable was typed.
    pub fn value(&self) -> Option<f32> { self.text.parse().ok() }

    /// The typed value as a whole number.
    pub fn value_u32(&self) -> Option<u32> { self.text.parse().ok() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(
        entry: &mut NumberEntry,
        codes: &[KeyCode],
    ) -> EntryState {
        let mut state = EntryState::Editing;
        for &code in codes {
            if let Some(key) = EntryKey::from_key(code) {
                state = entry.press(key);
            }
        }
        state
    }

    #[test]
    fn test_key_tables() {
        assert_eq!(ScopeCommand::from_key(37), Some(ScopeCommand::Exit));
        assert_eq!(ScopeCommand::from_key(6), None);
        assert_eq!(SweepCommand::from_key(35), Some(SweepCommand::CursorRight));
        assert_eq!(EditCommand::from_key(17), Some(EditCommand::Commit));
        assert_eq!(EntryKey::from_key(27), Some(EntryKey::Digit(0)));
        assert_eq!(EntryKey::from_key(20), Some(EntryKey::Digit(9)));
    }

    #[test]
    fn test_decimal_entry() {
        let mut entry = NumberEntry::decimal();
        // 1 2 . 5 . 0 confirm; the second dot is ignored.
        let state = type_keys(&mut entry, &[2, 3, 28, 11, 28, 27, 21]);
        assert_eq!(state, EntryState::Confirmed);
        assert_eq!(entry.as_str(), "12.50");
        assert_eq!(entry.value(), Some(12.5));
    }

    #[test]
    fn test_backspace_frees_the_dot() {
        let mut entry = NumberEntry::decimal();
        type_keys(&mut entry, &[2, 28, 5, 28, 3]);
        assert_eq!(entry.as_str(), "1.2");
        type_keys(&mut entry, &[5, 5, 5, 5]);
        assert_eq!(entry.as_str(), "");
        assert_eq!(entry.value(), None);
    }

    #[test]
    fn test_integer_entry_limits() {
        let mut entry = NumberEntry::integer();
        let state = type_keys(&mut entry, &[2; 12]);
        assert_eq!(state, EntryState::Editing);
        assert_eq!(entry.as_str(), "1111111111");
        type_keys(&mut entry, &[28]);
        assert!(!entry.as_str().contains('.'));
        assert_eq!(entry.value_u32(), Some(1_111_111_111));
        assert_eq!(type_keys(&mut entry, &[13]), EntryState::Cancelled);
    }

    #[test]
    fn test_key_queue() {
        let mut keys = KeyQueue::new().unwrap();
        assert!(keys.push(0));
        assert!(keys.push(3));
        assert!(keys.push(11));
        assert_eq!(keys.pop(), Some(3));
        for _ in 0..KEY_QUEUE_LEN {
            keys.push(1);
        }
        assert!(!keys.push(1));
        keys.clear();
        assert_eq!(keys.pop(), None);
    }
}
