//! Desktop keyboard to keypad code mapping.
//!
//! The board keypad reports codes row by row, eight keys to a row. The
//! simulator lays the first five rows over the keyboard:
//!
//! ```text
//! 1  2  3  4  5  6  7  8     ->  1..8
//! Q  W  E  R  T  Y  U  I     ->  9..16
//! A  S  D  F  G  H  J  K     ->  17..24
//! Z  X  C  V  B  N  M  ,     ->  25..32
//! F1 F2 F3 F4 F5 F6 F7 F8    ->  33..40
//! ```
//!
//! Keys are matched by SDL key name so the table does not depend on the
//! SDL binding's keycode representation.

use tft_common::input::KeyCode;

const MATRIX: [[&str; 8]; 5] = [
    ["1", "2", "3", "4", "5", "6", "7", "8"],
    ["Q", "W", "E", "R", "T", "Y", "U", "I"],
    ["A", "S", "D", "F", "G", "H", "J", "K"],
    ["Z", "X", "C", "V", "B", "N", "M", ","],
    ["F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8"],
];

/// Keypad code for an SDL key name, if the key is on the matrix.
pub fn keypad_code(name: &str) -> Option<KeyCode> {
    MATRIX.iter().enumerate().find_map(|(row, keys)| {
        keys.iter()
            .position(|key| key.eq_ignore_ascii_case(name))
            .map(|col| (row * keys.len() + col + 1) as KeyCode)
    })
}

/// Key bindings printed at startup.
pub const HELP: &str = "\
Keypad rows on the keyboard: 1..8 | Q..I | A..K | Z..M , | F1..F8

Oscilloscope:
  1 time base        2 current range    3 / E shift right / left
  4 / R shift up / down                 5 / T trigger level up / down
  F1 reset front end F2 toggle gain     F5 switch to sweep

Frequency sweep:
  Q normalize        A edit range       Z next amplitude step
  X / C amplitude down / up             F1 swap cursor
  F2 / F3 cursor left / right           F5 switch to scope
  While editing: S / D previous / next, F type a value, A done

Number entry:
  2 3 4 / W E R / S D F digits 1-9, C 0, V decimal point
  5 backspace, T cancel, G confirm";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_map_to_consecutive_codes() {
        assert_eq!(keypad_code("1"), Some(1));
        assert_eq!(keypad_code("8"), Some(8));
        assert_eq!(keypad_code("Q"), Some(9));
        assert_eq!(keypad_code("A"), Some(17));
        assert_eq!(keypad_code(","), Some(32));
        assert_eq!(keypad_code("F5"), Some(37));
    }

    #[test]
    fn test_name_match_ignores_case() {
        assert_eq!(keypad_code("t"), Some(13));
    }

    #[test]
    fn test_unmapped_keys() {
        assert_eq!(keypad_code("Escape"), None);
        assert_eq!(keypad_code("F9"), None);
        assert_eq!(keypad_code(""), None);
    }
}
