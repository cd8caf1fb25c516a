//! RGB565 palette and raw-word conversions.
//!
//! Panels and framebuffers store pixels as raw 16-bit words (5 bits red,
//! 6 bits green, 5 bits blue). The drawing API works in [`Rgb565`]; the
//! helpers here convert at the storage boundary.

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_graphics::prelude::*;

// =============================================================================
// Standard Colors (from RgbColor trait)
// =============================================================================

/// 0x0000. Also the transparency key for keyed bitmaps.
pub const BLACK: Rgb565 = Rgb565::BLACK;
/// 0xFFFF.
pub const WHITE: Rgb565 = Rgb565::WHITE;
/// 0xF800. Curve color on both screens.
pub const RED: Rgb565 = Rgb565::RED;
/// 0x07E0.
pub const GREEN: Rgb565 = Rgb565::GREEN;
/// 0x001F.
pub const BLUE: Rgb565 = Rgb565::BLUE;
/// 0xFFE0. Selected cursor and parameter values.
pub const YELLOW: Rgb565 = Rgb565::YELLOW;
/// 0xF81F.
pub const MAGENTA: Rgb565 = Rgb565::MAGENTA;

// =============================================================================
// Named Colors (decomposed from their RGB565 words)
// =============================================================================

/// 0x528A. Fine grid lines.
pub const DARKGRAY: Rgb565 = Rgb565::new(10, 20, 10);
/// 0xB5B6. Coarse grid lines.
pub const GRAY: Rgb565 = Rgb565::new(22, 45, 22);
/// 0xD69A. Secondary readouts.
pub const LIGHTGRAY: Rgb565 = Rgb565::new(26, 52, 26);
/// 0x7FE0.
pub const LAWNGREEN: Rgb565 = Rgb565::new(15, 63, 0);
/// 0x1C9F.
pub const DODGERBLUE: Rgb565 = Rgb565::new(3, 36, 31);
/// 0x4416. Low-gain badge.
pub const STEELBLUE: Rgb565 = Rgb565::new(8, 32, 22);
/// 0x0010.
pub const NAVYBLUE: Rgb565 = Rgb565::new(0, 0, 16);
/// 0x2595.
pub const PERRY: Rgb565 = Rgb565::new(4, 44, 21);
/// 0x7FFF.
pub const CYAN: Rgb565 = Rgb565::new(15, 63, 31);
/// 0x8A24. Unselected cursor.
pub const BROWN: Rgb565 = Rgb565::new(17, 17, 4);
/// 0xA11E. Measurement readouts.
pub const PURPLE: Rgb565 = Rgb565::new(20, 8, 30);
/// 0xFEA0.
pub const GOLD: Rgb565 = Rgb565::new(31, 53, 0);
/// 0xFC60.
pub const ORANGE: Rgb565 = Rgb565::new(31, 35, 0);
/// 0xFA20.
pub const ORANGERED: Rgb565 = Rgb565::new(31, 17, 0);
/// 0x867F.
pub const SKYBLUE: Rgb565 = Rgb565::new(16, 51, 31);
/// 0xF7FF. Trigger level line.
pub const AZURE: Rgb565 = Rgb565::new(30, 63, 31);
/// 0xF7DF.
pub const ALICEBLUE: Rgb565 = Rgb565::new(30, 62, 31);
/// 0xFC0E.
pub const SALMON: Rgb565 = Rgb565::new(31, 32, 14);
/// 0x9E66.
pub const OLIVE: Rgb565 = Rgb565::new(19, 51, 6);

// =============================================================================
// Conversions
// =============================================================================

/// Raw 16-bit word as written to GRAM.
#[inline]
pub fn to_raw(color: Rgb565) -> u16 { RawU16::from(color).into_inner() }

/// Color from a raw GRAM word.
#[inline]
pub fn from_raw(raw: u16) -> Rgb565 { Rgb565::from(RawU16::new(raw)) }

/// Packs 8-bit channels into an RGB565 word, dropping the low bits.
#[inline]
pub const fn pack_rgb565(
    r: u8,
    g: u8,
    b: u8,
) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | ((b as u16 & 0xF8) >> 3)
}
