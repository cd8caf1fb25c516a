//! Bitmap text: glyph records, font sources and the string renderer.
//!
//! Glyph records are column-major: each column of `size` rows is packed into
//! `size / 8` bytes, least significant bit at the top. ASCII cells are
//! `size/2 x size` (`size²/16` bytes), GB2312 cells `size x size`
//! (`size²/8` bytes).
//!
//! Two sources produce such records:
//!
//! - [`FontLibrary`] reads them from `0:/fontlib/*.bin` files through a
//!   [`FileSource`], covering ASCII and GB2312
//! - [`ProFontSource`] rasterises the built-in `profont` faces, ASCII only
//!
//! [`Text`] walks a byte string and draws whatever the source returns.
//! A glyph the source cannot supply is skipped; the pen still advances.

use core::convert::Infallible;
use core::fmt::Write;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::{BinaryColor, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text as GlyphText};
use heapless::String;
use profont::{PROFONT_12_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use crate::Error;
use crate::draw::Draw;
use crate::file::FileSource;
use crate::surface::PixelSurface;

/// Largest glyph record (a 40x40 GB2312 cell).
pub const MAX_GLYPH_BYTES: usize = 200;

/// Number of GB2312 cells per row of the code table.
const GB2312_ROW: u32 = 94;

// =============================================================================
// Glyph addressing
// =============================================================================

/// Cell height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontSize {
    Px16,
    Px24,
    Px32,
    Px40,
}

impl FontSize {
    #[inline]
    pub const fn pixels(self) -> u16 {
        match self {
            Self::Px16 => 16,
            Self::Px24 => 24,
            Self::Px32 => 32,
            Self::Px40 => 40,
        }
    }
}

/// Typeface family of the font library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontFace {
    #[default]
    Sans,
    Serif,
}

impl FontFace {
    const fn name(self) -> &'static str {
        match self {
            Self::Sans => "sans",
            Self::Serif => "serif",
        }
    }
}

/// A character to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphCode {
    Ascii(u8),
    /// Two-byte GB2312 code, both bytes `>= 0xA1`.
    Gb2312(u8, u8),
}

impl GlyphCode {
    /// Cell width at `size`.
    #[inline]
    pub const fn advance(
        self,
        size: FontSize,
    ) -> u16 {
        match self {
            Self::Ascii(_) => size.pixels() / 2,
            Self::Gb2312(..) => size.pixels(),
        }
    }

    /// Record length in bytes at `size`.
    #[inline]
    pub const fn record_len(
        self,
        size: FontSize,
    ) -> usize {
        let px = size.pixels() as usize;
        match self {
            Self::Ascii(_) => px * px / 16,
            Self::Gb2312(..) => px * px / 8,
        }
    }

    /// Record number inside its font file, `None` for codes outside the table.
    pub fn record_index(self) -> Option<u32> {
        match self {
            Self::Ascii(ch) => ch.checked_sub(b' ').map(u32::from),
            Self::Gb2312(hi, lo) => {
                let row = hi.checked_sub(0xA1)?;
                let cell = lo.checked_sub(0xA1)?;
                Some(u32::from(row) * GB2312_ROW + u32::from(cell))
            }
        }
    }
}

/// Supplies glyph records.
pub trait FontSource {
    /// Writes the record for `code` into `buf` and returns its length.
    ///
    /// # Errors
    ///
    /// [`Error::GlyphNotFound`] or the file error when the record is
    /// unavailable.
    fn glyph(
        &mut self,
        face: FontFace,
        size: FontSize,
        code: GlyphCode,
        buf: &mut [u8; MAX_GLYPH_BYTES],
    ) -> Result<usize, Error>;
}

impl<F: FontSource + ?Sized> FontSource for &mut F {
    fn glyph(
        &mut self,
        face: FontFace,
        size: FontSize,
        code: GlyphCode,
        buf: &mut [u8; MAX_GLYPH_BYTES],
    ) -> Result<usize, Error> {
        (**self).glyph(face, size, code, buf)
    }
}

// =============================================================================
// Font library files
// =============================================================================

/// Glyph records read from the font library on a file source.
pub struct FontLibrary<F> {
    files: F,
}

impl<F: FileSource> FontLibrary<F> {
    pub const fn new(files: F) -> Self { Self { files } }

    /// Path of the library file holding `code` at `face`/`size`.
    pub fn path(
        face: FontFace,
        size: FontSize,
        code: GlyphCode,
    ) -> String<40> {
        let px = size.pixels();
        let mut path = String::new();
        // 40 bytes hold the longest name, "0:/fontlib/serif_gb2312_40x40.bin".
        let _ = match code {
            GlyphCode::Ascii(_) => write!(path, "0:/fontlib/{}_ascii_{}x{}.bin", face.name(), px / 2, px),
            GlyphCode::Gb2312(..) => write!(path, "0:/fontlib/{}_gb2312_{}x{}.bin", face.name(), px, px),
        };
        path
    }

    pub fn files(&mut self) -> &mut F { &mut self.files }
}

impl<F: FileSource> FontSource for FontLibrary<F> {
    fn glyph(
        &mut self,
        face: FontFace,
        size: FontSize,
        code: GlyphCode,
        buf: &mut [u8; MAX_GLYPH_BYTES],
    ) -> Result<usize, Error> {
        let index = code.record_index().ok_or(Error::GlyphNotFound)?;
        let len = code.record_len(size);
        let path = Self::path(face, size, code);
        let read = self.files.read_at(&path, index * len as u32, &mut buf[..len])?;
        if read < len {
            return Err(Error::GlyphNotFound);
        }
        Ok(len)
    }
}

// =============================================================================
// Built-in ProFont glyphs
// =============================================================================

/// ASCII glyphs rasterised from `profont`, one face for every size.
#[derive(Clone, Copy, Default)]
pub struct ProFontSource;

impl ProFontSource {
    fn font(size: FontSize) -> &'static MonoFont<'static> {
        match size {
            FontSize::Px16 => &PROFONT_12_POINT,
            FontSize::Px24 => &PROFONT_18_POINT,
            FontSize::Px32 | FontSize::Px40 => &PROFONT_24_POINT,
        }
    }
}

/// Draw target that packs pixels into a column-major glyph record.
struct RecordCanvas<'a> {
    record: &'a mut [u8],
    columns: u32,
    rows: u32,
}

impl OriginDimensions for RecordCanvas<'_> {
    fn size(&self) -> Size { Size::new(self.columns, self.rows) }
}

impl DrawTarget for RecordCanvas<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bytes_per_column = (self.rows / 8) as usize;
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x >= self.columns || y >= self.rows || color.is_off() {
                continue;
            }
            let index = x as usize * bytes_per_column + (y / 8) as usize;
            self.record[index] |= 1 << (y % 8);
        }
        Ok(())
    }
}

impl FontSource for ProFontSource {
    fn glyph(
        &mut self,
        _face: FontFace,
        size: FontSize,
        code: GlyphCode,
        buf: &mut [u8; MAX_GLYPH_BYTES],
    ) -> Result<usize, Error> {
        let GlyphCode::Ascii(ch) = code else {
            return Err(Error::GlyphNotFound);
        };
        if !(b' '..=b'~').contains(&ch) {
            return Err(Error::GlyphNotFound);
        }

        let len = code.record_len(size);
        buf[..len].fill(0);
        let font = Self::font(size);
        let cell = Size::new(u32::from(code.advance(size)), u32::from(size.pixels()));
        // Centre the profont cell inside the record cell.
        let offset = Point::new(
            (cell.width.saturating_sub(font.character_size.width) / 2) as i32,
            (cell.height.saturating_sub(font.character_size.height) / 2) as i32,
        );

        let mut canvas = RecordCanvas {
            record: &mut buf[..len],
            columns: cell.width,
            rows: cell.height,
        };
        let utf8 = [ch];
        let text = core::str::from_utf8(&utf8).map_err(|_| Error::GlyphNotFound)?;
        let style = MonoTextStyle::new(font, BinaryColor::On);
        let _ = GlyphText::with_baseline(text, offset, style, Baseline::Top).draw(&mut canvas);
        Ok(len)
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Plots a column-major glyph record with its top-left corner at `(x, y)`.
pub fn draw_glyph<S: PixelSurface + ?Sized>(
    surface: &mut S,
    x: i32,
    y: i32,
    rows: u16,
    record: &[u8],
    color: Rgb565,
) {
    let bytes_per_column = usize::from(rows.div_ceil(8)).max(1);
    for (i, &byte) in record.iter().enumerate() {
        let column = (i / bytes_per_column) as i32;
        let first_row = (i % bytes_per_column) as u16 * 8;
        for bit in 0..8u16 {
            let row = first_row + bit;
            if row >= rows {
                break;
            }
            if byte >> bit & 1 != 0 {
                surface.pixel(x + column, y + i32::from(row), color);
            }
        }
    }
}

/// String renderer bound to a font source, face and size.
pub struct Text<F> {
    fonts: F,
    face: FontFace,
    size: FontSize,
}

impl<F: FontSource> Text<F> {
    pub const fn new(
        fonts: F,
        face: FontFace,
        size: FontSize,
    ) -> Self {
        Self { fonts, face, size }
    }

    pub const fn size(&self) -> FontSize { self.size }

    pub fn set_size(
        &mut self,
        size: FontSize,
    ) {
        self.size = size;
    }

    pub fn set_face(
        &mut self,
        face: FontFace,
    ) {
        self.face = face;
    }

    /// Draws one glyph.
    ///
    /// # Errors
    ///
    /// Whatever the font source reports; nothing is drawn in that case.
    pub fn draw_char<S: PixelSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        x: i32,
        y: i32,
        code: GlyphCode,
        color: Rgb565,
    ) -> Result<(), Error> {
        let mut record = [0u8; MAX_GLYPH_BYTES];
        let len = self.fonts.glyph(self.face, self.size, code, &mut record)?;
        draw_glyph(surface, x, y, self.size.pixels(), &record[..len], color);
        Ok(())
    }

    /// Draws a byte string: bytes below 0x80 are ASCII, others start a
    /// GB2312 pair. Stops at the surface's right edge or a NUL byte.
    ///
    /// Returns the pen position after the last glyph.
    pub fn draw_string<S: PixelSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        x: i32,
        y: i32,
        text: &[u8],
        color: Rgb565,
    ) -> i32 {
        let right = i32::from(surface.width());
        let mut pen = x;
        let mut bytes = text;
        while pen < right {
            let code = match bytes {
                [] | [0, ..] => break,
                [ch, rest @ ..] if *ch < 0x80 => {
                    bytes = rest;
                    GlyphCode::Ascii(*ch)
                }
                [hi, lo, rest @ ..] => {
                    bytes = rest;
                    GlyphCode::Gb2312(*hi, *lo)
                }
                // Dangling lead byte.
                [_] => break,
            };
            // Missing glyphs leave a gap.
            let _ = self.draw_char(surface, pen, y, code, color);
            pen += i32::from(code.advance(self.size));
        }
        pen
    }

    /// Draws a signed decimal number.
    pub fn draw_number<S: PixelSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        x: i32,
        y: i32,
        number: i32,
        color: Rgb565,
    ) -> i32 {
        let mut digits: String<12> = String::new();
        let _ = write!(digits, "{number}");
        self.draw_string(surface, x, y, digits.as_bytes(), color)
    }

    /// Width in pixels of `text` at the current size.
    pub fn measure(
        &self,
        text: &[u8],
    ) -> i32 {
        let ascii = text.iter().take_while(|&&b| b != 0).filter(|&&b| b < 0x80).count() as i32;
        let wide = text.iter().take_while(|&&b| b != 0).filter(|&&b| b >= 0x80).count() as i32 / 2;
        let px = i32::from(self.size.pixels());
        ascii * px / 2 + wide * px
    }
}
