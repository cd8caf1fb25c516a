//! BMP and raw RGB565 image blits.
//!
//! Only what the panels need: uncompressed 16-bit (RGB565, copied as is) and
//! 24-bit (BGR, packed down to RGB565) images. Rows are stored bottom-up
//! unless the header height is negative. Every image is validated before
//! the first pixel is written.

use embedded_graphics::pixelcolor::Rgb565;

use crate::Error;
use crate::colors::{from_raw, pack_rgb565};
use crate::file::FileSource;
use crate::surface::PixelSurface;

/// `"BM"` read as a little-endian word.
pub const BMP_MAGIC: u16 = 0x4D42;

/// File header plus `BITMAPINFOHEADER`.
pub const HEADER_LEN: usize = 14 + 40;

/// Longest row a file blit buffers (an 800-pixel 24-bit row).
pub const MAX_ROW_BYTES: usize = 2400;

// =============================================================================
// Header
// =============================================================================

/// The fields of the two BMP headers the blitter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    /// `bfOffBits`: start of the pixel array.
    pub data_offset: u32,
    pub width: u32,
    /// `biHeight`; negative for top-down images.
    pub height: i32,
    pub bit_count: u16,
}

#[inline]
fn le_u16(
    bytes: &[u8],
    at: usize,
) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
fn le_u32(
    bytes: &[u8],
    at: usize,
) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl BmpHeader {
    /// Parses the first [`HEADER_LEN`] bytes of a BMP file.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBitmap`] if the magic is not `BM`
    /// - [`Error::TruncatedImage`] if the headers are cut short
    /// - [`Error::UnsupportedBitDepth`] for anything but 16 or 24 bits
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 2 || le_u16(bytes, 0) != BMP_MAGIC {
            return Err(Error::InvalidBitmap);
        }
        if bytes.len() < HEADER_LEN {
            return Err(Error::TruncatedImage);
        }

        let header = Self {
            data_offset: le_u32(bytes, 10),
            width: le_u32(bytes, 18),
            height: le_u32(bytes, 22) as i32,
            bit_count: le_u16(bytes, 28),
        };
        match header.bit_count {
            16 | 24 => {}
            other => return Err(Error::UnsupportedBitDepth(other)),
        }
        header.data_end().ok_or(Error::TruncatedImage)?;
        Ok(header)
    }

    /// Row length in bytes before it is narrowed to `usize`.
    #[inline]
    const fn wide_stride(&self) -> u64 { (self.width as u64 * self.bit_count as u64).div_ceil(32) * 4 }

    /// Bytes per stored row, padded to four.
    ///
    /// Only meaningful for headers accepted by [`BmpHeader::parse`].
    #[inline]
    pub const fn stride(&self) -> usize { self.wide_stride() as usize }

    #[inline]
    pub const fn rows(&self) -> u32 { self.height.unsigned_abs() }

    /// File offset one past the pixel array, or `None` if it does not fit a
    /// 32-bit file offset.
    pub fn data_end(&self) -> Option<usize> {
        let end = self
            .wide_stride()
            .checked_mul(u64::from(self.rows()))?
            .checked_add(u64::from(self.data_offset))?;
        let end = u32::try_from(end).ok()?;
        usize::try_from(end).ok()
    }

    /// File offset of the row displayed at `row` (0 = top).
    ///
    /// `row` must be below [`BmpHeader::rows`] of a parsed header.
    pub fn row_offset(
        &self,
        row: u32,
    ) -> usize {
        let stored = if self.height < 0 { row } else { self.rows() - 1 - row };
        self.data_offset as usize + stored as usize * self.stride()
    }

    /// Decodes one stored row into colors.
    pub fn decode_row(
        self,
        row: &[u8],
    ) -> impl Iterator<Item = Rgb565> + '_ {
        let bytes_per_pixel = usize::from(self.bit_count / 8);
        let depth = self.bit_count;
        row.chunks_exact(bytes_per_pixel)
            .take(self.width as usize)
            .map(move |px| match depth {
                16 => from_raw(u16::from_le_bytes([px[0], px[1]])),
                _ => from_raw(pack_rgb565(px[2], px[1], px[0])),
            })
    }
}

// =============================================================================
// Blits
// =============================================================================

/// Surface row of image row `row`, `None` once it falls below the surface.
fn surface_row<S: PixelSurface + ?Sized>(
    surface: &S,
    y: i32,
    row: u32,
) -> Option<i32> {
    let row_y = y.checked_add(i32::try_from(row).ok()?)?;
    (row_y < i32::from(surface.height())).then_some(row_y)
}

/// Writes one row of pixels clipped to the surface.
fn blit_row<S, I>(
    surface: &mut S,
    x: i32,
    y: i32,
    width: u32,
    pixels: I,
) where
    S: PixelSurface + ?Sized,
    I: Iterator<Item = Rgb565>,
{
    if y < 0 || y >= i32::from(surface.height()) {
        return;
    }
    let skip = (-x).max(0) as u32;
    let right = (i64::from(x) + i64::from(width)).min(i64::from(surface.width()));
    let start = x.max(0);
    if i64::from(start) >= right {
        return;
    }
    let visible = (right - i64::from(start)) as u16;
    surface.write_rect(start as u16, y as u16, visible, 1, pixels.skip(skip as usize));
}

/// Draws an in-memory BMP image with its top-left corner at `(x, y)`.
///
/// # Errors
///
/// Header errors from [`BmpHeader::parse`], or [`Error::TruncatedImage`] if
/// the pixel array is short. Nothing is drawn on error.
pub fn draw_bmp<S: PixelSurface + ?Sized>(
    surface: &mut S,
    x: i32,
    y: i32,
    data: &[u8],
) -> Result<BmpHeader, Error> {
    let header = BmpHeader::parse(data)?;
    let end = header.data_end().ok_or(Error::TruncatedImage)?;
    if data.len() < end {
        return Err(Error::TruncatedImage);
    }
    let stride = header.stride();
    let rows = header.rows();

    let row_bytes = move |row: u32| {
        let start = header.row_offset(row);
        &data[start..start + stride]
    };

    let fits = x >= 0
        && y >= 0
        && i64::from(x) + i64::from(header.width) <= i64::from(surface.width())
        && i64::from(y) + i64::from(rows) <= i64::from(surface.height());
    if fits {
        let pixels = (0..rows).flat_map(move |row| header.decode_row(row_bytes(row)));
        surface.write_rect(x as u16, y as u16, header.width as u16, rows as u16, pixels);
    } else {
        for row in 0..rows {
            let Some(row_y) = surface_row(surface, y, row) else { break };
            blit_row(surface, x, row_y, header.width, header.decode_row(row_bytes(row)));
        }
    }
    Ok(header)
}

/// Draws a BMP file row by row.
///
/// # Errors
///
/// File errors, header errors, [`Error::TruncatedImage`] for rows longer
/// than [`MAX_ROW_BYTES`] or a file that ends early. Rows already drawn stay.
pub fn draw_bmp_file<S, F>(
    surface: &mut S,
    files: &mut F,
    path: &str,
    x: i32,
    y: i32,
) -> Result<BmpHeader, Error>
where
    S: PixelSurface + ?Sized,
    F: FileSource + ?Sized,
{
    let mut head = [0u8; HEADER_LEN];
    let read = files.read_at(path, 0, &mut head)?;
    let header = BmpHeader::parse(&head[..read])?;
    let stride = header.stride();
    if stride > MAX_ROW_BYTES {
        return Err(Error::TruncatedImage);
    }

    let mut line = [0u8; MAX_ROW_BYTES];
    for row in 0..header.rows() {
        let Some(row_y) = surface_row(surface, y, row) else { break };
        let line = &mut line[..stride];
        files.read_exact_at(path, header.row_offset(row) as u32, line)?;
        blit_row(surface, x, row_y, header.width, header.decode_row(line));
    }
    Ok(header)
}

/// Draws a headerless stream of little-endian RGB565 words.
///
/// # Errors
///
/// [`Error::TruncatedImage`] if `bytes` holds fewer than `width * height`
/// pixels; nothing is drawn in that case.
pub fn draw_rgb16<S: PixelSurface + ?Sized>(
    surface: &mut S,
    x: i32,
    y: i32,
    width: u16,
    height: u16,
    bytes: &[u8],
) -> Result<(), Error> {
    let row_len = usize::from(width) * 2;
    if bytes.len() < row_len * usize::from(height) {
        return Err(Error::TruncatedImage);
    }
    for (row, line) in bytes.chunks_exact(row_len.max(1)).take(usize::from(height)).enumerate() {
        let pixels = line.chunks_exact(2).map(|px| from_raw(u16::from_le_bytes([px[0], px[1]])));
        blit_row(surface, x, y + row as i32, u32::from(width), pixels);
    }
    Ok(())
}

/// Streams a raw RGB565 file one row at a time.
///
/// # Errors
///
/// File errors, or [`Error::TruncatedImage`] when a row is wider than
/// [`MAX_ROW_BYTES`] or the file ends early. Rows already drawn stay.
pub fn draw_rgb16_file<S, F>(
    surface: &mut S,
    files: &mut F,
    path: &str,
    x: i32,
    y: i32,
    width: u16,
    height: u16,
) -> Result<(), Error>
where
    S: PixelSurface + ?Sized,
    F: FileSource + ?Sized,
{
    let row_len = usize::from(width) * 2;
    if row_len > MAX_ROW_BYTES {
        return Err(Error::TruncatedImage);
    }
    let mut line = [0u8; MAX_ROW_BYTES];
    for row in 0..u32::from(height) {
        let line = &mut line[..row_len];
        files.read_exact_at(path, row * row_len as u32, line)?;
        let pixels = line.chunks_exact(2).map(|px| from_raw(u16::from_le_bytes([px[0], px[1]])));
        blit_row(surface, x, y + row as i32, u32::from(width), pixels);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLACK, BLUE, RED, WHITE, to_raw};
    use crate::display::Lcd;
    use crate::file::StaticFiles;
    use crate::framebuffer::FrameBuffer;
    use crate::controller::{DisplayController, Ili9341};
    use crate::testing::GramBus;

    /// Builds a BMP with rows given top to bottom as RGB565 words.
    fn bmp(
        bit_count: u16,
        width: u32,
        rows: &[&[u16]],
    ) -> Vec<u8> {
        let header = BmpHeader {
            data_offset: HEADER_LEN as u32,
            width,
            height: rows.len() as i32,
            bit_count,
        };
        let stride = header.stride();
        let mut data = vec![0u8; HEADER_LEN];
        data[0..2].copy_from_slice(&BMP_MAGIC.to_le_bytes());
        data[10..14].copy_from_slice(&(HEADER_LEN as u32).to_le_bytes());
        data[14..18].copy_from_slice(&40u32.to_le_bytes());
        data[18..22].copy_from_slice(&width.to_le_bytes());
        data[22..26].copy_from_slice(&(rows.len() as i32).to_le_bytes());
        data[28..30].copy_from_slice(&bit_count.to_le_bytes());
        for row in rows.iter().rev() {
            let mut line = Vec::new();
            for &px in row.iter() {
                if bit_count == 16 {
                    line.extend_from_slice(&px.to_le_bytes());
                } else {
                    let r = ((px >> 11) << 3) as u8;
                    let g = (((px >> 5) & 0x3F) << 2) as u8;
                    let b = ((px & 0x1F) << 3) as u8;
                    line.extend_from_slice(&[b, g, r]);
                }
            }
            line.resize(stride, 0);
            data.extend_from_slice(&line);
        }
        data
    }

    #[test]
    fn test_stride_padding() {
        let header = BmpHeader {
            data_offset: 54,
            width: 3,
            height: 2,
            bit_count: 24,
        };
        assert_eq!(header.stride(), 12);
        assert_eq!(BmpHeader { bit_count: 16, ..header }.stride(), 8);
        assert_eq!(header.row_offset(0), 54 + 12);
        assert_eq!(BmpHeader { height: -2, ..header }.row_offset(0), 54);
    }

    #[test]
    fn test_bad_magic_writes_nothing() {
        let mut data = bmp(16, 2, &[&[0xFFFF, 0xFFFF]]);
        data[0] = b'X';
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 2, 2).unwrap();
        assert_eq!(draw_bmp(&mut fb, 0, 0, &data), Err(Error::InvalidBitmap));
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_oversized_header_is_rejected() {
        let mut data = bmp(24, 1, &[&[0]]);
        data[18..22].copy_from_slice(&u32::MAX.to_le_bytes());
        data[22..26].copy_from_slice(&i32::MAX.to_le_bytes());
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 2, 2).unwrap();
        assert_eq!(draw_bmp(&mut fb, 0, 0, &data), Err(Error::TruncatedImage));
        assert!(fb.pixels().iter().all(|&p| p == 0));

        let table = [("0:/huge.bmp", data.as_slice())];
        let mut files = StaticFiles::new(&table);
        assert_eq!(draw_bmp_file(&mut fb, &mut files, "0:/huge.bmp", 0, 0), Err(Error::TruncatedImage));
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_short_pixel_array_writes_nothing() {
        let white = to_raw(WHITE);
        let mut data = bmp(16, 2, &[&[white, white], &[white, white]]);
        data.truncate(data.len() - 2);
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 2, 2).unwrap();
        assert_eq!(draw_bmp(&mut fb, 0, 0, &data), Err(Error::TruncatedImage));
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_bmp_file_row_too_wide() {
        let row = [to_raw(WHITE); 1000];
        let data = bmp(24, 1000, &[&row]);
        let table = [("0:/wide.bmp", data.as_slice())];
        let mut files = StaticFiles::new(&table);
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 2, 2).unwrap();
        assert_eq!(draw_bmp_file(&mut fb, &mut files, "0:/wide.bmp", 0, 0), Err(Error::TruncatedImage));
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_unsupported_depth() {
        let mut data = bmp(16, 1, &[&[0]]);
        data[28] = 8;
        assert_eq!(BmpHeader::parse(&data), Err(Error::UnsupportedBitDepth(8)));
    }

    #[test]
    fn test_bottom_up_rows_land_top_down() {
        let red = to_raw(RED);
        let blue = to_raw(BLUE);
        let data = bmp(24, 3, &[&[red, red, red], &[blue, BLACK_RAW, blue]]);
        let mut memory = [0u16; 9];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 3, 3).unwrap();
        draw_bmp(&mut fb, 0, 1, &data).unwrap();
        assert_eq!(fb.read_pixel(0, 1), RED);
        assert_eq!(fb.read_pixel(0, 2), BLUE);
        assert_eq!(fb.read_pixel(1, 2), BLACK);
        assert_eq!(fb.read_pixel(0, 0), BLACK);
    }

    const BLACK_RAW: u16 = 0x0000;

    #[test]
    fn test_partially_visible_bmp_clips() {
        let data = bmp(16, 2, &[&[1, 2], &[3, 4]]);
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 2, 2).unwrap();
        draw_bmp(&mut fb, -1, 1, &data).unwrap();
        assert_eq!(fb.pixels(), &[0, 0, 2, 0]);
    }

    #[test]
    fn test_bmp_file_on_panel_restores_window() {
        let white = to_raw(WHITE);
        let data = bmp(16, 2, &[&[white, 0], &[0, white]]);
        let table = [("0:/logo.bmp", data.as_slice())];
        let mut files = StaticFiles::new(&table);

        let mut lcd = Lcd::new(Ili9341::new(GramBus::new(320, 240)));
        draw_bmp_file(&mut lcd, &mut files, "0:/logo.bmp", 10, 20).unwrap();
        let bus = lcd.controller().bus();
        assert_eq!(bus.pixel(10, 20), white);
        assert_eq!(bus.pixel(11, 21), white);
        assert_eq!(bus.pixel(11, 20), 0);
        assert_eq!(bus.window(), (0, 0, 320, 240));
    }

    #[test]
    fn test_rgb16_stream() {
        let bytes: Vec<u8> = [5u16, 6, 7, 8].iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 2, 2).unwrap();
        assert_eq!(draw_rgb16(&mut fb, 0, 0, 2, 3, &bytes), Err(Error::TruncatedImage));
        draw_rgb16(&mut fb, 0, 0, 2, 2, &bytes).unwrap();
        assert_eq!(fb.pixels(), &[5, 6, 7, 8]);

        let table = [("0:/img.rgb16", bytes.as_slice())];
        let mut files = StaticFiles::new(&table);
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 2, 2).unwrap();
        draw_rgb16_file(&mut fb, &mut files, "0:/img.rgb16", 1, 0, 2, 2).unwrap();
        assert_eq!(fb.pixels(), &[0, 5, 0, 7]);
    }
}
