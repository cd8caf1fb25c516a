//! Buffer-backed pixel surface and its bulk flush to the panel.
//!
//! A [`FrameBuffer`] covers one rectangle of the panel (usually a chart) and
//! lives in memory the DMA engine can read, typically external SRAM. Drawing
//! touches only that memory; [`FrameBuffer::flush`] is the one operation that
//! reaches the panel.
//!
//! The flush streams two pixels per 32-bit transfer word. A single transfer
//! moves at most [`MAX_TRANSFER_WORDS`] words, so larger buffers go out in
//! chunks, each waited on for at most [`FLUSH_TIMEOUT_MS`].

use embedded_graphics::pixelcolor::Rgb565;

use crate::Error;
use crate::bus::DisplayBus;
use crate::colors::{from_raw, to_raw};
use crate::controller::DisplayController;
use crate::display::Lcd;
use crate::surface::PixelSurface;

// =============================================================================
// Transfer limits
// =============================================================================

/// Largest single transfer, in 32-bit words (the DMA NDTR limit).
pub const MAX_TRANSFER_WORDS: usize = 0xFFFF;

/// Pixels moved by one full-size transfer.
pub const MAX_TRANSFER_PIXELS: usize = MAX_TRANSFER_WORDS * 2;

/// Bounded wait per chunk before a flush gives up.
pub const FLUSH_TIMEOUT_MS: u32 = 1000;

// =============================================================================
// Block transfer seam
// =============================================================================

/// Moves a run of pixels into the panel's data register.
///
/// The window and write-GRAM command are already set up when `start` is
/// called; the implementation only has to deliver `chunk` in order.
pub trait BlockTransfer<B: DisplayBus> {
    /// Starts moving `chunk` (an even number of pixels) to the panel.
    fn start(
        &mut self,
        bus: &mut B,
        chunk: &[u16],
    );

    /// Waits up to `timeout_ms` for the last started chunk; `false` on timeout.
    fn wait(
        &mut self,
        timeout_ms: u32,
    ) -> bool;
}

/// CPU copy through the bus. Completes inside `start`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolledTransfer;

impl<B: DisplayBus> BlockTransfer<B> for PolledTransfer {
    fn start(
        &mut self,
        bus: &mut B,
        chunk: &[u16],
    ) {
        bus.write_slice(chunk);
    }

    fn wait(
        &mut self,
        _timeout_ms: u32,
    ) -> bool {
        true
    }
}

// =============================================================================
// Frame buffer
// =============================================================================

/// Row-major RGB565 pixels for one panel rectangle.
pub struct FrameBuffer<'a> {
    pixels: &'a mut [u16],
    x: u16,
    y: u16,
    width: u16,
    height: u16,
}

impl<'a> FrameBuffer<'a> {
    /// Binds `memory` to the panel rectangle at `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if `memory` holds fewer than
    /// `width * height` pixels.
    pub fn new(
        memory: &'a mut [u16],
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<Self, Error> {
        let mut fb = Self {
            pixels: memory,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
        fb.rebind(x, y, width, height)?;
        Ok(fb)
    }

    /// Moves the buffer to a new panel rectangle. Contents are kept as-is.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if the rectangle does not fit the memory.
    pub fn rebind(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), Error> {
        if usize::from(width) * usize::from(height) > self.pixels.len() {
            return Err(Error::BufferTooSmall);
        }
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Panel position of the top-left pixel.
    #[inline]
    pub const fn origin(&self) -> (u16, u16) { (self.x, self.y) }

    /// Pixels in use, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u16] { &self.pixels[..self.len()] }

    #[inline]
    fn len(&self) -> usize { usize::from(self.width) * usize::from(self.height) }

    #[inline]
    fn index(
        &self,
        x: u16,
        y: u16,
    ) -> usize {
        usize::from(self.width) * usize::from(y) + usize::from(x)
    }

    /// Sends the whole buffer to its panel rectangle.
    ///
    /// The window is restored to the full panel on every exit.
    ///
    /// # Errors
    ///
    /// [`Error::TransferTimeout`] if a chunk does not complete in
    /// [`FLUSH_TIMEOUT_MS`]; the remaining chunks are not sent.
    pub fn flush<C, T>(
        &self,
        lcd: &mut Lcd<C>,
        transfer: &mut T,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        if self.len() == 0 {
            return Ok(());
        }
        let pixels = self.pixels();
        let (paired, odd) = pixels.split_at(pixels.len() & !1);

        lcd.burst(self.x, self.y, self.width, self.height, |bus| {
            for (chunk_index, chunk) in paired.chunks(MAX_TRANSFER_PIXELS).enumerate() {
                transfer.start(bus, chunk);
                if !transfer.wait(FLUSH_TIMEOUT_MS) {
                    return Err(Error::TransferTimeout { chunk: chunk_index });
                }
            }
            // Trailing pixel of an odd-sized buffer
            bus.write_slice(odd);
            Ok(())
        })
    }
}

impl PixelSurface for FrameBuffer<'_> {
    #[inline]
    fn width(&self) -> u16 { self.width }

    #[inline]
    fn height(&self) -> u16 { self.height }

    #[inline]
    fn write_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
    ) {
        debug_assert!(x < self.width && y < self.height);
        let index = self.index(x, y);
        self.pixels[index] = to_raw(color);
    }

    #[inline]
    fn read_pixel(
        &mut self,
        x: u16,
        y: u16,
    ) -> Rgb565 {
        debug_assert!(x < self.width && y < self.height);
        from_raw(self.pixels[self.index(x, y)])
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        debug_assert!(x + width <= self.width && y + height <= self.height);
        let raw = to_raw(color);
        for row in y..y + height {
            let start = self.index(x, row);
            self.pixels[start..start + usize::from(width)].fill(raw);
        }
    }

    fn clear(
        &mut self,
        color: Rgb565,
    ) {
        let len = self.len();
        self.pixels[..len].fill(to_raw(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLUE, RED};
    use crate::controller::{Ili9341, Orientation};
    use crate::testing::{GramBus, NoDelay, RecordingTransfer};

    fn panel() -> Lcd<Ili9341<GramBus>> {
        let mut lcd = Lcd::new(Ili9341::new(GramBus::new(320, 240)));
        lcd.init(Orientation::Deg270, &mut NoDelay).unwrap();
        lcd
    }

    #[test]
    fn test_new_rejects_small_memory() {
        let mut memory = [0u16; 99];
        assert_eq!(FrameBuffer::new(&mut memory, 0, 0, 10, 10).err(), Some(Error::BufferTooSmall));
    }

    #[test]
    fn test_row_major_layout() {
        let mut memory = [0u16; 12];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 4, 3).unwrap();
        fb.write_pixel(1, 2, RED);
        assert_eq!(fb.pixels()[9], to_raw(RED));
        assert_eq!(fb.read_pixel(1, 2), RED);
    }

    #[test]
    fn test_flush_lands_at_origin() {
        let mut lcd = panel();
        let mut memory = [0u16; 35];
        let mut fb = FrameBuffer::new(&mut memory, 100, 50, 7, 5).unwrap();
        PixelSurface::clear(&mut fb, BLUE);
        fb.write_pixel(6, 4, RED);

        let mut transfer = RecordingTransfer::default();
        fb.flush(&mut lcd, &mut transfer).unwrap();

        // 35 pixels: one 34-pixel chunk plus the trailing odd pixel on the bus
        assert_eq!(transfer.chunks, vec![34]);
        let bus = lcd.controller().bus();
        assert_eq!(bus.pixel(100, 50), to_raw(BLUE));
        assert_eq!(bus.pixel(106, 54), to_raw(RED));
        assert_eq!(bus.pixel(107, 54), 0);
        assert_eq!(bus.window(), (0, 0, 320, 240));
    }

    #[test]
    fn test_flush_chunks_large_buffer() {
        let mut lcd = Lcd::new(Ili9341::new(GramBus::new(800, 480)));
        let mut memory = vec![0u16; 500 * 400];
        let fb = FrameBuffer::new(&mut memory, 0, 0, 500, 400).unwrap();
        let mut transfer = RecordingTransfer::default();
        fb.flush(&mut lcd, &mut transfer).unwrap();
        // 200000 pixels = 100000 words: one full chunk plus the remainder
        assert_eq!(transfer.chunks, vec![MAX_TRANSFER_PIXELS, 200_000 - MAX_TRANSFER_PIXELS]);
    }

    #[test]
    fn test_flush_timeout_reports_chunk_and_restores() {
        let mut lcd = panel();
        let mut memory = [0u16; 64];
        let fb = FrameBuffer::new(&mut memory, 0, 0, 8, 8).unwrap();
        let mut transfer = RecordingTransfer {
            stall_at: Some(0),
            ..Default::default()
        };
        assert_eq!(fb.flush(&mut lcd, &mut transfer), Err(Error::TransferTimeout { chunk: 0 }));
        assert_eq!(lcd.controller().bus().window(), (0, 0, 320, 240));
    }

    #[test]
    fn test_polled_transfer_matches() {
        let mut lcd = panel();
        let mut memory = [0u16; 4];
        let mut fb = FrameBuffer::new(&mut memory, 2, 2, 2, 2).unwrap();
        fb.write_pixel(1, 1, RED);
        fb.flush(&mut lcd, &mut PolledTransfer).unwrap();
        assert_eq!(lcd.controller().bus().pixel(3, 3), to_raw(RED));
    }
}
