//! Curve chart with incremental erase.
//!
//! A chart is a gridded plot area. Each frame the caller erases the previous
//! curve with [`CurveChart::recover_grid`] and draws the new one with
//! [`CurveChart::draw_curve`]; only the pixels the curves cover are touched.
//! Erasing recomputes each pixel from the grid rule
//! ([`CurveChart::recover_color`]), which is the same rule
//! [`CurveChart::paint`] uses, so an erased pixel is indistinguishable from
//! a freshly painted one.
//!
//! All drawing methods take the chart-local surface (see
//! [`crate::screen::Screen::plot`]). Values are measured upwards: value `v`
//! sits on row `height - 1 - v`. Positions outside the chart are skipped
//! without error.

use embedded_graphics::pixelcolor::Rgb565;

use crate::Error;
use crate::controller::DisplayController;
use crate::draw::Draw;
use crate::framebuffer::BlockTransfer;
use crate::screen::Screen;
use crate::surface::PixelSurface;

/// Dashed lines repeat this many pixels...
const DASH_PERIOD: u16 = 6;
/// ...of which the first this many are drawn.
const DASH_ON: u16 = 4;

/// Geometry and colors of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartConfig {
    /// Panel position of the top-left plot pixel.
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub coarse_grid_width: u16,
    pub coarse_grid_height: u16,
    pub fine_grid_width: u16,
    pub fine_grid_height: u16,
    pub border_color: Rgb565,
    pub background_color: Rgb565,
    pub coarse_grid_color: Rgb565,
    pub fine_grid_color: Rgb565,
}

/// A validated chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveChart {
    config: ChartConfig,
}

#[inline]
fn is_dash(position: u16) -> bool { position % DASH_PERIOD < DASH_ON }

impl CurveChart {
    /// # Errors
    ///
    /// [`Error::EmptyChart`] for a zero width or height,
    /// [`Error::ZeroGridPitch`] for any zero pitch.
    pub fn new(config: ChartConfig) -> Result<Self, Error> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::EmptyChart);
        }
        let pitches = [
            config.coarse_grid_width,
            config.coarse_grid_height,
            config.fine_grid_width,
            config.fine_grid_height,
        ];
        if pitches.contains(&0) {
            return Err(Error::ZeroGridPitch);
        }
        Ok(Self { config })
    }

    #[inline]
    pub const fn config(&self) -> &ChartConfig { &self.config }

    #[inline]
    pub const fn width(&self) -> u16 { self.config.width }

    #[inline]
    pub const fn height(&self) -> u16 { self.config.height }

    /// Row showing value `value`, `None` above the chart.
    #[inline]
    pub const fn row_of(
        &self,
        value: u16,
    ) -> Option<u16> {
        if value < self.config.height { Some(self.config.height - 1 - value) } else { None }
    }

    /// Color the grid has at `(x, y)` with nothing drawn over it.
    ///
    /// Coarse lines win over fine lines, fine lines over the background.
    #[inline]
    pub fn recover_color(
        &self,
        x: u16,
        y: u16,
    ) -> Rgb565 {
        let c = &self.config;
        if x % c.coarse_grid_width == 0 || y % c.coarse_grid_height == 0 {
            c.coarse_grid_color
        } else if x % c.fine_grid_width == 0 || y % c.fine_grid_height == 0 {
            c.fine_grid_color
        } else {
            c.background_color
        }
    }

    // =========================================================================
    // Whole-chart painting
    // =========================================================================

    /// Paints background and grid over the whole chart.
    ///
    /// Fine lines go down first so the coarse lines are never covered.
    pub fn paint<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
    ) {
        let c = &self.config;
        surface.fill(0, 0, c.width, c.height, c.background_color);
        self.paint_grid(surface, c.fine_grid_width, c.fine_grid_height, c.fine_grid_color);
        self.paint_grid(surface, c.coarse_grid_width, c.coarse_grid_height, c.coarse_grid_color);
    }

    fn paint_grid<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        pitch_x: u16,
        pitch_y: u16,
        color: Rgb565,
    ) {
        let c = &self.config;
        for row in (0..c.height).step_by(usize::from(pitch_y)) {
            surface.hline(0, i32::from(row), c.width, color);
        }
        for column in (0..c.width).step_by(usize::from(pitch_x)) {
            surface.vline(i32::from(column), 0, c.height, color);
        }
    }

    /// Draws the border on the panel, binds the plot area and paints the grid.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if the screen's framebuffer cannot hold the
    /// chart, or a flush timeout.
    pub fn init<C, T>(
        &self,
        screen: &mut Screen<'_, C, T>,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let c = &self.config;
        screen
            .lcd()
            .rect(i32::from(c.x) - 1, i32::from(c.y) - 1, c.width + 2, c.height + 2, c.border_color);
        screen.attach(c.x, c.y, c.width, c.height)?;
        self.paint(&mut screen.plot());
        screen.present()
    }

    /// Shows what was drawn since the last update.
    ///
    /// # Errors
    ///
    /// Flush timeout of a buffered screen.
    pub fn frame_update<C, T>(
        &self,
        screen: &mut Screen<'_, C, T>,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        screen.present()
    }

    // =========================================================================
    // Curves
    // =========================================================================

    /// Top row and length of the run joining two adjacent samples.
    fn column_span(
        &self,
        a: u16,
        b: u16,
    ) -> Option<(u16, u16)> {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let bottom = self.row_of(low)?;
        let top = self.row_of(high.min(self.config.height - 1))?;
        Some((top, bottom - top + 1))
    }

    /// Visits the run of every column that has a next sample.
    fn for_each_span(
        &self,
        samples: &[u16],
        mut visit: impl FnMut(u16, u16, u16),
    ) {
        let count = samples.len().min(usize::from(self.config.width));
        for (column, pair) in samples[..count].windows(2).enumerate() {
            if let Some((top, length)) = self.column_span(pair[0], pair[1]) {
                visit(column as u16, top, length);
            }
        }
    }

    /// Draws `samples` as one vertical run per column.
    ///
    /// Column `i` joins `samples[i]` and `samples[i + 1]`. A pair whose lower
    /// value is above the chart is skipped; a higher value above the chart
    /// is clamped to the top row.
    pub fn draw_curve<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        samples: &[u16],
        color: Rgb565,
    ) {
        self.for_each_span(samples, |column, top, length| {
            surface.vline(i32::from(column), i32::from(top), length, color);
        });
    }

    /// Erases a curve drawn by [`CurveChart::draw_curve`] with the same
    /// samples, restoring the grid under it.
    pub fn recover_grid<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        samples: &[u16],
    ) {
        self.for_each_span(samples, |column, top, length| {
            if !surface.contains(i32::from(column), i32::from(top + length - 1)) {
                return;
            }
            let colors = (top..top + length).map(|row| self.recover_color(column, row));
            surface.write_rect(column, top, 1, length, colors);
        });
    }

    // =========================================================================
    // Cursor lines
    // =========================================================================

    /// Full-height line at column `x`.
    pub fn draw_line_x<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        x: u16,
        color: Rgb565,
    ) {
        if x < self.config.width {
            surface.vline(i32::from(x), 0, self.config.height, color);
        }
    }

    /// Full-height dashed line at column `x`.
    pub fn draw_dashed_line_x<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        x: u16,
        color: Rgb565,
    ) {
        if x >= self.config.width {
            return;
        }
        for row in (0..self.config.height).filter(|&row| is_dash(row)) {
            surface.pixel(i32::from(x), i32::from(row), color);
        }
    }

    /// Full-width line at value `y`.
    pub fn draw_line_y<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        y: u16,
        color: Rgb565,
    ) {
        if let Some(row) = self.row_of(y) {
            surface.hline(0, i32::from(row), self.config.width, color);
        }
    }

    /// Full-width dashed line at value `y`.
    pub fn draw_dashed_line_y<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        y: u16,
        color: Rgb565,
    ) {
        let Some(row) = self.row_of(y) else { return };
        for column in (0..self.config.width).filter(|&column| is_dash(column)) {
            surface.pixel(i32::from(column), i32::from(row), color);
        }
    }

    /// Erases a solid or dashed line at column `x`.
    pub fn recover_line_x<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        x: u16,
    ) {
        let height = self.config.height;
        if x >= self.config.width || !surface.contains(i32::from(x), i32::from(height) - 1) {
            return;
        }
        surface.write_rect(x, 0, 1, height, (0..height).map(|row| self.recover_color(x, row)));
    }

    /// Erases a solid or dashed line at value `y`.
    pub fn recover_line_y<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        y: u16,
    ) {
        let width = self.config.width;
        let Some(row) = self.row_of(y) else { return };
        if !surface.contains(i32::from(width) - 1, i32::from(row)) {
            return;
        }
        surface.write_rect(0, row, width, 1, (0..width).map(|column| self.recover_color(column, row)));
    }

    // =========================================================================
    // Sprites
    // =========================================================================

    /// Overlays a sprite whose top-left corner is at column `x`, value `y`.
    ///
    /// The top sprite row lands on [`CurveChart::row_of`]`(y)`, the same row
    /// [`CurveChart::draw_line_y`] uses for `y`, and the sprite extends
    /// downward from there. A sprite at value 0 therefore starts on the
    /// bottom row. Values at or above the chart height draw nothing.
    ///
    /// Black sprite pixels are transparent.
    pub fn draw_bitmap<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        sprite: &[u16],
    ) {
        if let Some(row) = self.row_of(y) {
            surface.keyed_bitmap(i32::from(x), i32::from(row), width, height, sprite);
        }
    }

    /// Erases a sprite drawn by [`CurveChart::draw_bitmap`], using the same
    /// row mapping.
    pub fn recover_rect<S: PixelSurface + ?Sized>(
        &self,
        surface: &mut S,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) {
        let Some(top) = self.row_of(y) else { return };
        let right = x.saturating_add(width).min(self.config.width);
        let bottom = top.saturating_add(height).min(self.config.height);
        for row in top..bottom {
            for column in x..right {
                surface.pixel(i32::from(column), i32::from(row), self.recover_color(column, row));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLACK, DARKGRAY, GRAY, RED, WHITE, YELLOW, to_raw};
    use crate::controller::{Ili9341, Orientation};
    use crate::display::Lcd;
    use crate::framebuffer::FrameBuffer;
    use crate::testing::{GramBus, NoDelay, RecordingTransfer};

    fn config(
        width: u16,
        height: u16,
    ) -> ChartConfig {
        ChartConfig {
            x: 0,
            y: 0,
            width,
            height,
            coarse_grid_width: 50,
            coarse_grid_height: 50,
            fine_grid_width: 10,
            fine_grid_height: 10,
            border_color: WHITE,
            background_color: BLACK,
            coarse_grid_color: GRAY,
            fine_grid_color: DARKGRAY,
        }
    }

    fn painted(
        chart: &CurveChart,
        memory: &mut Vec<u16>,
    ) {
        let mut fb = FrameBuffer::new(memory, 0, 0, chart.width(), chart.height()).unwrap();
        chart.paint(&mut fb);
    }

    #[test]
    fn test_new_validates() {
        let mut bad = config(256, 200);
        bad.fine_grid_height = 0;
        assert_eq!(CurveChart::new(bad), Err(Error::ZeroGridPitch));
        assert_eq!(CurveChart::new(config(0, 200)), Err(Error::EmptyChart));
        assert!(CurveChart::new(config(256, 200)).is_ok());
    }

    #[test]
    fn test_reference_chart_pixels() {
        let chart = CurveChart::new(config(256, 200)).unwrap();
        let mut memory = vec![0u16; 256 * 200];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 256, 200).unwrap();
        chart.paint(&mut fb);
        assert_eq!(fb.read_pixel(50, 100), GRAY);
        assert_eq!(fb.read_pixel(10, 15), DARKGRAY);
        assert_eq!(fb.read_pixel(7, 13), BLACK);
    }

    #[test]
    fn test_recover_color_matches_paint_everywhere() {
        let mut cfg = config(256, 200);
        cfg.coarse_grid_height = 40;
        cfg.fine_grid_width = 7;
        let chart = CurveChart::new(cfg).unwrap();
        let mut memory = vec![0u16; 256 * 200];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 256, 200).unwrap();
        chart.paint(&mut fb);
        for y in 0..200 {
            for x in 0..256 {
                assert_eq!(fb.read_pixel(x, y), chart.recover_color(x, y), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_draw_then_recover_restores_grid() {
        let chart = CurveChart::new(config(256, 200)).unwrap();
        let mut fresh = vec![0u16; 256 * 200];
        painted(&chart, &mut fresh);

        let samples: Vec<u16> = (0..256u16).map(|i| (i * 37) % 260).collect();
        let mut memory = fresh.clone();
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 256, 200).unwrap();
        chart.draw_curve(&mut fb, &samples, RED);
        assert_ne!(fb.pixels(), fresh.as_slice());
        chart.recover_grid(&mut fb, &samples);
        assert_eq!(fb.pixels(), fresh.as_slice());
    }

    #[test]
    fn test_curve_clipping() {
        let chart = CurveChart::new(config(4, 20)).unwrap();
        let mut memory = vec![0u16; 4 * 20];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 4, 20).unwrap();
        fb.clear(BLACK);
        // Column 0: both above the chart. Column 1: 5 -> 30 clamps to the top.
        chart.draw_curve(&mut fb, &[25, 30, 5, 5], RED);
        assert!((0..20).all(|row| fb.read_pixel(0, row) == BLACK));
        assert_eq!(fb.read_pixel(1, 0), RED);
        assert_eq!(fb.read_pixel(1, 14), RED);
        assert_eq!(fb.read_pixel(1, 15), BLACK);
        // Column 2: flat pair draws one pixel; the last column has no partner.
        assert_eq!((0..20).filter(|&row| fb.read_pixel(2, row) == RED).count(), 1);
        assert!((0..20).all(|row| fb.read_pixel(3, row) == BLACK));
    }

    #[test]
    fn test_dashed_pattern() {
        let chart = CurveChart::new(config(12, 12)).unwrap();
        let mut memory = vec![0u16; 12 * 12];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 12, 12).unwrap();
        fb.clear(BLACK);
        chart.draw_dashed_line_y(&mut fb, 3, YELLOW);
        let on: Vec<u16> = (0..12).filter(|&x| fb.read_pixel(x, 8) == YELLOW).collect();
        assert_eq!(on, vec![0, 1, 2, 3, 6, 7, 8, 9]);

        chart.draw_dashed_line_x(&mut fb, 5, YELLOW);
        let on: Vec<u16> = (0..12).filter(|&y| fb.read_pixel(5, y) == YELLOW).collect();
        assert_eq!(on, vec![0, 1, 2, 3, 6, 7, 8, 9]);
    }

    #[test]
    fn test_recover_lines_keep_grid() {
        let chart = CurveChart::new(config(100, 100)).unwrap();
        let mut fresh = vec![0u16; 100 * 100];
        painted(&chart, &mut fresh);
        let mut memory = fresh.clone();
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 100, 100).unwrap();

        chart.draw_line_x(&mut fb, 50, YELLOW);
        chart.draw_dashed_line_y(&mut fb, 49, YELLOW);
        chart.draw_line_y(&mut fb, 0, YELLOW);
        assert_eq!(fb.read_pixel(50, 10), YELLOW);
        assert_eq!(fb.read_pixel(0, 99), YELLOW);

        chart.recover_line_x(&mut fb, 50);
        chart.recover_line_y(&mut fb, 49);
        chart.recover_line_y(&mut fb, 0);
        assert_eq!(fb.pixels(), fresh.as_slice());
    }

    #[test]
    fn test_out_of_range_lines_are_skipped() {
        let chart = CurveChart::new(config(10, 10)).unwrap();
        let mut memory = vec![0u16; 100];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 10, 10).unwrap();
        chart.draw_line_x(&mut fb, 10, RED);
        chart.draw_line_y(&mut fb, 10, RED);
        chart.draw_dashed_line_x(&mut fb, 99, RED);
        chart.recover_line_y(&mut fb, 10);
        chart.draw_bitmap(&mut fb, 0, 10, 1, 1, &[0xFFFF]);
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_sprite_overlay_and_recover() {
        let chart = CurveChart::new(config(100, 100)).unwrap();
        let mut fresh = vec![0u16; 100 * 100];
        painted(&chart, &mut fresh);
        let mut memory = fresh.clone();
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 100, 100).unwrap();

        let white = to_raw(WHITE);
        let sprite = [white, 0, white, 0, white, 0];
        // Top-left at value 50 -> row 49; two pixels hang past the right edge.
        chart.draw_bitmap(&mut fb, 98, 50, 3, 2, &sprite);
        assert_eq!(fb.read_pixel(98, 49), WHITE);
        assert_eq!(fb.read_pixel(99, 49), chart.recover_color(99, 49));
        assert_eq!(fb.read_pixel(99, 50), WHITE);

        chart.recover_rect(&mut fb, 98, 50, 3, 2);
        assert_eq!(fb.pixels(), fresh.as_slice());
    }

    #[test]
    fn test_sprite_rows_match_value_lines() {
        let chart = CurveChart::new(config(10, 10)).unwrap();
        let mut memory = vec![0u16; 100];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 10, 10).unwrap();
        let white = to_raw(WHITE);

        chart.draw_bitmap(&mut fb, 2, 0, 1, 2, &[white, white]);
        assert_eq!(fb.read_pixel(2, 9), WHITE);
        assert_eq!(fb.read_pixel(2, 8), BLACK);

        chart.draw_line_y(&mut fb, 9, RED);
        chart.draw_bitmap(&mut fb, 5, 9, 1, 1, &[white]);
        assert_eq!(fb.read_pixel(4, 0), RED);
        assert_eq!(fb.read_pixel(5, 0), WHITE);
    }

    #[test]
    fn test_init_direct_and_buffered_agree() {
        let mut cfg = config(100, 60);
        cfg.x = 40;
        cfg.y = 30;
        let chart = CurveChart::new(cfg).unwrap();
        let samples: Vec<u16> = (0..100).map(|i| (i * 3) % 70).collect();

        let mut direct_lcd = Lcd::new(Ili9341::new(GramBus::new(320, 240)));
        direct_lcd.init(Orientation::Deg270, &mut NoDelay).unwrap();
        let mut direct = Screen::direct(direct_lcd, RecordingTransfer::default());
        chart.init(&mut direct).unwrap();
        chart.draw_curve(&mut direct.plot(), &samples, RED);
        chart.frame_update(&mut direct).unwrap();

        let mut buffered_lcd = Lcd::new(Ili9341::new(GramBus::new(320, 240)));
        buffered_lcd.init(Orientation::Deg270, &mut NoDelay).unwrap();
        let mut memory = vec![0u16; 100 * 60];
        let mut buffered = Screen::buffered(buffered_lcd, RecordingTransfer::default(), &mut memory);
        chart.init(&mut buffered).unwrap();
        chart.draw_curve(&mut buffered.plot(), &samples, RED);
        chart.frame_update(&mut buffered).unwrap();

        let direct_gram = direct.lcd().controller().bus().gram.clone();
        assert_eq!(direct_gram, buffered.lcd().controller().bus().gram);
        let bus = buffered.lcd().controller().bus();
        assert_eq!(bus.pixel(39, 29), to_raw(WHITE));
        assert_eq!(bus.pixel(140, 90), to_raw(WHITE));
        assert_eq!(bus.pixel(40, 30), to_raw(GRAY));
        assert_eq!(bus.window(), (0, 0, 320, 240));
    }
}
