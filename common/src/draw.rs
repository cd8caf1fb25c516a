//! Drawing primitives over any [`PixelSurface`].
//!
//! Everything here is expressed through the surface contract, so the same
//! call paints into a framebuffer or straight onto the panel. Coordinates are
//! signed and shapes are clipped to the surface; runs and blocks go through
//! `fill_rect`/`write_rect` so the bus-backed surfaces turn them into one
//! windowed burst each.

use embedded_graphics::pixelcolor::Rgb565;

use crate::colors::from_raw;
use crate::surface::PixelSurface;

/// Raw word treated as transparent by [`Draw::keyed_bitmap`].
pub const TRANSPARENT_KEY: u16 = 0x0000;

/// Visible part of a rectangle as (x, y, width, height), if any.
fn clip<S: PixelSurface + ?Sized>(
    surface: &S,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> Option<(u16, u16, u16, u16)> {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(width).min(i32::from(surface.width()));
    let y1 = y.saturating_add(height).min(i32::from(surface.height()));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
}

/// Fills `width` pixels of row `y` starting at `x`, clipped before narrowing.
fn span<S: PixelSurface + ?Sized>(
    surface: &mut S,
    x: i32,
    y: i32,
    width: i32,
    color: Rgb565,
) {
    if let Some((x, y, width, height)) = clip(surface, x, y, width, 1) {
        surface.fill_rect(x, y, width, height, color);
    }
}

/// Primitives available on every pixel surface.
pub trait Draw: PixelSurface {
    /// Plots one pixel if it is on the surface.
    #[inline]
    fn pixel(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
    ) {
        if self.contains(x, y) {
            self.write_pixel(x as u16, y as u16, color);
        }
    }

    /// Horizontal run of `length` pixels starting at `(x, y)`.
    fn hline(
        &mut self,
        x: i32,
        y: i32,
        length: u16,
        color: Rgb565,
    ) {
        self.fill(x, y, length, 1, color);
    }

    /// Vertical run of `length` pixels starting at `(x, y)`.
    fn vline(
        &mut self,
        x: i32,
        y: i32,
        length: u16,
        color: Rgb565,
    ) {
        self.fill(x, y, 1, length, color);
    }

    /// Straight line between two points (integer Bresenham).
    fn line(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        color: Rgb565,
    ) {
        let (mut x0, mut y0, mut x1, mut y1) = (x0, y0, x1, y1);
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            core::mem::swap(&mut x0, &mut y0);
            core::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = (y1 - y0).abs();
        let y_step = if y0 < y1 { 1 } else { -1 };
        let mut err = dx / 2;
        let mut y = y0;
        for x in x0..=x1 {
            if steep {
                self.pixel(y, x, color);
            } else {
                self.pixel(x, y, color);
            }
            err -= dy;
            if err < 0 {
                y += y_step;
                err += dx;
            }
        }
    }

    /// Outline of a `width` x `height` rectangle: two H-lines and two V-lines.
    fn rect(
        &mut self,
        x: i32,
        y: i32,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        if width == 0 || height == 0 {
            return;
        }
        let right = x + i32::from(width) - 1;
        let bottom = y + i32::from(height) - 1;
        self.hline(x, y, width, color);
        self.hline(x, bottom, width, color);
        self.vline(x, y, height, color);
        self.vline(right, y, height, color);
    }

    /// Solid rectangle, clipped to the surface.
    fn fill(
        &mut self,
        x: i32,
        y: i32,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        if let Some((x, y, width, height)) = clip(self, x, y, i32::from(width), i32::from(height)) {
            self.fill_rect(x, y, width, height, color);
        }
    }

    /// Circle outline (midpoint algorithm, 8-way symmetric).
    fn circle(
        &mut self,
        x0: i32,
        y0: i32,
        radius: u16,
        color: Rgb565,
    ) {
        let mut x = 0;
        let mut y = i32::from(radius);
        let mut di = 3 - 2 * i32::from(radius);
        while x <= y {
            self.pixel(x0 + x, y0 - y, color);
            self.pixel(x0 + y, y0 - x, color);
            self.pixel(x0 + y, y0 + x, color);
            self.pixel(x0 + x, y0 + y, color);
            self.pixel(x0 - x, y0 + y, color);
            self.pixel(x0 - y, y0 + x, color);
            self.pixel(x0 - x, y0 - y, color);
            self.pixel(x0 - y, y0 - x, color);
            if di < 0 {
                di += 4 * x + 6;
            } else {
                di += 10 + 4 * (x - y);
                y -= 1;
            }
            x += 1;
        }
    }

    /// Filled circle: the outline's symmetric points joined by H-lines.
    fn fill_circle(
        &mut self,
        x0: i32,
        y0: i32,
        radius: u16,
        color: Rgb565,
    ) {
        let mut x = 0;
        let mut y = i32::from(radius);
        let mut di = 3 - 2 * i32::from(radius);
        while x <= y {
            span(self, x0.saturating_sub(y), y0 + x, 2 * y + 1, color);
            span(self, x0.saturating_sub(y), y0 - x, 2 * y + 1, color);
            if x > 0 {
                span(self, x0 - x, y0.saturating_sub(y), 2 * x + 1, color);
                span(self, x0 - x, y0.saturating_add(y), 2 * x + 1, color);
            }
            if di < 0 {
                di += 4 * x + 6;
            } else {
                di += 10 + 4 * (x - y);
                y -= 1;
            }
            x += 1;
        }
    }

    /// Copies a row-major block of raw RGB565 words.
    fn bitmap(
        &mut self,
        x: i32,
        y: i32,
        width: u16,
        height: u16,
        pixels: &[u16],
    ) {
        let stride = usize::from(width);
        if stride == 0 || pixels.len() < stride * usize::from(height) {
            return;
        }
        let Some((cx, cy, cw, ch)) = clip(self, x, y, i32::from(width), i32::from(height)) else {
            return;
        };
        let skip_x = (i32::from(cx) - x) as usize;
        let skip_y = (i32::from(cy) - y) as usize;

        if cw == width && ch == height {
            self.write_rect(cx, cy, cw, ch, pixels.iter().map(|&raw| from_raw(raw)));
            return;
        }
        for row in 0..usize::from(ch) {
            let start = (skip_y + row) * stride + skip_x;
            let line = &pixels[start..start + usize::from(cw)];
            self.write_rect(cx, cy + row as u16, cw, 1, line.iter().map(|&raw| from_raw(raw)));
        }
    }

    /// Copies a block pixel by pixel, skipping [`TRANSPARENT_KEY`].
    ///
    /// True black cannot be drawn through this path.
    fn keyed_bitmap(
        &mut self,
        x: i32,
        y: i32,
        width: u16,
        height: u16,
        pixels: &[u16],
    ) {
        let rows = pixels.chunks_exact(usize::from(width.max(1))).take(usize::from(height));
        for (dy, row) in rows.enumerate() {
            for (dx, &raw) in row.iter().enumerate() {
                if raw != TRANSPARENT_KEY {
                    self.pixel(x + dx as i32, y + dy as i32, from_raw(raw));
                }
            }
        }
    }
}

impl<S: PixelSurface + ?Sized> Draw for S {}
