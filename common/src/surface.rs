//! One write/read-pixel contract over every canvas.
//!
//! A surface is either a local buffer ([`crate::framebuffer::FrameBuffer`])
//! or the live panel ([`crate::display::Lcd`], [`crate::display::Viewport`]).
//! Drawing code is written against [`PixelSurface`] only and never asks which
//! one it got.
//!
//! Coordinates passed to the trait methods must lie inside the surface;
//! that is checked with `debug_assert!` and otherwise left to the caller.
//! [`crate::draw::Draw`] clips before it gets here.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// A rectangular canvas of RGB565 pixels.
pub trait PixelSurface {
    /// Width in pixels.
    fn width(&self) -> u16;

    /// Height in pixels.
    fn height(&self) -> u16;

    /// Writes one pixel.
    fn write_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
    );

    /// Reads one pixel back.
    fn read_pixel(
        &mut self,
        x: u16,
        y: u16,
    ) -> Rgb565;

    /// Fills a rectangle with one color.
    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        debug_assert!(x + width <= self.width() && y + height <= self.height());
        for row in y..y + height {
            for col in x..x + width {
                self.write_pixel(col, row, color);
            }
        }
    }

    /// Writes a block of pixels in row-major order.
    ///
    /// Stops early if `pixels` runs out.
    fn write_rect<I>(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        pixels: I,
    ) where
        I: IntoIterator<Item = Rgb565>,
    {
        debug_assert!(x + width <= self.width() && y + height <= self.height());
        if width == 0 {
            return;
        }
        let mut pixels = pixels.into_iter();
        for row in y..y + height {
            for col in x..x + width {
                let Some(color) = pixels.next() else { return };
                self.write_pixel(col, row, color);
            }
        }
    }

    /// Fills the whole surface.
    fn clear(
        &mut self,
        color: Rgb565,
    ) {
        let (width, height) = (self.width(), self.height());
        self.fill_rect(0, 0, width, height, color);
    }

    /// Whether `(x, y)` lies inside the surface.
    #[inline]
    fn contains(
        &self,
        x: i32,
        y: i32,
    ) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width()) && y < i32::from(self.height())
    }
}

impl<S: PixelSurface> PixelSurface for &mut S {
    fn width(&self) -> u16 { (**self).width() }

    fn height(&self) -> u16 { (**self).height() }

    fn write_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
    ) {
        (**self).write_pixel(x, y, color);
    }

    fn read_pixel(
        &mut self,
        x: u16,
        y: u16,
    ) -> Rgb565 {
        (**self).read_pixel(x, y)
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        (**self).fill_rect(x, y, width, height, color);
    }

    fn write_rect<I>(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        pixels: I,
    ) where
        I: IntoIterator<Item = Rgb565>,
    {
        (**self).write_rect(x, y, width, height, pixels);
    }
}

/// `embedded-graphics` adapter, so text styles and shapes from that crate can
/// render onto any surface.
pub struct Canvas<'a, S> {
    surface: &'a mut S,
}

impl<'a, S: PixelSurface> Canvas<'a, S> {
    /// Borrows `surface` for drawing.
    pub fn new(surface: &'a mut S) -> Self { Self { surface } }
}

impl<S: PixelSurface> OriginDimensions for Canvas<'_, S> {
    fn size(&self) -> Size { Size::new(u32::from(self.surface.width()), u32::from(self.surface.height())) }
}

impl<S: PixelSurface> DrawTarget for Canvas<'_, S> {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if self.surface.contains(point.x, point.y) {
                self.surface.write_pixel(point.x as u16, point.y as u16, color);
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if let Some(bottom_right) = area.bottom_right() {
            let (x, y) = (area.top_left.x as u16, area.top_left.y as u16);
            let width = (bottom_right.x - area.top_left.x + 1) as u16;
            let height = (bottom_right.y - area.top_left.y + 1) as u16;
            self.surface.fill_rect(x, y, width, height, color);
        }
        Ok(())
    }
}
