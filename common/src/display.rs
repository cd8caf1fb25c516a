//! The live panel as a pixel surface.
//!
//! [`Lcd`] owns a controller and its logical geometry. Every burst write
//! opens a window, streams, and puts the window back to the full panel
//! before returning, so unwindowed writes that follow (single pixels, which
//! only move the cursor) land where they are addressed.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;

use crate::Error;
use crate::bus::DisplayBus;
use crate::colors::{BLACK, from_raw, to_raw};
use crate::controller::{DisplayController, Orientation};
use crate::surface::PixelSurface;

/// A display controller plus the state needed to draw on it directly.
pub struct Lcd<C> {
    controller: C,
    width: u16,
    height: u16,
}

impl<C: DisplayController> Lcd<C> {
    /// Wraps an (uninitialized) controller.
    pub fn new(controller: C) -> Self {
        let (width, height) = controller.size();
        Self {
            controller,
            width,
            height,
        }
    }

    /// Brings the panel up: register init, ID check, clear to black, display on.
    ///
    /// # Errors
    ///
    /// [`Error::PanelIdMismatch`] if the panel reports a different controller;
    /// the display is left off in that case.
    pub fn init<D: DelayNs>(
        &mut self,
        orientation: Orientation,
        delay: &mut D,
    ) -> Result<(), Error> {
        self.controller.init(orientation, delay);
        (self.width, self.height) = self.controller.size();

        let expected = self.controller.expected_id();
        let found = self.controller.read_id();
        if found != expected {
            self.controller.display_off();
            return Err(Error::PanelIdMismatch { expected, found });
        }

        self.restore_window();
        self.clear(BLACK);
        self.controller.display_on();
        Ok(())
    }

    /// Mutable access to the controller.
    #[inline]
    pub fn controller(&mut self) -> &mut C { &mut self.controller }

    /// Turns the panel output on.
    pub fn display_on(&mut self) { self.controller.display_on(); }

    /// Turns the panel output off.
    pub fn display_off(&mut self) { self.controller.display_off(); }

    /// Opens a `width` x `height` write window at `(x, y)`, hands the bus to
    /// `stream`, then restores the full-panel window.
    pub fn burst<R>(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        stream: impl FnOnce(&mut C::Bus) -> R,
    ) -> R {
        self.controller.set_window(x, y, width, height);
        self.controller.prepare_write();
        let result = stream(self.controller.bus());
        self.restore_window();
        result
    }

    /// Addresses the whole panel again.
    pub fn restore_window(&mut self) { self.controller.set_window(0, 0, self.width, self.height); }

    /// A sub-rectangle of the panel with its own origin, clipped to the panel.
    pub fn viewport(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Viewport<'_, C> {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);
        Viewport {
            lcd: self,
            x,
            y,
            width,
            height,
        }
    }
}

impl<C: DisplayController> PixelSurface for Lcd<C> {
    #[inline]
    fn width(&self) -> u16 { self.width }

    #[inline]
    fn height(&self) -> u16 { self.height }

    fn write_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
    ) {
        debug_assert!(x < self.width && y < self.height);
        self.controller.write_pixel(x, y, to_raw(color));
    }

    fn read_pixel(
        &mut self,
        x: u16,
        y: u16,
    ) -> Rgb565 {
        debug_assert!(x < self.width && y < self.height);
        from_raw(self.controller.read_pixel(x, y))
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        if width == 0 || height == 0 {
            return;
        }
        debug_assert!(x + width <= self.width && y + height <= self.height);
        let count = u32::from(width) * u32::from(height);
        self.burst(x, y, width, height, |bus| bus.write_repeated(to_raw(color), count));
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
        if width == 0 || height == 0 {
            return;
        }
        debug_assert!(x + width <= self.width && y + height <= self.height);
        let count = usize::from(width) * usize::from(height);
        self.burst(x, y, width, height, |bus| {
            for color in pixels.into_iter().take(count) {
                bus.write_data(to_raw(color));
            }
        });
    }
}

/// A panel rectangle addressed with local coordinates.
pub struct Viewport<'a, C> {
    lcd: &'a mut Lcd<C>,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
}

impl<C: DisplayController> PixelSurface for Viewport<'_, C> {
    #[inline]
    fn width(&self) -> u16 { self.width }

    #[inline]
    fn height(&self) -> u16 { self.height }

    fn write_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
    ) {
        self.lcd.write_pixel(self.x + x, self.y + y, color);
    }

    fn read_pixel(
        &mut self,
        x: u16,
        y: u16,
    ) -> Rgb565 {
        self.lcd.read_pixel(self.x + x, self.y + y)
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        self.lcd.fill_rect(self.x + x, self.y + y, width, height, color);
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
        self.lcd.write_rect(self.x + x, self.y + y, width, height, pixels);
    }
}
