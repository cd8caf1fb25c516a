//! The drawing context: one panel, one transfer engine, at most one
//! framebuffer.
//!
//! Whichever way the chart area is backed, drawing code asks the screen for
//! a [`PlotSurface`] in chart-local coordinates and calls [`Screen::present`]
//! when a frame is complete. With a framebuffer the plot surface is the
//! buffer and `present` flushes it; without one the plot surface is a
//! viewport onto the panel and `present` does nothing.

use embedded_graphics::Drawable;
use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::{Primitive, PrimitiveStyleBuilder, Rectangle, StrokeAlignment};

use crate::Error;
use crate::colors::{DODGERBLUE, LAWNGREEN};
use crate::controller::DisplayController;
use crate::display::{Lcd, Viewport};
use crate::draw::Draw;
use crate::font::{FontFace, FontSize, FontSource, Text};
use crate::framebuffer::{BlockTransfer, FrameBuffer};
use crate::input::{Flow, KeyCode, KeyQueue};
use crate::surface::{Canvas, PixelSurface};

/// How the chart area reaches the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Backing {
    /// Every pixel is an addressed bus write.
    Direct,
    /// Pixels go to a framebuffer that is flushed once per frame.
    #[default]
    Buffered,
}

/// Owned panel state shared by everything that draws.
pub struct Screen<'fb, C, T> {
    lcd: Lcd<C>,
    transfer: T,
    framebuffer: Option<FrameBuffer<'fb>>,
    area: (u16, u16, u16, u16),
}

impl<'fb, C, T> Screen<'fb, C, T>
where
    C: DisplayController,
    T: BlockTransfer<C::Bus>,
{
    /// A screen that draws straight onto the panel.
    pub fn direct(
        lcd: Lcd<C>,
        transfer: T,
    ) -> Self {
        let area = (0, 0, lcd.width(), lcd.height());
        Self {
            lcd,
            transfer,
            framebuffer: None,
            area,
        }
    }

    /// A screen whose plot area is buffered in `memory`.
    ///
    /// The buffer starts empty; [`Screen::attach`] sizes it.
    pub fn buffered(
        lcd: Lcd<C>,
        transfer: T,
        memory: &'fb mut [u16],
    ) -> Self {
        let framebuffer = FrameBuffer::new(memory, 0, 0, 0, 0).ok();
        Self {
            lcd,
            transfer,
            framebuffer,
            area: (0, 0, 0, 0),
        }
    }

    #[inline]
    pub fn backing(&self) -> Backing {
        if self.framebuffer.is_some() { Backing::Buffered } else { Backing::Direct }
    }

    /// The whole panel, for drawing outside the plot area.
    #[inline]
    pub fn lcd(&mut self) -> &mut Lcd<C> { &mut self.lcd }

    /// Panel rectangle of the plot area as (x, y, width, height).
    #[inline]
    pub const fn area(&self) -> (u16, u16, u16, u16) { self.area }

    /// Moves the plot area to a panel rectangle.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if the framebuffer cannot hold it.
    pub fn attach(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) -> Result<(), Error> {
        if let Some(fb) = self.framebuffer.as_mut() {
            fb.rebind(x, y, width, height)?;
        }
        self.area = (x, y, width, height);
        Ok(())
    }

    /// The plot area as a surface with its own origin.
    pub fn plot(&mut self) -> PlotSurface<'_, 'fb, C> {
        match self.framebuffer.as_mut() {
            Some(fb) => PlotSurface::Buffered(fb),
            None => {
                let (x, y, width, height) = self.area;
                PlotSurface::Direct(self.lcd.viewport(x, y, width, height))
            }
        }
    }

    /// Shows the frame drawn into the plot area.
    ///
    /// # Errors
    ///
    /// [`Error::TransferTimeout`] from the flush.
    pub fn present(&mut self) -> Result<(), Error> {
        match self.framebuffer.as_ref() {
            Some(fb) => fb.flush(&mut self.lcd, &mut self.transfer),
            None => Ok(()),
        }
    }
}

/// A full-screen application: the oscilloscope or the frequency sweep.
///
/// The main loop calls [`Overlay::init`] once, then for every iteration
/// hands over at most one key, draws one frame and sleeps
/// [`Overlay::frame_delay_ms`].
pub trait Overlay {
    /// Draws the static layout.
    ///
    /// # Errors
    ///
    /// Chart setup or flush errors.
    fn init<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>;

    /// Acquires and draws one frame.
    ///
    /// # Errors
    ///
    /// Flush timeout of a buffered screen.
    fn frame<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        now_ms: u64,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>;

    /// Applies one keypad code.
    fn handle_key<C, T>(
        &mut self,
        code: KeyCode,
        screen: &mut Screen<'_, C, T>,
        now_ms: u64,
    ) -> Flow
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>;

    fn frame_delay_ms(&self) -> u64;
}

/// The full-screen applications, in switching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Application {
    #[default]
    Scope,
    Sweep,
}

impl Application {
    /// The application started when this one exits.
    pub const fn next(self) -> Self {
        match self {
            Self::Scope => Self::Sweep,
            Self::Sweep => Self::Scope,
        }
    }
}

/// One main-loop pass: hands `overlay` at most one queued key, then draws a
/// frame unless the key asked to leave.
///
/// # Errors
///
/// Frame errors from the overlay.
pub fn run_once<O, C, T>(
    overlay: &mut O,
    screen: &mut Screen<'_, C, T>,
    keys: &mut KeyQueue,
    now_ms: u64,
) -> Result<Flow, Error>
where
    O: Overlay,
    C: DisplayController,
    T: BlockTransfer<C::Bus>,
{
    if let Some(code) = keys.pop()
        && overlay.handle_key(code, screen, now_ms) == Flow::Exit
    {
        keys.clear();
        return Ok(Flow::Exit);
    }
    overlay.frame(screen, now_ms)?;
    Ok(Flow::Continue)
}

/// Chart-local drawing surface handed out by [`Screen::plot`].
pub enum PlotSurface<'s, 'fb, C> {
    Direct(Viewport<'s, C>),
    Buffered(&'s mut FrameBuffer<'fb>),
}

macro_rules! plot_dispatch {
    ($self:ident, $s:ident => $body:expr) => {
        match $self {
            PlotSurface::Direct($s) => $body,
            PlotSurface::Buffered($s) => $body,
        }
    };
}

impl<C: DisplayController> PixelSurface for PlotSurface<'_, '_, C> {
    fn width(&self) -> u16 { plot_dispatch!(self, s => s.width()) }

    fn height(&self) -> u16 { plot_dispatch!(self, s => s.height()) }

    fn write_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
    ) {
        plot_dispatch!(self, s => s.write_pixel(x, y, color));
    }

    fn read_pixel(
        &mut self,
        x: u16,
        y: u16,
    ) -> Rgb565 {
        plot_dispatch!(self, s => s.read_pixel(x, y))
    }

    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        color: Rgb565,
    ) {
        plot_dispatch!(self, s => s.fill_rect(x, y, width, height, color));
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
        plot_dispatch!(self, s => s.write_rect(x, y, width, height, pixels));
    }
}

// =============================================================================
// Splash
// =============================================================================

/// Boot screen shown while the rest of the board comes up.
pub fn draw_splash<S, F>(
    surface: &mut S,
    fonts: F,
) where
    S: PixelSurface,
    F: FontSource,
{
    let frame = PrimitiveStyleBuilder::new()
        .stroke_color(DODGERBLUE)
        .stroke_width(2)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    Rectangle::new(Point::new(4, 4), Size::new(168, 48))
        .into_styled(frame)
        .draw(&mut Canvas::new(surface))
        .ok();

    let mut text = Text::new(fonts, FontFace::Sans, FontSize::Px32);
    text.draw_string(surface, 16, 16, b"Lovely", LAWNGREEN);
    surface.fill(128, 8, 32, 16, DODGERBLUE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{BLACK, RED, to_raw};
    use crate::controller::{Ili9341, Orientation};
    use crate::font::ProFontSource;
    use crate::testing::{GramBus, NoDelay, RecordingTransfer};

    fn lcd() -> Lcd<Ili9341<GramBus>> {
        let mut lcd = Lcd::new(Ili9341::new(GramBus::new(320, 240)));
        lcd.init(Orientation::Deg270, &mut NoDelay).unwrap();
        lcd
    }

    #[test]
    fn test_direct_plot_is_offset_and_present_is_noop() {
        let mut screen = Screen::direct(lcd(), RecordingTransfer::default());
        screen.attach(40, 30, 100, 50).unwrap();
        assert_eq!(screen.backing(), Backing::Direct);
        screen.plot().write_pixel(2, 3, RED);
        screen.present().unwrap();
        assert_eq!(screen.lcd().controller().bus().pixel(42, 33), to_raw(RED));
        assert!(screen.transfer.chunks.is_empty());
    }

    #[test]
    fn test_buffered_plot_reaches_panel_only_on_present() {
        let mut memory = vec![0u16; 100 * 50];
        let mut screen = Screen::buffered(lcd(), RecordingTransfer::default(), &mut memory);
        screen.attach(40, 30, 100, 50).unwrap();
        assert_eq!(screen.plot().width(), 100);
        screen.plot().write_pixel(2, 3, RED);
        assert_eq!(screen.lcd().controller().bus().pixel(42, 33), 0);

        screen.present().unwrap();
        let bus = screen.lcd().controller().bus();
        assert_eq!(bus.pixel(42, 33), to_raw(RED));
        assert_eq!(bus.window(), (0, 0, 320, 240));
        assert_eq!(screen.transfer.chunks, vec![5000]);
    }

    #[test]
    fn test_attach_rejects_oversized_area() {
        let mut memory = vec![0u16; 10];
        let mut screen = Screen::buffered(lcd(), RecordingTransfer::default(), &mut memory);
        assert_eq!(screen.attach(0, 0, 4, 4), Err(Error::BufferTooSmall));
    }

    /// Counts frames and leaves on key 37.
    #[derive(Default)]
    struct Counter {
        frames: u32,
        keys: std::vec::Vec<KeyCode>,
    }

    impl Overlay for Counter {
        fn init<C, T>(
            &mut self,
            _screen: &mut Screen<'_, C, T>,
        ) -> Result<(), Error>
        where
            C: DisplayController,
            T: BlockTransfer<C::Bus>,
        {
            Ok(())
        }

        fn frame<C, T>(
            &mut self,
            _screen: &mut Screen<'_, C, T>,
            _now_ms: u64,
        ) -> Result<(), Error>
        where
            C: DisplayController,
            T: BlockTransfer<C::Bus>,
        {
            self.frames += 1;
            Ok(())
        }

        fn handle_key<C, T>(
            &mut self,
            code: KeyCode,
            _screen: &mut Screen<'_, C, T>,
            _now_ms: u64,
        ) -> Flow
        where
            C: DisplayController,
            T: BlockTransfer<C::Bus>,
        {
            self.keys.push(code);
            if code == 37 { Flow::Exit } else { Flow::Continue }
        }

        fn frame_delay_ms(&self) -> u64 { 0 }
    }

    #[test]
    fn test_run_once_one_key_per_frame() {
        let mut screen = Screen::direct(lcd(), RecordingTransfer::default());
        let mut keys = KeyQueue::new().unwrap();
        let mut counter = Counter::default();
        keys.push(1);
        keys.push(2);

        assert_eq!(run_once(&mut counter, &mut screen, &mut keys, 0), Ok(Flow::Continue));
        assert_eq!(counter.keys, vec![1]);
        assert_eq!(counter.frames, 1);
        assert_eq!(run_once(&mut counter, &mut screen, &mut keys, 0), Ok(Flow::Continue));
        assert_eq!(run_once(&mut counter, &mut screen, &mut keys, 0), Ok(Flow::Continue));
        assert_eq!(counter.keys, vec![1, 2]);
        assert_eq!(counter.frames, 3);
    }

    #[test]
    fn test_run_once_exit_skips_frame_and_drops_keys() {
        let mut screen = Screen::direct(lcd(), RecordingTransfer::default());
        let mut keys = KeyQueue::new().unwrap();
        let mut counter = Counter::default();
        keys.push(37);
        keys.push(5);

        assert_eq!(run_once(&mut counter, &mut screen, &mut keys, 0), Ok(Flow::Exit));
        assert_eq!(counter.frames, 0);
        assert_eq!(keys.pop(), None);
    }

    #[test]
    fn test_application_cycle() {
        assert_eq!(Application::default(), Application::Scope);
        assert_eq!(Application::Scope.next(), Application::Sweep);
        assert_eq!(Application::Sweep.next(), Application::Scope);
    }

    #[test]
    fn test_splash_frame_and_badge() {
        let mut memory = vec![0u16; 176 * 56];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 176, 56).unwrap();
        draw_splash(&mut fb, ProFontSource);
        assert_eq!(fb.read_pixel(4, 4), DODGERBLUE);
        assert_eq!(fb.read_pixel(5, 30), DODGERBLUE);
        assert_eq!(fb.read_pixel(171, 51), DODGERBLUE);
        assert_eq!(fb.read_pixel(6, 30), BLACK);
        assert_eq!(fb.read_pixel(130, 10), DODGERBLUE);
        assert_eq!(fb.read_pixel(100, 8), BLACK);
        assert_eq!(fb.read_pixel(0, 0), BLACK);
    }
}
