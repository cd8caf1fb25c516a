//! Display controller facade.
//!
//! Three controllers share one capability set ([`DisplayController`]); the
//! board picks one at startup through [`Panel`], so no call site depends on
//! which chip is fitted.
//!
//! Orientation is captured by `init` and consulted by every cursor/window
//! call afterwards: the ILI9341 and NT35510 reprogram their memory access
//! direction register, the ILI9325 swaps X/Y when feeding its GRAM address
//! registers.

use embedded_hal::delay::DelayNs;

use crate::bus::DisplayBus;

mod ili9325;
mod ili9341;
mod nt35510;

pub use ili9325::Ili9325;
pub use ili9341::Ili9341;
pub use nt35510::Nt35510;

// =============================================================================
// Orientation
// =============================================================================

/// Panel rotation applied at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// Portrait, connector at the bottom.
    Deg0,
    /// Landscape.
    Deg90,
    /// Portrait, upside down.
    Deg180,
    /// Landscape, the board's default mounting.
    #[default]
    Deg270,
}

impl Orientation {
    /// Whether the long panel edge is horizontal.
    #[inline]
    pub const fn is_landscape(self) -> bool { matches!(self, Self::Deg90 | Self::Deg270) }

    /// Logical (width, height) for a panel whose long/short edges are given.
    #[inline]
    pub const fn logical_size(
        self,
        long_edge: u16,
        short_edge: u16,
    ) -> (u16, u16) {
        if self.is_landscape() {
            (long_edge, short_edge)
        } else {
            (short_edge, long_edge)
        }
    }
}

// =============================================================================
// Controller contract
// =============================================================================

/// Uniform capability set over the supported controller protocols.
///
/// Coordinates are logical (after orientation). Implementations do not
/// bounds-check; [`crate::display::Lcd`] does.
pub trait DisplayController {
    /// Bus the controller talks through.
    type Bus: DisplayBus;

    /// Borrow the underlying bus (bulk pixel streams go straight to it).
    fn bus(&mut self) -> &mut Self::Bus;

    /// ID this controller reports from [`Self::read_id`].
    fn expected_id(&self) -> u16;

    /// (long edge, short edge) of the glass in pixels.
    fn native_size(&self) -> (u16, u16);

    /// Orientation captured by the last `init`.
    fn orientation(&self) -> Orientation;

    /// Runs the power-up register sequence for `orientation`.
    fn init<D: DelayNs>(
        &mut self,
        orientation: Orientation,
        delay: &mut D,
    );

    /// Reads the controller ID.
    fn read_id(&mut self) -> u16;

    /// Turns the display output on.
    fn display_on(&mut self);

    /// Turns the display output off.
    fn display_off(&mut self);

    /// Points the GRAM address counter at `(x, y)`.
    fn set_cursor(
        &mut self,
        x: u16,
        y: u16,
    );

    /// Restricts sequential GRAM access to a `width` x `height` window.
    fn set_window(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    );

    /// Selects the GRAM write register; data words that follow are pixels.
    fn prepare_write(&mut self);

    /// Selects the GRAM read register.
    fn prepare_read(&mut self);

    /// Reads the pixel at the address counter after [`Self::prepare_read`],
    /// including any dummy cycles and decoding.
    fn read_gram(&mut self) -> u16;

    /// Logical (width, height) for the captured orientation.
    #[inline]
    fn size(&self) -> (u16, u16) {
        let (long_edge, short_edge) = self.native_size();
        self.orientation().logical_size(long_edge, short_edge)
    }

    /// Writes one pixel at `(x, y)`.
    fn write_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: u16,
    ) {
        self.set_cursor(x, y);
        self.prepare_write();
        self.bus().write_data(color);
    }

    /// Reads one pixel at `(x, y)`.
    fn read_pixel(
        &mut self,
        x: u16,
        y: u16,
    ) -> u16 {
        self.set_cursor(x, y);
        self.prepare_read();
        self.read_gram()
    }
}

// =============================================================================
// Register tables
// =============================================================================

/// One step of a bring-up sequence.
#[derive(Debug, Clone, Copy)]
pub(crate) enum InitStep {
    /// Select a register and write its argument words.
    Write(u16, &'static [u16]),
    /// Write one word each to consecutive registers starting at the first.
    Sequential(u16, &'static [u16]),
    /// Wait before the next step.
    DelayMs(u32),
}

pub(crate) fn run_init_table<B: DisplayBus, D: DelayNs>(
    bus: &mut B,
    table: &[InitStep],
    delay: &mut D,
) {
    for step in table {
        match *step {
            InitStep::Write(register, args) => {
                bus.write_command(register);
                bus.write_slice(args);
            }
            InitStep::Sequential(first, values) => {
                for (register, &value) in (first..).zip(values) {
                    bus.write_reg(register, value);
                }
            }
            InitStep::DelayMs(ms) => delay.delay_ms(ms),
        }
    }
}

/// Reassembles a pixel read back as (R, B) words.
///
/// The controller returns `R8:G8` in the first word and `B8:xx` in the
/// second; each 8-bit component is shifted down to its 5/6/5-bit field.
#[inline]
pub const fn decode_rgb_triplet(
    red_green: u16,
    blue: u16,
) -> u16 {
    let green = (red_green & 0xFF) << 8;
    ((red_green >> 11) << 11) | ((green >> 10) << 5) | (blue >> 11)
}

// =============================================================================
// Runtime selection
// =============================================================================

/// Controller fitted to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelKind {
    /// 320x240, 16-bit register protocol.
    Ili9325,
    /// 320x240, MIPI DCS command protocol.
    Ili9341,
    /// 800x480, 16-bit MIPI DCS register addresses.
    Nt35510,
}

/// One of the supported controllers, chosen at startup.
pub enum Panel<B> {
    Ili9325(Ili9325<B>),
    Ili9341(Ili9341<B>),
    Nt35510(Nt35510<B>),
}

impl<B: DisplayBus> Panel<B> {
    /// Wraps `bus` in the driver for `kind`.
    pub fn new(
        kind: PanelKind,
        bus: B,
    ) -> Self {
        match kind {
            PanelKind::Ili9325 => Self::Ili9325(Ili9325::new(bus)),
            PanelKind::Ili9341 => Self::Ili9341(Ili9341::new(bus)),
            PanelKind::Nt35510 => Self::Nt35510(Nt35510::new(bus)),
        }
    }

    /// Which controller this is.
    pub const fn kind(&self) -> PanelKind {
        match self {
            Self::Ili9325(_) => PanelKind::Ili9325,
            Self::Ili9341(_) => PanelKind::Ili9341,
            Self::Nt35510(_) => PanelKind::Nt35510,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $driver:ident => $body:expr) => {
        match $self {
            Panel::Ili9325($driver) => $body,
            Panel::Ili9341($driver) => $body,
            Panel::Nt35510($driver) => $body,
        }
    };
}

impl<B: DisplayBus> DisplayController for Panel<B> {
    type Bus = B;

    fn bus(&mut self) -> &mut B { dispatch!(self, d => d.bus()) }

    fn expected_id(&self) -> u16 { dispatch!(self, d => d.expected_id()) }

    fn native_size(&self) -> (u16, u16) { dispatch!(self, d => d.native_size()) }

    fn orientation(&self) -> Orientation { dispatch!(self, d => d.orientation()) }

    fn init<D: DelayNs>(
        &mut self,
        orientation: Orientation,
        delay: &mut D,
    ) {
        dispatch!(self, d => d.init(orientation, delay));
    }

    fn read_id(&mut self) -> u16 { dispatch!(self, d => d.read_id()) }

    fn display_on(&mut self) { dispatch!(self, d => d.display_on()) }

    fn display_off(&mut self) { dispatch!(self, d => d.display_off()) }

    fn set_cursor(
        &mut self,
        x: u16,
        y: u16,
    ) {
        dispatch!(self, d => d.set_cursor(x, y));
    }

    fn set_window(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) {
        dispatch!(self, d => d.set_window(x, y, width, height));
    }

    fn prepare_write(&mut self) { dispatch!(self, d => d.prepare_write()) }

    fn prepare_read(&mut self) { dispatch!(self, d => d.prepare_read()) }

    fn read_gram(&mut self) -> u16 { dispatch!(self, d => d.read_gram()) }
}
