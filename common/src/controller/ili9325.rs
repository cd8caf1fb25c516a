//! ILI9325 driver (indexed 16-bit registers).
//!
//! The GRAM is addressed in native portrait coordinates. In landscape the
//! logical X axis runs along the GRAM vertical address, so cursor and window
//! coordinates are swapped before they are written.

use embedded_hal::delay::DelayNs;

use super::{DisplayController, InitStep, Orientation, run_init_table};
use crate::bus::DisplayBus;

/// Value returned by `read_id`.
pub const ILI9325_ID: u16 = 0x9325;

const LONG_EDGE: u16 = 320;
const SHORT_EDGE: u16 = 240;

// ILI9325 Registers
const DRIVER_CODE: u16 = 0x00;
const START_OSC: u16 = 0x00;
const ENTRY_MODE: u16 = 0x03;
const DISPLAY_CONTROL: u16 = 0x07;
const POWER_CONTROL_1: u16 = 0x10;
const POWER_CONTROL_2: u16 = 0x11;
const POWER_CONTROL_3: u16 = 0x12;
const POWER_CONTROL_4: u16 = 0x13;
const POWER_CONTROL_7: u16 = 0x29;
const GRAM_HORIZONTAL: u16 = 0x20;
const GRAM_VERTICAL: u16 = 0x21;
const GRAM_DATA: u16 = 0x22;
const WINDOW_H_START: u16 = 0x50;
const WINDOW_H_END: u16 = 0x51;
const WINDOW_V_START: u16 = 0x52;
const WINDOW_V_END: u16 = 0x53;

const DISPLAY_ON_VALUE: u16 = 0x0173;

const fn reg(
    register: u16,
    value: &'static [u16],
) -> InitStep {
    InitStep::Write(register, value)
}

const INIT_TABLE: &[InitStep] = &[
    // Oscillator, driver output, inversion, porches
    reg(START_OSC, &[0x0001]),
    reg(0x01, &[0x0100]),
    reg(0x02, &[0x0700]),
    reg(ENTRY_MODE, &[0x1018]),
    reg(0x04, &[0x0000]),
    reg(0x08, &[0x0202]),
    reg(0x09, &[0x0000]),
    reg(0x0A, &[0x0000]),
    reg(0x0C, &[0x0000]),
    reg(0x0D, &[0x0000]),
    reg(0x0F, &[0x0000]),
    // Power on sequence
    reg(POWER_CONTROL_1, &[0x0000]),
    reg(POWER_CONTROL_2, &[0x0000]),
    reg(POWER_CONTROL_3, &[0x0000]),
    reg(POWER_CONTROL_4, &[0x0000]),
    InitStep::DelayMs(50),
    reg(POWER_CONTROL_1, &[0x17B0]),
    reg(POWER_CONTROL_2, &[0x0137]),
    InitStep::DelayMs(50),
    reg(POWER_CONTROL_3, &[0x0139]),
    InitStep::DelayMs(50),
    reg(POWER_CONTROL_4, &[0x1D00]),
    reg(POWER_CONTROL_7, &[0x0013]),
    InitStep::DelayMs(50),
    reg(GRAM_HORIZONTAL, &[0x0000]),
    reg(GRAM_VERTICAL, &[0x0000]),
    // Gamma curve
    reg(0x30, &[0x0007]),
    reg(0x31, &[0x0302]),
    reg(0x32, &[0x0105]),
    reg(0x35, &[0x0206]),
    reg(0x36, &[0x0808]),
    reg(0x37, &[0x0206]),
    reg(0x38, &[0x0504]),
    reg(0x39, &[0x0007]),
    reg(0x3C, &[0x0105]),
    reg(0x3D, &[0x0808]),
    // Full GRAM area
    reg(WINDOW_H_START, &[0x0000]),
    reg(WINDOW_H_END, &[0x00EF]),
    reg(WINDOW_V_START, &[0x0000]),
    reg(WINDOW_V_END, &[0x013F]),
    // Gate scan G320..G1, no scrolling
    reg(0x60, &[0xA700]),
    reg(0x61, &[0x0001]),
    reg(0x6A, &[0x0000]),
    // Partial display off
    reg(0x80, &[0x0000]),
    reg(0x81, &[0x0000]),
    reg(0x82, &[0x0000]),
    reg(0x83, &[0x0000]),
    reg(0x84, &[0x0000]),
    reg(0x85, &[0x0000]),
    // Panel interface
    reg(0x90, &[0x0010]),
    reg(0x92, &[0x0000]),
    reg(0x93, &[0x0003]),
    reg(0x95, &[0x0110]),
    reg(0x97, &[0x0000]),
    reg(0x98, &[0x0000]),
];

const POWER_ON_SEQUENCE: &[(u16, u16)] = &[
    (POWER_CONTROL_1, 0x0000),
    (POWER_CONTROL_2, 0x0000),
    (POWER_CONTROL_3, 0x0000),
    (POWER_CONTROL_4, 0x0000),
    (POWER_CONTROL_1, 0x17B0),
    (POWER_CONTROL_2, 0x0137),
    (POWER_CONTROL_3, 0x0139),
    (POWER_CONTROL_4, 0x1D00),
    (POWER_CONTROL_7, 0x0013),
];

const POWER_OFF_SEQUENCE: &[(u16, u16)] = &[
    (POWER_CONTROL_1, 0x0000),
    (POWER_CONTROL_2, 0x0000),
    (POWER_CONTROL_3, 0x0000),
    (POWER_CONTROL_4, 0x0000),
    (POWER_CONTROL_7, 0x0000),
];

/// Entry mode (GRAM write direction, BGR=1) per orientation.
const fn entry_mode(orientation: Orientation) -> u16 {
    match orientation {
        Orientation::Deg0 => 0x1018,
        Orientation::Deg90 => 0x1000,
        Orientation::Deg180 => 0x1008,
        Orientation::Deg270 => 0x1010,
    }
}

/// ILI9325 on a 16-bit parallel bus.
pub struct Ili9325<B> {
    bus: B,
    orientation: Orientation,
}

impl<B: DisplayBus> Ili9325<B> {
    /// Wraps a bus; call `init` before drawing.
    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            orientation: Orientation::Deg0,
        }
    }

    /// Releases the bus.
    pub fn release(self) -> B { self.bus }

    /// Maps logical (x, y) to GRAM (horizontal, vertical) addresses.
    #[inline]
    const fn gram_address(
        &self,
        x: u16,
        y: u16,
    ) -> (u16, u16) {
        if self.orientation.is_landscape() { (y, x) } else { (x, y) }
    }
}

impl<B: DisplayBus> DisplayController for Ili9325<B> {
    type Bus = B;

    #[inline]
    fn bus(&mut self) -> &mut B { &mut self.bus }

    fn expected_id(&self) -> u16 { ILI9325_ID }

    fn native_size(&self) -> (u16, u16) { (LONG_EDGE, SHORT_EDGE) }

    fn orientation(&self) -> Orientation { self.orientation }

    fn init<D: DelayNs>(
        &mut self,
        orientation: Orientation,
        delay: &mut D,
    ) {
        self.orientation = orientation;
        run_init_table(&mut self.bus, INIT_TABLE, delay);
        self.bus.write_reg(ENTRY_MODE, entry_mode(orientation));
        self.bus.write_reg(DISPLAY_CONTROL, DISPLAY_ON_VALUE);
        self.bus.write_command(GRAM_DATA);
    }

    fn read_id(&mut self) -> u16 {
        self.bus.write_command(DRIVER_CODE);
        let _ = self.bus.read_data();
        let _ = self.bus.read_data();
        let high = self.bus.read_data() & 0xFF;
        let low = self.bus.read_data() & 0xFF;
        (high << 8) | low
    }

    fn display_on(&mut self) {
        for &(register, value) in POWER_ON_SEQUENCE {
            self.bus.write_reg(register, value);
        }
        self.bus.write_reg(DISPLAY_CONTROL, DISPLAY_ON_VALUE);
    }

    fn display_off(&mut self) {
        for &(register, value) in POWER_OFF_SEQUENCE {
            self.bus.write_reg(register, value);
        }
        self.bus.write_reg(START_OSC, 0x0000);
    }

    fn set_cursor(
        &mut self,
        x: u16,
        y: u16,
    ) {
        let (horizontal, vertical) = self.gram_address(x, y);
        self.bus.write_reg(GRAM_HORIZONTAL, horizontal);
        self.bus.write_reg(GRAM_VERTICAL, vertical);
    }

    fn set_window(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) {
        let (h_start, v_start) = self.gram_address(x, y);
        let (h_end, v_end) = self.gram_address(x + width - 1, y + height - 1);
        self.bus.write_reg(WINDOW_H_START, h_start);
        self.bus.write_reg(WINDOW_H_END, h_end);
        self.bus.write_reg(WINDOW_V_START, v_start);
        self.bus.write_reg(WINDOW_V_END, v_end);
        // The address counter does not follow the window on this chip
        self.set_cursor(x, y);
    }

    #[inline]
    fn prepare_write(&mut self) { self.bus.write_command(GRAM_DATA); }

    #[inline]
    fn prepare_read(&mut self) { self.bus.write_command(GRAM_DATA); }

    fn read_gram(&mut self) -> u16 { self.bus.read_data() }
}
