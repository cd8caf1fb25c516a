//! NT35510 driver (16-bit MIPI DCS register addresses, one argument each).

use embedded_hal::delay::DelayNs;

use super::{DisplayController, InitStep, Orientation, decode_rgb_triplet, run_init_table};
use crate::bus::DisplayBus;

/// Value assembled by `read_id`.
pub const NT35510_ID: u16 = 0x8000;

const LONG_EDGE: u16 = 800;
const SHORT_EDGE: u16 = 480;

// NT35510 Registers
const SLPOUT: u16 = 0x1100;
const DISPOFF: u16 = 0x2800;
const DISPON: u16 = 0x2900;
const CASET: u16 = 0x2A00;
const RASET: u16 = 0x2B00;
const RAMWR: u16 = 0x2C00;
const RAMRD: u16 = 0x2E00;
const MADCTL: u16 = 0x3600;
const RDID1: u16 = 0xDA00;
const RDID2: u16 = 0xDB00;

/// Gamma curve, identical for the six R/G/B positive/negative tables.
const GAMMA: &[u16] = &[
    0x00, 0x33, 0x00, 0x34, 0x00, 0x3A, 0x00, 0x4A, 0x00, 0x5C, 0x00, 0x81, 0x00, 0xA6, 0x00, 0xE5, 0x01,
    0x13, 0x01, 0x54, 0x01, 0x82, 0x01, 0xCA, 0x02, 0x00, 0x02, 0x01, 0x02, 0x34, 0x02, 0x67, 0x02, 0x84,
    0x02, 0xA4, 0x02, 0xB7, 0x02, 0xCF, 0x02, 0xDE, 0x02, 0xF2, 0x02, 0xFE, 0x03, 0x10, 0x03, 0x33, 0x03,
    0x6D,
];

const INIT_TABLE: &[InitStep] = &[
    InitStep::DelayMs(5),
    InitStep::Write(0x0000, &[0x01]),
    InitStep::DelayMs(5),
    // Manufacturer command set, page 1: power rails
    InitStep::Sequential(0xF000, &[0x55, 0xAA, 0x52, 0x08, 0x01]),
    InitStep::Sequential(0xB000, &[0x0D, 0x0D, 0x0D]),
    InitStep::Sequential(0xB600, &[0x34, 0x34, 0x34]),
    InitStep::Sequential(0xB100, &[0x0D, 0x0D, 0x0D]),
    InitStep::Sequential(0xB700, &[0x34, 0x34, 0x34]),
    InitStep::Sequential(0xB200, &[0x00, 0x00, 0x00]),
    InitStep::Sequential(0xB800, &[0x24, 0x24, 0x24]),
    InitStep::Sequential(0xBF00, &[0x01]),
    InitStep::Sequential(0xB300, &[0x0F, 0x0F, 0x0F]),
    InitStep::Sequential(0xB900, &[0x34, 0x34, 0x34]),
    InitStep::Sequential(0xB500, &[0x08, 0x08, 0x08]),
    InitStep::Sequential(0xC200, &[0x03]),
    InitStep::Sequential(0xBA00, &[0x24, 0x24, 0x24]),
    InitStep::Sequential(0xBC00, &[0x00, 0x78, 0x00]),
    InitStep::Sequential(0xBD00, &[0x00, 0x78, 0x00]),
    InitStep::Sequential(0xBE00, &[0x00, 0x64]),
    InitStep::Sequential(0xD100, GAMMA),
    InitStep::Sequential(0xD200, GAMMA),
    InitStep::Sequential(0xD300, GAMMA),
    InitStep::Sequential(0xD400, GAMMA),
    InitStep::Sequential(0xD500, GAMMA),
    InitStep::Sequential(0xD600, GAMMA),
    // Page 0: display timing and source/gate control
    InitStep::Sequential(0xF000, &[0x55, 0xAA, 0x52, 0x08, 0x00]),
    InitStep::Sequential(0xB100, &[0xCC, 0x00]),
    InitStep::Sequential(0xB600, &[0x05]),
    InitStep::Sequential(0xB700, &[0x70, 0x70]),
    InitStep::Sequential(0xB800, &[0x01, 0x03, 0x03, 0x03]),
    InitStep::Sequential(0xBC00, &[0x02, 0x00, 0x00]),
    InitStep::Sequential(0xC900, &[0xD0, 0x02, 0x50, 0x50, 0x50]),
    // Tearing effect line on, 16 bits per pixel
    InitStep::Sequential(0x3500, &[0x00]),
    InitStep::Sequential(0x3A00, &[0x55]),
];

const WAKE_TABLE: &[InitStep] = &[
    InitStep::Write(SLPOUT, &[]),
    InitStep::DelayMs(1),
    InitStep::Write(DISPON, &[]),
];

/// Memory access control per orientation.
const fn madctl(orientation: Orientation) -> u16 {
    match orientation {
        Orientation::Deg0 => 0x00,
        Orientation::Deg90 => 0x22,
        Orientation::Deg180 => 0x03,
        Orientation::Deg270 => 0x21,
    }
}

/// NT35510 on a 16-bit parallel bus.
pub struct Nt35510<B> {
    bus: B,
    orientation: Orientation,
}

impl<B: DisplayBus> Nt35510<B> {
    /// Wraps a bus; call `init` before drawing.
    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            orientation: Orientation::Deg0,
        }
    }

    /// Releases the bus.
    pub fn release(self) -> B { self.bus }

    /// Writes a 16-bit value as high/low bytes to `register` and `register + 1`.
    fn write_split(
        &mut self,
        register: u16,
        value: u16,
    ) {
        self.bus.write_reg(register, value >> 8);
        self.bus.write_reg(register + 1, value & 0xFF);
    }
}

impl<B: DisplayBus> DisplayController for Nt35510<B> {
    type Bus = B;

    #[inline]
    fn bus(&mut self) -> &mut B { &mut self.bus }

    fn expected_id(&self) -> u16 { NT35510_ID }

    fn native_size(&self) -> (u16, u16) { (LONG_EDGE, SHORT_EDGE) }

    fn orientation(&self) -> Orientation { self.orientation }

    fn init<D: DelayNs>(
        &mut self,
        orientation: Orientation,
        delay: &mut D,
    ) {
        self.orientation = orientation;
        run_init_table(&mut self.bus, INIT_TABLE, delay);
        self.bus.write_reg(MADCTL, madctl(orientation));
        run_init_table(&mut self.bus, WAKE_TABLE, delay);
    }

    fn read_id(&mut self) -> u16 {
        self.bus.write_command(RDID1);
        let low = self.bus.read_data() & 0xFF;
        self.bus.write_command(RDID2);
        let high = self.bus.read_data() & 0xFF;
        (high << 8) | low
    }

    fn display_on(&mut self) { self.bus.write_command(DISPON); }

    fn display_off(&mut self) { self.bus.write_command(DISPOFF); }

    fn set_cursor(
        &mut self,
        x: u16,
        y: u16,
    ) {
        self.write_split(CASET, x);
        self.write_split(RASET, y);
    }

    fn set_window(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) {
        self.write_split(CASET, x);
        self.write_split(CASET + 2, x + width - 1);
        self.write_split(RASET, y);
        self.write_split(RASET + 2, y + height - 1);
    }

    #[inline]
    fn prepare_write(&mut self) { self.bus.write_command(RAMWR); }

    #[inline]
    fn prepare_read(&mut self) { self.bus.write_command(RAMRD); }

    fn read_gram(&mut self) -> u16 {
        let _ = self.bus.read_data();
        let red_green = self.bus.read_data();
        let blue = self.bus.read_data();
        decode_rgb_triplet(red_green, blue)
    }
}
