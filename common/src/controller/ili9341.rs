//! ILI9341 driver (MIPI DCS commands, 8-bit arguments on the 16-bit bus).

use embedded_hal::delay::DelayNs;

use super::{DisplayController, InitStep, Orientation, decode_rgb_triplet, run_init_table};
use crate::bus::DisplayBus;

/// Value returned by `read_id`.
pub const ILI9341_ID: u16 = 0x9341;

const LONG_EDGE: u16 = 320;
const SHORT_EDGE: u16 = 240;

// ILI9341 Commands
const DISPOFF: u16 = 0x28;
const DISPON: u16 = 0x29;
const CASET: u16 = 0x2A;
const PASET: u16 = 0x2B;
const RAMWR: u16 = 0x2C;
const RAMRD: u16 = 0x2E;
const MADCTL: u16 = 0x36;
const PIXSET: u16 = 0x3A;
const SLPOUT: u16 = 0x11;
const RDID4: u16 = 0xD3;

const INIT_TABLE: &[InitStep] = &[
    InitStep::Write(0x00, &[0x01]),
    // Power control B, power on sequence, driver timing A/B
    InitStep::Write(0xCF, &[0x00, 0x81, 0x30]),
    InitStep::Write(0xED, &[0x64, 0x03, 0x12, 0x81]),
    InitStep::Write(0xE8, &[0x85, 0x10, 0x78]),
    InitStep::Write(0xCB, &[0x39, 0x2C, 0x00, 0x34, 0x02]),
    InitStep::Write(0xF7, &[0x20]),
    InitStep::Write(0xEA, &[0x00, 0x00]),
    // Frame rate, display function, power and VCOM
    InitStep::Write(0xB1, &[0x00, 0x1B]),
    InitStep::Write(0xB6, &[0x0A, 0xA2]),
    InitStep::Write(0xC0, &[0x35]),
    InitStep::Write(0xC1, &[0x11]),
    InitStep::Write(0xC5, &[0x45, 0x45]),
    InitStep::Write(0xC7, &[0xA2]),
    // Gamma
    InitStep::Write(0xF2, &[0x00]),
    InitStep::Write(0x26, &[0x01]),
    InitStep::Write(
        0xE0,
        &[0x0F, 0x26, 0x24, 0x0B, 0x0E, 0x09, 0x54, 0xA8, 0x46, 0x0C, 0x17, 0x09, 0x0F, 0x07, 0x00],
    ),
    InitStep::Write(
        0xE1,
        &[0x00, 0x19, 0x1B, 0x04, 0x10, 0x07, 0x2A, 0x47, 0x39, 0x03, 0x06, 0x06, 0x30, 0x38, 0x0F],
    ),
];

const WAKE_TABLE: &[InitStep] = &[
    InitStep::Write(PIXSET, &[0x55]),
    InitStep::Write(SLPOUT, &[]),
    InitStep::DelayMs(200),
    InitStep::Write(DISPON, &[]),
];

/// Memory access control per orientation (BGR order always set).
const fn madctl(orientation: Orientation) -> u16 {
    match orientation {
        Orientation::Deg0 => 0x08,
        Orientation::Deg90 => 0x68,
        Orientation::Deg180 => 0xC8,
        Orientation::Deg270 => 0xA8,
    }
}

/// ILI9341 on a 16-bit parallel bus.
pub struct Ili9341<B> {
    bus: B,
    orientation: Orientation,
}

impl<B: DisplayBus> Ili9341<B> {
    /// Wraps a bus; call `init` before drawing.
    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            orientation: Orientation::Deg0,
        }
    }

    /// Releases the bus.
    pub fn release(self) -> B { self.bus }

    fn write_range(
        &mut self,
        command: u16,
        start: u16,
        end: u16,
    ) {
        self.bus.write_command(command);
        self.bus.write_data(start >> 8);
        self.bus.write_data(start & 0xFF);
        self.bus.write_data(end >> 8);
        self.bus.write_data(end & 0xFF);
    }
}

impl<B: DisplayBus> DisplayController for Ili9341<B> {
    type Bus = B;

    #[inline]
    fn bus(&mut self) -> &mut B { &mut self.bus }

    fn expected_id(&self) -> u16 { ILI9341_ID }

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
        self.bus.write_command(RDID4);
        let _ = self.bus.read_data();
        let _ = self.bus.read_data();
        let high = self.bus.read_data() & 0xFF;
        let low = self.bus.read_data() & 0xFF;
        (high << 8) | low
    }

    fn display_on(&mut self) { self.bus.write_command(DISPON); }

    fn display_off(&mut self) { self.bus.write_command(DISPOFF); }

    fn set_cursor(
        &mut self,
        x: u16,
        y: u16,
    ) {
        self.bus.write_command(CASET);
        self.bus.write_data(x >> 8);
        self.bus.write_data(x & 0xFF);
        self.bus.write_command(PASET);
        self.bus.write_data(y >> 8);
        self.bus.write_data(y & 0xFF);
    }

    fn set_window(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    ) {
        self.write_range(CASET, x, x + width - 1);
        self.write_range(PASET, y, y + height - 1);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BusOp, NoDelay, RecordingBus};

    #[test]
    fn test_set_window_bytes() {
        let mut lcd = Ili9341::new(RecordingBus::new());
        lcd.set_window(10, 20, 5, 3);
        assert_eq!(lcd.bus().ops, vec![
            BusOp::Command(0x2A),
            BusOp::Data(0x00),
            BusOp::Data(0x0A),
            BusOp::Data(0x00),
            BusOp::Data(0x0E),
            BusOp::Command(0x2B),
            BusOp::Data(0x00),
            BusOp::Data(0x14),
            BusOp::Data(0x00),
            BusOp::Data(0x16),
        ]);
    }

    #[test]
    fn test_set_cursor_splits_high_byte() {
        let mut lcd = Ili9341::new(RecordingBus::new());
        lcd.set_cursor(300, 7);
        assert_eq!(&lcd.bus().ops[..3], &[BusOp::Command(0x2A), BusOp::Data(0x01), BusOp::Data(0x2C)]);
    }

    #[test]
    fn test_read_id() {
        let mut bus = RecordingBus::new();
        bus.reads.extend([0x00, 0x00, 0x93, 0x41]);
        let mut lcd = Ili9341::new(bus);
        assert_eq!(lcd.read_id(), ILI9341_ID);
        assert_eq!(lcd.bus().ops[0], BusOp::Command(0xD3));
    }

    #[test]
    fn test_read_pixel_decodes_triplet() {
        let mut bus = RecordingBus::new();
        bus.reads.extend([0x1234, 0xF8FC, 0xF800]);
        let mut lcd = Ili9341::new(bus);
        assert_eq!(lcd.read_pixel(1, 2), 0xFFFF);
        assert!(lcd.bus().ops.contains(&BusOp::Command(0x2E)));
    }

    #[test]
    fn test_init_programs_orientation() {
        let mut lcd = Ili9341::new(RecordingBus::new());
        lcd.init(Orientation::Deg270, &mut NoDelay);
        let ops = &lcd.bus().ops;
        let pos = ops.iter().position(|op| *op == BusOp::Command(0x36)).unwrap();
        assert_eq!(ops[pos + 1], BusOp::Data(0xA8));
        assert_eq!(ops.last(), Some(&BusOp::Command(0x29)));
        assert_eq!(lcd.size(), (320, 240));
    }
}
