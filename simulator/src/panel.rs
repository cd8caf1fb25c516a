//! Emulated NT35510 behind the parallel bus.
//!
//! Decodes the 16-bit register stream the driver writes (column/page
//! address bytes, memory write/read, display on/off, ID registers) into a
//! logical GRAM, which is then copied into the simulator window. MADCTL is
//! accepted and ignored: the GRAM is kept in logical coordinates.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::SimulatorDisplay;
use tft_common::bus::DisplayBus;
use tft_common::colors::BLACK;

const DISPOFF: u16 = 0x2800;
const DISPON: u16 = 0x2900;
const CASET: u16 = 0x2A00;
const RASET: u16 = 0x2B00;
const RAMWR: u16 = 0x2C00;
const RAMRD: u16 = 0x2E00;
const RDID1: u16 = 0xDA00;
const RDID2: u16 = 0xDB00;

/// ID bytes reported by RDID1/RDID2.
const ID: (u16, u16) = (0x00, 0x80);

/// NT35510 GRAM fed by bus writes.
pub struct EmulatedBus {
    width: u16,
    height: u16,
    gram: Vec<u16>,
    register: u16,
    columns: (u16, u16),
    pages: (u16, u16),
    pointer: (u16, u16),
    read_phase: u8,
    display_on: bool,
    dirty: bool,
}

impl EmulatedBus {
    pub fn new(
        width: u16,
        height: u16,
    ) -> Self {
        Self {
            width,
            height,
            gram: vec![0; usize::from(width) * usize::from(height)],
            register: 0,
            columns: (0, width - 1),
            pages: (0, height - 1),
            pointer: (0, 0),
            read_phase: 0,
            display_on: false,
            dirty: true,
        }
    }

    pub fn size(&self) -> Size { Size::new(u32::from(self.width), u32::from(self.height)) }

    /// Copies the GRAM into `display` if anything changed since the last call.
    ///
    /// A panel with its output off shows black.
    pub fn render(
        &mut self,
        display: &mut SimulatorDisplay<Rgb565>,
    ) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let area = Rectangle::new(Point::zero(), self.size());
        if self.display_on {
            let pixels = self.gram.iter().map(|&raw| Rgb565::from(RawU16::new(raw)));
            display.fill_contiguous(&area, pixels).ok();
        } else {
            display.fill_solid(&area, BLACK).ok();
        }
    }

    fn index(
        &self,
        (x, y): (u16, u16),
    ) -> Option<usize> {
        (x < self.width && y < self.height).then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    fn advance(&mut self) {
        let (x, y) = self.pointer;
        self.pointer = if x >= self.columns.1 {
            (self.columns.0, if y >= self.pages.1 { self.pages.0 } else { y + 1 })
        } else {
            (x + 1, y)
        };
    }

    fn set_address_byte(
        &mut self,
        byte: u16,
    ) {
        let range = if self.register < RASET { &mut self.columns } else { &mut self.pages };
        match self.register & 0x3 {
            0 => range.0 = (range.0 & 0x00FF) | (byte << 8),
            1 => range.0 = (range.0 & 0xFF00) | byte,
            2 => range.1 = (range.1 & 0x00FF) | (byte << 8),
            _ => range.1 = (range.1 & 0xFF00) | byte,
        }
    }
}

impl DisplayBus for EmulatedBus {
    fn write_command(
        &mut self,
        command: u16,
    ) {
        self.register = command;
        match command {
            RAMWR | RAMRD => {
                self.pointer = (self.columns.0, self.pages.0);
                self.read_phase = 0;
            }
            DISPOFF => {
                self.display_on = false;
                self.dirty = true;
            }
            DISPON => {
                self.display_on = true;
                self.dirty = true;
            }
            _ => {}
        }
    }

    fn write_data(
        &mut self,
        data: u16,
    ) {
        match self.register {
            CASET..=0x2A03 | RASET..=0x2B03 => self.set_address_byte(data & 0xFF),
            RAMWR => {
                if let Some(index) = self.index(self.pointer) {
                    self.gram[index] = data;
                    self.dirty = true;
                }
                self.advance();
            }
            _ => {}
        }
    }

    fn read_data(&mut self) -> u16 {
        match self.register {
            RAMRD => {
                self.read_phase += 1;
                let pixel = self.index(self.pointer).map_or(0, |index| self.gram[index]);
                let r8 = (pixel >> 11) << 3;
                let g8 = ((pixel >> 5) & 0x3F) << 2;
                let b8 = (pixel & 0x1F) << 3;
                match self.read_phase {
                    // Dummy read after RAMRD
                    1 => 0,
                    2 => (r8 << 8) | g8,
                    _ => {
                        self.advance();
                        self.read_phase = 1;
                        b8 << 8
                    }
                }
            }
            RDID1 => ID.0,
            RDID2 => ID.1,
            _ => 0,
        }
    }
}
