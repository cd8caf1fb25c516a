//! Host-side stand-ins for the panel, bus and delay.

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::bus::DisplayBus;
use crate::framebuffer::BlockTransfer;

/// Delay that returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(
        &mut self,
        _ns: u32,
    ) {
    }
}

/// One bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Command(u16),
    Data(u16),
    Read,
}

/// Bus that logs every transaction and replays queued read values.
#[derive(Default)]
pub struct RecordingBus {
    pub ops: Vec<BusOp>,
    pub reads: VecDeque<u16>,
}

impl RecordingBus {
    pub fn new() -> Self { Self::default() }
}

impl DisplayBus for RecordingBus {
    fn write_command(
        &mut self,
        command: u16,
    ) {
        self.ops.push(BusOp::Command(command));
    }

    fn write_data(
        &mut self,
        data: u16,
    ) {
        self.ops.push(BusOp::Data(data));
    }

    fn read_data(&mut self) -> u16 {
        self.ops.push(BusOp::Read);
        self.reads.pop_front().unwrap_or(0)
    }
}

/// GRAM emulator decoding the ILI9341 (8-bit commands, four argument bytes
/// per axis) and NT35510 (16-bit registers, one byte each) command streams.
///
/// Coordinates are logical; MADCTL is accepted and ignored.
pub struct GramBus {
    pub width: u16,
    pub height: u16,
    pub gram: Vec<u16>,
    pub commands: Vec<u16>,
    pub pixel_writes: usize,
    pub display_on: bool,
    command: u16,
    args: Vec<u16>,
    columns: (u16, u16),
    pages: (u16, u16),
    pointer: (u16, u16),
    read_phase: u8,
    id_reads: VecDeque<u16>,
}

impl GramBus {
    pub fn new(
        width: u16,
        height: u16,
    ) -> Self {
        Self {
            width,
            height,
            gram: vec![0; width as usize * height as usize],
            commands: Vec::new(),
            pixel_writes: 0,
            display_on: false,
            command: 0,
            args: Vec::new(),
            columns: (0, width - 1),
            pages: (0, height - 1),
            pointer: (0, 0),
            read_phase: 0,
            id_reads: VecDeque::new(),
        }
    }

    /// Currently addressed window as (x, y, width, height).
    pub fn window(&self) -> (u16, u16, u16, u16) {
        (
            self.columns.0,
            self.pages.0,
            self.columns.1 - self.columns.0 + 1,
            self.pages.1 - self.pages.0 + 1,
        )
    }

    pub fn pixel(
        &self,
        x: u16,
        y: u16,
    ) -> u16 {
        self.gram[y as usize * self.width as usize + x as usize]
    }

    fn advance(&mut self) {
        let (x, y) = self.pointer;
        if x >= self.columns.1 {
            let y = if y >= self.pages.1 { self.pages.0 } else { y + 1 };
            self.pointer = (self.columns.0, y);
        } else {
            self.pointer = (x + 1, y);
        }
    }

    fn current(&self) -> u16 { self.pixel(self.pointer.0, self.pointer.1) }
}

impl DisplayBus for GramBus {
    fn write_command(
        &mut self,
        command: u16,
    ) {
        self.command = command;
        self.commands.push(command);
        self.args.clear();
        match command {
            0x2C | 0x2E | 0x2C00 | 0x2E00 => {
                self.pointer = (self.columns.0, self.pages.0);
                self.read_phase = 0;
            }
            0x28 | 0x2800 => self.display_on = false,
            0x29 | 0x2900 => self.display_on = true,
            0xD3 => self.id_reads = VecDeque::from([0x00, 0x00, 0x93, 0x41]),
            0xDA00 => self.id_reads = VecDeque::from([0x00]),
            0xDB00 => self.id_reads = VecDeque::from([0x80]),
            _ => {}
        }
    }

    fn write_data(
        &mut self,
        data: u16,
    ) {
        match self.command {
            0x2A | 0x2B => {
                self.args.push(data & 0xFF);
                let a = &self.args;
                let range = if self.command == 0x2A { &mut self.columns } else { &mut self.pages };
                match a.len() {
                    2 => range.0 = (a[0] << 8) | a[1],
                    4 => range.1 = (a[2] << 8) | a[3],
                    _ => {}
                }
            }
            0x2A00..=0x2A03 | 0x2B00..=0x2B03 => {
                let range = if self.command < 0x2B00 { &mut self.columns } else { &mut self.pages };
                let byte = data & 0xFF;
                match self.command & 0x3 {
                    0 => range.0 = (range.0 & 0x00FF) | (byte << 8),
                    1 => range.0 = (range.0 & 0xFF00) | byte,
                    2 => range.1 = (range.1 & 0x00FF) | (byte << 8),
                    _ => range.1 = (range.1 & 0xFF00) | byte,
                }
            }
            0x2C | 0x2C00 => {
                let (x, y) = self.pointer;
                let index = y as usize * self.width as usize + x as usize;
                self.gram[index] = data;
                self.pixel_writes += 1;
                self.advance();
            }
            _ => self.args.push(data),
        }
    }

    fn read_data(&mut self) -> u16 {
        match self.command {
            0x2E | 0x2E00 => {
                self.read_phase += 1;
                let pixel = self.current();
                let r8 = (pixel >> 11) << 3;
                let g8 = ((pixel >> 5) & 0x3F) << 2;
                let b8 = (pixel & 0x1F) << 3;
                match self.read_phase {
                    1 => 0,
                    2 => (r8 << 8) | g8,
                    _ => {
                        self.advance();
                        self.read_phase = 1;
                        b8 << 8
                    }
                }
            }
            0xD3 | 0xDA00 | 0xDB00 => self.id_reads.pop_front().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Transfer that streams each chunk through the bus and logs its length.
#[derive(Default)]
pub struct RecordingTransfer {
    pub chunks: Vec<usize>,
    pub stall_at: Option<usize>,
}

impl<B: DisplayBus> BlockTransfer<B> for RecordingTransfer {
    fn start(
        &mut self,
        bus: &mut B,
        chunk: &[u16],
    ) {
        self.chunks.push(chunk.len());
        bus.write_slice(chunk);
    }

    fn wait(
        &mut self,
        _timeout_ms: u32,
    ) -> bool {
        self.stall_at != Some(self.chunks.len() - 1)
    }
}
