//! Board configuration.
//!
//! Everything here is plain data so it can be checked on the host: which
//! panel is fitted and how it is driven, where the FSMC maps the panel and
//! the external SRAM, and the register words the FSMC is programmed with.

use tft_common::controller::{Orientation, PanelKind};
use tft_common::screen::Backing;

// =============================================================================
// Board selection
// =============================================================================

/// Startup choices for the display path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Controller on the panel module.
    pub panel: PanelKind,
    /// Mounting rotation.
    pub orientation: Orientation,
    /// Whether the chart area is drawn directly or through SRAM.
    pub backing: Backing,
}

impl BoardConfig {
    /// The 800x480 NT35510 module mounted landscape.
    pub const fn new() -> Self {
        Self {
            panel: PanelKind::Nt35510,
            orientation: Orientation::Deg270,
            backing: if cfg!(feature = "framebuffer") { Backing::Buffered } else { Backing::Direct },
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self { Self::new() }
}

/// Configuration the firmware boots with.
pub const BOARD: BoardConfig = BoardConfig::new();

// =============================================================================
// FSMC address map
// =============================================================================

/// Start of FSMC bank 1 (four NOR/SRAM regions of 64 MiB).
pub const FSMC_BANK1_BASE: u32 = 0x6000_0000;

/// Chip select of the panel (NE4).
pub const LCD_REGION: u8 = 3;

/// Address line wired to the panel's RS pin (A6).
pub const LCD_RS_ADDRESS_LINE: u8 = 6;

/// Chip select of the external SRAM (NE3).
pub const SRAM_REGION: u8 = 2;

/// Size of the external SRAM (512K x 16).
pub const SRAM_BYTES: usize = 1024 * 1024;

/// Base address of NOR/SRAM region `region` (0 = NE1 .. 3 = NE4).
#[inline]
pub const fn region_base(region: u8) -> u32 { FSMC_BANK1_BASE | ((region as u32) << 26) }

/// Address that drives RS high when the FSMC is in 16-bit mode.
///
/// The FSMC puts byte addresses on the bus shifted right by one for 16-bit
/// memories, so address line `n` is bit `n + 1`.
#[inline]
pub const fn data_address(
    base: u32,
    rs_line: u8,
) -> u32 {
    base + (1 << (rs_line + 1))
}

/// Panel command register.
pub const LCD_COMMAND_ADDR: u32 = region_base(LCD_REGION);

/// Panel data register.
pub const LCD_DATA_ADDR: u32 = data_address(LCD_COMMAND_ADDR, LCD_RS_ADDRESS_LINE);

/// First byte of external SRAM.
pub const SRAM_BASE_ADDR: u32 = region_base(SRAM_REGION);

/// Framebuffer capacity in pixels when backed by the whole SRAM.
pub const FRAMEBUFFER_PIXELS: usize = SRAM_BYTES / 2;

// =============================================================================
// FSMC register encoding
// =============================================================================

/// FSMC control register block.
pub const FSMC_REGISTERS: u32 = 0xA000_0000;

/// Address of BCRx for `region`.
#[inline]
pub const fn bcr_address(region: u8) -> u32 { FSMC_REGISTERS + 8 * region as u32 }

/// Address of BTRx for `region`.
#[inline]
pub const fn btr_address(region: u8) -> u32 { FSMC_REGISTERS + 4 + 8 * region as u32 }

/// Address of BWTRx for `region`.
#[inline]
pub const fn bwtr_address(region: u8) -> u32 { FSMC_REGISTERS + 0x104 + 8 * region as u32 }

const BCR_MBKEN: u32 = 1 << 0;
const BCR_MWID_16: u32 = 0b01 << 4;
const BCR_WREN: u32 = 1 << 12;
const BCR_EXTMOD: u32 = 1 << 14;

/// Asynchronous SRAM-type control word for a 16-bit device.
///
/// `split_timing` selects separate read (BTR) and write (BWTR) timings.
#[inline]
pub const fn sram_control(split_timing: bool) -> u32 {
    let base = BCR_MBKEN | BCR_MWID_16 | BCR_WREN;
    if split_timing { base | BCR_EXTMOD } else { base }
}

/// Mode-A asynchronous access timing, in HCLK cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsmcTiming {
    /// ADDSET, 0..=15.
    pub address_setup: u8,
    /// DATAST, 1..=255.
    pub data_setup: u8,
    /// BUSTURN, 0..=15.
    pub bus_turnaround: u8,
}

impl FsmcTiming {
    /// Packs the fields into a BTR/BWTR word (access mode A).
    #[inline]
    pub const fn register(self) -> u32 {
        (self.address_setup as u32 & 0xF)
            | ((self.data_setup as u32) << 8)
            | ((self.bus_turnaround as u32 & 0xF) << 16)
    }
}

/// Panel reads are slow on the NT35510.
pub const LCD_READ_TIMING: FsmcTiming = FsmcTiming {
    address_setup: 15,
    data_setup: 60,
    bus_turnaround: 0,
};

pub const LCD_WRITE_TIMING: FsmcTiming = FsmcTiming {
    address_setup: 9,
    data_setup: 9,
    bus_turnaround: 0,
};

pub const SRAM_TIMING: FsmcTiming = FsmcTiming {
    address_setup: 0,
    data_setup: 8,
    bus_turnaround: 0,
};

// =============================================================================
// Timing
// =============================================================================

/// Keypad INT hold-off after an accepted edge.
pub const KEY_DEBOUNCE_MS: u64 = 20;

/// I2C bus frequency of the keypad controller.
pub const KEYPAD_I2C_HZ: u32 = 100_000;

/// Splash screen hold time before the first screen starts.
pub const SPLASH_MS: u64 = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcd_addresses() {
        assert_eq!(LCD_COMMAND_ADDR, 0x6C00_0000);
        assert_eq!(LCD_DATA_ADDR, 0x6C00_0080);
    }

    #[test]
    fn test_sram_address() {
        assert_eq!(SRAM_BASE_ADDR, 0x6800_0000);
        assert_eq!(region_base(0), 0x6000_0000);
        assert_eq!(region_base(1), 0x6400_0000);
    }

    #[test]
    fn test_framebuffer_fits_scope_chart() {
        // 500 x 400 chart.
        assert!(FRAMEBUFFER_PIXELS >= 500 * 400);
    }

    #[test]
    fn test_register_addresses() {
        assert_eq!(bcr_address(0), 0xA000_0000);
        assert_eq!(btr_address(0), 0xA000_0004);
        assert_eq!(bcr_address(3), 0xA000_0018);
        assert_eq!(btr_address(3), 0xA000_001C);
        assert_eq!(bwtr_address(3), 0xA000_011C);
    }

    #[test]
    fn test_control_words() {
        assert_eq!(sram_control(false), 0x1011);
        assert_eq!(sram_control(true), 0x5011);
    }

    #[test]
    fn test_timing_words() {
        assert_eq!(LCD_READ_TIMING.register(), 0x3C0F);
        assert_eq!(LCD_WRITE_TIMING.register(), 0x0909);
        assert_eq!(SRAM_TIMING.register(), 0x0800);
        let turned = FsmcTiming {
            address_setup: 1,
            data_setup: 2,
            bus_turnaround: 3,
        };
        assert_eq!(turned.register(), 0x0003_0201);
    }

    #[test]
    fn test_default_board() {
        let board = BoardConfig::default();
        assert_eq!(board.panel, PanelKind::Nt35510);
        assert_eq!(board.orientation, Orientation::Deg270);
        assert_eq!(board, BOARD);
    }
}
