//! FSMC bring-up and the memory-mapped panel bus.
//!
//! The panel sits on NE4 with RS on A6, the external SRAM on NE3. Both are
//! 16-bit asynchronous SRAM-type devices; after [`init`] a volatile store to
//! the command or data address is one bus cycle to the panel.

use core::ptr;

use embassy_stm32::pac;
use embassy_stm32::pac::gpio::{Gpio, vals};
use tft_common::bus::DisplayBus;
use tft_stm32f4::config::{
    FRAMEBUFFER_PIXELS,
    LCD_READ_TIMING,
    LCD_REGION,
    LCD_WRITE_TIMING,
    SRAM_BASE_ADDR,
    SRAM_REGION,
    SRAM_TIMING,
    bcr_address,
    btr_address,
    bwtr_address,
    sram_control,
};

/// FSMC alternate function number.
const AF_FSMC: u8 = 12;

/// FSMC pins per port: panel D0-D15, NOE, NWE, NE4, A6 and SRAM A0-A18,
/// NE3, NBL0/1.
const FSMC_PINS: [(Gpio, u16); 4] = [
    // D0-D3, NOE, NWE, D13-D15, A16-A18
    (pac::GPIOD, 0xFF33),
    // NBL0, NBL1, D4-D12
    (pac::GPIOE, 0xFF83),
    // A0-A5, A6-A9
    (pac::GPIOF, 0xF03F),
    // A10-A15, NE3, NE4
    (pac::GPIOG, 0x143F),
];

/// Routes the FSMC pins and programs both chip selects.
///
/// # Safety
///
/// Must run once, before any access to the panel or SRAM windows, and
/// nothing else may own the listed GPIO pins.
pub unsafe fn init() {
    pac::RCC.ahb3enr().modify(|w| w.set_fsmcen(true));

    for (port, mask) in FSMC_PINS {
        for pin in (0..16).filter(|pin| mask & (1 << pin) != 0) {
            port.moder().modify(|w| w.set_moder(pin, vals::Moder::ALTERNATE));
            port.ospeedr().modify(|w| w.set_ospeedr(pin, vals::Ospeedr::VERY_HIGH_SPEED));
            port.afr(pin / 8).modify(|w| w.set_afr(pin % 8, AF_FSMC));
        }
    }

    // SAFETY: fixed FSMC control register addresses on STM32F4.
    unsafe {
        write_register(btr_address(LCD_REGION), LCD_READ_TIMING.register());
        write_register(bwtr_address(LCD_REGION), LCD_WRITE_TIMING.register());
        write_register(bcr_address(LCD_REGION), sram_control(true));

        write_register(btr_address(SRAM_REGION), SRAM_TIMING.register());
        write_register(bcr_address(SRAM_REGION), sram_control(false));
    }
}

unsafe fn write_register(
    address: u32,
    value: u32,
) {
    // SAFETY: caller passes an FSMC register address.
    unsafe { ptr::write_volatile(address as *mut u32, value) };
}

/// The whole external SRAM as pixel memory.
///
/// # Safety
///
/// [`init`] must have run, and the slice must be the only reference to
/// the SRAM window.
pub unsafe fn sram() -> &'static mut [u16] {
    // SAFETY: SRAM_BASE_ADDR maps FRAMEBUFFER_PIXELS halfwords once NE3 is enabled.
    unsafe { core::slice::from_raw_parts_mut(SRAM_BASE_ADDR as *mut u16, FRAMEBUFFER_PIXELS) }
}

/// Panel command/data registers behind the FSMC.
pub struct FsmcBus {
    command: *mut u16,
    data: *mut u16,
}

impl FsmcBus {
    /// # Safety
    ///
    /// Both addresses must be mapped by an initialised FSMC region and this
    /// must be the only bus handle for them.
    pub const unsafe fn new(
        command_addr: u32,
        data_addr: u32,
    ) -> Self {
        Self {
            command: command_addr as *mut u16,
            data: data_addr as *mut u16,
        }
    }

    /// Destination for bulk pixel transfers.
    #[inline]
    pub fn data_address(&self) -> u32 { self.data as u32 }
}

impl DisplayBus for FsmcBus {
    #[inline]
    fn write_command(
        &mut self,
        command: u16,
    ) {
        // SAFETY: mapped panel register (see `new`).
        unsafe { ptr::write_volatile(self.command, command) };
    }

    #[inline]
    fn write_data(
        &mut self,
        data: u16,
    ) {
        // SAFETY: mapped panel register (see `new`).
        unsafe { ptr::write_volatile(self.data, data) };
    }

    #[inline]
    fn read_data(&mut self) -> u16 {
        // SAFETY: mapped panel register (see `new`).
        unsafe { ptr::read_volatile(self.data) }
    }
}
