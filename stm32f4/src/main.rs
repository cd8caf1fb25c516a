//! STM32F4 TFT firmware: oscilloscope and frequency-sweep screens.
//!
//! Drives an ILI9325, ILI9341 or NT35510 panel over the FSMC, optionally
//! through an external-SRAM framebuffer flushed by DMA.
//!
//! # Architecture
//!
//! A single Embassy task owns the panel, the keypad and both screens:
//! - Poll the keypad INT line; on an edge read the key over I2C and queue it
//! - Hand the running screen one queued key, then let it draw a frame
//! - Sleep for the screen's frame delay
//!
//! The exit key of either screen switches to the other one.
//!
//! Host builds compile only the library; the firmware needs the
//! `thumbv7em-none-eabihf` target set in `.cargo/config.toml`.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

#[cfg(target_arch = "arm")]
#[macro_use]
mod logging;

#[cfg(target_arch = "arm")]
mod dma;
#[cfg(target_arch = "arm")]
mod firmware;
#[cfg(target_arch = "arm")]
mod fsmc;

#[cfg(not(target_arch = "arm"))]
fn main() {}
