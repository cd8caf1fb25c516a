//! Pixel surfaces, TFT controller drivers, drawing primitives and curve charts.
//!
//! This crate holds everything that does not touch a register directly, so it
//! builds for the STM32F4 firmware, the desktop simulator and the host test
//! harness alike:
//!
//! - [`bus`], [`controller`]: the parallel command/data bus and the three
//!   supported controllers (ILI9325, ILI9341, NT35510)
//! - [`surface`], [`framebuffer`], [`display`]: the two ways of depositing a
//!   pixel (local buffer or addressed bus write) behind one contract
//! - [`draw`], [`font`], [`bmp`]: primitives written against that contract
//! - [`chart`]: the curve chart with incremental recover/draw
//! - [`screen`]: the owned context tying panel, transfer and framebuffer
//! - [`scope`], [`sweep`]: the oscilloscope and frequency-sweep screens
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p tft-common
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`); the firmware uses the crate
//! as `no_std`.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

// === Hardware seams ===
pub mod bus;
pub mod controller;
pub mod file;

// === Pixel surfaces ===
pub mod display;
pub mod framebuffer;
pub mod screen;
pub mod surface;

// === Drawing ===
pub mod bmp;
pub mod chart;
pub mod colors;
pub mod draw;
pub mod font;

// === Application ===
pub mod fifo;
pub mod input;
pub mod scope;
pub mod signal;
pub mod sweep;

mod error;

#[cfg(test)]
mod testing;

pub use error::Error;
