//! Board library - host-testable pieces of the STM32F4 firmware.
//!
//! The binary (`main.rs`) owns the peripherals and the main loop; this
//! library holds the logic that does not need them: the board configuration
//! and FSMC register words, the keypad driver (generic over
//! `embedded_hal::i2c::I2c`) and the on-panel log ring.
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p tft-stm32f4 --lib --target x86_64-unknown-linux-gnu
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod config;
pub mod keypad;
pub mod log_buffer;
