//! Global log ring and the `log_*!` macros.
//!
//! Each macro formats the message once into a `heapless::String` for the
//! on-panel ring and forwards the same arguments to defmt.
//!
//! ```ignore
//! log_info!("Panel {:?} ready", kind);
//! log_warn!("Flush failed: {}", err);
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use tft_stm32f4::log_buffer::{LogBuffer, LogEntry, LogLevel};

/// Recent log lines, shown on the panel when startup fails.
pub static LOG_BUFFER: Mutex<CriticalSectionRawMutex, LogBuffer> = Mutex::new(LogBuffer::new());

/// Appends to the ring. Dropped if the ring is locked.
pub fn push_log(
    level: LogLevel,
    message: &str,
) {
    let timestamp = embassy_time::Instant::now().as_millis() as u32;
    if let Ok(mut buffer) = LOG_BUFFER.try_lock() {
        buffer.push(LogEntry::new(level, message, timestamp));
    }
}

macro_rules! log_at {
    ($level:ident, $defmt:ident, $($arg:tt)*) => {{
        use core::fmt::Write;
        let mut buf: heapless::String<{ tft_stm32f4::log_buffer::LOG_MSG_LEN }> = heapless::String::new();
        let _ = write!(buf, $($arg)*);
        $crate::logging::push_log(tft_stm32f4::log_buffer::LogLevel::$level, buf.as_str());
        defmt::$defmt!($($arg)*);
    }};
}

macro_rules! log_info {
    ($($arg:tt)*) => { log_at!(Info, info, $($arg)*) };
}

macro_rules! log_warn {
    ($($arg:tt)*) => { log_at!(Warn, warn, $($arg)*) };
}

macro_rules! log_error {
    ($($arg:tt)*) => { log_at!(Error, error, $($arg)*) };
}

macro_rules! log_debug {
    ($($arg:tt)*) => { log_at!(Debug, debug, $($arg)*) };
}
