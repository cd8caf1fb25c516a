//! Ring of recent log lines for on-panel viewing.
//!
//! The firmware keeps the last few log lines next to the defmt stream so a
//! failed startup can still be diagnosed without a probe: the ring is drawn
//! on the panel with [`draw_log`].
//!
//! # Log Levels
//!
//! - `Debug`: Gray
//! - `Info`: Green
//! - `Warn`: Yellow
//! - `Error`: Red

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use heapless::String;
use tft_common::colors::{GRAY, GREEN, RED, YELLOW};
use tft_common::font::{FontSource, Text};
use tft_common::surface::PixelSurface;

/// Maximum number of log entries to keep.
pub const LOG_ENTRIES: usize = 16;

/// Maximum characters per log message.
pub const LOG_MSG_LEN: usize = 48;

/// Log severity level.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Display color for this level.
    pub const fn color(self) -> Rgb565 {
        match self {
            Self::Debug => GRAY,
            Self::Info => GREEN,
            Self::Warn => YELLOW,
            Self::Error => RED,
        }
    }

    /// Single-character prefix for this level.
    pub const fn prefix(self) -> char {
        match self {
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

/// A single log entry with level, message, and timestamp.
#[derive(Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Message, cut at a character boundary to fit.
    pub message: String<LOG_MSG_LEN>,
    /// Milliseconds since boot.
    pub timestamp_ms: u32,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        message: &str,
        timestamp_ms: u32,
    ) -> Self {
        let mut msg: String<LOG_MSG_LEN> = String::new();
        for c in message.chars() {
            if msg.push(c).is_err() {
                break;
            }
        }
        Self {
            level,
            message: msg,
            timestamp_ms,
        }
    }

    /// The line as shown on the panel: `I 12.345 message`.
    pub fn line(&self) -> String<{ LOG_MSG_LEN + 12 }> {
        let mut line = String::new();
        let seconds = self.timestamp_ms / 1000 % 100;
        let millis = self.timestamp_ms % 1000;
        let _ = write!(line, "{} {:2}.{:03} {}", self.level.prefix(), seconds, millis, self.message);
        line
    }
}

impl Default for LogEntry {
    fn default() -> Self { Self::new(LogLevel::Info, "", 0) }
}

/// Circular buffer of log entries. The oldest entry is dropped when full.
pub struct LogBuffer {
    entries: [LogEntry; LOG_ENTRIES],
    head: usize,
    count: usize,
}

impl LogBuffer {
    pub const fn new() -> Self {
        Self {
            entries: [const {
                LogEntry {
                    level: LogLevel::Info,
                    message: String::new(),
                    timestamp_ms: 0,
                }
            }; LOG_ENTRIES],
            head: 0,
            count: 0,
        }
    }

    pub fn push(
        &mut self,
        entry: LogEntry,
    ) {
        self.entries[self.head] = entry;
        self.head = (self.head + 1) % LOG_ENTRIES;
        if self.count < LOG_ENTRIES {
            self.count += 1;
        }
    }

    #[inline]
    pub const fn len(&self) -> usize { self.count }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.count == 0 }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        let start = if self.count < LOG_ENTRIES { 0 } else { self.head };
        (0..self.count).map(move |i| &self.entries[(start + i) % LOG_ENTRIES])
    }
}

impl Default for LogBuffer {
    fn default() -> Self { Self::new() }
}

/// Draws the newest entries that fit, one per line, oldest at the top.
///
/// Returns the number of lines drawn.
pub fn draw_log<S, F>(
    surface: &mut S,
    text: &mut Text<F>,
    log: &LogBuffer,
    x: i32,
    y: i32,
) -> usize
where
    S: PixelSurface + ?Sized,
    F: FontSource,
{
    let line_height = i32::from(text.size().pixels());
    let room = ((i32::from(surface.height()) - y) / line_height).max(0) as usize;
    let skip = log.len().saturating_sub(room);

    let mut drawn = 0;
    for entry in log.iter().skip(skip) {
        let line = entry.line();
        let top = y + drawn as i32 * line_height;
        text.draw_string(surface, x, top, line.as_bytes(), entry.level.color());
        drawn += 1;
    }
    drawn
}

#[cfg(test)]
mod tests {
    use tft_common::colors::{BLACK, to_raw};
    use tft_common::font::{FontFace, FontSize, ProFontSource};
    use tft_common::framebuffer::FrameBuffer;

    use super::*;

    #[test]
    fn test_entry_truncates_message() {
        let long = "x".repeat(LOG_MSG_LEN + 10);
        let entry = LogEntry::new(LogLevel::Warn, &long, 0);
        assert_eq!(entry.message.len(), LOG_MSG_LEN);
    }

    #[test]
    fn test_entry_line_format() {
        let entry = LogEntry::new(LogLevel::Error, "panel id", 12_345);
        assert_eq!(entry.line().as_str(), "E 12.345 panel id");
        let entry = LogEntry::new(LogLevel::Info, "up", 7);
        assert_eq!(entry.line().as_str(), "I  0.007 up");
    }

    #[test]
    fn test_buffer_drops_oldest() {
        let mut log = LogBuffer::new();
        assert!(log.is_empty());
        for i in 0..LOG_ENTRIES + 3 {
            log.push(LogEntry::new(LogLevel::Info, "", i as u32));
        }
        assert_eq!(log.len(), LOG_ENTRIES);
        let stamps: Vec<u32> = log.iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(stamps.first(), Some(&3));
        assert_eq!(stamps.last(), Some(&(LOG_ENTRIES as u32 + 2)));
    }

    #[test]
    fn test_draw_log_keeps_newest_lines() {
        let mut log = LogBuffer::new();
        for (i, level) in [LogLevel::Info, LogLevel::Warn, LogLevel::Error].into_iter().enumerate() {
            log.push(LogEntry::new(level, "msg", i as u32));
        }

        let mut memory = vec![0u16; 200 * 40];
        let mut fb = FrameBuffer::new(&mut memory, 0, 0, 200, 40).unwrap();
        fb.clear(BLACK);
        let mut text = Text::new(ProFontSource, FontFace::Sans, FontSize::Px16);

        // Two 16-pixel lines fit; the Info entry is dropped.
        assert_eq!(draw_log(&mut fb, &mut text, &log, 0, 0), 2);
        let pixels = fb.pixels();
        assert!(pixels.contains(&to_raw(YELLOW)));
        assert!(pixels.contains(&to_raw(RED)));
        assert!(!pixels.contains(&to_raw(GREEN)));
    }
}
