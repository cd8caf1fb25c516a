//! Oscilloscope screen: triggered current waveform on a 500x400 chart.
//!
//! Each frame captures [`SAMPLE_COUNT`] centred ADC codes, finds a rising
//! crossing of the trigger level near the middle of the capture and shows a
//! chart-wide window around it. The old curve is erased with
//! [`CurveChart::recover_grid`] before the new one is drawn, so a frame only
//! touches the pixels the two curves cover.
//!
//! The panel layout assumes an 800x480 landscape panel.

use core::fmt::Write;

use heapless::String;

use crate::Error;
use crate::chart::{ChartConfig, CurveChart};
use crate::colors::{AZURE, BLACK, DARKGRAY, GRAY, PURPLE, RED, STEELBLUE, WHITE, YELLOW, pack_rgb565};
use crate::controller::DisplayController;
use crate::draw::Draw;
use crate::font::{FontFace, FontSize, FontSource, Text};
use crate::framebuffer::BlockTransfer;
use crate::input::{Flow, KeyCode, ScopeCommand};
use crate::screen::{Overlay, Screen};
use crate::surface::PixelSurface;

// =============================================================================
// Configuration
// =============================================================================

/// Samples per capture.
pub const SAMPLE_COUNT: usize = 2048;

pub const GRID_X: u16 = 40;
pub const GRID_Y: u16 = 30;
pub const GRID_WIDTH: u16 = 500;
pub const GRID_HEIGHT: u16 = 400;

/// Milliamps per ADC code.
pub const VOLT_FACTOR: f32 = 0.019_531_25;
/// Scale applied to codes while the front end's extra gain stage is on.
pub const EXTRA_GAIN_FACTOR: f32 = 0.1;
/// RMS of a sine relative to its peak-to-peak value.
const RMS_FACTOR: f32 = 0.353_553_4;

/// Input-capture timer clock of the frequency meter.
pub const FREQ_METER_CLOCK_HZ: f32 = 6_000_000.0;

/// Trigger level range of the 18-bit ADC, in centred codes.
pub const TRIGGER_MIN: i32 = -(1 << 17);
pub const TRIGGER_MAX: i32 = (1 << 17) - 1;

/// The trigger search starts this far before the middle of the capture...
const TRIGGER_SEARCH_BACK: usize = 128;
/// ...and tries this many positions.
const TRIGGER_SEARCH_SPAN: usize = 512;

/// Minimum time between two readout refreshes.
pub const READOUT_INTERVAL_MS: u64 = 1000;
/// How long the trigger line stays visible after the level changes.
pub const TRIGGER_LINE_HOLD_MS: u64 = 1000;
/// Pause between two frames.
pub const FRAME_DELAY_MS: u64 = 24;

const TIMEBOX: (u16, u16, u16, u16) = (580, 30, 200, 130);
const VOLTBOX: (u16, u16, u16, u16) = (580, 180, 200, 130);
const READOUT_Y: u16 = GRID_Y + GRID_HEIGHT + 16;
const GAIN_BADGE: (u16, u16) = (770, 450);

const MARKER_SIZE: u16 = 11;
const MARKER_COLOR: u16 = pack_rgb565(0xFF, 0xFF, 0x00);

/// Offset marker above the chart.
static DOWN_MARKER: [u16; 121] = marker(false);
/// Offset marker left of the chart.
static RIGHT_MARKER: [u16; 121] = marker(true);

const fn marker(pointing_right: bool) -> [u16; 121] {
    let mut pixels = [0u16; 121];
    let mut row = 0;
    while row < 11 {
        let mut column = 0;
        while column < 11 {
            let (along, across) = if pointing_right { (column, row) } else { (row, column) };
            if (across - 5i32).abs() <= (10 - along) / 2 {
                pixels[(row * 11 + column) as usize] = MARKER_COLOR;
            }
            column += 1;
        }
        row += 1;
    }
    pixels
}

// =============================================================================
// Front end
// =============================================================================

/// The analog side of the scope: sampling ADC and frequency meter.
pub trait ScopeFrontEnd {
    /// Fills `samples` with one capture of centred signed codes.
    fn capture(
        &mut self,
        samples: &mut [i32],
    );

    fn set_sample_rate(
        &mut self,
        hz: u32,
    );

    /// Switches the extra gain stage.
    fn set_extra_gain(
        &mut self,
        on: bool,
    );

    /// Re-initialises the ADC.
    fn reset(&mut self);

    /// Timer ticks of the last measured input period, if one was captured
    /// since the previous call.
    fn take_period_count(&mut self) -> Option<u32>;
}

/// Ticks between two input-capture values of a timer reloading at `reload`.
pub const fn capture_period(
    first: u32,
    second: u32,
    reload: u32,
) -> u32 {
    if second > first { second - first } else { reload.wrapping_sub(first).wrapping_add(1).wrapping_add(second) }
}

// =============================================================================
// Settings
// =============================================================================

/// Horizontal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeBase {
    #[default]
    Ms1,
    Ms5,
    Ms10,
    Ms50,
}

impl TimeBase {
    pub const fn next(self) -> Self {
        match self {
            Self::Ms1 => Self::Ms5,
            Self::Ms5 => Self::Ms10,
            Self::Ms10 => Self::Ms50,
            Self::Ms50 => Self::Ms1,
        }
    }

    /// ADC rate giving 100 samples per division.
    pub const fn sample_rate(self) -> u32 {
        match self {
            Self::Ms1 => 100_000,
            Self::Ms5 => 20_000,
            Self::Ms10 => 10_000,
            Self::Ms50 => 2_000,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ms1 => "1ms/div",
            Self::Ms5 => "5ms/div",
            Self::Ms10 => "10ms/div",
            Self::Ms50 => "50ms/div",
        }
    }

    /// Horizontal offset in milliseconds.
    pub fn offset_label(
        self,
        offset: i16,
    ) -> String<16> {
        let (per_pixel, decimals) = match self {
            Self::Ms1 => (0.02, 2),
            Self::Ms5 => (0.1, 2),
            Self::Ms10 => (0.2, 1),
            Self::Ms50 => (1.0, 1),
        };
        let mut label = String::new();
        let _ = write!(label, "{:+.*}ms", decimals, f32::from(offset) * per_pixel);
        label
    }
}

/// Vertical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CurrentRange {
    Ma5,
    Ma10,
    Ma50,
    Ma100,
    Ma500,
    #[default]
    A1,
}

impl CurrentRange {
    pub const fn next(self) -> Self {
        match self {
            Self::Ma5 => Self::Ma10,
            Self::Ma10 => Self::Ma50,
            Self::Ma50 => Self::Ma100,
            Self::Ma100 => Self::Ma500,
            Self::Ma500 => Self::A1,
            Self::A1 => Self::Ma5,
        }
    }

    /// Pixels per ADC code.
    pub const fn scale(self) -> f32 {
        VOLT_FACTOR
            * match self {
                Self::Ma5 => 10.0,
                Self::Ma10 => 5.0,
                Self::Ma50 => 1.0,
                Self::Ma100 => 0.5,
                Self::Ma500 => 0.1,
                Self::A1 => 0.05,
            }
    }

    /// Smallest trigger level step, in codes.
    pub const fn trigger_step(self) -> i32 {
        match self {
            Self::Ma5 => 2,
            Self::Ma10 => 4,
            Self::Ma50 => 20,
            Self::Ma100 => 50,
            Self::Ma500 => 100,
            Self::A1 => 200,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ma5 => "5mA/div",
            Self::Ma10 => "10mA/div",
            Self::Ma50 => "50mA/div",
            Self::Ma100 => "100mA/div",
            Self::Ma500 => "500mA/div",
            Self::A1 => "1A/div",
        }
    }

    /// Vertical offset in the range's unit.
    pub fn offset_label(
        self,
        offset: i16,
    ) -> String<16> {
        let (per_pixel, decimals, unit) = match self {
            Self::Ma5 => (0.1, 1, "mA"),
            Self::Ma10 => (0.2, 1, "mA"),
            Self::Ma50 => (1.0, 0, "mA"),
            Self::Ma100 => (2.0, 0, "mA"),
            Self::Ma500 => (0.01, 2, "A"),
            Self::A1 => (0.02, 2, "A"),
        };
        let mut label = String::new();
        let _ = write!(label, "{:+.*}{}", decimals, f32::from(offset) * per_pixel, unit);
        label
    }
}

/// Everything the user can adjust.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScopeSettings {
    pub time_base: TimeBase,
    pub range: CurrentRange,
    /// Pixels the trigger point sits right of the chart centre.
    pub time_offset: i16,
    /// Pixels the zero line sits above the chart centre.
    pub volt_offset: i16,
    /// Trigger level in centred codes.
    pub trigger_level: i32,
    pub extra_gain: bool,
}

impl ScopeSettings {
    /// Chart value of a sample; values below the chart saturate to 0.
    pub fn display_value(
        &self,
        raw: i32,
    ) -> u16 {
        let gain = if self.extra_gain { EXTRA_GAIN_FACTOR } else { 1.0 };
        let value = raw as f32 * self.range.scale() * gain + f32::from(GRID_HEIGHT / 2) + f32::from(self.volt_offset);
        value as u16
    }

    /// Chart value of the trigger line.
    pub fn trigger_value(&self) -> u16 { self.display_value(self.trigger_level) }

    /// First sample of the window shown for a trigger at `trigger`.
    pub fn window_start(
        &self,
        trigger: usize,
        len: usize,
    ) -> usize {
        let width = usize::from(GRID_WIDTH);
        let begin = trigger as i64 - (width / 2) as i64 - i64::from(self.time_offset);
        begin.clamp(0, len.saturating_sub(width) as i64) as usize
    }

    /// Peak-to-peak current in milliamps for a code difference.
    pub fn milliamps(
        &self,
        codes: i32,
    ) -> f32 {
        let amps = codes as f32 * VOLT_FACTOR;
        if self.extra_gain { amps * EXTRA_GAIN_FACTOR } else { amps }
    }
}

/// Step size that grows while a key is repeated in the same direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accel {
    increasing: bool,
    delta: i32,
}

impl Accel {
    /// Signed step for one press.
    ///
    /// Repeating the previous direction grows the step by `unit`, up to
    /// `limit`; reversing starts again at `unit`.
    pub fn step(
        &mut self,
        increase: bool,
        unit: i32,
        limit: i32,
    ) -> i32 {
        let unit = if increase { unit } else { -unit };
        self.delta = if increase == self.increasing { (self.delta + unit).clamp(-limit, limit) } else { unit };
        self.increasing = increase;
        self.delta
    }
}

// =============================================================================
// Signal processing
// =============================================================================

/// Index of the first rising crossing of `level` near the middle of
/// `samples`, or the last position tried if there is none.
pub fn find_trigger(
    samples: &[i32],
    level: i32,
) -> usize {
    let start = (samples.len() / 2).saturating_sub(TRIGGER_SEARCH_BACK);
    let end = (start + TRIGGER_SEARCH_SPAN).min(samples.len().saturating_sub(1));
    (start..end)
        .find(|&i| samples[i] < level && samples[i + 1] > level)
        .unwrap_or_else(|| end.saturating_sub(1).max(start))
}

/// Mean of the four samples around `index`.
fn mean4(
    window: &[i32],
    index: usize,
) -> i32 {
    let start = index.saturating_sub(2).min(window.len().saturating_sub(4));
    let run = &window[start..(start + 4).min(window.len())];
    (run.iter().map(|&v| i64::from(v)).sum::<i64>() / run.len() as i64) as i32
}

/// Code difference between the averaged maximum and minimum of `window`.
pub fn peak_to_peak(window: &[i32]) -> Option<i32> {
    let max = *window.iter().max()?;
    let min = *window.iter().min()?;
    let max_index = window.iter().position(|&v| v == max)?;
    let min_index = window.iter().position(|&v| v == min)?;
    Some(mean4(window, max_index) - mean4(window, min_index))
}

/// Current with `decimals` places in mA, or three places in A from 1 A up.
pub fn format_current(
    milliamps: f32,
    decimals: usize,
) -> String<16> {
    let mut text = String::new();
    if milliamps < 1000.0 {
        let _ = write!(text, "{:.*}mA", decimals, milliamps);
    } else {
        let _ = write!(text, "{:.3}A", milliamps * 0.001);
    }
    text
}

/// Input frequency for a period of `count` meter ticks.
///
/// Periods of 600 ticks or fewer (above 10 kHz) are out of range.
pub fn format_frequency(count: Option<u32>) -> String<16> {
    let mut text = String::new();
    match count {
        Some(count) if count > 600 => {
            let decimals = if count > 60_000 { 3 } else { 2 };
            let _ = write!(text, "{:.*}Hz", decimals, FREQ_METER_CLOCK_HZ / count as f32);
        }
        _ => {
            let _ = text.push_str("------");
        }
    }
    text
}

// =============================================================================
// Screen
// =============================================================================

/// The oscilloscope screen.
pub struct ScopeScreen<F, A> {
    chart: CurveChart,
    text: Text<F>,
    front_end: A,
    settings: ScopeSettings,
    samples: [i32; SAMPLE_COUNT],
    display: [u16; GRID_WIDTH as usize],
    horizontal: Accel,
    vertical: Accel,
    trigger: Accel,
    last_readout_ms: u64,
    trigger_line_since: Option<u64>,
}

impl<F: FontSource, A: ScopeFrontEnd> ScopeScreen<F, A> {
    /// # Errors
    ///
    /// Chart validation errors.
    pub fn new(
        fonts: F,
        front_end: A,
    ) -> Result<Self, Error> {
        let chart = CurveChart::new(ChartConfig {
            x: GRID_X,
            y: GRID_Y,
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            coarse_grid_width: 100,
            coarse_grid_height: 50,
            fine_grid_width: 10,
            fine_grid_height: 10,
            border_color: WHITE,
            background_color: BLACK,
            coarse_grid_color: GRAY,
            fine_grid_color: DARKGRAY,
        })?;
        Ok(Self {
            chart,
            text: Text::new(fonts, FontFace::Sans, FontSize::Px24),
            front_end,
            settings: ScopeSettings::default(),
            samples: [0; SAMPLE_COUNT],
            display: [0; GRID_WIDTH as usize],
            horizontal: Accel::default(),
            vertical: Accel::default(),
            trigger: Accel::default(),
            last_readout_ms: 0,
            trigger_line_since: None,
        })
    }

    pub const fn settings(&self) -> &ScopeSettings { &self.settings }

    pub fn front_end(&mut self) -> &mut A { &mut self.front_end }

    // =========================================================================
    // Layout helpers
    // =========================================================================

    /// Erases the trigger line before anything that moves it.
    fn hide_trigger_line<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        if self.trigger_line_since.take().is_some() {
            self.chart.recover_line_y(&mut screen.plot(), self.settings.trigger_value());
        }
    }

    /// Replaces a centred label and the offset readout of an info box.
    fn draw_box_values<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        area: (u16, u16, u16, u16),
        label: &str,
        offset: &str,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let (x, y, width, _) = area;
        let (x, y) = (i32::from(x), i32::from(y));
        let lcd = screen.lcd();
        lcd.fill(x + 12, y + 36, width - 24, 24, BLACK);
        let label_x = x + (i32::from(width) - self.text.measure(label.as_bytes())) / 2;
        self.text.draw_string(lcd, label_x, y + 36, label.as_bytes(), YELLOW);
        lcd.fill(x + 44, y + 96, 144, 24, BLACK);
        self.text.draw_string(lcd, x + 44, y + 96, offset.as_bytes(), YELLOW);
    }

    fn draw_time_base<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let base = self.settings.time_base;
        let offset = base.offset_label(self.settings.time_offset);
        self.draw_box_values(screen, TIMEBOX, base.label(), &offset);
    }

    fn draw_range<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let range = self.settings.range;
        let offset = range.offset_label(self.settings.volt_offset);
        self.draw_box_values(screen, VOLTBOX, range.label(), &offset);
    }

    /// Draws (or erases) the marker above the chart and the offset readout.
    fn draw_horizontal_marker<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        erase: bool,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let x = i32::from(GRID_X + GRID_WIDTH / 2) + i32::from(self.settings.time_offset) - 5;
        let y = i32::from(GRID_Y) - 12;
        if erase {
            screen.lcd().fill(x, y, MARKER_SIZE, MARKER_SIZE, BLACK);
        } else {
            screen.lcd().bitmap(x, y, MARKER_SIZE, MARKER_SIZE, &DOWN_MARKER);
            self.draw_time_base(screen);
        }
    }

    /// Draws (or erases) the marker left of the chart and the offset readout.
    fn draw_vertical_marker<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        erase: bool,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let x = i32::from(GRID_X) - 12;
        let y = i32::from(GRID_Y + GRID_HEIGHT / 2) - i32::from(self.settings.volt_offset) - 5;
        if erase {
            screen.lcd().fill(x, y, MARKER_SIZE, MARKER_SIZE, BLACK);
        } else {
            screen.lcd().bitmap(x, y, MARKER_SIZE, MARKER_SIZE, &RIGHT_MARKER);
            self.draw_range(screen);
        }
    }

    fn draw_gain_badge<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let (x, y) = (i32::from(GAIN_BADGE.0), i32::from(GAIN_BADGE.1));
        let lcd = screen.lcd();
        lcd.fill(x, y, 24, 24, BLACK);
        let (badge, color) = if self.settings.extra_gain { (b"HG", RED) } else { (b"LG", STEELBLUE) };
        self.text.draw_string(lcd, x, y, badge, color);
    }

    fn draw_readouts<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        pp_milliamps: f32,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let frequency = format_frequency(self.front_end.take_period_count());
        let pp = format_current(pp_milliamps, 1);
        let rms = format_current(pp_milliamps * RMS_FACTOR, 2);

        let lcd = screen.lcd();
        let y = i32::from(READOUT_Y);
        for (offset, value) in [(64, &frequency), (280, &pp), (472, &rms)] {
            let x = i32::from(GRID_X) + offset;
            lcd.fill(x, y, 108, 24, BLACK);
            self.text.draw_string(lcd, x, y, value.as_bytes(), PURPLE);
        }
    }
}

impl<F: FontSource, A: ScopeFrontEnd> Overlay for ScopeScreen<F, A> {
    /// Draws the static layout and configures the front end.
    fn init<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        screen.lcd().clear(BLACK);
        self.display = [0; GRID_WIDTH as usize];
        self.chart.init(screen)?;

        let lcd = screen.lcd();
        let (x, y, width, height) = TIMEBOX;
        lcd.rect(i32::from(x), i32::from(y), width, height, WHITE);
        self.text.draw_string(lcd, i32::from(x) + 12, i32::from(y) + 6, b"Time base", WHITE);
        self.text.draw_string(lcd, i32::from(x) + 36, i32::from(y) + 66, b"H offset", WHITE);

        let (x, y, width, height) = VOLTBOX;
        lcd.rect(i32::from(x), i32::from(y), width, height, WHITE);
        self.text.draw_string(lcd, i32::from(x) + 12, i32::from(y) + 6, b"Current", WHITE);
        self.text.draw_string(lcd, i32::from(x) + 36, i32::from(y) + 66, b"V offset", WHITE);

        let readout_y = i32::from(READOUT_Y);
        let grid_x = i32::from(GRID_X);
        self.text.draw_string(lcd, grid_x, readout_y, b"Freq", WHITE);
        self.text.draw_string(lcd, grid_x + 192, readout_y, b"Ipp", WHITE);
        self.text.draw_string(lcd, grid_x + 384, readout_y, b"Irms", WHITE);

        self.draw_time_base(screen);
        self.draw_range(screen);
        self.draw_horizontal_marker(screen, false);
        self.draw_vertical_marker(screen, false);
        self.draw_gain_badge(screen);

        self.front_end.set_sample_rate(self.settings.time_base.sample_rate());
        self.front_end.set_extra_gain(self.settings.extra_gain);
        Ok(())
    }

    /// Captures, redraws the curve and, when due, the readouts.
    fn frame<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        now_ms: u64,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        self.front_end.capture(&mut self.samples);
        let trigger = find_trigger(&self.samples, self.settings.trigger_level);
        let begin = self.settings.window_start(trigger, SAMPLE_COUNT);
        let window = &self.samples[begin..begin + usize::from(GRID_WIDTH)];
        let pp_codes = peak_to_peak(window).unwrap_or(0);

        {
            let mut plot = screen.plot();
            self.chart.recover_grid(&mut plot, &self.display);
            for (value, &raw) in self.display.iter_mut().zip(window) {
                *value = self.settings.display_value(raw);
            }
            self.chart.draw_curve(&mut plot, &self.display, RED);

            if let Some(since) = self.trigger_line_since {
                let level = self.settings.trigger_value();
                if now_ms.saturating_sub(since) >= TRIGGER_LINE_HOLD_MS {
                    self.chart.recover_line_y(&mut plot, level);
                    self.trigger_line_since = None;
                } else {
                    self.chart.draw_dashed_line_y(&mut plot, level, AZURE);
                }
            }
        }

        if now_ms.saturating_sub(self.last_readout_ms) >= READOUT_INTERVAL_MS {
            self.last_readout_ms = now_ms;
            self.draw_readouts(screen, self.settings.milliamps(pp_codes));
        }

        screen.present()
    }

    fn handle_key<C, T>(
        &mut self,
        code: KeyCode,
        screen: &mut Screen<'_, C, T>,
        now_ms: u64,
    ) -> Flow
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let Some(command) = ScopeCommand::from_key(code) else { return Flow::Continue };
        match command {
            ScopeCommand::NextTimeBase => {
                self.settings.time_base = self.settings.time_base.next();
                self.draw_time_base(screen);
                self.front_end.set_sample_rate(self.settings.time_base.sample_rate());
            }
            ScopeCommand::NextCurrentRange => {
                self.hide_trigger_line(screen);
                self.settings.range = self.settings.range.next();
                self.draw_range(screen);
            }
            ScopeCommand::ShiftRight | ScopeCommand::ShiftLeft => {
                let delta = self.horizontal.step(command == ScopeCommand::ShiftRight, 1, 10);
                self.draw_horizontal_marker(screen, true);
                let limit = (GRID_WIDTH / 2) as i16;
                self.settings.time_offset = (self.settings.time_offset + delta as i16).clamp(-limit, limit);
                self.draw_horizontal_marker(screen, false);
            }
            ScopeCommand::ShiftUp | ScopeCommand::ShiftDown => {
                self.hide_trigger_line(screen);
                let delta = self.vertical.step(command == ScopeCommand::ShiftUp, 1, 10);
                self.draw_vertical_marker(screen, true);
                let limit = (GRID_HEIGHT / 2) as i16;
                self.settings.volt_offset = (self.settings.volt_offset + delta as i16).clamp(-limit, limit);
                self.draw_vertical_marker(screen, false);
            }
            ScopeCommand::TriggerUp | ScopeCommand::TriggerDown => {
                let unit = self.settings.range.trigger_step();
                let delta = self.trigger.step(command == ScopeCommand::TriggerUp, unit, 1000);
                let mut plot = screen.plot();
                self.chart.recover_line_y(&mut plot, self.settings.trigger_value());
                self.settings.trigger_level = (self.settings.trigger_level + delta).clamp(TRIGGER_MIN, TRIGGER_MAX);
                self.chart.draw_dashed_line_y(&mut plot, self.settings.trigger_value(), AZURE);
                self.trigger_line_since = Some(now_ms);
            }
            ScopeCommand::ResetFrontEnd => {
                self.front_end.reset();
                self.front_end.set_sample_rate(self.settings.time_base.sample_rate());
            }
            ScopeCommand::ToggleGain => {
                self.hide_trigger_line(screen);
                self.settings.extra_gain = !self.settings.extra_gain;
                self.front_end.set_extra_gain(self.settings.extra_gain);
                self.draw_gain_badge(screen);
            }
            ScopeCommand::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    fn frame_delay_ms(&self) -> u64 { FRAME_DELAY_MS }
}
