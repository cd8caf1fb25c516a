//! Frequency-sweep screen: detector level against frequency.
//!
//! Every frame the front end steps its generator through the sweep range and
//! reports one detector level per step. Levels are optionally normalised
//! against a calibration sweep, scaled to chart values (200 is 0 dB, one
//! pixel is 0.2 dB) and linearly interpolated to the chart width. Two
//! cursors read frequency and gain at their columns.

use core::fmt::Write;

use heapless::String;

use crate::Error;
use crate::chart::{ChartConfig, CurveChart};
use crate::colors::{BLACK, BROWN, DARKGRAY, GRAY, LIGHTGRAY, RED, WHITE, YELLOW};
use crate::controller::DisplayController;
use crate::draw::Draw;
use crate::font::{FontFace, FontSize, FontSource, GlyphCode, Text};
use crate::framebuffer::BlockTransfer;
use crate::input::{EditCommand, EntryKey, EntryState, Flow, KeyCode, NumberEntry, SweepCommand};
use crate::screen::{Overlay, Screen};
use crate::surface::PixelSurface;

// =============================================================================
// Configuration
// =============================================================================

pub const GRID_X: u16 = 40;
pub const GRID_Y: u16 = 30;
pub const GRID_WIDTH: u16 = 500;
pub const GRID_HEIGHT: u16 = 400;

/// Fewest and most sweep points a range may produce.
pub const MIN_SAMPLE_COUNT: u32 = 50;
pub const MAX_SAMPLE_COUNT: u32 = 1000;

/// Highest sweep frequency in kHz.
pub const MAX_STOP_KHZ: u32 = 200_000;
/// Lowest sweep stop frequency in kHz.
pub const MIN_STOP_KHZ: u32 = 100;

/// Detector code of a 0 dB response.
pub const REFERENCE_LEVEL: i16 = 1241;
/// Chart value per detector code.
pub const LEVEL_SCALE: f32 = 0.161_133;
/// Chart value of 0 dB.
pub const ZERO_DB_VALUE: u16 = 200;
pub const DB_PER_PIXEL: f32 = 0.2;

/// Generator amplitude, in 2 mV units.
pub const MAX_AMPLITUDE: u8 = 50;

pub const FRAME_DELAY_MS: u64 = 33;

const CURSOR_STEP: u16 = 2;

const FREQBOX: (u16, u16, u16, u16) = (580, 30, 200, 104);
const AMPBOX: (u16, u16, u16, u16) = (580, 150, 200, 56);
const CURSORBOX: (u16, u16, u16, u16) = (580, 222, 200, 196);
const ENTRY: (u16, u16) = (580, 430);
/// Width of the "Value:" prompt.
const ENTRY_PROMPT_WIDTH: u16 = 56;
const VALUE_COLUMN: i32 = 85;

const FONT_HEIGHT: u16 = 16;

// =============================================================================
// Front end
// =============================================================================

/// Signal generator plus level detector.
pub trait SweepFrontEnd {
    /// Steps from `start_khz` by `step_khz`, one detector level per entry of
    /// `levels`.
    fn sweep(
        &mut self,
        start_khz: u32,
        step_khz: u32,
        levels: &mut [i16],
    );

    /// Output amplitude in 2 mV units (1 to [`MAX_AMPLITUDE`]).
    fn set_amplitude(
        &mut self,
        amplitude: u8,
    );
}

// =============================================================================
// Sweep range
// =============================================================================

/// An editable sweep parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SweepParam {
    Start,
    Stop,
    Step,
}

impl SweepParam {
    const fn index(self) -> u16 {
        match self {
            Self::Start => 0,
            Self::Stop => 1,
            Self::Step => 2,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Start => Self::Stop,
            Self::Stop => Self::Step,
            Self::Step => Self::Start,
        }
    }

    pub const fn previous(self) -> Self {
        match self {
            Self::Start => Self::Step,
            Self::Stop => Self::Start,
            Self::Step => Self::Stop,
        }
    }
}

/// Start, stop and step of a sweep, in kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepRange {
    pub start_khz: u32,
    pub stop_khz: u32,
    pub step_khz: u32,
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            start_khz: 1000,
            stop_khz: 50_000,
            step_khz: 100,
        }
    }
}

impl SweepRange {
    /// Number of sweep points.
    pub const fn sample_count(&self) -> u32 {
        if self.step_khz == 0 { 0 } else { self.stop_khz.saturating_sub(self.start_khz) / self.step_khz }
    }

    pub const fn get(
        &self,
        param: SweepParam,
    ) -> u32 {
        match param {
            SweepParam::Start => self.start_khz,
            SweepParam::Stop => self.stop_khz,
            SweepParam::Step => self.step_khz,
        }
    }

    pub fn set(
        &mut self,
        param: SweepParam,
        khz: u32,
    ) {
        match param {
            SweepParam::Start => self.start_khz = khz,
            SweepParam::Stop => self.stop_khz = khz,
            SweepParam::Step => self.step_khz = khz,
        }
    }

    fn count_in_bounds(&self) -> bool {
        self.step_khz != 0 && (MIN_SAMPLE_COUNT..=MAX_SAMPLE_COUNT).contains(&self.sample_count())
    }

    /// Accepts edited values, falling back to `previous` where they are
    /// unusable.
    ///
    /// An inverted or out-of-band range restores start and stop; a point
    /// count out of bounds then restores the step. If the count is still out
    /// of bounds the whole previous range comes back.
    pub fn commit(
        &mut self,
        previous: &SweepRange,
    ) {
        if self.start_khz > self.stop_khz || self.stop_khz < MIN_STOP_KHZ || self.stop_khz > MAX_STOP_KHZ {
            self.start_khz = previous.start_khz;
            self.stop_khz = previous.stop_khz;
        }
        if !self.count_in_bounds() {
            self.step_khz = previous.step_khz;
        }
        if !self.count_in_bounds() {
            *self = *previous;
        }
    }

    /// Frequency in MHz at chart column `x` of `width`.
    pub fn frequency_at(
        &self,
        x: u16,
        width: u16,
    ) -> f32 {
        let span = u64::from(self.stop_khz.saturating_sub(self.start_khz));
        let khz = u64::from(self.start_khz) + span * u64::from(x) / u64::from(width.max(1));
        khz as f32 * 0.001
    }
}

// =============================================================================
// Signal processing
// =============================================================================

/// Stores the offset of each calibration level from the 0 dB code.
pub fn normalize(
    levels: &[i16],
    normalization: &mut [i16],
) {
    for (norm, &level) in normalization.iter_mut().zip(levels) {
        *norm = level.wrapping_sub(REFERENCE_LEVEL);
    }
}

/// Converts detector levels to chart values after removing the calibration.
pub fn scale_levels(
    levels: &[i16],
    normalization: &[i16],
    values: &mut [u16],
) {
    for ((value, &level), &norm) in values.iter_mut().zip(levels).zip(normalization) {
        *value = (f32::from(level.saturating_sub(norm)) * LEVEL_SCALE) as u16;
    }
}

/// Stretches `samples` over `out` by linear interpolation in 12.20 fixed
/// point. Positions at or past the last sample take its value.
pub fn interpolate(
    samples: &[u16],
    out: &mut [u16],
) {
    let Some(&last) = samples.last() else {
        out.fill(0);
        return;
    };
    let count = samples.len() as u64;
    let width = out.len() as u64;
    for (i, value) in out.iter_mut().enumerate() {
        let x = ((i as u64) << 20) / width * count;
        let index = (x >> 20) as usize;
        *value = if index + 1 >= samples.len() {
            last
        } else {
            let fraction = (x & 0xF_FFFF) as i64;
            let y0 = i64::from(samples[index]);
            let y1 = i64::from(samples[index + 1]);
            ((y0 * ((1 << 20) - fraction) + y1 * fraction) >> 20) as u16
        };
    }
}

/// Gain in dB shown by chart value `value`.
pub fn gain_db(value: u16) -> f32 { (f32::from(value) - f32::from(ZERO_DB_VALUE)) * DB_PER_PIXEL }

// =============================================================================
// Cursors and amplitude
// =============================================================================

/// Two measurement columns, one of them selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursors {
    pub a: u16,
    pub b: u16,
    pub a_selected: bool,
}

impl Cursors {
    /// Cursors at one and two thirds of `width`, A selected.
    pub const fn new(width: u16) -> Self {
        Self {
            a: width / 3,
            b: width * 2 / 3,
            a_selected: true,
        }
    }

    pub fn swap(&mut self) { self.a_selected = !self.a_selected; }

    fn selected(&mut self) -> &mut u16 { if self.a_selected { &mut self.a } else { &mut self.b } }

    /// Moves the selected cursor left, wrapping to the last column.
    pub fn move_left(
        &mut self,
        width: u16,
    ) {
        let cursor = self.selected();
        *cursor = if *cursor <= CURSOR_STEP { width - 1 } else { *cursor - CURSOR_STEP };
    }

    /// Moves the selected cursor right, wrapping past the last column.
    pub fn move_right(
        &mut self,
        width: u16,
    ) {
        let cursor = self.selected();
        *cursor = (*cursor + CURSOR_STEP) % width;
    }
}

/// Generator amplitude and the step the amplitude keys use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amplitude {
    /// Output level in 2 mV units.
    pub level: u8,
    /// Step index: the keys move by `step + 1` units.
    pub step: u8,
}

impl Default for Amplitude {
    fn default() -> Self {
        Self {
            level: MAX_AMPLITUDE,
            step: 1,
        }
    }
}

impl Amplitude {
    pub fn next_step(&mut self) { self.step = (self.step + 1) % 5; }

    pub fn decrease(&mut self) {
        if self.level > self.step + 2 {
            self.level -= self.step + 1;
        }
    }

    pub fn increase(&mut self) {
        if self.level + self.step < MAX_AMPLITUDE {
            self.level += self.step + 1;
        }
    }

    pub const fn millivolts(&self) -> u16 { self.level as u16 * 2 }

    pub const fn step_millivolts(&self) -> u16 { (self.step as u16 + 1) * 2 }
}

// =============================================================================
// Screen
// =============================================================================

#[derive(Debug, Clone)]
enum Mode {
    Running,
    /// A range parameter is highlighted; frames are paused.
    Editing { param: SweepParam, previous: SweepRange },
    /// Typing a new value for `param` in MHz.
    Entering {
        param: SweepParam,
        previous: SweepRange,
        entry: NumberEntry,
    },
}

/// The frequency-sweep screen.
pub struct SweepScreen<F, S> {
    chart: CurveChart,
    text: Text<F>,
    front_end: S,
    range: SweepRange,
    amplitude: Amplitude,
    cursors: Cursors,
    mode: Mode,
    levels: [i16; MAX_SAMPLE_COUNT as usize],
    normalization: [i16; MAX_SAMPLE_COUNT as usize],
    values: [u16; MAX_SAMPLE_COUNT as usize],
    display: [u16; GRID_WIDTH as usize],
}

impl<F: FontSource, S: SweepFrontEnd> SweepScreen<F, S> {
    /// # Errors
    ///
    /// Chart validation errors.
    pub fn new(
        fonts: F,
        front_end: S,
    ) -> Result<Self, Error> {
        let chart = CurveChart::new(ChartConfig {
            x: GRID_X,
            y: GRID_Y,
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            coarse_grid_width: 50,
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
            text: Text::new(fonts, FontFace::Sans, FontSize::Px16),
            front_end,
            range: SweepRange::default(),
            amplitude: Amplitude::default(),
            cursors: Cursors::new(GRID_WIDTH),
            mode: Mode::Running,
            levels: [0; MAX_SAMPLE_COUNT as usize],
            normalization: [0; MAX_SAMPLE_COUNT as usize],
            values: [0; MAX_SAMPLE_COUNT as usize],
            display: [0; GRID_WIDTH as usize],
        })
    }

    pub const fn range(&self) -> &SweepRange { &self.range }

    pub const fn amplitude(&self) -> &Amplitude { &self.amplitude }

    pub const fn cursors(&self) -> &Cursors { &self.cursors }

    /// Interpolated chart values of the last frame.
    pub fn display(&self) -> &[u16] { &self.display }

    pub fn front_end(&mut self) -> &mut S { &mut self.front_end }

    /// Whether a range parameter is being edited.
    pub const fn is_editing(&self) -> bool { !matches!(self.mode, Mode::Running) }

    fn count(&self) -> usize { (self.range.sample_count() as usize).min(MAX_SAMPLE_COUNT as usize) }

    fn sweep(&mut self) {
        let count = self.count();
        self.front_end
            .sweep(self.range.start_khz, self.range.step_khz, &mut self.levels[..count]);
    }

    // =========================================================================
    // Key handling per mode
    // =========================================================================

    fn handle_running<C, T>(
        &mut self,
        command: SweepCommand,
        screen: &mut Screen<'_, C, T>,
    ) -> Flow
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        match command {
            SweepCommand::Normalize => {
                self.sweep();
                let count = self.count();
                normalize(&self.levels[..count], &mut self.normalization[..count]);
            }
            SweepCommand::EditRange => {
                let param = SweepParam::Start;
                self.draw_param(screen, param, true);
                self.mode = Mode::Editing {
                    param,
                    previous: self.range,
                };
            }
            SweepCommand::NextAmplitudeStep => {
                self.amplitude.next_step();
                self.draw_amplitude(screen);
            }
            SweepCommand::AmplitudeDown | SweepCommand::AmplitudeUp => {
                if command == SweepCommand::AmplitudeUp {
                    self.amplitude.increase();
                } else {
                    self.amplitude.decrease();
                }
                self.front_end.set_amplitude(self.amplitude.level);
                self.draw_amplitude(screen);
            }
            SweepCommand::SwapCursor | SweepCommand::CursorLeft | SweepCommand::CursorRight => {
                let mut plot = screen.plot();
                self.chart.recover_line_x(&mut plot, self.cursors.a);
                self.chart.recover_line_x(&mut plot, self.cursors.b);
                match command {
                    SweepCommand::SwapCursor => self.cursors.swap(),
                    SweepCommand::CursorLeft => self.cursors.move_left(GRID_WIDTH),
                    _ => self.cursors.move_right(GRID_WIDTH),
                }
                self.draw_cursor_readouts(screen);
            }
            SweepCommand::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    fn handle_editing<C, T>(
        &mut self,
        command: EditCommand,
        param: SweepParam,
        previous: SweepRange,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        match command {
            EditCommand::Previous | EditCommand::Next => {
                self.draw_param(screen, param, false);
                let param = if command == EditCommand::Next { param.next() } else { param.previous() };
                self.draw_param(screen, param, true);
                self.mode = Mode::Editing { param, previous };
            }
            EditCommand::EnterValue => {
                let (x, y) = (i32::from(ENTRY.0), i32::from(ENTRY.1));
                self.text.draw_string(screen.lcd(), x, y, b"Value:", RED);
                let entry = NumberEntry::decimal();
                self.draw_entry(screen, &entry);
                self.mode = Mode::Entering { param, previous, entry };
            }
            EditCommand::Commit => {
                self.range.commit(&previous);
                self.mode = Mode::Running;
                self.draw_frequency_info(screen);
                self.draw_cursor_readouts(screen);
            }
        }
    }

    fn handle_entering<C, T>(
        &mut self,
        key: EntryKey,
        param: SweepParam,
        previous: SweepRange,
        mut entry: NumberEntry,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        match entry.press(key) {
            EntryState::Editing => {
                self.draw_entry(screen, &entry);
                self.mode = Mode::Entering { param, previous, entry };
            }
            state => {
                let (x, y) = (i32::from(ENTRY.0), i32::from(ENTRY.1));
                screen.lcd().fill(x, y, 200, FONT_HEIGHT, BLACK);
                if state == EntryState::Confirmed
                    && let Some(mhz) = entry.value()
                {
                    self.range.set(param, (mhz * 1000.0) as u32);
                }
                self.draw_param(screen, param, true);
                self.mode = Mode::Editing { param, previous };
            }
        }
    }

    // =========================================================================
    // Layout helpers
    // =========================================================================

    fn draw_axes<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let (x, y) = (i32::from(GRID_X), i32::from(GRID_Y));
        let lcd = screen.lcd();
        let _ = self.text.draw_char(lcd, x - 15, y + 192, GlyphCode::Ascii(b'0'), WHITE);
        for i in 0..4 {
            self.text.draw_number(lcd, x - 20, y - 8 + i * 50, (4 - i) * 10, WHITE);
        }
        for i in 0..3 {
            self.text.draw_number(lcd, x - 20, y + 242 + i * 50, (i + 1) * 10, WHITE);
            let _ = self.text.draw_char(lcd, x - 30, y + 242 + i * 50, GlyphCode::Ascii(b'-'), WHITE);
        }
        let bottom = y + i32::from(GRID_HEIGHT);
        self.text.draw_string(lcd, x - 20, bottom - 16, b"dB", WHITE);
        self.text.draw_string(lcd, x + i32::from(GRID_WIDTH) - 12, bottom + 20, b"MHz", WHITE);
    }

    /// Frequency axis labels and the range box values.
    fn draw_frequency_info<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let range = self.range;
        let (x, y) = (i32::from(GRID_X), i32::from(GRID_Y + GRID_HEIGHT));
        let lcd = screen.lcd();
        lcd.fill(x - 12, y + 3, GRID_WIDTH + 36, FONT_HEIGHT, BLACK);
        let span = range.stop_khz.saturating_sub(range.start_khz);
        for i in 0..=10u32 {
            let mut label: String<16> = String::new();
            let _ = write!(label, "{:.1}", (range.start_khz + i * span / 10) as f32 * 0.001);
            self.text.draw_string(lcd, x - 12 + i as i32 * 50, y + 2, label.as_bytes(), WHITE);
        }

        let (bx, by, _, _) = FREQBOX;
        let (bx, by) = (i32::from(bx), i32::from(by));
        lcd.fill(bx + VALUE_COLUMN, by + 8, 80, 88, BLACK);
        for param in [SweepParam::Start, SweepParam::Stop, SweepParam::Step] {
            self.draw_param(screen, param, false);
        }
        let mut points: String<16> = String::new();
        let _ = write!(points, "{} pts", range.sample_count());
        self.text
            .draw_string(screen.lcd(), bx + VALUE_COLUMN, by + 80, points.as_bytes(), LIGHTGRAY);
    }

    /// One range value, inverted while selected for editing.
    fn draw_param<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        param: SweepParam,
        selected: bool,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let (background, foreground) = if selected { (LIGHTGRAY, BLACK) } else { (BLACK, LIGHTGRAY) };
        let x = i32::from(FREQBOX.0) + VALUE_COLUMN;
        let y = i32::from(FREQBOX.1 + 8 + 24 * param.index());
        let mut value: String<16> = String::new();
        let _ = write!(value, "{:.3} MHz", self.range.get(param) as f32 * 0.001);
        let lcd = screen.lcd();
        lcd.fill(x, y, 80, FONT_HEIGHT, background);
        self.text.draw_string(lcd, x, y, value.as_bytes(), foreground);
    }

    fn draw_amplitude<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let (x, y) = (i32::from(AMPBOX.0) + 118, i32::from(AMPBOX.1));
        let lcd = screen.lcd();
        for (row, millivolts) in [(8, self.amplitude.millivolts()), (32, self.amplitude.step_millivolts())] {
            let mut value: String<16> = String::new();
            let _ = write!(value, "{millivolts} mV");
            lcd.fill(x, y + row, 48, FONT_HEIGHT, BLACK);
            self.text.draw_string(lcd, x, y + row, value.as_bytes(), LIGHTGRAY);
        }
    }

    fn draw_cursor_readouts<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let x = i32::from(CURSORBOX.0) + VALUE_COLUMN;
        let y = i32::from(CURSORBOX.1);
        let cursors = self.cursors;
        let freq_a = self.range.frequency_at(cursors.a, GRID_WIDTH);
        let freq_b = self.range.frequency_at(cursors.b, GRID_WIDTH);
        let gain_a = gain_db(self.display[usize::from(cursors.a)]);
        let gain_b = gain_db(self.display[usize::from(cursors.b)]);

        let lcd = screen.lcd();
        lcd.fill(x, y + 8, 88, 180, BLACK);
        let mark = if cursors.a_selected { b'A' } else { b'B' };
        let _ = self.text.draw_char(lcd, x, y + 8, GlyphCode::Ascii(mark), YELLOW);

        let rows = [
            (40, freq_a, "MHz"),
            (64, freq_b, "MHz"),
            (88, freq_b - freq_a, "MHz"),
            (120, gain_a, "dB"),
            (144, gain_b, "dB"),
            (168, gain_b - gain_a, "dB"),
        ];
        for (row, reading, unit) in rows {
            let mut value: String<16> = String::new();
            let _ = write!(value, "{reading:.3} {unit}");
            self.text.draw_string(lcd, x, y + row, value.as_bytes(), LIGHTGRAY);
        }
    }

    fn draw_entry<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        entry: &NumberEntry,
    ) where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        let x = i32::from(ENTRY.0 + ENTRY_PROMPT_WIDTH);
        let y = i32::from(ENTRY.1);
        let lcd = screen.lcd();
        lcd.fill(x, y, 200 - ENTRY_PROMPT_WIDTH, FONT_HEIGHT, BLACK);
        let pen = self.text.draw_string(lcd, x, y, entry.as_str().as_bytes(), WHITE);
        let _ = self.text.draw_char(lcd, pen, y, GlyphCode::Ascii(b'|'), GRAY);
    }
}

impl<F: FontSource, S: SweepFrontEnd> Overlay for SweepScreen<F, S> {
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
        self.mode = Mode::Running;
        self.chart.init(screen)?;
        self.draw_axes(screen);

        let lcd = screen.lcd();
        let boxes: [((u16, u16, u16, u16), &[&[u8]]); 3] = [
            (FREQBOX, &[b"Start:", b"Stop:", b"Step:", b"Points:"]),
            (AMPBOX, &[b"Output:", b"Step:"]),
            (CURSORBOX, &[b"Cursor:"]),
        ];
        for ((x, y, width, height), labels) in boxes {
            let (x, y) = (i32::from(x), i32::from(y));
            lcd.rect(x, y, width, height, WHITE);
            for (i, label) in labels.iter().enumerate() {
                self.text.draw_string(lcd, x + 8, y + 8 + i as i32 * 24, label, WHITE);
            }
        }
        let (x, y) = (i32::from(CURSORBOX.0) + 8, i32::from(CURSORBOX.1));
        let readouts: [(i32, &[u8]); 6] = [
            (40, b"A freq:"),
            (64, b"B freq:"),
            (88, b"dFreq:"),
            (120, b"A gain:"),
            (144, b"B gain:"),
            (168, b"dGain:"),
        ];
        for (row, label) in readouts {
            self.text.draw_string(lcd, x, y + row, label, WHITE);
        }

        self.draw_frequency_info(screen);
        self.draw_amplitude(screen);
        self.draw_cursor_readouts(screen);
        self.front_end.set_amplitude(self.amplitude.level);
        Ok(())
    }

    /// Sweeps and redraws cursors and curve; paused while editing.
    fn frame<C, T>(
        &mut self,
        screen: &mut Screen<'_, C, T>,
        _now_ms: u64,
    ) -> Result<(), Error>
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        if self.is_editing() {
            return Ok(());
        }
        self.sweep();
        let count = self.count();

        let mut plot = screen.plot();
        self.chart.recover_line_x(&mut plot, self.cursors.a);
        self.chart.recover_line_x(&mut plot, self.cursors.b);
        self.chart.recover_grid(&mut plot, &self.display);

        scale_levels(&self.levels[..count], &self.normalization[..count], &mut self.values[..count]);
        interpolate(&self.values[..count], &mut self.display);

        let (selected, other) = if self.cursors.a_selected {
            (self.cursors.a, self.cursors.b)
        } else {
            (self.cursors.b, self.cursors.a)
        };
        self.chart.draw_dashed_line_x(&mut plot, selected, YELLOW);
        self.chart.draw_dashed_line_x(&mut plot, other, BROWN);
        self.chart.draw_curve(&mut plot, &self.display, RED);
        screen.present()
    }

    fn handle_key<C, T>(
        &mut self,
        code: KeyCode,
        screen: &mut Screen<'_, C, T>,
        _now_ms: u64,
    ) -> Flow
    where
        C: DisplayController,
        T: BlockTransfer<C::Bus>,
    {
        match self.mode.clone() {
            Mode::Running => {
                if let Some(command) = SweepCommand::from_key(code) {
                    return self.handle_running(command, screen);
                }
            }
            Mode::Editing { param, previous } => {
                if let Some(command) = EditCommand::from_key(code) {
                    self.handle_editing(command, param, previous, screen);
                }
            }
            Mode::Entering { param, previous, entry } => {
                if let Some(key) = EntryKey::from_key(code) {
                    self.handle_entering(key, param, previous, entry, screen);
                }
            }
        }
        Flow::Continue
    }

    fn frame_delay_ms(&self) -> u64 { FRAME_DELAY_MS }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::to_raw;
    use crate::controller::{Nt35510, Orientation};
    use crate::display::Lcd;
    use crate::font::ProFontSource;
    use crate::testing::{GramBus, NoDelay, RecordingTransfer};

    /// Flat response at a fixed code, recording what it was asked for.
    struct FlatFrontEnd {
        level: i16,
        amplitude: u8,
        sweeps: Vec<(u32, u32, usize)>,
    }

    impl FlatFrontEnd {
        fn new(level: i16) -> Self {
            Self {
                level,
                amplitude: 0,
                sweeps: Vec::new(),
            }
        }
    }

    impl SweepFrontEnd for FlatFrontEnd {
        fn sweep(
            &mut self,
            start_khz: u32,
            step_khz: u32,
            levels: &mut [i16],
        ) {
            self.sweeps.push((start_khz, step_khz, levels.len()));
            levels.fill(self.level);
        }

        fn set_amplitude(
            &mut self,
            amplitude: u8,
        ) {
            self.amplitude = amplitude;
        }
    }

    type TestScreen = Screen<'static, Nt35510<GramBus>, RecordingTransfer>;

    fn screen() -> TestScreen {
        let mut lcd = Lcd::new(Nt35510::new(GramBus::new(800, 480)));
        lcd.init(Orientation::Deg270, &mut NoDelay).unwrap();
        Screen::direct(lcd, RecordingTransfer::default())
    }

    fn pixel(
        screen: &mut TestScreen,
        x: u16,
        y: u16,
    ) -> u16 {
        screen.lcd().controller().bus().pixel(x, y)
    }

    fn press(
        sweep: &mut SweepScreen<ProFontSource, FlatFrontEnd>,
        screen: &mut TestScreen,
        codes: &[KeyCode],
    ) {
        for &code in codes {
            sweep.handle_key(code, screen, 0);
        }
    }

    #[test]
    fn test_default_range() {
        let range = SweepRange::default();
        assert_eq!(range.sample_count(), 490);
        assert!((range.frequency_at(0, 500) - 1.0).abs() < 1e-4);
        assert!((range.frequency_at(250, 500) - 25.5).abs() < 1e-4);
        assert!((range.frequency_at(500, 500) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_commit_restores_invalid_range() {
        let previous = SweepRange::default();

        let mut inverted = SweepRange {
            start_khz: 60_000,
            ..previous
        };
        inverted.commit(&previous);
        assert_eq!(inverted, previous);

        let mut too_high = SweepRange {
            stop_khz: 250_000,
            ..previous
        };
        too_high.commit(&previous);
        assert_eq!(too_high.stop_khz, 50_000);

        // 10 points: the step comes back.
        let mut coarse = SweepRange {
            step_khz: 4900,
            ..previous
        };
        coarse.commit(&previous);
        assert_eq!(coarse.step_khz, 100);

        let mut narrow = SweepRange {
            start_khz: 2000,
            stop_khz: 12_000,
            step_khz: 50,
        };
        narrow.commit(&previous);
        assert_eq!(narrow.sample_count(), 200);

        // 1990 points even with the previous step: everything comes back.
        let mut wide = SweepRange {
            stop_khz: 200_000,
            step_khz: 0,
            ..previous
        };
        wide.commit(&previous);
        assert_eq!(wide, previous);
    }

    #[test]
    fn test_interpolation_of_ramp() {
        let ramp: Vec<u16> = (0..8).map(|i| i * 10).collect();
        let mut out = [0u16; 16];
        interpolate(&ramp, &mut out);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 5);
        assert_eq!(out[2], 10);
        assert_eq!(out[7], 35);
        assert_eq!(out[13], 65);
        assert_eq!(out[14], 70);
        assert_eq!(out[15], 70);

        let mut single = [1u16; 4];
        interpolate(&[42], &mut single);
        assert_eq!(single, [42; 4]);
        interpolate(&[], &mut single);
        assert_eq!(single, [0; 4]);
    }

    #[test]
    fn test_normalisation_flattens_response() {
        let levels = [1300i16, 1200, 1241];
        let mut norm = [0i16; 3];
        normalize(&levels, &mut norm);
        assert_eq!(norm, [59, -41, 0]);
        let mut values = [0u16; 3];
        scale_levels(&levels, &norm, &mut values);
        assert_eq!(values, [199, 199, 199]);
        scale_levels(&levels, &[0; 3], &mut values);
        assert_eq!(values, [209, 193, 199]);
        assert_eq!(gain_db(ZERO_DB_VALUE), 0.0);
        assert_eq!(gain_db(250), 10.0);
    }

    #[test]
    fn test_cursor_wrapping() {
        let mut cursors = Cursors::new(500);
        assert_eq!((cursors.a, cursors.b), (166, 333));
        cursors.a = 2;
        cursors.move_left(500);
        assert_eq!(cursors.a, 499);
        cursors.move_right(500);
        assert_eq!(cursors.a, 1);
        cursors.swap();
        cursors.move_right(500);
        assert_eq!((cursors.a, cursors.b), (1, 335));
    }

    #[test]
    fn test_amplitude_limits() {
        let mut amplitude = Amplitude::default();
        amplitude.increase();
        assert_eq!(amplitude.level, 50);
        amplitude.decrease();
        assert_eq!(amplitude.level, 48);
        amplitude.next_step();
        amplitude.next_step();
        amplitude.next_step();
        amplitude.next_step();
        assert_eq!(amplitude.step, 0);
        assert_eq!(amplitude.step_millivolts(), 2);
        amplitude.level = 2;
        amplitude.decrease();
        assert_eq!(amplitude.level, 2);
        assert_eq!(amplitude.millivolts(), 4);
    }

    #[test]
    fn test_frame_draws_cursors_and_curve() {
        let mut screen = screen();
        let mut sweep = SweepScreen::new(ProFontSource, FlatFrontEnd::new(REFERENCE_LEVEL)).unwrap();
        sweep.init(&mut screen).unwrap();
        assert_eq!(sweep.front_end().amplitude, 50);

        sweep.frame(&mut screen, 0).unwrap();
        assert_eq!(sweep.front_end().sweeps, vec![(1000, 100, 490)]);
        // 1241 codes scale to value 199, row 200.
        assert!(sweep.display().iter().all(|&v| v == 199));
        assert_eq!(pixel(&mut screen, GRID_X + 1, GRID_Y + 200), to_raw(RED));
        assert_eq!(pixel(&mut screen, GRID_X + 166, GRID_Y + 1), to_raw(YELLOW));
        assert_eq!(pixel(&mut screen, GRID_X + 333, GRID_Y + 1), to_raw(BROWN));

        // Moving cursor A erases its line.
        press(&mut sweep, &mut screen, &[35]);
        assert_eq!(sweep.cursors().a, 168);
        assert_eq!(pixel(&mut screen, GRID_X + 166, GRID_Y + 1), to_raw(BLACK));
        sweep.frame(&mut screen, 33).unwrap();
        assert_eq!(pixel(&mut screen, GRID_X + 168, GRID_Y + 1), to_raw(YELLOW));
    }

    #[test]
    fn test_range_editing_with_number_entry() {
        let mut screen = screen();
        let mut sweep = SweepScreen::new(ProFontSource, FlatFrontEnd::new(REFERENCE_LEVEL)).unwrap();
        sweep.init(&mut screen).unwrap();

        // Edit, move to stop, enter "20" MHz, confirm, commit.
        press(&mut sweep, &mut screen, &[17, 19, 20]);
        assert!(sweep.is_editing());
        sweep.frame(&mut screen, 0).unwrap();
        assert!(sweep.front_end().sweeps.is_empty());

        press(&mut sweep, &mut screen, &[3, 27, 21, 17]);
        assert!(!sweep.is_editing());
        assert_eq!(sweep.range().stop_khz, 20_000);
        assert_eq!(sweep.range().sample_count(), 190);

        sweep.frame(&mut screen, 0).unwrap();
        assert_eq!(sweep.front_end().sweeps, vec![(1000, 100, 190)]);
    }

    #[test]
    fn test_cancelled_entry_keeps_value() {
        let mut screen = screen();
        let mut sweep = SweepScreen::new(ProFontSource, FlatFrontEnd::new(REFERENCE_LEVEL)).unwrap();
        sweep.init(&mut screen).unwrap();
        press(&mut sweep, &mut screen, &[17, 20, 2, 13, 17]);
        assert_eq!(*sweep.range(), SweepRange::default());
    }

    #[test]
    fn test_amplitude_keys_reach_front_end_and_exit() {
        let mut screen = screen();
        let mut sweep = SweepScreen::new(ProFontSource, FlatFrontEnd::new(REFERENCE_LEVEL)).unwrap();
        sweep.init(&mut screen).unwrap();
        press(&mut sweep, &mut screen, &[26, 26]);
        assert_eq!(sweep.front_end().amplitude, 46);
        assert_eq!(sweep.handle_key(37, &mut screen, 0), Flow::Exit);
    }
}
