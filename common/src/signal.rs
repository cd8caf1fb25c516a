//! Deterministic stand-ins for the analog front ends.
//!
//! The firmware runs without the ADC and DDS boards attached, and the
//! simulator has neither, so both feed the screens from these generators.

use core::f32::consts::PI;

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::scope::{ScopeFrontEnd, TRIGGER_MAX, TRIGGER_MIN, capture_period};
use crate::sweep::{MAX_AMPLITUDE, REFERENCE_LEVEL, SweepFrontEnd};

/// Ticks per second of the simulated input-capture timer.
const METER_CLOCK_HZ: f32 = 6_000_000.0;
/// The simulated capture timer is 16 bits wide.
const METER_RELOAD: u32 = 0xFFFF;

/// Detector codes per dB.
const CODES_PER_DB: f32 = 31.03;

// =============================================================================
// Scope
// =============================================================================

/// Sine with a third harmonic, as centred 18-bit ADC codes.
pub struct SyntheticScope {
    frequency_hz: f32,
    amplitude: f32,
    sample_rate: u32,
    extra_gain: bool,
    phase: f32,
    meter: u32,
    captured: Option<u32>,
}

impl SyntheticScope {
    /// A `frequency_hz` signal peaking at `amplitude` codes.
    pub const fn new(
        frequency_hz: f32,
        amplitude: f32,
    ) -> Self {
        Self {
            frequency_hz,
            amplitude,
            sample_rate: 100_000,
            extra_gain: false,
            phase: 0.0,
            meter: 0,
            captured: None,
        }
    }

    /// Simulates two input-capture events one signal period apart.
    fn measure_period(&mut self) {
        let period = (METER_CLOCK_HZ / self.frequency_hz) as u32;
        let first = self.meter;
        let second = (first + period) % (METER_RELOAD + 1);
        self.captured = Some(capture_period(first, second, METER_RELOAD));
        // Let the timer run on so the next pair lands elsewhere.
        self.meter = (second + period / 3) % (METER_RELOAD + 1);
    }
}

impl Default for SyntheticScope {
    fn default() -> Self {
        // Not a divisor of any sample rate, so crossings fall between samples.
        Self::new(210.0, 40_000.0)
    }
}

impl ScopeFrontEnd for SyntheticScope {
    fn capture(
        &mut self,
        samples: &mut [i32],
    ) {
        let gain = if self.extra_gain { 10.0 } else { 1.0 };
        let step = 2.0 * PI * self.frequency_hz / self.sample_rate as f32;
        for sample in samples.iter_mut() {
            let value = self.phase.sin() + 0.2 * (3.0 * self.phase).sin();
            *sample = ((value * self.amplitude * gain) as i32).clamp(TRIGGER_MIN, TRIGGER_MAX);
            self.phase += step;
            if self.phase >= 2.0 * PI {
                self.phase -= 2.0 * PI;
            }
        }
        // Drift between captures so the trigger has work to do.
        self.phase = (self.phase + 0.37) % (2.0 * PI);
        if self.frequency_hz > 0.0 {
            self.measure_period();
        }
    }

    fn set_sample_rate(
        &mut self,
        hz: u32,
    ) {
        self.sample_rate = hz.max(1);
    }

    fn set_extra_gain(
        &mut self,
        on: bool,
    ) {
        self.extra_gain = on;
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.meter = 0;
        self.captured = None;
    }

    fn take_period_count(&mut self) -> Option<u32> { self.captured.take() }
}

// =============================================================================
// Sweep
// =============================================================================

/// Resonant band-pass filter seen through a logarithmic detector.
pub struct SyntheticSweep {
    centre_khz: f32,
    quality: f32,
    peak_db: f32,
    amplitude: u8,
    frame: u32,
}

impl SyntheticSweep {
    pub const fn new(
        centre_khz: f32,
        quality: f32,
        peak_db: f32,
    ) -> Self {
        Self {
            centre_khz,
            quality,
            peak_db,
            amplitude: MAX_AMPLITUDE,
            frame: 0,
        }
    }

    /// Response in dB at `khz`, for the current output amplitude.
    pub fn response_db(
        &self,
        khz: f32,
    ) -> f32 {
        let khz = khz.max(1.0);
        let detune = khz / self.centre_khz - self.centre_khz / khz;
        let magnitude = 1.0 / (1.0 + self.quality * self.quality * detune * detune).sqrt();
        let drive = f32::from(self.amplitude.max(1)) / f32::from(MAX_AMPLITUDE);
        20.0 * magnitude.log10() + self.peak_db + 20.0 * drive.log10()
    }
}

impl Default for SyntheticSweep {
    fn default() -> Self { Self::new(10_700.0, 5.0, 20.0) }
}

impl SweepFrontEnd for SyntheticSweep {
    fn sweep(
        &mut self,
        start_khz: u32,
        step_khz: u32,
        levels: &mut [i16],
    ) {
        self.frame = self.frame.wrapping_add(1);
        let wobble = (self.frame as f32 * 0.3).sin() * 0.1;
        for (i, level) in levels.iter_mut().enumerate() {
            let khz = start_khz as f32 + (i as f32) * step_khz as f32;
            let ripple = 0.3 * (i as f32 * 0.7).sin() + wobble;
            let db = self.response_db(khz) + ripple;
            *level = (f32::from(REFERENCE_LEVEL) + db * CODES_PER_DB) as i16;
        }
    }

    fn set_amplitude(
        &mut self,
        amplitude: u8,
    ) {
        self.amplitude = amplitude;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{SAMPLE_COUNT, find_trigger};

    #[test]
    fn test_scope_signal_triggers_and_measures() {
        let mut scope = SyntheticScope::default();
        let mut samples = [0i32; SAMPLE_COUNT];
        scope.capture(&mut samples);

        let trigger = find_trigger(&samples, 0);
        assert!(samples[trigger] < 0 && samples[trigger + 1] > 0);
        // 6 MHz / 210 Hz.
        assert_eq!(scope.take_period_count(), Some(28_571));
        assert_eq!(scope.take_period_count(), None);

        let peak = samples.iter().map(|s| s.abs()).max().unwrap();
        // The harmonic flattens the crest to 0.87 of the amplitude.
        assert!(peak > 33_000 && peak < 36_000, "peak {peak}");
    }

    #[test]
    fn test_scope_extra_gain_saturates_at_adc_range() {
        let mut scope = SyntheticScope::new(200.0, 100_000.0);
        scope.set_extra_gain(true);
        let mut samples = [0i32; 1000];
        scope.capture(&mut samples);
        assert_eq!(samples.iter().max(), Some(&TRIGGER_MAX));
        assert_eq!(samples.iter().min(), Some(&TRIGGER_MIN));
    }

    #[test]
    fn test_period_survives_timer_wrap() {
        let mut scope = SyntheticScope::default();
        let mut samples = [0i32; 16];
        for _ in 0..10 {
            scope.capture(&mut samples);
            assert_eq!(scope.take_period_count(), Some(28_571));
        }
    }

    #[test]
    fn test_sweep_peaks_at_centre() {
        let mut sweep = SyntheticSweep::default();
        assert!((sweep.response_db(10_700.0) - 20.0).abs() < 0.01);
        assert!(sweep.response_db(1_000.0) < -10.0);

        let mut levels = [0i16; 490];
        sweep.sweep(1000, 100, &mut levels);
        let (peak_index, _) = levels.iter().enumerate().max_by_key(|&(_, level)| *level).unwrap();
        // 10.7 MHz is point 97; ripple may shift the maximum a little.
        assert!((90..=104).contains(&peak_index), "peak at {peak_index}");

        sweep.set_amplitude(25);
        assert!((sweep.response_db(10_700.0) - 13.98).abs() < 0.05);
    }
}
