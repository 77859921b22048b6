//! The vibrato shape added on top of a note's pitch curve.

use std::f64::consts::PI;

use crate::note::{ms_to_ticks, Vibrato};

/// A vibrato laid out over a note of a given length at a given tempo.
/// All positions are in ticks relative to the note start.
///
/// The vibrato covers the last `length` percent of the note. Within that window the
/// amplitude ramps up linearly during the attack and down again during the release.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VibratoShape {
    window_start: f64,
    window_length: f64,
    /// Angular frequency in radians per tick.
    frequency: f64,
    /// Initial phase in radians.
    phase: f64,
    amplitude: f64,
    /// Constant bias in cents.
    bias: f64,
    attack_end: f64,
    release_start: f64,
}

impl VibratoShape {
    /// Returns `None` if the vibrato cannot contribute anything, i.e. for empty notes
    /// or a non-positive period.
    pub fn new(vibrato: &Vibrato, note_length: i32, tempo: f64) -> Option<VibratoShape> {
        let period = ms_to_ticks(vibrato.period, tempo);
        if note_length <= 0 || !(period > 0.0) {
            return None;
        }
        let proportion = vibrato.length / 100.0;
        let window_length = proportion * note_length as f64;
        Some(VibratoShape {
            window_start: (1.0 - proportion) * note_length as f64,
            window_length,
            frequency: 2.0 * PI / period,
            phase: vibrato.phase / 100.0 * 2.0 * PI,
            amplitude: vibrato.amplitude,
            bias: vibrato.offset / 100.0 * vibrato.amplitude,
            attack_end: vibrato.attack / 100.0 * window_length,
            release_start: (1.0 - vibrato.release / 100.0) * window_length,
        })
    }

    pub fn window_start(&self) -> f64 {
        self.window_start
    }

    pub fn window_length(&self) -> f64 {
        self.window_length
    }

    /// Pitch offset in cents at `tick`; exactly zero outside of the vibrato window.
    pub fn at(&self, tick: f64) -> f64 {
        let x = tick - self.window_start;
        if !(x > 0.0 && x < self.window_length) {
            return 0.0;
        }

        let y = self.amplitude * (self.frequency * x - self.phase).sin() + self.bias;
        let mut ratio = 1.0;
        if x < self.attack_end {
            ratio *= x / self.attack_end;
        }
        if x > self.release_start {
            ratio *= 1.0 - (x - self.release_start) / (self.window_length - self.release_start);
        }
        ratio * y
    }
}
