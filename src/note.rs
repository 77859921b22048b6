// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Definitions of what a note is.

use crate::tone::Tone;

/// Ticks per quarter note.
pub const TIME_BASE: i32 = 480;

pub const DEFAULT_TEMPO: f64 = 120.0;
pub const DEFAULT_VELOCITY: f64 = 100.0;
pub const DEFAULT_INTENSITY: f64 = 100.0;
pub const DEFAULT_MODULATION: f64 = 0.0;
pub const DEFAULT_START_POINT: f64 = 0.0;

/// Convert a length in ticks to milliseconds at the given tempo.
pub fn ticks_to_ms(ticks: f64, tempo: f64) -> f64 {
    ticks * 60_000.0 / (tempo * TIME_BASE as f64)
}

/// Convert milliseconds to (fractional) ticks at the given tempo.
pub fn ms_to_ticks(ms: f64, tempo: f64) -> f64 {
    ms * tempo * TIME_BASE as f64 / 60_000.0
}

/// Whether a lyric denotes a rest, i.e. it is empty or `R`.
pub fn is_rest_lyric(lyric: &str) -> bool {
    let lyric = lyric.trim();
    lyric.is_empty() || lyric == "R" || lyric == "r"
}

/// The shape of a pitch curve segment.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JoinType {
    /// Cosine ease on both ends. Written as an empty string.
    Default,
    /// Straight line. Written as `s`.
    Linear,
    /// Written as `r`.
    EaseIn,
    /// Written as `j`.
    EaseOut,
}

impl JoinType {
    pub fn from_code(code: &str) -> JoinType {
        match code {
            "s" => JoinType::Linear,
            "r" => JoinType::EaseIn,
            "j" => JoinType::EaseOut,
            _ => JoinType::Default,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            JoinType::Default => "",
            JoinType::Linear => "s",
            JoinType::EaseIn => "r",
            JoinType::EaseOut => "j",
        }
    }
}

impl Default for JoinType {
    fn default() -> Self {
        JoinType::Default
    }
}

/// A control point of a Mode2 pitch curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurvePoint {
    /// Time offset in milliseconds relative to the start of the note.
    pub x: f64,
    /// Pitch offset in tenths of a semitone.
    pub y: f64,
    /// Shape of the segment ending at this point.
    pub join: JoinType,
}

impl CurvePoint {
    pub fn new(x: f64, y: f64) -> CurvePoint {
        CurvePoint {
            x,
            y,
            join: JoinType::Default,
        }
    }

    pub fn with_join(x: f64, y: f64, join: JoinType) -> CurvePoint {
        CurvePoint { x, y, join }
    }
}

/// Vibrato applied on top of the pitch curve of a note.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vibrato {
    /// Portion of the note (from its end) covered by the vibrato, in percent.
    pub length: f64,
    /// Period of one oscillation in milliseconds.
    pub period: f64,
    /// Amplitude in cents.
    pub amplitude: f64,
    /// Fade-in time, in percent of the vibrato length.
    pub attack: f64,
    /// Fade-out time, in percent of the vibrato length.
    pub release: f64,
    /// Initial phase in percent of a period.
    pub phase: f64,
    /// Constant bias in percent of the amplitude.
    pub offset: f64,
    /// Not used for pitch curves.
    pub intensity: f64,
}

impl Default for Vibrato {
    fn default() -> Self {
        Vibrato {
            length: 65.0,
            period: 180.0,
            amplitude: 35.0,
            attack: 20.0,
            release: 20.0,
            phase: 0.0,
            offset: 0.0,
            intensity: 0.0,
        }
    }
}

/// A volume envelope anchor: `x` in milliseconds, `y` in percent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnvelopePoint {
    pub x: f64,
    pub y: f64,
}

/// Volume envelope of a note, passed on to the wavtool.
///
/// The anchors are stored in the order they are drawn: `(p1, v1)`, `(p2, v2)`,
/// optionally `(p5, v5)`, then `(p3, v3)` and `(p4, v4)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub anchors: Vec<EnvelopePoint>,
}

impl Default for Envelope {
    fn default() -> Self {
        let anchor = |x, y| EnvelopePoint { x, y };
        Envelope {
            anchors: vec![
                anchor(0.0, 0.0),
                anchor(5.0, 100.0),
                anchor(35.0, 100.0),
                anchor(0.0, 0.0),
            ],
        }
    }
}

/// A note as seen by the synthesizer.
///
/// Optional numeric fields are `None` when the project does not override them,
/// which is different from an explicit zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub lyric: String,
    pub flags: String,
    pub tone: Tone,
    /// Length in ticks.
    pub length: i32,

    pub tempo: Option<f64>,
    pub velocity: Option<f64>,
    pub intensity: Option<f64>,
    pub modulation: Option<f64>,
    pub pre_utterance: Option<f64>,
    pub overlap: Option<f64>,
    pub start_point: Option<f64>,

    pub envelope: Option<Envelope>,
    /// Mode2 pitch control points.
    pub portamento: Vec<CurvePoint>,
    pub vibrato: Option<Vibrato>,
}

impl Note {
    pub fn new(tone: Tone, length: i32, lyric: &str) -> Note {
        Note {
            lyric: lyric.into(),
            flags: String::new(),
            tone,
            length,
            tempo: None,
            velocity: None,
            intensity: None,
            modulation: None,
            pre_utterance: None,
            overlap: None,
            start_point: None,
            envelope: None,
            portamento: Vec::new(),
            vibrato: None,
        }
    }

    /// A rest of the given length in ticks.
    pub fn rest(length: i32) -> Note {
        Note::new(Tone::default(), length, "R")
    }

    pub fn is_rest(&self) -> bool {
        is_rest_lyric(&self.lyric)
    }

    pub fn real_velocity(&self) -> f64 {
        self.velocity.unwrap_or(DEFAULT_VELOCITY)
    }

    pub fn real_intensity(&self) -> f64 {
        self.intensity.unwrap_or(DEFAULT_INTENSITY)
    }

    pub fn real_modulation(&self) -> f64 {
        self.modulation.unwrap_or(DEFAULT_MODULATION)
    }

    pub fn real_start_point(&self) -> f64 {
        self.start_point.unwrap_or(DEFAULT_START_POINT)
    }

    /// Duration of a note of `length` ticks in milliseconds.
    ///
    /// ```
    /// use utau_synth::note::Note;
    ///
    /// assert_eq!(Note::duration(480, 120.0), 500.0);
    /// ```
    pub fn duration(length: i32, tempo: f64) -> f64 {
        ticks_to_ms(length as f64, tempo)
    }
}

/// The neutral note handed out for indices outside of the project.
impl Default for Note {
    fn default() -> Self {
        Note::rest(TIME_BASE)
    }
}
