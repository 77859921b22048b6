// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Turning sparse Mode2 pitch curves into the dense Mode1 pitch bend samples
//! a resampler understands.
//!
//! - `curve`: interpolation between two control points
//! - `vibrato`: the vibrato shape added on top of a curve
//! - `walker`: sampling a whole control point sequence tick by tick
//! - `convert`: combining the curves of three neighbouring notes into the samples of one note
//! - `encode`: compressing the samples into resampler arguments

pub mod convert;
pub mod curve;
pub mod encode;
pub mod vibrato;
pub mod walker;

pub use convert::{NoteContext, NoteCurve};
pub use encode::PitchEncoding;
pub use walker::CurveWalker;

/// Distance between two pitch bend samples in ticks.
pub const SAMPLE_STEP: f64 = 5.0;

/// Trailing zeros are never trimmed below this many samples.
pub const MIN_SAMPLES: usize = 7;
