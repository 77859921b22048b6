// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! This namespace contains the parts converting from note data to tool invocations.

pub mod args;

use std::ops::RangeInclusive;

use log::{debug, trace};

use crate::genon::{DeclaredTiming, GenonSettings, PreviousNote};
use crate::note::{is_rest_lyric, CurvePoint, JoinType, Note, DEFAULT_TEMPO};
use crate::pitch::{NoteContext, NoteCurve, PitchEncoding};
use crate::tone::Tone;

pub use args::{fix_filename, fix_flags, ResamplerArgs, WavtoolArgs};

/// Rendered notes are padded by this many milliseconds and rounded up to a multiple of it.
const RENDER_PADDING: f64 = 50.0;

/// Access to the notes of a project by index.
///
/// Indices outside of the project must yield a neutral note instead of failing,
/// as neighbouring notes are looked up unconditionally.
pub trait NoteGetter {
    fn note(&self, index: isize) -> Note;
}

impl<F: Fn(isize) -> Note> NoteGetter for F {
    fn note(&self, index: isize) -> Note {
        self(index)
    }
}

/// Lookup of the original voice entry belonging to a note.
///
/// Notes without a matching entry get a zeroed [`GenonSettings`].
pub trait GenonSettingsGetter {
    fn genon(&self, note: &Note) -> GenonSettings;
}

impl<F: Fn(&Note) -> GenonSettings> GenonSettingsGetter for F {
    fn genon(&self, note: &Note) -> GenonSettings {
        self(note)
    }
}

/// A [`NoteGetter`] over an in-memory list of notes.
#[derive(Copy, Clone, Debug)]
pub struct NoteList<'a> {
    notes: &'a [Note],
}

impl<'a> NoteList<'a> {
    pub fn new(notes: &'a [Note]) -> Self {
        NoteList { notes }
    }

    /// The indices of all notes in the list.
    pub fn limits(&self) -> RangeInclusive<isize> {
        0..=(self.notes.len() as isize - 1)
    }
}

impl<'a> NoteGetter for NoteList<'a> {
    fn note(&self, index: isize) -> Note {
        if index < 0 {
            return Note::default();
        }
        self.notes
            .get(index as usize)
            .cloned()
            .unwrap_or_default()
    }
}

/// Project wide settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthConfig {
    /// Tempo used until the first note that sets one.
    pub initial_tempo: f64,
    /// Resampler flags prepended to the flags of every note.
    pub global_flags: String,
    pub pitch_encoding: PitchEncoding,
    /// The file the wavtool appends all notes to.
    pub output_file: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            initial_tempo: DEFAULT_TEMPO,
            global_flags: String::new(),
            pitch_encoding: PitchEncoding::default(),
            output_file: String::new(),
        }
    }
}

/// Computes the tool invocations for rendering a range of notes.
#[derive(Clone, Debug, Default)]
pub struct Synth {
    config: SynthConfig,
}

/// Overwrite the first y of a curve so that it starts at the previous note's
/// tone, unless the previous note is silent.
fn correct_first_y(prev_tone: Tone, prev_lyric: &str, tone: Tone, point: &mut CurvePoint) {
    if !is_rest_lyric(prev_lyric) {
        point.y = if prev_tone.number() <= 0 {
            0.0
        } else {
            ((prev_tone.number() - tone.number()) * 10) as f64
        };
    }
}

fn declared_timing(note: &Note, genon: &GenonSettings) -> DeclaredTiming {
    DeclaredTiming {
        pre_utterance: note.pre_utterance.unwrap_or(genon.pre_utterance),
        overlap: note.overlap.unwrap_or(genon.voice_overlap),
        start_point: note.real_start_point(),
    }
}

impl Synth {
    pub fn new(config: SynthConfig) -> Self {
        Synth { config }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Compute resampler and wavtool arguments for the notes in `range`.
    ///
    /// `limits` are the indices of the notes that exist; neighbouring notes
    /// outside of it are not used for pitch bends. Notes of `range` outside of
    /// `limits` are skipped, and an inverted range yields nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use utau_synth::genon::GenonSettings;
    /// use utau_synth::note::Note;
    /// use utau_synth::synth::{NoteList, Synth};
    /// use utau_synth::tone::Tone;
    ///
    /// let notes = vec![Note::new(Tone::from_number(60), 480, "a"), Note::rest(480)];
    /// let list = NoteList::new(&notes);
    /// let genon = |_: &Note| GenonSettings::default();
    ///
    /// let rendered = Synth::default().synthesize(list.limits(), 0..=1, &list, &genon);
    /// assert_eq!(rendered.len(), 2);
    /// assert_eq!(rendered[0].0.out_file, "0_a_C4_480.wav");
    /// assert_eq!(rendered[1].1.in_file, "1_R_C4_480.wav");
    /// ```
    pub fn synthesize<N: NoteGetter, G: GenonSettingsGetter>(
        &self,
        limits: RangeInclusive<isize>,
        range: RangeInclusive<isize>,
        notes: &N,
        genon: &G,
    ) -> Vec<(ResamplerArgs, WavtoolArgs)> {
        let left = (*limits.start()).max(*range.start());
        let right = (*limits.end()).min(*range.end());
        if range.start() > range.end() || left > right {
            debug!("nothing to synthesize in {:?} within {:?}", range, limits);
            return Vec::new();
        }

        // tempo and timing of the note before `left`
        let mut tempo = self.config.initial_tempo;
        let mut prev = PreviousNote::default();
        if left == 0 {
            if let Some(first_tempo) = notes.note(0).tempo {
                tempo = first_tempo;
            }
        } else {
            if let Some(found) = (0..left).rev().find_map(|i| notes.note(i).tempo) {
                tempo = found;
            }
            let prev_note = notes.note(left - 1);
            prev = PreviousNote {
                duration: Note::duration(prev_note.length, tempo),
                is_rest: prev_note.is_rest(),
            };
        }
        debug!(
            "synthesizing notes {} to {} starting at tempo {}",
            left, right, tempo
        );

        let mut result = Vec::with_capacity((right - left + 1) as usize);
        for i in left..=right {
            let note = notes.note(i);

            let prev_tempo = tempo;
            if let Some(note_tempo) = note.tempo {
                tempo = note_tempo;
            }

            let velocity = note.real_velocity();
            let settings = genon.genon(&note);
            let duration = Note::duration(note.length, tempo);
            let corrected = declared_timing(&note, &settings).correct(velocity, duration, prev);

            let after_rest = prev.is_rest;
            prev = PreviousNote {
                duration,
                is_rest: note.is_rest(),
            };

            // previous note
            let mut prev_curve = NoteCurve::default();
            let mut prev_lyric = String::new();
            let mut prev_tone = note.tone;
            if i > *limits.start() {
                let prev_note = notes.note(i - 1);
                prev_curve = NoteCurve {
                    points: prev_note.portamento,
                    vibrato: prev_note.vibrato,
                    length: prev_note.length,
                };
                prev_lyric = prev_note.lyric;
                prev_tone = prev_note.tone;

                if i > *limits.start() + 1 {
                    if let Some(first) = prev_curve.points.first_mut() {
                        let before = notes.note(i - 2);
                        correct_first_y(before.tone, &before.lyric, prev_tone, first);
                    }
                }
            }

            // current note
            let mut points = note.portamento.clone();
            if points.is_empty() {
                points = vec![
                    CurvePoint::new(0.0, 0.0),
                    CurvePoint::with_join(0.0, 0.0, JoinType::Linear),
                ];
            }
            if let Some(first) = points.first_mut() {
                correct_first_y(prev_tone, &prev_lyric, note.tone, first);
            }
            let current_curve = NoteCurve {
                points,
                vibrato: note.vibrato,
                length: note.length,
            };

            // next note
            let mut next_curve = NoteCurve::default();
            let mut next_pre_utterance = 0.0;
            let mut next_overlap = 0.0;
            if i < *limits.end() {
                let next_note = notes.note(i + 1);
                let next_settings = genon.genon(&next_note);
                let next_tempo = next_note.tempo.unwrap_or(tempo);
                let next_corrected = declared_timing(&next_note, &next_settings).correct(
                    next_note.real_velocity(),
                    Note::duration(next_note.length, next_tempo),
                    prev,
                );
                next_pre_utterance = next_corrected.pre_utterance;
                next_overlap = next_corrected.voice_overlap;

                next_curve = NoteCurve {
                    points: next_note.portamento,
                    vibrato: next_note.vibrato,
                    length: next_note.length,
                };
                if let Some(first) = next_curve.points.first_mut() {
                    correct_first_y(note.tone, &note.lyric, next_note.tone, first);
                }
            }

            let context = NoteContext {
                tempo,
                prev_tempo,
                prev: prev_curve,
                current: current_curve,
                next: next_curve,
                pre_utterance: corrected.pre_utterance,
                start_point: corrected.start_point,
                next_pre_utterance,
                next_overlap,
            };
            let pitch_samples = context.to_mode1();

            let correction = corrected.pre_utterance - next_pre_utterance + next_overlap;
            let real_length = (duration + correction + corrected.start_point + RENDER_PADDING)
                .max(settings.consonant);
            let real_length = (real_length / RENDER_PADDING).ceil() * RENDER_PADDING;

            let tone_name = note.tone.name();
            let cache_name = format!(
                "{}_{}_{}_{}.wav",
                i,
                fix_filename(&note.lyric),
                tone_name,
                note.length
            );
            trace!(
                "note {} {:?}: {:?}, length {} ms, {} pitch samples",
                i,
                note.lyric,
                corrected,
                real_length,
                pitch_samples.len()
            );

            let resampler = ResamplerArgs {
                sequence: i,
                in_file: settings.file_name.clone(),
                out_file: cache_name.clone(),
                tone_name,
                velocity,
                flags: fix_flags(&format!("{}{}", self.config.global_flags, note.flags)),
                offset: settings.offset,
                real_length,
                consonant: settings.consonant,
                blank: settings.blank,
                intensity: note.real_intensity(),
                modulation: note.real_modulation(),
                pitch_samples,
                tempo,
                pitch_encoding: self.config.pitch_encoding,
                corrected_pre_utterance: corrected.pre_utterance,
                corrected_overlap: corrected.voice_overlap,
                corrected_start_point: corrected.start_point,
            };
            let wavtool = WavtoolArgs {
                in_file: cache_name,
                out_file: self.config.output_file.clone(),
                start_point: corrected.start_point,
                voice_overlap: corrected.voice_overlap,
                tempo,
                length: note.length,
                correction,
                envelope: note
                    .envelope
                    .map(|envelope| envelope.anchors)
                    .unwrap_or_default(),
                rest: after_rest,
            };
            result.push((resampler, wavtool));
        }
        result
    }
}
