// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Argument records for the two external rendering tools.
//!
//! The resampler turns one recorded sample into a rendered note:
//!
//! ```text
//! resampler <in> <out> <tone> <velocity> <flags> <offset> <length> <consonant> <blank>
//!           <intensity> <modulation> <pitch bend>...
//! ```
//!
//! The wavtool appends the rendered note to the output file:
//!
//! ```text
//! wavtool <out> <in> <start point> <length>@<tempo>+<correction> p1 p2 p3 v1 v2 v3 v4 ovr [p4 [p5 v5]]
//! ```

use crate::fields::format_number;
use crate::note::{EnvelopePoint, DEFAULT_TEMPO, TIME_BASE};
use crate::pitch::PitchEncoding;

/// Everything needed to invoke the resampler for one note.
#[derive(Clone, Debug, PartialEq)]
pub struct ResamplerArgs {
    /// Index of the note in the project.
    pub sequence: isize,

    pub in_file: String,
    pub out_file: String,
    pub tone_name: String,

    pub velocity: f64,
    pub flags: String,

    pub offset: f64,
    /// Length of the rendered note in milliseconds.
    pub real_length: f64,
    pub consonant: f64,
    pub blank: f64,

    pub intensity: f64,
    pub modulation: f64,

    pub pitch_samples: Vec<i32>,
    pub tempo: f64,
    pub pitch_encoding: PitchEncoding,

    pub corrected_pre_utterance: f64,
    pub corrected_overlap: f64,
    pub corrected_start_point: f64,
}

impl Default for ResamplerArgs {
    fn default() -> Self {
        ResamplerArgs {
            sequence: 0,
            in_file: String::new(),
            out_file: String::new(),
            tone_name: String::new(),
            velocity: 100.0,
            flags: String::new(),
            offset: 0.0,
            real_length: 0.0,
            consonant: 0.0,
            blank: 0.0,
            intensity: 100.0,
            modulation: 0.0,
            pitch_samples: Vec::new(),
            tempo: DEFAULT_TEMPO,
            pitch_encoding: PitchEncoding::default(),
            corrected_pre_utterance: 0.0,
            corrected_overlap: 0.0,
            corrected_start_point: 0.0,
        }
    }
}

impl ResamplerArgs {
    /// The trailing arguments: intensity, modulation and the pitch bend.
    pub fn params(&self) -> Vec<String> {
        let mut params = vec![format_number(self.intensity), format_number(self.modulation)];
        params.extend(
            self.pitch_encoding
                .pitch_params(&self.pitch_samples, self.tempo),
        );
        params
    }

    pub fn arguments(&self) -> Vec<String> {
        let mut arguments = vec![
            self.in_file.clone(),
            self.out_file.clone(),
            self.tone_name.clone(),
            format_number(self.velocity),
            self.flags.clone(),
            format_number(self.offset),
            format_number(self.real_length),
            format_number(self.consonant),
            format_number(self.blank),
        ];
        arguments.extend(self.params());
        arguments
    }
}

/// Everything needed to invoke the wavtool for one note.
#[derive(Clone, Debug, PartialEq)]
pub struct WavtoolArgs {
    /// The file rendered by the resampler.
    pub in_file: String,
    /// The file all notes are appended to.
    pub out_file: String,

    pub start_point: f64,
    pub voice_overlap: f64,

    pub tempo: f64,
    /// Length in ticks.
    pub length: i32,
    /// Length correction in milliseconds.
    pub correction: f64,

    pub envelope: Vec<EnvelopePoint>,

    /// Whether the note is appended after a rest.
    pub rest: bool,
}

impl Default for WavtoolArgs {
    fn default() -> Self {
        WavtoolArgs {
            in_file: String::new(),
            out_file: String::new(),
            start_point: 0.0,
            voice_overlap: 0.0,
            tempo: DEFAULT_TEMPO,
            length: TIME_BASE,
            correction: 0.0,
            envelope: Vec::new(),
            rest: false,
        }
    }
}

impl WavtoolArgs {
    /// The length argument `<length>@<tempo><signed correction>`.
    ///
    /// ```
    /// use utau_synth::synth::args::WavtoolArgs;
    ///
    /// let mut args = WavtoolArgs { length: 480, tempo: 120.0, correction: 60.0, ..Default::default() };
    /// assert_eq!(args.out_duration(), "480@120+60");
    /// args.correction = -12.5;
    /// assert_eq!(args.out_duration(), "480@120-12.5");
    /// ```
    pub fn out_duration(&self) -> String {
        let correction = format_number(self.correction);
        let sign = if correction.starts_with('-') { "" } else { "+" };
        format!(
            "{}@{}{}{}",
            self.length,
            format_number(self.tempo),
            sign,
            correction
        )
    }

    /// The envelope arguments, or just two zeros for a note following a rest.
    pub fn envelope_fields(&self) -> Vec<String> {
        if self.rest {
            return vec!["0".into(), "0".into()];
        }

        let overlap = format_number(self.voice_overlap);
        let anchors = &self.envelope;
        let n = anchors.len();
        if n < 4 {
            let mut fields: Vec<String> = ["0", "5", "35", "0", "100", "100", "0"]
                .iter()
                .map(|field| field.to_string())
                .collect();
            fields.push(overlap);
            return fields;
        }

        let mut fields: Vec<String> = [
            anchors[0].x,
            anchors[1].x,
            anchors[n - 2].x,
            anchors[0].y,
            anchors[1].y,
            anchors[n - 2].y,
            anchors[n - 1].y,
        ]
        .iter()
        .map(|&value| format_number(value))
        .collect();
        fields.push(overlap);

        if n == 5 {
            fields.push(format_number(anchors[n - 1].x));
            fields.push(format_number(anchors[2].x));
            fields.push(format_number(anchors[2].y));
        } else if anchors[n - 1].x != 0.0 {
            fields.push(format_number(anchors[n - 1].x));
        }
        fields
    }

    pub fn arguments(&self) -> Vec<String> {
        let mut arguments = vec![
            self.out_file.clone(),
            self.in_file.clone(),
            format_number(self.start_point),
            self.out_duration(),
        ];
        arguments.extend(self.envelope_fields());
        arguments
    }
}

/// Remove quotes and escape `e`/`E` with a slash.
///
/// ```
/// use utau_synth::synth::args::fix_flags;
///
/// assert_eq!(fix_flags("g-5\"Y0"), "g-5Y0");
/// assert_eq!(fix_flags("eB20"), "/eB20");
/// ```
pub fn fix_flags(flags: &str) -> String {
    let mut fixed = String::with_capacity(flags.len());
    for ch in flags.chars() {
        match ch {
            '"' => continue,
            'e' | 'E' => fixed.push('/'),
            _ => {}
        }
        fixed.push(ch);
    }
    fixed
}

/// Replace or drop characters that are not allowed in file names.
pub fn fix_filename(name: &str) -> String {
    name.chars()
        .filter_map(|ch| match ch {
            ' ' => Some('+'),
            '\\' | '/' => Some('_'),
            '*' => Some('$'),
            '?' => Some('='),
            ':' | '|' | '>' | '<' => None,
            _ => Some(ch),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::{expect, Expect};

    fn check(args: Vec<String>, output: Expect) {
        output.assert_eq(&args.join(" "));
    }

    fn anchors(points: &[(f64, f64)]) -> Vec<EnvelopePoint> {
        points.iter().map(|&(x, y)| EnvelopePoint { x, y }).collect()
    }

    #[test]
    fn resampler_arguments() {
        let args = ResamplerArgs {
            in_file: "voice/_ka.wav".into(),
            out_file: "0_ka_C4_480.wav".into(),
            tone_name: "C4".into(),
            flags: "g-5".into(),
            offset: 12.5,
            real_length: 650.0,
            consonant: 100.0,
            blank: -300.0,
            pitch_samples: vec![-100, -95, -95, -95, 0, 0, 0],
            ..Default::default()
        };
        check(
            args.arguments(),
            expect![[r#"voice/_ka.wav 0_ka_C4_480.wav C4 100 g-5 12.5 650 100 -300 100 0 !120 +c+h#2#AA#2#"#]],
        );

        let legacy = ResamplerArgs {
            pitch_encoding: PitchEncoding::Legacy,
            pitch_samples: vec![3, 2, 1],
            tempo: 150.0,
            ..args
        };
        check(
            legacy.params(),
            expect![[r#"100 0 3Q150 2 1"#]],
        );
    }

    #[test]
    fn wavtool_arguments() {
        let args = WavtoolArgs {
            in_file: "0_ka_C4_480.wav".into(),
            out_file: "out.wav".into(),
            start_point: 3.25,
            voice_overlap: 20.0,
            correction: 60.0,
            ..Default::default()
        };
        check(
            args.arguments(),
            expect![[r#"out.wav 0_ka_C4_480.wav 3.25 480@120+60 0 5 35 0 100 100 0 20"#]],
        );

        let after_rest = WavtoolArgs { rest: true, ..args };
        check(
            after_rest.arguments(),
            expect![[r#"out.wav 0_ka_C4_480.wav 3.25 480@120+60 0 0"#]],
        );
    }

    #[test]
    fn envelope_fields() {
        let mut args = WavtoolArgs {
            voice_overlap: 10.0,
            envelope: anchors(&[(0.0, 0.0), (5.0, 100.0), (35.0, 100.0), (0.0, 0.0)]),
            ..Default::default()
        };
        check(args.envelope_fields(), expect![[r#"0 5 35 0 100 100 0 10"#]]);

        args.envelope = anchors(&[(1.0, 10.0), (5.0, 100.0), (35.0, 90.0), (12.0, 0.0)]);
        check(args.envelope_fields(), expect![[r#"1 5 35 10 100 90 0 10 12"#]]);

        args.envelope = anchors(&[
            (0.0, 0.0),
            (5.0, 100.0),
            (20.0, 80.0),
            (35.0, 100.0),
            (0.0, 0.0),
        ]);
        check(
            args.envelope_fields(),
            expect![[r#"0 5 35 0 100 100 0 10 0 20 80"#]],
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(fix_filename("a b/c\\d*e?f:g|h>i<j"), "a+b_c_d$e=fghij");
        assert_eq!(fix_filename("か"), "か");
    }
}
