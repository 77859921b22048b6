// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Textual encodings of the per-note fields of a project:
//! Mode2 pitch strings, vibrato and envelope.

use std::fmt;
use std::str::FromStr;

use snafu::Snafu;

use crate::note::{CurvePoint, Envelope, EnvelopePoint, JoinType, Vibrato};

/// Format a number the way project files and tool arguments expect it:
/// at most three decimals, without trailing zeros.
///
/// ```
/// use utau_synth::fields::format_number;
///
/// assert_eq!(format_number(120.0), "120");
/// assert_eq!(format_number(12.5), "12.5");
/// assert_eq!(format_number(-0.0001), "0");
/// assert_eq!(format_number(1.0 / 3.0), "0.333");
/// ```
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".into()
    } else {
        trimmed.into()
    }
}

/// Lenient number parsing: anything unparsable reads as zero.
fn number_or_zero(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}

fn split_list(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        text.split(',').collect()
    }
}

/// Join a list of entries, dropping empty entries at the end.
fn join_trimmed(mut entries: Vec<String>) -> String {
    while entries.last().map_or(false, |entry| entry.is_empty()) {
        entries.pop();
    }
    entries.join(",")
}

/// The four strings a project uses to store a Mode2 pitch curve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PitchStrings {
    /// Start of the curve, `x` or `x;y`.
    pub pbs: String,
    /// Widths of the segments.
    pub pbw: String,
    /// Pitch offsets at the end of each segment.
    pub pby: String,
    /// Join types of each segment.
    pub pbm: String,
}

impl PitchStrings {
    /// Expand the relative segment widths into absolute control points.
    ///
    /// ```
    /// use utau_synth::fields::PitchStrings;
    /// use utau_synth::note::{CurvePoint, JoinType};
    ///
    /// let strings = PitchStrings {
    ///     pbs: "-40;20".into(),
    ///     pbw: "40,60".into(),
    ///     pby: ",5".into(),
    ///     pbm: "s,j".into(),
    /// };
    /// assert_eq!(
    ///     strings.to_points(),
    ///     vec![
    ///         CurvePoint::new(-40.0, 20.0),
    ///         CurvePoint::with_join(0.0, 0.0, JoinType::Linear),
    ///         CurvePoint::with_join(60.0, 5.0, JoinType::EaseOut),
    ///     ]
    /// );
    /// ```
    pub fn to_points(&self) -> Vec<CurvePoint> {
        if self.pbs.trim().is_empty() && self.pbw.trim().is_empty() {
            return Vec::new();
        }

        let mut start = self.pbs.split(';');
        let first_x = start.next().map_or(0.0, number_or_zero);
        let first_y = start.next().map_or(0.0, number_or_zero);

        let widths = split_list(&self.pbw);
        let offsets = split_list(&self.pby);
        let joins = split_list(&self.pbm);

        let mut points = Vec::with_capacity(widths.len() + 1);
        points.push(CurvePoint::new(first_x, first_y));
        let mut x = first_x;
        for (i, width) in widths.iter().enumerate() {
            x += number_or_zero(width);
            let y = offsets.get(i).map_or(0.0, |y| number_or_zero(y));
            let join = joins
                .get(i)
                .map_or(JoinType::Default, |code| JoinType::from_code(code.trim()));
            points.push(CurvePoint::with_join(x, y, join));
        }

        // x must never run backwards
        for i in 1..points.len() {
            if points[i].x < points[i - 1].x {
                points[i].x = points[i - 1].x;
            }
        }
        points
    }

    /// Inverse of [`PitchStrings::to_points`].
    pub fn from_points(points: &[CurvePoint]) -> PitchStrings {
        let first = match points.first() {
            Some(first) => first,
            None => return PitchStrings::default(),
        };

        let pbs = if first.y == 0.0 {
            format_number(first.x)
        } else {
            format!("{};{}", format_number(first.x), format_number(first.y))
        };
        let pbw = points
            .windows(2)
            .map(|pair| format_number(pair[1].x - pair[0].x))
            .collect::<Vec<_>>()
            .join(",");
        let pby = join_trimmed(
            points[1..]
                .iter()
                .map(|p| {
                    if p.y == 0.0 {
                        String::new()
                    } else {
                        format_number(p.y)
                    }
                })
                .collect(),
        );
        let pbm = join_trimmed(points[1..].iter().map(|p| p.join.code().into()).collect());

        PitchStrings { pbs, pbw, pby, pbm }
    }
}

/// Errors from decoding vibrato or envelope strings.
#[derive(Debug, PartialEq, Snafu)]
pub enum FieldError {
    #[snafu(display("Field {} ({:?}) is not a number", index, text))]
    InvalidNumber { index: usize, text: String },
    #[snafu(display("Expected at least {} fields, found {}", expected, found))]
    MissingFields { expected: usize, found: usize },
}

fn parse_fields(text: &str) -> Vec<&str> {
    text.split(',').map(str::trim).collect()
}

/// Parse a single field; an empty field reads as zero.
fn parse_field(fields: &[&str], index: usize) -> Result<f64, FieldError> {
    match fields.get(index) {
        None | Some(&"") => Ok(0.0),
        Some(text) => text.parse().map_err(|_| FieldError::InvalidNumber {
            index,
            text: (*text).into(),
        }),
    }
}

impl FromStr for Vibrato {
    type Err = FieldError;

    /// Parse `length,period,amplitude,attack,release,phase,offset,intensity`.
    /// Missing trailing fields keep their default values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = parse_fields(s);
        let mut vibrato = Vibrato::default();
        {
            let mut slots = [
                &mut vibrato.length,
                &mut vibrato.period,
                &mut vibrato.amplitude,
                &mut vibrato.attack,
                &mut vibrato.release,
                &mut vibrato.phase,
                &mut vibrato.offset,
                &mut vibrato.intensity,
            ];
            for (index, slot) in slots.iter_mut().enumerate().take(fields.len()) {
                **slot = parse_field(&fields, index)?;
            }
        }
        Ok(vibrato)
    }
}

impl fmt::Display for Vibrato {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = [
            self.length,
            self.period,
            self.amplitude,
            self.attack,
            self.release,
            self.phase,
            self.offset,
            self.intensity,
        ];
        let strings: Vec<_> = values.iter().map(|v| format_number(*v)).collect();
        write!(f, "{}", strings.join(","))
    }
}

impl FromStr for Envelope {
    type Err = FieldError;

    /// Parse `p1,p2,p3,v1,v2,v3,v4[,%[,p4[,p5,v5]]]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = parse_fields(s);
        if fields.len() < 7 {
            return Err(FieldError::MissingFields {
                expected: 7,
                found: fields.len(),
            });
        }
        let field = |index| parse_field(&fields, index);
        let anchor = |x, y| -> Result<EnvelopePoint, FieldError> {
            Ok(EnvelopePoint {
                x: field(x)?,
                y: field(y)?,
            })
        };

        // field 7 is the literal "%" separator
        let mut anchors = vec![anchor(0, 3)?, anchor(1, 4)?];
        if fields.len() >= 10 {
            anchors.push(anchor(9, 10)?);
        }
        anchors.push(anchor(2, 5)?);
        anchors.push(anchor(8, 6)?);
        Ok(Envelope { anchors })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.anchors.len();
        if n < 4 {
            return write!(f, "{}", Envelope::default());
        }
        let a = &self.anchors;
        let mut fields = vec![
            format_number(a[0].x),
            format_number(a[1].x),
            format_number(a[n - 2].x),
            format_number(a[0].y),
            format_number(a[1].y),
            format_number(a[n - 2].y),
            format_number(a[n - 1].y),
            "%".into(),
            format_number(a[n - 1].x),
        ];
        if n == 5 {
            fields.push(format_number(a[2].x));
            fields.push(format_number(a[2].y));
        }
        write!(f, "{}", fields.join(","))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_pitch_strings_mean_no_curve() {
        assert_eq!(PitchStrings::default().to_points(), vec![]);
        assert_eq!(PitchStrings::from_points(&[]), PitchStrings::default());
    }

    #[test]
    fn garbage_numbers_read_as_zero() {
        let strings = PitchStrings {
            pbs: "abc".into(),
            pbw: "10,x".into(),
            pby: "".into(),
            pbm: "".into(),
        };
        assert_eq!(
            strings.to_points(),
            vec![
                CurvePoint::new(0.0, 0.0),
                CurvePoint::new(10.0, 0.0),
                CurvePoint::new(10.0, 0.0),
            ]
        );
    }

    #[test]
    fn backwards_points_are_clamped() {
        let strings = PitchStrings {
            pbs: "-20".into(),
            pbw: "30,-50,10".into(),
            pby: "1,2,3".into(),
            pbm: "".into(),
        };
        let xs: Vec<f64> = strings.to_points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-20.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn pitch_strings_from_points() {
        let points = vec![
            CurvePoint::new(-50.0, -20.0),
            CurvePoint::with_join(25.5, 0.0, JoinType::EaseIn),
            CurvePoint::new(100.0, 0.0),
        ];
        let strings = PitchStrings::from_points(&points);
        assert_eq!(
            strings,
            PitchStrings {
                pbs: "-50;-20".into(),
                pbw: "75.5,74.5".into(),
                pby: "".into(),
                pbm: "r".into(),
            }
        );
        assert_eq!(strings.to_points(), points);
    }

    #[test]
    fn vibrato_strings() {
        let vibrato: Vibrato = "70,150,40,10,30,25,-10,0".parse().unwrap();
        assert_eq!(
            vibrato,
            Vibrato {
                length: 70.0,
                period: 150.0,
                amplitude: 40.0,
                attack: 10.0,
                release: 30.0,
                phase: 25.0,
                offset: -10.0,
                intensity: 0.0,
            }
        );
        assert_eq!(vibrato.to_string(), "70,150,40,10,30,25,-10,0");

        let partial: Vibrato = "50,200".parse().unwrap();
        assert_eq!(partial.length, 50.0);
        assert_eq!(partial.period, 200.0);
        assert_eq!(partial.amplitude, Vibrato::default().amplitude);

        assert_eq!(
            "50,fast".parse::<Vibrato>(),
            Err(FieldError::InvalidNumber {
                index: 1,
                text: "fast".into()
            })
        );
    }

    #[test]
    fn envelope_strings() {
        let four: Envelope = "0,5,35,0,100,100,0,%,0".parse().unwrap();
        assert_eq!(four, Envelope::default());
        assert_eq!(four.to_string(), "0,5,35,0,100,100,0,%,0");

        let five: Envelope = "0,5,35,0,100,100,0,%,0,10,80".parse().unwrap();
        assert_eq!(five.anchors.len(), 5);
        assert_eq!(five.anchors[2], EnvelopePoint { x: 10.0, y: 80.0 });
        assert_eq!(five.to_string(), "0,5,35,0,100,100,0,%,0,10,80");

        assert_eq!(
            "0,5,35".parse::<Envelope>(),
            Err(FieldError::MissingFields {
                expected: 7,
                found: 3
            })
        );
    }
}
