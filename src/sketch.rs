//! A simple textual format for writing down note sequences while testing things.
//!
//! A note is written as `lyric:tone`, e.g. `ka:C4` or `so:f#3`, a rest as `r`.
//! Both can be followed by duration marks: every `+` doubles the length of a
//! quarter note, every `-` halves it, and each `.` adds half of the previous
//! addition. A quarter note can be doubled or halved at most five times and
//! carry at most five dots.
//!
//! Per-note fields follow in brackets as `key=value` pairs: the Mode2 pitch
//! strings `pbs`, `pbw`, `pby` and `pbm`, `vbr` for the vibrato, `env` for the
//! envelope, the numbers `vel`, `pre`, `ovl` and `stp`, and `flags`.
//! A trailing `@bpm` changes the tempo from that note on.
//!
//! ```
//! use utau_synth::sketch::parse_sketch;
//!
//! let notes = parse_sketch("ka:C4 ra:D4- r+ n:E4.@140").unwrap();
//! let lengths: Vec<i32> = notes.iter().map(|note| note.length).collect();
//! assert_eq!(lengths, vec![480, 240, 960, 720]);
//! assert_eq!(notes[3].tempo, Some(140.0));
//! ```

use snafu::Snafu;

use crate::fields::{FieldError, PitchStrings};
use crate::note::{Note, TIME_BASE};
use crate::tone::Tone;

/// How often a quarter note can be doubled or halved, and how many dots it can carry.
const MAX_DOUBLINGS: i32 = 5;

pub fn parse_sketch(input: &str) -> Result<Vec<Note>, SketchError> {
    let mut p = Parser::new(input);
    p.parse_sequence()
}

#[derive(Debug, PartialEq, Snafu)]
pub enum SketchError {
    #[snafu(display("unexpected end of input"))]
    Eof,
    #[snafu(display("expected a lyric at {}, found '{}'", position, found))]
    NoLyric { position: usize, found: char },
    #[snafu(display("expected ':' after lyric '{}' at {}", lyric, position))]
    MissingSeparator { position: usize, lyric: String },
    #[snafu(display("invalid tone '{}' at {}", found, position))]
    InvalidTone { position: usize, found: String },
    #[snafu(display("invalid tempo at {}", position))]
    InvalidTempo { position: usize },
    #[snafu(display("duration out of range at {}", position))]
    InvalidDuration { position: usize },
    #[snafu(display("unknown field '{}' at {}", key, position))]
    UnknownField { position: usize, key: String },
    #[snafu(display("invalid field '{}' at {}: {}", key, position, message))]
    InvalidField {
        position: usize,
        key: String,
        message: String,
    },
    #[snafu(display("unclosed field list starting at {}", position))]
    UnclosedFields { position: usize },
}

/// Characters with a meaning of their own after a lyric.
fn is_lyric_char(ch: char) -> bool {
    !(ch.is_whitespace() || ":+-.@[]".contains(ch))
}

struct Parser<'a> {
    stream: Scan<'a>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut stream = Scan::new(input);
        stream.skip_whitespace();
        Self { stream }
    }

    pub fn is_eof(&mut self) -> bool {
        self.stream.is_eof()
    }

    pub fn parse_sequence(&mut self) -> Result<Vec<Note>, SketchError> {
        let mut notes = Vec::new();
        while !self.is_eof() {
            notes.push(self.parse_note()?);
            self.stream.skip_whitespace();
        }
        Ok(notes)
    }

    pub fn parse_note(&mut self) -> Result<Note, SketchError> {
        let position = self.stream.position();
        let lyric = self.parse_lyric()?;

        let mut note = if lyric == "r" || lyric == "R" {
            Note::rest(self.parse_duration()?)
        } else {
            if self.peek_char_optional() != Some(':') {
                return Err(SketchError::MissingSeparator { position, lyric });
            }
            self.stream.advance();
            let tone = self.parse_tone()?;
            let length = self.parse_duration()?;
            Note::new(tone, length, &lyric)
        };

        if let Some('[') = self.peek_char_optional() {
            self.parse_fields(&mut note)?;
        }
        if let Some('@') = self.peek_char_optional() {
            self.stream.advance();
            note.tempo = Some(self.parse_tempo()?);
        }
        Ok(note)
    }

    fn parse_lyric(&mut self) -> Result<String, SketchError> {
        let position = self.stream.position();
        let mut lyric = String::new();
        while let Some(ch) = self.peek_char_optional() {
            if !is_lyric_char(ch) {
                break;
            }
            self.stream.advance();
            lyric.push(ch);
        }
        if lyric.is_empty() {
            let found = self.peek_char()?;
            return Err(SketchError::NoLyric { position, found });
        }
        Ok(lyric)
    }

    fn parse_tone(&mut self) -> Result<Tone, SketchError> {
        let position = self.stream.position();
        // First comes the name
        let mut name = String::new();
        name.push(self.expect_char()?);
        // Then any accidental
        if let Some(ch) = self.peek_char_optional() {
            if ch == '#' || ch == '♯' || ch == 'b' || ch == '♭' {
                self.stream.advance();
                name.push(ch);
            }
        }
        // Then the octave
        let mut has_octave = false;
        while let Some(ch) = self.peek_char_optional() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.stream.advance();
            name.push(ch);
            has_octave = true;
        }
        if !has_octave {
            name.push('4');
        }
        Tone::named_str(&name).ok_or(SketchError::InvalidTone {
            position,
            found: name,
        })
    }

    /// Duration marks relative to a quarter note, in ticks.
    fn parse_duration(&mut self) -> Result<i32, SketchError> {
        let position = self.stream.position();
        // first in powers of two
        let mut power: i32 = 0;
        loop {
            match self.peek_char_optional() {
                Some('+') => {
                    self.stream.advance();
                    power = power.saturating_add(1);
                }
                Some('-') => {
                    self.stream.advance();
                    power = power.saturating_sub(1);
                }
                _ => break,
            }
        }
        // then the dots
        let mut dots: i32 = 0;
        while let Some('.') = self.peek_char_optional() {
            self.expect_char()?;
            dots = dots.saturating_add(1);
        }
        if power < -MAX_DOUBLINGS || power > MAX_DOUBLINGS || dots > MAX_DOUBLINGS {
            return Err(SketchError::InvalidDuration { position });
        }
        let scaled = |power: i32| {
            if power >= 0 {
                TIME_BASE << power
            } else {
                TIME_BASE >> -power
            }
        };
        let mut length = scaled(power);
        for i in 0..dots {
            // each dot is worth half of the previous addition
            length += scaled(power - i - 1);
        }
        Ok(length)
    }

    /// A bracketed list of whitespace separated `key=value` note fields.
    fn parse_fields(&mut self, note: &mut Note) -> Result<(), SketchError> {
        let start = self.stream.position();
        self.expect_char()?;

        let mut pitch = PitchStrings::default();
        let mut has_pitch = false;
        loop {
            self.stream.skip_whitespace();
            match self.peek_char_optional() {
                None => return Err(SketchError::UnclosedFields { position: start }),
                Some(']') => {
                    self.stream.advance();
                    break;
                }
                Some(_) => {}
            }

            let position = self.stream.position();
            let mut entry = String::new();
            while let Some(ch) = self.peek_char_optional() {
                if ch.is_whitespace() || ch == ']' {
                    break;
                }
                self.stream.advance();
                entry.push(ch);
            }
            let (key, value) = match entry.find('=') {
                Some(split) => (&entry[..split], &entry[split + 1..]),
                None => (entry.as_str(), ""),
            };
            let invalid = |message: String| SketchError::InvalidField {
                position,
                key: key.into(),
                message,
            };
            let number = |value: &str| {
                value
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("'{}' is not a number", value)))
            };

            match key {
                "pbs" => pitch.pbs = value.into(),
                "pbw" => pitch.pbw = value.into(),
                "pby" => pitch.pby = value.into(),
                "pbm" => pitch.pbm = value.into(),
                "vbr" => {
                    let vibrato = value
                        .parse()
                        .map_err(|err: FieldError| invalid(err.to_string()))?;
                    note.vibrato = Some(vibrato);
                }
                "env" => {
                    let envelope = value
                        .parse()
                        .map_err(|err: FieldError| invalid(err.to_string()))?;
                    note.envelope = Some(envelope);
                }
                "vel" => note.velocity = Some(number(value)?),
                "pre" => note.pre_utterance = Some(number(value)?),
                "ovl" => note.overlap = Some(number(value)?),
                "stp" => note.start_point = Some(number(value)?),
                "flags" => note.flags = value.into(),
                _ => {
                    return Err(SketchError::UnknownField {
                        position,
                        key: key.into(),
                    })
                }
            }
            has_pitch |= key.starts_with("pb");
        }

        if has_pitch {
            note.portamento = pitch.to_points();
        }
        Ok(())
    }

    fn parse_tempo(&mut self) -> Result<f64, SketchError> {
        let position = self.stream.position();
        let mut text = String::new();
        while let Some(ch) = self.peek_char_optional() {
            if !(ch.is_ascii_digit() || ch == '.') {
                break;
            }
            self.stream.advance();
            text.push(ch);
        }
        match text.parse::<f64>() {
            Ok(tempo) if tempo > 0.0 => Ok(tempo),
            _ => Err(SketchError::InvalidTempo { position }),
        }
    }

    fn expect_char(&mut self) -> Result<char, SketchError> {
        if let Some((_, ch)) = self.stream.next() {
            Ok(ch)
        } else {
            Err(SketchError::Eof)
        }
    }

    fn peek_char(&mut self) -> Result<char, SketchError> {
        if let Some((_, ch)) = self.stream.current() {
            Ok(ch)
        } else {
            Err(SketchError::Eof)
        }
    }

    fn peek_char_optional(&mut self) -> Option<char> {
        self.stream.current().map(|(_, ch)| ch)
    }
}

struct Scan<'a> {
    stream: std::iter::Peekable<std::str::CharIndices<'a>>,
    length: usize,
}

impl<'a> Scan<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            stream: input.char_indices().peekable(),
            length: input.len(),
        }
    }

    pub fn is_eof(&mut self) -> bool {
        self.current().is_none()
    }

    /// Byte offset of the next character.
    pub fn position(&mut self) -> usize {
        self.current().map_or(self.length, |(pos, _)| pos)
    }

    pub fn current(&mut self) -> Option<(usize, char)> {
        self.stream.peek().cloned()
    }

    pub fn next(&mut self) -> Option<(usize, char)> {
        self.stream.next()
    }

    pub fn advance(&mut self) {
        self.stream.next();
    }

    pub fn skip_whitespace(&mut self) {
        while let Some((_, ch)) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}
