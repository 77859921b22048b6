// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Tone numbers and their names.

/// Letters of the twelve semitones of an octave, starting at C.
/// A letter repeating its predecessor denotes the sharp of that predecessor.
const TONE_LETTERS: [char; 12] = ['C', 'C', 'D', 'D', 'E', 'F', 'F', 'G', 'G', 'A', 'A', 'B'];

/// Tone number of C1, the lowest tone a voicebank prefix table covers.
pub const TONE_NUMBER_BASE: i32 = 24;
pub const TONE_OCTAVE_MIN: i32 = 1;
pub const TONE_OCTAVE_MAX: i32 = 7;
pub const TONE_OCTAVE_STEPS: i32 = 12;

/// A tone is the pitch of a note as an index on the keyboard.
/// This follows the MIDI numbering where C4 corresponds to index 60.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Tone(i32);

impl Tone {
    pub const fn from_number(number: i32) -> Tone {
        Tone(number)
    }

    pub fn number(self) -> i32 {
        self.0
    }

    /// The name of the tone as understood by resamplers, e.g. `C4` or `A#3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use utau_synth::tone::Tone;
    ///
    /// assert_eq!(Tone::from_number(60).name(), "C4");
    /// assert_eq!(Tone::from_number(70).name(), "A#4");
    /// assert_eq!(Tone::from_number(47).name(), "B2");
    /// ```
    pub fn name(self) -> String {
        let index = self.0.rem_euclid(TONE_OCTAVE_STEPS) as usize;
        let octave = self.0.div_euclid(TONE_OCTAVE_STEPS) - 1;
        let mut name = String::new();
        name.push(TONE_LETTERS[index]);
        if index > 0 && TONE_LETTERS[index] == TONE_LETTERS[index - 1] {
            name.push('#');
        }
        name.push_str(&octave.to_string());
        name
    }

    /// Parse a name string of the format `<letter><offset><octave>`.
    /// Octaves outside of the range covered by voicebanks are clamped to that range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use utau_synth::tone::Tone;
    ///
    /// assert_eq!(Tone::named_str("C4"), Some(Tone::from_number(60)));
    /// assert_eq!(Tone::named_str("a#4"), Some(Tone::from_number(70)));
    /// assert_eq!(Tone::named_str("Gb2"), Some(Tone::from_number(42)));
    /// assert_eq!(Tone::named_str("C9"), Some(Tone::from_number(96)));
    /// assert_eq!(Tone::named_str("H4"), None);
    /// ```
    pub fn named_str(name_str: &str) -> Option<Tone> {
        let mut name_chars = name_str.chars();
        let letter = name_chars.next()?.to_ascii_uppercase();
        let index = TONE_LETTERS.iter().position(|&ch| ch == letter)? as i32;

        let offset_str = name_chars
            .as_str()
            .trim_end_matches(|ch: char| ch.is_ascii_digit());
        let offset = match offset_str {
            "#" | "♯" => 1,
            "b" | "♭" => -1,
            "" => 0,
            _ => return None,
        };

        let octave_str = &name_chars.as_str()[offset_str.len()..];
        let octave: i32 = octave_str.parse().ok()?;
        let octave = octave.max(TONE_OCTAVE_MIN).min(TONE_OCTAVE_MAX);

        Some(Tone(
            TONE_NUMBER_BASE + (octave - 1) * TONE_OCTAVE_STEPS + index + offset,
        ))
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone(60)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_round_trip_over_voicebank_range() {
        let lowest = TONE_NUMBER_BASE;
        let highest = lowest + (TONE_OCTAVE_MAX - TONE_OCTAVE_MIN + 1) * TONE_OCTAVE_STEPS - 1;
        for number in lowest..=highest {
            let tone = Tone::from_number(number);
            assert_eq!(Tone::named_str(&tone.name()), Some(tone));
        }
    }

    #[test]
    fn malformed_names() {
        assert_eq!(Tone::named_str(""), None);
        assert_eq!(Tone::named_str("C"), None);
        assert_eq!(Tone::named_str("Cx4"), None);
    }

    #[test]
    fn low_octaves_are_clamped() {
        assert_eq!(Tone::named_str("C0"), Some(Tone::from_number(TONE_NUMBER_BASE)));
    }
}
