// utau-synth -- pitch curve and render argument synthesis for UTAU voicebanks
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Original voice ("genon") settings and the timing correction applied to them.

/// One entry of a voicebank's original voice table, describing which part
/// of a recorded sample is used for an alias. All times are in milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenonSettings {
    pub file_name: String,
    pub alias: String,
    pub offset: f64,
    pub consonant: f64,
    pub blank: f64,
    pub pre_utterance: f64,
    pub voice_overlap: f64,
}

/// The timing a note asks for, before correcting it against its neighbours.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DeclaredTiming {
    pub pre_utterance: f64,
    pub overlap: f64,
    pub start_point: f64,
}

/// What the correction needs to know about the preceding note.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PreviousNote {
    /// Duration in milliseconds, zero if there is no previous note.
    pub duration: f64,
    pub is_rest: bool,
}

/// Timing that fits into the space the previous note leaves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CorrectedTiming {
    pub pre_utterance: f64,
    pub voice_overlap: f64,
    pub start_point: f64,
}

impl DeclaredTiming {
    /// Scale the consonant timing by the consonant velocity (100 is neutral, higher
    /// is shorter) and shrink it so that it does not eat up more of the previous note
    /// than available: all of a rest, but only half of a sung note.
    ///
    /// Whatever is cut off the pre-utterance moves the start point, keeping the
    /// consonant onset where it was.
    ///
    /// # Examples
    ///
    /// ```
    /// use utau_synth::genon::{DeclaredTiming, PreviousNote};
    ///
    /// let declared = DeclaredTiming { pre_utterance: 120.0, overlap: 20.0, start_point: 0.0 };
    /// let prev = PreviousNote { duration: 100.0, is_rest: false };
    /// let corrected = declared.correct(100.0, 500.0, prev);
    /// assert_eq!(corrected.pre_utterance, 60.0);
    /// assert_eq!(corrected.voice_overlap, 10.0);
    /// assert_eq!(corrected.start_point, 60.0);
    /// ```
    pub fn correct(&self, velocity: f64, duration: f64, prev: PreviousNote) -> CorrectedTiming {
        let velocity_rate = 2f64.powf(1.0 - velocity / 100.0);
        let pre_utterance = self.pre_utterance * velocity_rate;
        let overlap = self.overlap * velocity_rate;
        if prev.duration == 0.0 {
            return CorrectedTiming {
                pre_utterance,
                voice_overlap: overlap,
                start_point: self.start_point,
            };
        }

        let max_occupy = if prev.is_rest {
            prev.duration
        } else {
            prev.duration / 2.0
        };
        let occupied = pre_utterance - overlap;
        let rate = if occupied > max_occupy {
            max_occupy / occupied
        } else {
            1.0
        };

        let corrected_pre_utterance = rate * pre_utterance;
        let mut corrected_overlap = rate * overlap;
        let start_point = self.start_point + (pre_utterance - corrected_pre_utterance);

        // the overlap cannot be longer than the note itself
        if corrected_overlap - corrected_pre_utterance > duration {
            corrected_overlap = corrected_pre_utterance + duration;
        }

        CorrectedTiming {
            pre_utterance: corrected_pre_utterance,
            voice_overlap: corrected_overlap,
            start_point,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn declared(pre_utterance: f64, overlap: f64, start_point: f64) -> DeclaredTiming {
        DeclaredTiming {
            pre_utterance,
            overlap,
            start_point,
        }
    }

    #[test]
    fn first_note_is_only_velocity_scaled() {
        let timing = declared(80.0, 20.0, 5.0);
        assert_eq!(
            timing.correct(100.0, 500.0, PreviousNote::default()),
            CorrectedTiming {
                pre_utterance: 80.0,
                voice_overlap: 20.0,
                start_point: 5.0
            }
        );
        // velocity 200 halves the consonant, velocity 0 doubles it
        assert_eq!(
            timing.correct(200.0, 500.0, PreviousNote::default()),
            CorrectedTiming {
                pre_utterance: 40.0,
                voice_overlap: 10.0,
                start_point: 5.0
            }
        );
        assert_eq!(
            timing.correct(0.0, 500.0, PreviousNote::default()),
            CorrectedTiming {
                pre_utterance: 160.0,
                voice_overlap: 40.0,
                start_point: 5.0
            }
        );
    }

    #[test]
    fn rest_yields_its_whole_duration() {
        let timing = declared(120.0, 20.0, 0.0);
        let prev = PreviousNote {
            duration: 100.0,
            is_rest: true,
        };
        // 100 ms fit exactly, nothing to correct
        assert_eq!(
            timing.correct(100.0, 500.0, prev),
            CorrectedTiming {
                pre_utterance: 120.0,
                voice_overlap: 20.0,
                start_point: 0.0
            }
        );
        let sung = PreviousNote {
            duration: 100.0,
            is_rest: false,
        };
        assert_eq!(timing.correct(100.0, 500.0, sung).pre_utterance, 60.0);
    }

    #[test]
    fn overlap_is_bounded_by_duration() {
        let prev = PreviousNote {
            duration: 1000.0,
            is_rest: false,
        };
        for &(pre, overlap, duration) in &[
            (10.0, 300.0, 100.0),
            (0.0, 50.0, 10.0),
            (100.0, 100.0, 0.0),
            (40.0, 500.0, 460.0),
        ] {
            let corrected = declared(pre, overlap, 0.0).correct(100.0, duration, prev);
            assert!(corrected.voice_overlap - corrected.pre_utterance <= duration);
        }
    }

    #[test]
    fn start_point_absorbs_removed_pre_utterance() {
        let prev = PreviousNote {
            duration: 50.0,
            is_rest: false,
        };
        let corrected = declared(100.0, 0.0, 10.0).correct(100.0, 500.0, prev);
        assert_eq!(corrected.pre_utterance, 25.0);
        assert_eq!(corrected.start_point, 85.0);
    }
}
