//! Sampling a note's control point sequence tick by tick.

use crate::note::{ms_to_ticks, CurvePoint, Vibrato};

use super::vibrato::VibratoShape;

/// A cursor over the control points of one note.
///
/// Samples are expected to be requested in increasing order, which lets the walker
/// continue from the segment it found last time instead of searching from the start.
/// If a sample lies left of the current segment the walker steps back, but never
/// before the first point.
#[derive(Clone, Debug)]
pub struct CurveWalker<'a> {
    points: &'a [CurvePoint],
    vibrato: Option<VibratoShape>,
    /// Tempo for converting points at or after the note start.
    tempo: f64,
    /// Tempo for converting points before the note start.
    negative_tempo: f64,
    position: usize,
}

impl<'a> CurveWalker<'a> {
    pub fn new(points: &'a [CurvePoint], tempo: f64) -> Self {
        CurveWalker {
            points,
            vibrato: None,
            tempo,
            negative_tempo: tempo,
            position: 0,
        }
    }

    /// Use a different tempo for points lying before the note start.
    pub fn with_negative_tempo(mut self, tempo: f64) -> Self {
        self.negative_tempo = tempo;
        self
    }

    /// Add a vibrato to a note of `note_length` ticks.
    pub fn with_vibrato(mut self, vibrato: Option<&Vibrato>, note_length: i32) -> Self {
        self.vibrato = vibrato.and_then(|v| VibratoShape::new(v, note_length, self.tempo));
        self
    }

    /// Index of the left point of the current segment.
    pub fn position(&self) -> usize {
        self.position
    }

    fn point_ticks(&self, point: &CurvePoint) -> f64 {
        let tempo = if point.x < 0.0 {
            self.negative_tempo
        } else {
            self.tempo
        };
        ms_to_ticks(point.x, tempo)
    }

    /// Pitch offset in cents at `tick`, relative to the note start.
    ///
    /// Before the first point the first point's value is held; after the last point
    /// the curve itself contributes nothing.
    ///
    /// ```
    /// use utau_synth::note::{CurvePoint, JoinType};
    /// use utau_synth::pitch::CurveWalker;
    ///
    /// // at tempo 125 one millisecond is one tick
    /// let points = [CurvePoint::new(0.0, -10.0), CurvePoint::with_join(100.0, 0.0, JoinType::Linear)];
    /// let mut walker = CurveWalker::new(&points, 125.0);
    /// assert_eq!(walker.advance(-20), -100);
    /// assert_eq!(walker.advance(50), -50);
    /// assert_eq!(walker.advance(150), 0);
    /// ```
    pub fn advance(&mut self, tick: i32) -> i32 {
        let x = tick as f64;
        let mut pitch = 0;

        let mut too_far_left = false;
        while self.position + 1 < self.points.len() {
            let left = &self.points[self.position];
            let x1 = self.point_ticks(left);
            if x < x1 {
                if self.position > 0 {
                    self.position -= 1;
                    continue;
                }
                too_far_left = true;
                break;
            }

            let right = &self.points[self.position + 1];
            let x2 = self.point_ticks(right);
            if x > x2 {
                self.position += 1;
                continue;
            }

            pitch = right.join.sample(x1, left.y * 10.0, x2, right.y * 10.0, x);
            break;
        }
        if too_far_left {
            pitch = (self.points[0].y * 10.0) as i32;
        }

        if let Some(vibrato) = &self.vibrato {
            pitch = (pitch as f64 + vibrato.at(x)) as i32;
        }
        pitch
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::note::JoinType;

    #[test]
    fn empty_curve_is_flat() {
        let mut walker = CurveWalker::new(&[], 120.0);
        for tick in (-100..500).step_by(5) {
            assert_eq!(walker.advance(tick), 0);
        }
    }

    #[test]
    fn single_point_contributes_nothing() {
        let points = [CurvePoint::new(0.0, 30.0)];
        let mut walker = CurveWalker::new(&points, 120.0);
        assert_eq!(walker.advance(-50), 0);
        assert_eq!(walker.advance(50), 0);
    }

    #[test]
    fn walks_across_segments() {
        let points = [
            CurvePoint::new(-20.0, -20.0),
            CurvePoint::with_join(0.0, 0.0, JoinType::Linear),
            CurvePoint::with_join(100.0, 10.0, JoinType::Linear),
            CurvePoint::with_join(200.0, 0.0, JoinType::Linear),
        ];
        let mut walker = CurveWalker::new(&points, 125.0);
        assert_eq!(walker.advance(-30), -200);
        assert_eq!(walker.position(), 0);
        assert_eq!(walker.advance(-10), -100);
        assert_eq!(walker.advance(50), 50);
        assert_eq!(walker.position(), 1);
        assert_eq!(walker.advance(150), 50);
        assert_eq!(walker.position(), 2);
        assert_eq!(walker.advance(250), 0);
        assert_eq!(walker.position(), 3);
    }

    #[test]
    fn steps_back_when_sampled_out_of_order() {
        let points = [
            CurvePoint::new(0.0, 0.0),
            CurvePoint::with_join(100.0, 10.0, JoinType::Linear),
            CurvePoint::with_join(200.0, 0.0, JoinType::Linear),
        ];
        let mut walker = CurveWalker::new(&points, 125.0);
        assert_eq!(walker.advance(150), 50);
        assert_eq!(walker.position(), 1);
        assert_eq!(walker.advance(50), 50);
        assert_eq!(walker.position(), 0);
    }

    #[test]
    fn negative_points_use_their_own_tempo() {
        let points = [
            CurvePoint::new(-100.0, -10.0),
            CurvePoint::with_join(0.0, 0.0, JoinType::Linear),
        ];
        // before the note start one millisecond is half a tick
        let mut walker = CurveWalker::new(&points, 125.0).with_negative_tempo(62.5);
        assert_eq!(walker.advance(-60), -100);
        assert_eq!(walker.advance(-25), -50);
    }

    #[test]
    fn vibrato_is_added_to_the_curve() {
        let vibrato = Vibrato {
            length: 50.0,
            period: 100.0,
            amplitude: 40.0,
            attack: 0.0,
            release: 0.0,
            phase: 0.0,
            offset: 0.0,
            intensity: 0.0,
        };
        let points = [
            CurvePoint::new(0.0, 5.0),
            CurvePoint::with_join(400.0, 5.0, JoinType::Linear),
        ];
        let mut walker = CurveWalker::new(&points, 125.0).with_vibrato(Some(&vibrato), 400);
        assert_eq!(walker.advance(100), 50);
        assert_eq!(walker.advance(225), 90);
        assert_eq!(walker.advance(275), 10);
    }
}
