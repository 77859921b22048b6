//! Conversion of a note's Mode2 pitch curve, together with the curves of its
//! neighbours, into Mode1 pitch bend samples.

use crate::note::{ms_to_ticks, CurvePoint, Vibrato, TIME_BASE};

use super::walker::CurveWalker;
use super::{MIN_SAMPLES, SAMPLE_STEP};

/// The pitch related parts of a single note.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteCurve {
    /// Control points, with the first point's y already corrected against the
    /// preceding note.
    pub points: Vec<CurvePoint>,
    pub vibrato: Option<Vibrato>,
    /// Length of the note in ticks.
    pub length: i32,
}

impl Default for NoteCurve {
    fn default() -> Self {
        NoteCurve {
            points: Vec::new(),
            vibrato: None,
            length: TIME_BASE,
        }
    }
}

/// Everything needed to compute the pitch bend of the current note.
///
/// Timing values are corrected genon timings in milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteContext {
    /// Tempo of the current note.
    pub tempo: f64,
    /// Tempo in effect for the previous note.
    pub prev_tempo: f64,
    pub prev: NoteCurve,
    pub current: NoteCurve,
    pub next: NoteCurve,
    pub pre_utterance: f64,
    pub start_point: f64,
    pub next_pre_utterance: f64,
    pub next_overlap: f64,
}

impl NoteContext {
    /// Sample the pitch bend of the current note every [`SAMPLE_STEP`] ticks.
    ///
    /// Sampling starts before the note where its pre-utterance begins and ends where
    /// the next note's overlap ends. Around the note boundaries the curves of the
    /// neighbouring notes bleed in: the previous curve until the note starts, the
    /// next curve from its first point on.
    ///
    /// [`SAMPLE_STEP`]: super::SAMPLE_STEP
    pub fn to_mode1(&self) -> Vec<i32> {
        let current_length = self.current.length as f64;
        let prev_length = self.prev.length as f64;

        let end = current_length
            + ms_to_ticks(self.next_overlap - self.next_pre_utterance, self.tempo);
        let next_start = match self.next.points.first() {
            Some(first) => current_length + ms_to_ticks(first.x, self.tempo),
            None => f64::INFINITY,
        };

        let mut current = CurveWalker::new(&self.current.points, self.tempo)
            .with_negative_tempo(self.prev_tempo)
            .with_vibrato(self.current.vibrato.as_ref(), self.current.length);
        let mut next = CurveWalker::new(&self.next.points, self.tempo)
            .with_vibrato(self.next.vibrato.as_ref(), self.next.length);
        let mut prev = CurveWalker::new(&self.prev.points, self.prev_tempo)
            .with_vibrato(self.prev.vibrato.as_ref(), self.prev.length);

        let mut samples = Vec::new();
        let mut tick = -ms_to_ticks(self.pre_utterance + self.start_point, self.prev_tempo);
        while tick < end {
            let mut pitch = current.advance(tick as i32);

            if tick >= next_start {
                let mut bleed = 0;
                if self.next.points.len() > 1 {
                    bleed = next.advance((tick - current_length) as i32);
                }
                // the next curve is relative to its own first point
                let baseline = self.next.points[0].y * 10.0;
                pitch += (bleed as f64 - baseline) as i32;
            }

            if tick <= 0.0 {
                pitch += prev.advance((tick + prev_length) as i32);
            }

            samples.push(pitch);
            tick += SAMPLE_STEP;
        }

        trim_trailing_zeros(&mut samples);
        samples
    }
}

/// Drop zeros from the end, but never below [`MIN_SAMPLES`] samples.
///
/// [`MIN_SAMPLES`]: super::MIN_SAMPLES
pub fn trim_trailing_zeros(samples: &mut Vec<i32>) {
    while samples.len() > MIN_SAMPLES && samples.last() == Some(&0) {
        samples.pop();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::note::JoinType;

    /// At tempo 125 one millisecond is exactly one tick.
    const TEMPO: f64 = 125.0;

    fn context(current: NoteCurve) -> NoteContext {
        NoteContext {
            tempo: TEMPO,
            prev_tempo: TEMPO,
            prev: NoteCurve::default(),
            current,
            next: NoteCurve::default(),
            pre_utterance: 0.0,
            start_point: 0.0,
            next_pre_utterance: 0.0,
            next_overlap: 0.0,
        }
    }

    fn rising_curve() -> NoteCurve {
        NoteCurve {
            points: vec![
                CurvePoint::new(0.0, -10.0),
                CurvePoint::with_join(100.0, 0.0, JoinType::Linear),
            ],
            vibrato: None,
            length: 200,
        }
    }

    #[test]
    fn samples_own_curve() {
        let samples = context(rising_curve()).to_mode1();
        let expected: Vec<i32> = (0..20).map(|i| -100 + 5 * i).collect();
        assert_eq!(samples, expected);
    }

    #[test]
    fn pre_utterance_holds_first_point() {
        let mut ctx = context(rising_curve());
        ctx.pre_utterance = 20.0;
        let samples = ctx.to_mode1();
        assert_eq!(samples.len(), 24);
        assert_eq!(&samples[..5], &[-100, -100, -100, -100, -100]);
        assert_eq!(samples[5], -95);
    }

    #[test]
    fn next_curve_bleeds_into_tail() {
        let mut ctx = context(NoteCurve {
            length: 200,
            ..NoteCurve::default()
        });
        ctx.next.points = vec![CurvePoint::new(-30.0, 10.0), CurvePoint::new(0.0, 0.0)];
        let samples = ctx.to_mode1();
        assert_eq!(samples.len(), 40);
        assert!(samples[..34].iter().all(|&s| s == 0));
        assert_eq!(samples[34], 0);
        assert_eq!(samples[37], -50);
        assert_eq!(samples[39], -94);
    }

    #[test]
    fn previous_curve_bleeds_into_head() {
        let mut ctx = context(NoteCurve {
            length: 200,
            ..NoteCurve::default()
        });
        ctx.pre_utterance = 20.0;
        ctx.prev = NoteCurve {
            points: vec![
                CurvePoint::new(0.0, 0.0),
                CurvePoint::with_join(200.0, 20.0, JoinType::Linear),
            ],
            vibrato: None,
            length: 200,
        };
        let samples = ctx.to_mode1();
        // the previous curve is sampled at its ticks 180 to 200
        assert_eq!(&samples[..5], &[180, 185, 190, 195, 200]);
        assert_eq!(samples.len(), MIN_SAMPLES);
    }

    #[test]
    fn flat_note_keeps_minimum_length() {
        let samples = context(NoteCurve::default()).to_mode1();
        assert_eq!(samples, vec![0; MIN_SAMPLES]);
    }

    #[test]
    fn trimming_stops_at_minimum() {
        let mut samples = vec![5, 3, 0, 0, 0, 0, 0, 0];
        trim_trailing_zeros(&mut samples);
        assert_eq!(samples, vec![5, 3, 0, 0, 0, 0, 0]);

        let mut samples = vec![1, 0, 0, 2, 0, 0, 0, 0, 0, 0];
        trim_trailing_zeros(&mut samples);
        assert_eq!(samples, vec![1, 0, 0, 2, 0, 0, 0]);

        let mut samples = vec![1, 2, 3, 4, 5, 6, 7, 8, 0];
        trim_trailing_zeros(&mut samples);
        assert_eq!(samples, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
