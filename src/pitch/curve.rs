//! Interpolation between two control points of a pitch curve.
//!
//! All evaluators take the segment `(x1, y1)` to `(x2, y2)` and the position `x`,
//! and return `y1` for a degenerate segment where `x1 == x2`.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::note::JoinType;

/// Cosine ease on both ends.
pub fn cosine(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x1 == x2 {
        return y1;
    }
    (y1 - y2) / 2.0 * (PI * (x - x1) / (x2 - x1)).cos() + (y1 + y2) / 2.0
}

pub fn linear(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x1 == x2 {
        return y1;
    }
    (y2 - y1) / (x2 - x1) * (x - x1) + y1
}

/// Quarter cosine that settles into `y2`.
pub fn ease_in(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x1 == x2 {
        return y1;
    }
    (y2 - y1) * (FRAC_PI_2 / (x2 - x1) * (x - x2)).cos() + y1
}

/// Quarter cosine that leaves `y1` flat.
pub fn ease_out(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x1 == x2 {
        return y1;
    }
    (y1 - y2) * (FRAC_PI_2 / (x2 - x1) * (x - x1)).cos() + y2
}

impl JoinType {
    /// Evaluate the segment shape at `x`.
    pub fn interpolate(self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
        match self {
            JoinType::Default => cosine(x1, y1, x2, y2, x),
            JoinType::Linear => linear(x1, y1, x2, y2, x),
            JoinType::EaseIn => ease_in(x1, y1, x2, y2, x),
            JoinType::EaseOut => ease_out(x1, y1, x2, y2, x),
        }
    }

    /// Evaluate the segment shape at `x`, truncated to whole cents.
    pub fn sample(self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> i32 {
        self.interpolate(x1, y1, x2, y2, x) as i32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const JOINS: [JoinType; 4] = [
        JoinType::Default,
        JoinType::Linear,
        JoinType::EaseIn,
        JoinType::EaseOut,
    ];

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn segments_hit_both_endpoints() {
        let segments = [
            (0.0, 0.0, 100.0, 50.0),
            (-48.0, -200.0, 0.0, 0.0),
            (10.0, 30.0, 11.0, -30.0),
            (0.0, 5.0, 1000.0, 5.0),
        ];
        for join in JOINS.iter() {
            for &(x1, y1, x2, y2) in segments.iter() {
                assert_close(join.interpolate(x1, y1, x2, y2, x1), y1);
                assert_close(join.interpolate(x1, y1, x2, y2, x2), y2);
            }
        }
    }

    #[test]
    fn degenerate_segment_holds_left_value() {
        for join in JOINS.iter() {
            assert_eq!(join.interpolate(10.0, 7.0, 10.0, -3.0, 10.0), 7.0);
            assert_eq!(join.interpolate(10.0, 7.0, 10.0, -3.0, 50.0), 7.0);
        }
    }

    #[test]
    fn midpoints() {
        assert_close(cosine(0.0, 0.0, 100.0, 100.0, 50.0), 50.0);
        assert_close(linear(0.0, 0.0, 100.0, 100.0, 25.0), 25.0);
        // the ease in shape has covered most of the distance halfway through
        assert!(ease_in(0.0, 0.0, 100.0, 100.0, 50.0) > 70.0);
        // the ease out shape has barely moved halfway through
        assert!(ease_out(0.0, 0.0, 100.0, 100.0, 50.0) < 30.0);
    }

    #[test]
    fn samples_truncate_toward_zero() {
        assert_eq!(JoinType::Linear.sample(0.0, 0.0, 3.0, 10.0, 1.0), 3);
        assert_eq!(JoinType::Linear.sample(0.0, 0.0, 3.0, -10.0, 1.0), -3);
    }
}
