//! Encoding pitch bend samples as resampler arguments.

use crate::fields::format_number;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Smallest and largest value representable by two alphabet characters.
const VALUE_MIN: i32 = -2048;
const VALUE_MAX: i32 = 2047;

/// How pitch bend samples are passed to the resampler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PitchEncoding {
    /// Two characters per sample with run-length compression, introduced by `!<tempo>`.
    Compact,
    /// One decimal argument per sample, the first one tagged with `Q<tempo>`.
    Legacy,
}

impl Default for PitchEncoding {
    fn default() -> Self {
        PitchEncoding::Compact
    }
}

/// Encode a single sample as two characters of 6 bits each.
/// Negative values are stored in 12 bit two's complement.
///
/// ```
/// use utau_synth::pitch::encode::encode_value;
///
/// assert_eq!(encode_value(0), "AA");
/// assert_eq!(encode_value(65), "BB");
/// assert_eq!(encode_value(-1), "//");
/// ```
pub fn encode_value(value: i32) -> String {
    let mut n = value.max(VALUE_MIN).min(VALUE_MAX);
    if n < 0 {
        n += 4096;
    }
    let high = ALPHABET[(n / 64) as usize] as char;
    let low = ALPHABET[(n % 64) as usize] as char;
    let mut encoded = String::with_capacity(2);
    encoded.push(high);
    encoded.push(low);
    encoded
}

/// Encode all samples, compressing runs.
///
/// A repeated value is written once and followed by `#n#`, where `n` is the
/// number of additional repetitions. A value occurring exactly twice is simply
/// written twice.
pub fn encode_compact(samples: &[i32]) -> String {
    let mut result = String::with_capacity(samples.len() * 2);
    let mut i = 0;
    while i < samples.len() {
        let value = samples[i];
        let run = samples[i..].iter().take_while(|&&s| s == value).count();
        result.push_str(&encode_value(value));
        match run - 1 {
            0 => {}
            1 => result.push_str(&encode_value(value)),
            repeats => {
                result.push('#');
                result.push_str(&repeats.to_string());
                result.push('#');
            }
        }
        i += run;
    }
    result
}

/// One decimal string per sample, the first one carrying the tempo.
/// An empty input still yields the tempo marker.
pub fn encode_legacy(samples: &[i32], tempo: f64) -> Vec<String> {
    let first = samples.first().copied().unwrap_or(0);
    let mut result = vec![format!("{}Q{}", first, format_number(tempo))];
    result.extend(samples.iter().skip(1).map(|s| s.to_string()));
    result
}

impl PitchEncoding {
    /// The trailing resampler arguments describing the pitch bend.
    pub fn pitch_params(self, samples: &[i32], tempo: f64) -> Vec<String> {
        match self {
            PitchEncoding::Compact => {
                vec![format!("!{}", format_number(tempo)), encode_compact(samples)]
            }
            PitchEncoding::Legacy => encode_legacy(samples, tempo),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn values_are_clamped() {
        assert_eq!(encode_value(2047), "f/");
        assert_eq!(encode_value(5000), "f/");
        assert_eq!(encode_value(-2048), "gA");
        assert_eq!(encode_value(-5000), "gA");
    }

    #[test]
    fn runs_are_compressed() {
        assert_eq!(encode_compact(&[]), "");
        assert_eq!(encode_compact(&[42]), "Aq");
        assert_eq!(encode_compact(&[42, 42]), "AqAq");
        assert_eq!(encode_compact(&[42, 42, 42]), "Aq#2#");
        assert_eq!(encode_compact(&[1, 42, 42, 42, 42, 0, 0]), "ABAq#3#AAAA");
        assert_eq!(encode_compact(&[0, 0, 0, 0, 0, 0, 0]), "AA#6#");
        // a run of three is the value followed by two repetitions
        assert_eq!(encode_compact(&[1, 42, 42, 42, 0, 5, 6]), "ABAq#2#AAAFAG");
    }

    #[test]
    fn encoding_is_deterministic() {
        let samples = [-100, -95, -95, -95, 3, 3, 3, 3, 0, 7];
        assert_eq!(encode_compact(&samples), encode_compact(&samples));
        assert_eq!(encode_compact(&samples), "+c+h#2#AD#3#AAAH");
    }

    #[test]
    fn pitch_params() {
        assert_eq!(
            PitchEncoding::Compact.pitch_params(&[0, 0, 0], 120.0),
            vec!["!120".to_string(), "AA#2#".to_string()]
        );
        assert_eq!(
            PitchEncoding::Legacy.pitch_params(&[5, -3, 0], 142.5),
            vec!["5Q142.5".to_string(), "-3".to_string(), "0".to_string()]
        );
        assert_eq!(
            PitchEncoding::Legacy.pitch_params(&[], 120.0),
            vec!["0Q120".to_string()]
        );
    }
}
