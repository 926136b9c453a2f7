//! Positional base-N codec over an arbitrary alphabet.
//!
//! A [`Universe`] is the ordered digit set: the character at index `i` has
//! digit value `i`. [`encode`] and [`decode`] convert between a non-negative
//! integer and its most-significant-first representation in that alphabet.
//!
//! Conventions:
//!
//! - `encode(0)` is the first character of the universe, never `""`.
//! - `decode` rejects empty input, characters outside the universe, and
//!   values that overflow `u64`. Shortcodes arrive on the redirect path from
//!   untrusted clients, so a bad digit must never silently decode.

use crate::error::CoreError;

/// The digit alphabet used for shortcodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    digits: Vec<char>,
}

impl Universe {
    /// Build a universe from its characters, in digit order.
    ///
    /// Requires at least two characters and no repeats.
    pub fn new(chars: &str) -> Result<Self, CoreError> {
        let digits: Vec<char> = chars.chars().collect();
        if digits.len() < 2 {
            return Err(CoreError::Malformed(format!(
                "universe needs at least 2 characters, got {}",
                digits.len()
            )));
        }
        for (i, c) in digits.iter().enumerate() {
            if digits[..i].contains(c) {
                return Err(CoreError::Malformed(format!(
                    "universe contains duplicate character {c:?}"
                )));
            }
        }
        Ok(Self { digits })
    }

    /// Number of digits, i.e. the numeric base.
    pub fn base(&self) -> u64 {
        self.digits.len() as u64
    }

    /// The zero digit.
    pub fn first(&self) -> char {
        self.digits[0]
    }

    /// The highest-value digit.
    pub fn last(&self) -> char {
        self.digits[self.digits.len() - 1]
    }

    fn digit_value(&self, c: char) -> Option<u64> {
        self.digits.iter().position(|d| *d == c).map(|i| i as u64)
    }

    fn digit_char(&self, value: u64) -> char {
        self.digits[value as usize]
    }

    /// The universe as a string, in digit order.
    pub fn as_string(&self) -> String {
        self.digits.iter().collect()
    }
}

/// Encode `value` in base-N using `universe` as the digit set.
pub fn encode(value: u64, universe: &Universe) -> String {
    let base = universe.base();
    if value == 0 {
        return universe.first().to_string();
    }

    let mut rest = value;
    let mut digits = Vec::new();
    while rest > 0 {
        digits.push(universe.digit_char(rest % base));
        rest /= base;
    }
    digits.iter().rev().collect()
}

/// Decode a base-N string back into its integer value.
pub fn decode(code: &str, universe: &Universe) -> Result<u64, CoreError> {
    if code.is_empty() {
        return Err(CoreError::Malformed("empty code".into()));
    }

    let base = universe.base();
    code.chars().try_fold(0u64, |acc, c| {
        let digit = universe.digit_value(c).ok_or_else(|| {
            CoreError::Malformed(format!("character {c:?} is not in the universe"))
        })?;
        acc.checked_mul(base)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| CoreError::Malformed(format!("code {code:?} overflows")))
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const ALPHANUMERIC: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

    #[test]
    fn encode_zero_is_first_character() {
        let u = Universe::new("xyz").unwrap();
        assert_eq!(encode(0, &u), "x");
        assert_eq!(decode("x", &u).unwrap(), 0);
    }

    #[test]
    fn encode_matches_decimal_for_decimal_universe() {
        let u = Universe::new("0123456789").unwrap();
        for v in [1u64, 9, 10, 99, 100, 12345, 9_876_543_210] {
            assert_eq!(encode(v, &u), v.to_string());
        }
    }

    #[test]
    fn encode_is_most_significant_first() {
        let u = Universe::new("ab").unwrap();
        assert_eq!(encode(1, &u), "b");
        assert_eq!(encode(2, &u), "ba");
        assert_eq!(encode(6, &u), "bba");
    }

    #[test]
    fn round_trip_over_small_universes() {
        for chars in ["ab", "abc", "0123456789abcdef", ALPHANUMERIC] {
            let u = Universe::new(chars).unwrap();
            for v in 0..5_000u64 {
                assert_eq!(decode(&encode(v, &u), &u).unwrap(), v, "universe {chars}");
            }
        }
    }

    #[test]
    fn round_trip_at_u64_max() {
        let u = Universe::new(ALPHANUMERIC).unwrap();
        assert_eq!(decode(&encode(u64::MAX, &u), &u).unwrap(), u64::MAX);
    }

    #[test]
    fn round_trip_with_multibyte_characters() {
        let u = Universe::new("αβγδ").unwrap();
        let code = encode(27, &u);
        assert_eq!(code, "βγδ");
        assert_eq!(decode(&code, &u).unwrap(), 27);
    }

    #[test]
    fn leading_zero_digits_do_not_change_value() {
        let u = Universe::new("0123456789").unwrap();
        assert_eq!(decode("0042", &u).unwrap(), 42);
    }

    #[test]
    fn decode_rejects_character_outside_universe() {
        let u = Universe::new("abc").unwrap();
        assert_matches!(decode("abz", &u), Err(CoreError::Malformed(_)));
    }

    #[test]
    fn decode_rejects_empty_code() {
        let u = Universe::new("abc").unwrap();
        assert_matches!(decode("", &u), Err(CoreError::Malformed(_)));
    }

    #[test]
    fn decode_rejects_overflow() {
        let u = Universe::new("0123456789").unwrap();
        assert_matches!(
            decode("99999999999999999999999", &u),
            Err(CoreError::Malformed(_))
        );
    }

    #[test]
    fn universe_rejects_single_character() {
        assert_matches!(Universe::new("a"), Err(CoreError::Malformed(_)));
        assert_matches!(Universe::new(""), Err(CoreError::Malformed(_)));
    }

    #[test]
    fn universe_rejects_duplicates() {
        assert_matches!(Universe::new("abca"), Err(CoreError::Malformed(_)));
    }

    #[test]
    fn universe_reports_base_and_bounds() {
        let u = Universe::new(ALPHANUMERIC).unwrap();
        assert_eq!(u.base(), 62);
        assert_eq!(u.first(), '0');
        assert_eq!(u.last(), 'Z');
        assert_eq!(u.as_string(), ALPHANUMERIC);
    }
}
