//! Extended-precision score values.
//!
//! Scores in late runs overflow any fixed-width number, so the wire format
//! uses an extended exponential form: zero or more leading `e` tier markers
//! (each one an extra order-of-magnitude escalation beyond plain exponent
//! notation), a coefficient, and an optional `e`-separated integer exponent.
//! `"ee2.5e12"` is two tiers, coefficient 2.5, exponent 12.
//!
//! Values are compared lexicographically over (tiers, exponent, coefficient),
//! most significant first. That is the protocol's ordering contract — it is
//! deliberately not plain floating-point comparison.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing a score literal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseScoreError {
    #[error("empty score literal")]
    Empty,
    #[error("invalid coefficient `{0}`")]
    InvalidCoefficient(String),
    #[error("invalid exponent `{0}`")]
    InvalidExponent(String),
    #[error("non-finite coefficient")]
    NonFinite,
}

/// Arithmetic error on score values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreArithmeticError {
    #[error("division by a zero coefficient")]
    DivisionByZero,
}

/// An arbitrary-tier exponential number.
///
/// The canonical string form round-trips through [`FromStr`]; `add`/`div`
/// keep whatever exponent basis the operands establish instead of
/// renormalizing, so identities like `x.add(zero) == x` hold exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendedScore {
    tiers: u32,
    coefficient: f64,
    exponent: i64,
}

impl ExtendedScore {
    pub fn new(tiers: u32, coefficient: f64, exponent: i64) -> Self {
        Self {
            tiers,
            coefficient,
            exponent,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0.0, 0)
    }

    pub fn one() -> Self {
        Self::new(0, 1.0, 0)
    }

    pub fn tiers(&self) -> u32 {
        self.tiers
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Whether the value compares below zero. Negative scores are never
    /// stored; callers treat this as a reset-to-zero signal.
    pub fn is_negative(&self) -> bool {
        *self < Self::zero()
    }

    /// Sum on a common basis.
    ///
    /// Equal tiers: align on the larger exponent and sum the scaled
    /// coefficients. Differing tiers: tiers denote repeated exponentiation,
    /// so no finite exponent shift can bridge the gap — the higher-tier
    /// operand dominates and the other is negligible.
    pub fn add(self, other: Self) -> Self {
        match self.tiers.cmp(&other.tiers) {
            Ordering::Greater => self,
            Ordering::Less => other,
            Ordering::Equal => {
                let (hi, lo) = if self.exponent >= other.exponent {
                    (self, other)
                } else {
                    (other, self)
                };
                let shift = (lo.exponent - hi.exponent).clamp(-400, 0) as i32;
                Self {
                    tiers: hi.tiers,
                    coefficient: hi.coefficient + lo.coefficient * 10f64.powi(shift),
                    exponent: hi.exponent,
                }
            }
        }
    }

    /// Componentwise division: tiers subtract (saturating at zero),
    /// exponents subtract, coefficients divide. Used to split a shared cost
    /// across N players and to apply score multipliers.
    pub fn div(self, other: Self) -> Result<Self, ScoreArithmeticError> {
        if other.coefficient == 0.0 {
            return Err(ScoreArithmeticError::DivisionByZero);
        }
        Ok(Self {
            tiers: self.tiers.saturating_sub(other.tiers),
            coefficient: self.coefficient / other.coefficient,
            exponent: self.exponent - other.exponent,
        })
    }
}

impl PartialOrd for ExtendedScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.tiers.cmp(&other.tiers) {
            Ordering::Equal => {}
            unequal => return Some(unequal),
        }
        match self.exponent.cmp(&other.exponent) {
            Ordering::Equal => {}
            unequal => return Some(unequal),
        }
        self.coefficient.partial_cmp(&other.coefficient)
    }
}

impl FromStr for ExtendedScore {
    type Err = ParseScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseScoreError::Empty);
        }

        let tiers = s.bytes().take_while(|b| *b == b'e').count();
        let rest = &s[tiers..];

        let (coefficient, exponent) = match rest.split_once('e') {
            Some((coeff, exp)) => {
                let exponent: i64 = exp
                    .parse()
                    .map_err(|_| ParseScoreError::InvalidExponent(exp.to_string()))?;
                (coeff, exponent)
            }
            None => (rest, 0),
        };
        let coefficient: f64 = coefficient
            .parse()
            .map_err(|_| ParseScoreError::InvalidCoefficient(coefficient.to_string()))?;
        if !coefficient.is_finite() {
            return Err(ParseScoreError::NonFinite);
        }

        Ok(Self {
            tiers: tiers as u32,
            coefficient,
            exponent,
        })
    }
}

impl fmt::Display for ExtendedScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.tiers {
            write!(f, "e")?;
        }
        write!(f, "{}", self.coefficient)?;
        if self.exponent != 0 {
            write!(f, "e{}", self.exponent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn score(s: &str) -> ExtendedScore {
        s.parse().unwrap()
    }

    #[test]
    fn parses_all_canonical_shapes() {
        assert_eq!(score("0"), ExtendedScore::new(0, 0.0, 0));
        assert_eq!(score("100"), ExtendedScore::new(0, 100.0, 0));
        assert_eq!(score("1.5e10"), ExtendedScore::new(0, 1.5, 10));
        assert_eq!(score("e3"), ExtendedScore::new(1, 3.0, 0));
        assert_eq!(score("ee2.5e12"), ExtendedScore::new(2, 2.5, 12));
        assert_eq!(score("2e-5"), ExtendedScore::new(0, 2.0, -5));
        assert_eq!(score("-40"), ExtendedScore::new(0, -40.0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<ExtendedScore>().is_err());
        assert!("abc".parse::<ExtendedScore>().is_err());
        assert!("1ex".parse::<ExtendedScore>().is_err());
        assert!("inf".parse::<ExtendedScore>().is_err());
    }

    #[test]
    fn string_form_round_trips() {
        for s in ["0", "100", "1.5", "1.5e10", "e3", "ee2.5e12", "7e-3", "-2.5"] {
            let value = score(s);
            assert_eq!(value.to_string(), s);
            assert_eq!(score(&value.to_string()), value);
        }
    }

    #[test]
    fn ordering_is_lexicographic_most_significant_first() {
        // Tiers beat exponent beats coefficient.
        assert!(score("e1") > score("9e300"));
        assert!(score("1e5") > score("9999e4"));
        assert!(score("200") > score("100"));
        // The quirk the contract accepts: exponent dominates even when the
        // plain numeric values would order the other way.
        assert!(score("1e3") > score("2000"));
    }

    #[test]
    fn ordering_is_a_strict_total_order_on_generated_triples() {
        let mut values = Vec::new();
        for tiers in 0..3u32 {
            for exponent in [-2i64, 0, 7] {
                for coefficient in [-1.5, 0.0, 2.0, 950.0] {
                    values.push(ExtendedScore::new(tiers, coefficient, exponent));
                }
            }
        }
        for a in &values {
            for b in &values {
                let forward = a.partial_cmp(b).unwrap();
                let backward = b.partial_cmp(a).unwrap();
                assert_eq!(forward, backward.reverse());
                assert_eq!(forward == Ordering::Equal, a == b);
                for c in &values {
                    if a <= b && b <= c {
                        assert!(a <= c, "transitivity broke at {a} {b} {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn add_zero_is_identity() {
        for s in ["0", "100", "1.5e10", "e3", "ee2.5e12", "7e-3"] {
            let value = score(s);
            assert_eq!(value.add(ExtendedScore::zero()), value);
        }
    }

    #[test]
    fn add_aligns_on_the_larger_exponent() {
        assert_eq!(score("1e3").add(score("500")), ExtendedScore::new(0, 1.5, 3));
        assert_eq!(score("500").add(score("1e3")), ExtendedScore::new(0, 1.5, 3));
        assert_eq!(score("100").add(score("50")), score("150"));
    }

    #[test]
    fn add_across_tiers_keeps_the_dominant_operand() {
        assert_eq!(score("e5").add(score("9e300")), score("e5"));
        assert_eq!(score("9e300").add(score("ee2")), score("ee2"));
    }

    #[test]
    fn ordering_is_preserved_by_nonnegative_addition() {
        let values = ["0", "50", "100", "1e3", "e2"];
        for a in values {
            for b in values {
                let sum = score(a).add(score(b));
                assert!(sum >= score(a), "{a} + {b} ordered below {a}");
            }
        }
    }

    #[test]
    fn div_by_one_is_identity() {
        for s in ["0", "100", "1.5e10", "e3"] {
            let value = score(s);
            assert_eq!(value.div(ExtendedScore::one()).unwrap(), value);
        }
    }

    #[test]
    fn div_splits_a_shared_cost() {
        let split = score("300").div(ExtendedScore::new(0, 3.0, 0)).unwrap();
        assert_eq!(split, score("100"));
        assert_eq!(
            score("ee6e4").div(ExtendedScore::new(0, 2.0, 4)).unwrap(),
            ExtendedScore::new(2, 3.0, 0)
        );
    }

    #[test]
    fn div_by_zero_coefficient_is_an_error() {
        assert_eq!(
            score("100").div(ExtendedScore::zero()),
            Err(ScoreArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn negative_values_compare_below_zero() {
        assert!(score("-5").is_negative());
        assert!(!score("0").is_negative());
        assert!(!score("100").is_negative());
    }
}
