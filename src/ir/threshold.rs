//! Confidence threshold newtype.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoneScanError;

/// Minimum score a candidate detection must meet to be returned.
///
/// Always within `[0.0, 1.0]`. The threshold is supplied per request and is
/// never stored as entity state.
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConfidenceThreshold(f64);

impl ConfidenceThreshold {
    /// Lowest value reachable through the operator-facing interface.
    pub const OPERATOR_MIN: f64 = 0.1;
    /// Highest value reachable through the operator-facing interface.
    pub const OPERATOR_MAX: f64 = 1.0;
    /// Value preselected for operators.
    pub const DEFAULT: f64 = 0.4;

    /// Creates a threshold anywhere in the full `[0, 1]` range a detector accepts.
    pub fn new(value: f64) -> Result<Self, StoneScanError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(StoneScanError::InvalidThreshold {
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Creates a threshold restricted to the operator range `[0.1, 1.0]`.
    pub fn operator(value: f64) -> Result<Self, StoneScanError> {
        if !(Self::OPERATOR_MIN..=Self::OPERATOR_MAX).contains(&value) {
            return Err(StoneScanError::InvalidThreshold {
                value,
                min: Self::OPERATOR_MIN,
                max: Self::OPERATOR_MAX,
            });
        }
        Ok(Self(value))
    }

    /// Returns the threshold value.
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns true if `confidence` meets this threshold.
    #[inline]
    pub fn admits(&self, confidence: f64) -> bool {
        confidence >= self.0
    }
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f64> for ConfidenceThreshold {
    type Error = StoneScanError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfidenceThreshold> for f64 {
    fn from(threshold: ConfidenceThreshold) -> Self {
        threshold.0
    }
}

impl fmt::Debug for ConfidenceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfidenceThreshold({})", self.0)
    }
}

impl fmt::Display for ConfidenceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_range_accepts_bounds() {
        assert!(ConfidenceThreshold::new(0.0).is_ok());
        assert!(ConfidenceThreshold::new(1.0).is_ok());
        assert!(ConfidenceThreshold::new(0.05).is_ok());
    }

    #[test]
    fn test_full_range_rejects_outside_and_nan() {
        assert!(ConfidenceThreshold::new(-0.01).is_err());
        assert!(ConfidenceThreshold::new(1.01).is_err());
        assert!(ConfidenceThreshold::new(f64::NAN).is_err());
    }

    #[test]
    fn test_operator_range() {
        assert!(ConfidenceThreshold::operator(0.1).is_ok());
        assert!(ConfidenceThreshold::operator(1.0).is_ok());

        let err = ConfidenceThreshold::operator(0.05).unwrap_err();
        assert!(matches!(
            err,
            StoneScanError::InvalidThreshold { min, .. } if min == 0.1
        ));
    }

    #[test]
    fn test_default_is_operator_default() {
        assert_eq!(ConfidenceThreshold::default().value(), 0.4);
    }

    #[test]
    fn test_admits_is_inclusive() {
        let t = ConfidenceThreshold::new(0.4).unwrap();
        assert!(t.admits(0.4));
        assert!(t.admits(0.41));
        assert!(!t.admits(0.39));
    }

    #[test]
    fn test_deserialize_validates_range() {
        let ok: ConfidenceThreshold = serde_json::from_str("0.25").unwrap();
        assert_eq!(ok.value(), 0.25);
        assert!(serde_json::from_str::<ConfidenceThreshold>("1.5").is_err());
    }
}
