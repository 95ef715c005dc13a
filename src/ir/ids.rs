//! Newtype ID for detector class identifiers.
//!
//! Detectors emit class ids as non-negative integers; wrapping them keeps a
//! class id from being confused with a detection index or a pixel value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A class identifier as emitted by a detector.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u64);

impl ClassId {
    /// Creates a new ClassId.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ClassId {
    fn from(id: u64) -> Self {
        ClassId::new(id)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
