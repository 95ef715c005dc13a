//! Detection records and class-name lookup.
//!
//! [`RawDetection`] is what a detector hands back; [`Detection`] is the
//! normalized, presentable value the rest of the pipeline works with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bbox::BBoxXYXY;
use super::ids::ClassId;

/// One candidate detection exactly as a detector emitted it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Class identifier predicted by the model.
    pub class_id: ClassId,

    /// Model confidence score in `[0, 1]`.
    pub confidence: f64,

    /// Bounding box in the source image's pixel space.
    pub bbox: BBoxXYXY,
}

impl RawDetection {
    /// Creates a raw detection.
    pub fn new(class_id: impl Into<ClassId>, confidence: f64, bbox: BBoxXYXY) -> Self {
        Self {
            class_id: class_id.into(),
            confidence,
            bbox,
        }
    }
}

/// A normalized detection with a resolved class name.
///
/// Created once by [`normalize`](crate::pipeline::normalize) and never
/// mutated afterwards; fields are read through accessors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    class_id: ClassId,
    class_name: String,
    confidence: f64,
    bbox: BBoxXYXY,
}

impl Detection {
    pub(crate) fn new(
        class_id: ClassId,
        class_name: String,
        confidence: f64,
        bbox: BBoxXYXY,
    ) -> Self {
        Self {
            class_id,
            class_name,
            confidence,
            bbox,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn bbox(&self) -> &BBoxXYXY {
        &self.bbox
    }
}

/// Mapping from class id to human-readable class name.
///
/// May be empty: a detector without a name table still produces usable
/// detections, labelled `"Class {id}"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassNames(BTreeMap<ClassId, String>);

static EMPTY_CLASS_NAMES: ClassNames = ClassNames(BTreeMap::new());

impl ClassNames {
    /// Creates an empty lookup.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns a shared empty lookup.
    pub fn empty() -> &'static ClassNames {
        &EMPTY_CLASS_NAMES
    }

    /// Builds a lookup from names listed in class-id order.
    pub fn from_sequence<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            names
                .into_iter()
                .enumerate()
                .map(|(idx, name)| (ClassId(idx as u64), name.into()))
                .collect(),
        )
    }

    /// Returns the name for `id`, if one is known.
    pub fn get(&self, id: ClassId) -> Option<&str> {
        self.0.get(&id).map(String::as_str)
    }

    /// Returns the name for `id`, or the synthesized label `"Class {id}"`.
    pub fn resolve(&self, id: ClassId) -> String {
        match self.get(id) {
            Some(name) => name.to_string(),
            None => format!("Class {}", id),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.0.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(u64, S)> for ClassNames {
    fn from_iter<T: IntoIterator<Item = (u64, S)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, name)| (ClassId(id), name.into()))
                .collect(),
        )
    }
}
