//! Mark types and canonical mark sets
//!
//! Marks are non-structural annotations on text. A `MarkSet` keeps its marks
//! sorted and deduplicated so that equal sets compare equal regardless of the
//! order they were added in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of mark kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarkType {
    #[serde(rename = "strong")]
    Bold,
    #[serde(rename = "em")]
    Italic,
    #[serde(rename = "code")]
    Code,
}

impl MarkType {
    pub const ALL: [MarkType; 3] = [MarkType::Bold, MarkType::Italic, MarkType::Code];

    /// Name used in the serialized document
    pub fn name(self) -> &'static str {
        match self {
            MarkType::Bold => "strong",
            MarkType::Italic => "em",
            MarkType::Code => "code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        MarkType::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sorted, duplicate-free set of marks attached to an inline node
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkSet(Vec<MarkType>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn of(marks: &[MarkType]) -> Self {
        marks.iter().copied().collect()
    }

    pub fn contains(&self, mark: MarkType) -> bool {
        self.0.binary_search(&mark).is_ok()
    }

    /// Copy of this set with `mark` added
    pub fn with(&self, mark: MarkType) -> Self {
        let mut marks = self.clone();
        if let Err(idx) = marks.0.binary_search(&mark) {
            marks.0.insert(idx, mark);
        }
        marks
    }

    /// Copy of this set with `mark` removed
    pub fn without(&self, mark: MarkType) -> Self {
        let mut marks = self.clone();
        if let Ok(idx) = marks.0.binary_search(&mark) {
            marks.0.remove(idx);
        }
        marks
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MarkType> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<MarkType> for MarkSet {
    fn from_iter<I: IntoIterator<Item = MarkType>>(iter: I) -> Self {
        let mut marks: Vec<MarkType> = iter.into_iter().collect();
        marks.sort();
        marks.dedup();
        Self(marks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_set_is_order_independent() {
        let a = MarkSet::of(&[MarkType::Italic, MarkType::Bold]);
        let b = MarkSet::new().with(MarkType::Bold).with(MarkType::Italic);
        assert_eq!(a, b);
    }

    #[test]
    fn test_with_and_without() {
        let marks = MarkSet::of(&[MarkType::Bold]).with(MarkType::Bold);
        assert_eq!(marks.len(), 1);
        assert!(marks.without(MarkType::Bold).is_empty());
        assert!(!marks.without(MarkType::Bold).contains(MarkType::Bold));
    }

    #[test]
    fn test_names_round_trip() {
        for mark in MarkType::ALL {
            assert_eq!(MarkType::from_name(mark.name()), Some(mark));
        }
        assert_eq!(MarkType::from_name("underline"), None);
    }
}
