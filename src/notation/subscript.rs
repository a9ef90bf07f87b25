//! Subscript representation for einsum notation.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Inline capacity for label sequences; most operands have few axes.
pub(crate) const INLINE_LABELS: usize = 8;

/// A single axis label.
pub type Label = char;

/// Returns true if `c` may be used as an axis label.
#[inline]
pub fn is_label(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// The ordered labels of a single tensor.
///
/// For example, in `ij,jk->ik`, the subscripts are `ij`, `jk`, and `ik`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscript {
    labels: SmallVec<[Label; INLINE_LABELS]>,
}

impl Subscript {
    /// Creates an empty subscript (a rank-0 tensor).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a subscript from a sequence of labels.
    pub fn from_chars(chars: impl IntoIterator<Item = Label>) -> Self {
        Self {
            labels: chars.into_iter().collect(),
        }
    }

    /// Appends a label.
    pub fn push(&mut self, c: Label) {
        self.labels.push(c);
    }

    /// Number of labels, which is the rank the subscript describes.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        self.labels.iter().copied()
    }

    pub fn as_slice(&self) -> &[Label] {
        &self.labels
    }

    pub fn contains(&self, c: Label) -> bool {
        self.labels.contains(&c)
    }

    /// Counts occurrences of a label.
    pub fn count(&self, c: Label) -> usize {
        self.labels.iter().filter(|&&x| x == c).count()
    }

    /// Position of the first occurrence of a label.
    pub fn position(&self, c: Label) -> Option<usize> {
        self.labels.iter().position(|&x| x == c)
    }

    /// Returns true if some label occurs more than once.
    pub fn has_repeats(&self) -> bool {
        self.labels
            .iter()
            .enumerate()
            .any(|(i, c)| self.labels[..i].contains(c))
    }

    /// Labels with duplicates removed, keeping first occurrences in order.
    pub fn distinct(&self) -> Subscript {
        let mut out = Subscript::new();
        for c in self.iter() {
            if !out.contains(c) {
                out.push(c);
            }
        }
        out
    }

    /// Axis groups of labels that occur more than once, in first-occurrence order.
    ///
    /// `jii` yields `[('i', [1, 2])]`.
    pub fn repeated_groups(&self) -> Vec<(Label, Vec<usize>)> {
        let mut groups = Vec::new();
        for c in self.distinct().iter() {
            let axes: Vec<usize> = self
                .labels
                .iter()
                .enumerate()
                .filter(|&(_, &x)| x == c)
                .map(|(axis, _)| axis)
                .collect();
            if axes.len() > 1 {
                groups.push((c, axes));
            }
        }
        groups
    }

    /// Axis positions (in `self`) of each label of `target`.
    ///
    /// Returns `None` if `target` names a label missing from `self`.
    pub fn permutation_to(&self, target: &Subscript) -> Option<Vec<usize>> {
        target.iter().map(|c| self.position(c)).collect()
    }
}

impl fmt::Display for Subscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.labels {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl FromIterator<Label> for Subscript {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self::from_chars(iter)
    }
}

impl<'a> IntoIterator for &'a Subscript {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}
