//! Implicit output inference.

use std::collections::BTreeMap;

use super::notation::EinsumNotation;
use super::subscript::{Label, Subscript};

/// Infers the output subscript when no arrow was given.
///
/// Labels that occur exactly once across all inputs (repeats inside one
/// operand count) are kept, in ascending character order. Every other label
/// is summed away. The result does not depend on operand order.
pub fn infer_output(notation: &EinsumNotation) -> Subscript {
    let mut counts: BTreeMap<Label, usize> = BTreeMap::new();
    for input in notation.inputs() {
        for c in input.iter() {
            *counts.entry(c).or_insert(0) += 1;
        }
    }

    // BTreeMap iterates in ascending key order
    counts
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(c, _)| c)
        .collect()
}
