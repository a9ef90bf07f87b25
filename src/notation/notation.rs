//! Complete einsum notation representation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::output::infer_output;
use super::subscript::{Label, Subscript};

/// A parsed einsum expression.
///
/// Holds one subscript per input operand, the explicit output subscript if
/// an arrow was given, and the `(operand, axis)` occurrences of every label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EinsumNotation {
    /// Input tensor subscripts.
    inputs: Vec<Subscript>,
    /// Explicit output subscript, `None` in implicit mode.
    output: Option<Subscript>,
    /// Every occurrence of each label across the inputs.
    occurrences: BTreeMap<Label, Vec<(usize, usize)>>,
}

impl EinsumNotation {
    /// Creates a notation from parsed components.
    pub fn new(inputs: Vec<Subscript>, output: Option<Subscript>) -> Self {
        let mut occurrences: BTreeMap<Label, Vec<(usize, usize)>> = BTreeMap::new();
        for (operand, input) in inputs.iter().enumerate() {
            for (axis, c) in input.iter().enumerate() {
                occurrences.entry(c).or_default().push((operand, axis));
            }
        }

        Self {
            inputs,
            output,
            occurrences,
        }
    }

    /// Returns the input subscripts.
    #[inline]
    pub fn inputs(&self) -> &[Subscript] {
        &self.inputs
    }

    /// Returns the explicit output subscript, if one was given.
    #[inline]
    pub fn explicit_output(&self) -> Option<&Subscript> {
        self.output.as_ref()
    }

    /// Returns true if the output must be inferred.
    #[inline]
    pub fn is_implicit(&self) -> bool {
        self.output.is_none()
    }

    /// Returns the output subscript, inferring it in implicit mode.
    pub fn output(&self) -> Subscript {
        match &self.output {
            Some(output) => output.clone(),
            None => infer_output(self),
        }
    }

    /// Returns the number of input tensors.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Returns true if this is a unary operation (single input).
    #[inline]
    pub fn is_unary(&self) -> bool {
        self.inputs.len() == 1
    }

    /// All `(operand, axis)` positions bound to a label.
    pub fn occurrences(&self, c: Label) -> &[(usize, usize)] {
        self.occurrences.get(&c).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every label used by the inputs, in ascending order.
    pub fn input_labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.occurrences.keys().copied()
    }

    /// Counts total occurrences of a label across all inputs.
    pub fn count_in_inputs(&self, c: Label) -> usize {
        self.occurrences(c).len()
    }

    /// Returns which inputs contain a given label.
    pub fn inputs_containing(&self, c: Label) -> Vec<usize> {
        let operands: BTreeSet<usize> = self.occurrences(c).iter().map(|&(op, _)| op).collect();
        operands.into_iter().collect()
    }

    /// Labels of the inputs that do not survive into `output`.
    pub fn summed_labels(&self, output: &Subscript) -> BTreeSet<Label> {
        self.input_labels().filter(|&c| !output.contains(c)).collect()
    }
}

impl fmt::Display for EinsumNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", input)?;
        }
        if let Some(output) = &self.output {
            write!(f, "->{}", output)?;
        }
        Ok(())
    }
}
