//! Validation of einsum notation against operand shapes.

use hashbrown::HashMap;

use super::notation::EinsumNotation;
use super::subscript::{Label, Subscript};
use crate::error::{EinsumError, EinsumResult};

/// Label to dimension size bindings, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSizeTable {
    sizes: HashMap<Label, usize>,
    order: Vec<Label>,
}

impl LabelSizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `label` to `size`, or checks it against an earlier binding.
    pub fn bind(&mut self, label: Label, size: usize) -> EinsumResult<()> {
        match self.sizes.get(&label) {
            Some(&expected) if expected != size => Err(EinsumError::DimensionMismatch {
                label,
                expected,
                got: size,
            }),
            Some(_) => Ok(()),
            None => {
                self.sizes.insert(label, size);
                self.order.push(label);
                Ok(())
            }
        }
    }

    #[inline]
    pub fn get(&self, label: Label) -> Option<usize> {
        self.sizes.get(&label).copied()
    }

    pub fn contains(&self, label: Label) -> bool {
        self.sizes.contains_key(&label)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bindings in the order labels were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (Label, usize)> + '_ {
        self.order.iter().map(|&c| (c, self.sizes[&c]))
    }

    /// Shape of a tensor carrying `subscript`; unbound labels count as 1.
    pub fn shape_of(&self, subscript: &Subscript) -> Vec<usize> {
        subscript
            .iter()
            .map(|c| self.get(c).unwrap_or(1))
            .collect()
    }

    /// Number of elements of a tensor carrying `labels`.
    pub fn volume(&self, labels: impl IntoIterator<Item = Label>) -> u64 {
        labels
            .into_iter()
            .map(|c| self.get(c).unwrap_or(1) as u64)
            .fold(1u64, u64::saturating_mul)
    }
}

/// Result of shape validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Mapping from labels to dimension sizes.
    pub sizes: LabelSizeTable,
    /// Explicit or inferred output subscript.
    pub output: Subscript,
    /// Computed output shape.
    pub output_shape: Vec<usize>,
    /// Sizes of the summed-away labels.
    pub contracted_shape: Vec<usize>,
}

impl ValidationResult {
    /// FLOPs of a naive single-loop evaluation: output elements times
    /// summed elements times two (multiply and add).
    pub fn compute_flops(&self) -> u64 {
        elements(&self.output_shape)
            .saturating_mul(elements(&self.contracted_shape))
            .saturating_mul(2)
    }

    /// Computes the memory footprint in elements.
    pub fn compute_memory_elements(&self, input_shapes: &[&[usize]]) -> u64 {
        input_shapes
            .iter()
            .map(|&shape| elements(shape))
            .fold(elements(&self.output_shape), u64::saturating_add)
    }
}

fn elements(shape: &[usize]) -> u64 {
    shape
        .iter()
        .map(|&d| d as u64)
        .fold(1u64, u64::saturating_mul)
}

/// Validates the notation against operand shapes.
///
/// Inputs are scanned left to right, then the output. The first violation
/// found is returned:
/// - label count must equal operand rank,
/// - every occurrence of a label must bind the same size,
/// - output labels must occur in some input and must not repeat.
pub fn validate_shapes(
    notation: &EinsumNotation,
    shapes: &[&[usize]],
) -> EinsumResult<ValidationResult> {
    if shapes.len() != notation.num_inputs() {
        return Err(EinsumError::OperandCountMismatch {
            groups: notation.num_inputs(),
            operands: shapes.len(),
        });
    }

    let sizes = build_size_table(notation, shapes)?;

    let output = match notation.explicit_output() {
        Some(output) => {
            validate_output(notation, output)?;
            output.clone()
        }
        None => notation.output(),
    };

    let output_shape = sizes.shape_of(&output);
    let contracted_shape: Vec<usize> = notation
        .summed_labels(&output)
        .into_iter()
        .filter_map(|c| sizes.get(c))
        .collect();

    Ok(ValidationResult {
        sizes,
        output,
        output_shape,
        contracted_shape,
    })
}

/// Checks ranks and builds the size table, operand by operand.
fn build_size_table(
    notation: &EinsumNotation,
    shapes: &[&[usize]],
) -> EinsumResult<LabelSizeTable> {
    let mut sizes = LabelSizeTable::new();

    for (operand, (input, shape)) in notation.inputs().iter().zip(shapes.iter()).enumerate() {
        if input.len() > shape.len() {
            return Err(EinsumError::TooManySubscripts {
                operand,
                subscript: input.to_string(),
                labels: input.len(),
                ndim: shape.len(),
            });
        }
        if input.len() < shape.len() {
            return Err(EinsumError::TooFewSubscripts {
                operand,
                subscript: input.to_string(),
                labels: input.len(),
                ndim: shape.len(),
            });
        }

        for (c, &dim) in input.iter().zip(shape.iter()) {
            sizes.bind(c, dim)?;
        }
    }

    Ok(sizes)
}

/// Checks an explicit output subscript, label by label.
fn validate_output(notation: &EinsumNotation, output: &Subscript) -> EinsumResult<()> {
    for (i, c) in output.iter().enumerate() {
        if notation.count_in_inputs(c) == 0 {
            return Err(EinsumError::OutputLabelNotInInputs { label: c });
        }
        if output.as_slice()[..i].contains(&c) {
            return Err(EinsumError::DuplicateOutputLabel { label: c });
        }
    }
    Ok(())
}
