//! Einsum notation parser.
//!
//! Parses strings like "ij,jk->ik" into a structured [`EinsumNotation`].

use super::notation::EinsumNotation;
use super::subscript::{Subscript, is_label};
use crate::error::{EinsumError, EinsumResult};

/// Parses an einsum subscript string for `num_operands` operands.
///
/// # Grammar
///
/// ```text
/// einsum      ::= inputs '->' output | inputs
/// inputs      ::= subscript (',' subscript)*
/// output      ::= subscript
/// subscript   ::= label*
/// label       ::= [a-zA-Z]
/// ```
///
/// Whitespace is ignored everywhere. An empty input group describes a
/// rank-0 operand. Errors are reported for the first violation found
/// scanning left to right; the group count is checked after the scan.
///
/// # Examples
///
/// ```
/// use einsum_eval::notation::parse_einsum;
///
/// let notation = parse_einsum("ij,jk->ik", 2).unwrap();
/// assert_eq!(notation.num_inputs(), 2);
/// assert_eq!(notation.output().to_string(), "ik");
///
/// let implicit = parse_einsum("ij,jk", 2).unwrap();
/// assert!(implicit.is_implicit());
/// ```
pub fn parse_einsum(notation: &str, num_operands: usize) -> EinsumResult<EinsumNotation> {
    if num_operands == 0 {
        return Err(EinsumError::NoInputs);
    }
    if notation.trim().is_empty() {
        return Err(EinsumError::EmptySubscript);
    }

    let mut inputs: Vec<Subscript> = Vec::with_capacity(num_operands);
    let mut current = Subscript::new();
    let mut output: Option<Subscript> = None;

    let mut chars = notation.char_indices().peekable();
    while let Some((position, c)) = chars.next() {
        match c {
            '-' => {
                if chars.next_if(|&(_, next)| next == '>').is_none() {
                    return Err(EinsumError::arrow(format!(
                        "'-' at position {} must be followed by '>'",
                        position
                    )));
                }
                if output.is_some() {
                    return Err(EinsumError::arrow(format!(
                        "second '->' at position {}",
                        position
                    )));
                }
                inputs.push(std::mem::take(&mut current));
                output = Some(Subscript::new());
            }
            '>' => {
                return Err(EinsumError::arrow(format!(
                    "'>' at position {} must be preceded by '-'",
                    position
                )));
            }
            ',' if output.is_none() => {
                inputs.push(std::mem::take(&mut current));
            }
            c if c.is_whitespace() => continue,
            c if is_label(c) => match output.as_mut() {
                Some(out) => out.push(c),
                None => current.push(c),
            },
            _ => return Err(EinsumError::InvalidCharacter { ch: c, position }),
        }
    }

    if output.is_none() {
        inputs.push(current);
    }

    if inputs.len() != num_operands {
        return Err(EinsumError::OperandCountMismatch {
            groups: inputs.len(),
            operands: num_operands,
        });
    }

    Ok(EinsumNotation::new(inputs, output))
}
