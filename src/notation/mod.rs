//! Einsum notation parsing and representation.
//!
//! Supports the einsum grammar:
//! - Explicit output: `ij,jk->ik`
//! - Implicit output: `ij,jk` (implies `->ik`)
//! - Scalar operands: `,i->` (an empty group is a rank-0 operand)

mod notation;
mod output;
mod parser;
mod subscript;
pub mod validation;

pub use notation::EinsumNotation;
pub use output::infer_output;
pub use parser::parse_einsum;
pub use subscript::{Label, Subscript, is_label};
pub use validation::{LabelSizeTable, ValidationResult, validate_shapes};
