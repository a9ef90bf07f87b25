//! # Einsum Eval
//!
//! Einstein summation over N-dimensional arrays.
//!
//! An expression such as `"ij,jk->ik"` names the axes of each operand with
//! single-letter labels. Evaluation runs in fixed stages:
//!
//! 1. [`notation::parse_einsum`] tokenizes the subscripts,
//! 2. [`notation::validate_shapes`] checks them against operand shapes and
//!    infers the output in implicit mode,
//! 3. [`optimization::create_plan`] lowers the expression into diagonal,
//!    reduction, pairwise contraction and permutation steps,
//! 4. the executor runs the plan through a [`TensorBackend`].
//!
//! ## Features
//!
//! - Explicit (`ij->ji`) and implicit (`ij,jk`) output, scalar operands (`,i->`)
//! - Repeated labels within an operand (`ii->i`, `ijij->ij`)
//! - Contraction ordering: left to right, greedy, or exact dynamic programming
//! - Parallel evaluation of independent contractions (`parallel` feature)
//! - Host backend over `ndarray` for any `LinalgScalar` element type
//!
//! ## Example
//!
//! ```
//! use einsum_eval::{NdArrayBackend, einsum};
//! use ndarray::array;
//!
//! let backend = NdArrayBackend::new();
//! let a = array![[0.0, 1.0], [2.0, 3.0]].into_dyn();
//!
//! // Trace
//! let t = einsum(&backend, "ii", &[&a]).unwrap();
//! assert_eq!(t[[]], 3.0);
//!
//! // Transpose
//! let at = einsum(&backend, "ji", &[&a]).unwrap();
//! assert_eq!(at, array![[0.0, 2.0], [1.0, 3.0]].into_dyn());
//! ```

pub mod backend;
pub mod call;
pub mod error;
pub mod launch;
pub mod notation;
pub mod optimization;

pub use backend::{ContractDims, NdArrayBackend, TensorBackend};
pub use error::{EinsumError, EinsumResult, ErrorKind};
pub use launch::{EinsumConfig, einsum, einsum_with_config, execute_plan, plan_einsum};
pub use notation::{EinsumNotation, Subscript, parse_einsum};
pub use optimization::{ContractionStrategy, CostModel, ExecutionPlan, ExecutionStep};
