//! Launch module for einsum operations.
//!
//! Provides the high-level API: evaluate an expression in one call, or plan
//! once and execute the plan on many operand sets.

mod config;
mod executor;

pub use config::EinsumConfig;
pub use executor::{einsum, einsum_with_config, execute_plan, plan_einsum};
