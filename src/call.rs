//! Dynamically typed call surface.
//!
//! Mirrors a variadic `einsum(subscripts, *operands, **options)` call where
//! argument kinds are only known at run time, as when bridging from a
//! scripting layer. Plain numbers become rank-0 operands. Other argument
//! kind problems surface as type errors
//! ([`ErrorKind::Type`](crate::error::ErrorKind)); everything else is
//! delegated to [`einsum_with_config`].

use std::fmt;

use crate::backend::TensorBackend;
use crate::error::{EinsumError, EinsumResult};
use crate::launch::{EinsumConfig, einsum_with_config};
use crate::optimization::ContractionStrategy;

/// One positional argument.
#[derive(Debug)]
pub enum Argument<'a, T, E> {
    Subscripts(&'a str),
    Tensor(&'a T),
    /// A single number, evaluated as a rank-0 tensor.
    Scalar(E),
    /// Any other value; carries the name of its type for messages.
    Other(&'static str),
}

impl<T, E> Argument<'_, T, E> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Argument::Subscripts(_) => "str",
            Argument::Tensor(_) => "array",
            Argument::Scalar(_) => "scalar",
            Argument::Other(name) => *name,
        }
    }
}

impl<T, E: Copy> Clone for Argument<'_, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E: Copy> Copy for Argument<'_, T, E> {}

/// Value of a keyword option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue<'a> {
    Bool(bool),
    Str(&'a str),
    Int(i64),
}

impl fmt::Display for OptionValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Str(s) => write!(f, "'{}'", s),
            OptionValue::Int(i) => write!(f, "{}", i),
        }
    }
}

/// Builds a config from keyword options.
///
/// Recognized keywords:
/// - `optimize`: `false` contracts left to right, `true` greedily; a string
///   names a [`ContractionStrategy`].
/// - `parallel`: bool.
pub fn parse_options(options: &[(&str, OptionValue<'_>)]) -> EinsumResult<EinsumConfig> {
    let mut config = EinsumConfig::default();
    for &(name, value) in options {
        match (name, value) {
            ("optimize", OptionValue::Bool(false)) => {
                config.strategy = ContractionStrategy::LeftToRight;
            }
            ("optimize", OptionValue::Bool(true)) => {
                config.strategy = ContractionStrategy::Greedy;
            }
            ("optimize", OptionValue::Str(s)) => {
                config.strategy = ContractionStrategy::from_name(s).ok_or_else(|| {
                    EinsumError::option(
                        name,
                        format!(
                            "unknown strategy {}; expected one of 'left_to_right', 'greedy', 'optimal', 'auto'",
                            value
                        ),
                    )
                })?;
            }
            ("optimize", _) => {
                return Err(EinsumError::option(
                    name,
                    format!("expected a bool or a strategy name, got {}", value),
                ));
            }
            ("parallel", OptionValue::Bool(b)) => config.parallel = b,
            ("parallel", _) => {
                return Err(EinsumError::option(
                    name,
                    format!("expected a bool, got {}", value),
                ));
            }
            _ => {
                return Err(EinsumError::UnexpectedKeyword {
                    name: name.to_string(),
                });
            }
        }
    }
    Ok(config)
}

/// Evaluates `einsum(args[0], *args[1..], **options)`.
///
/// Checks run in call order: an empty call, then the keyword options, then
/// the kind of every positional argument, then the expression itself.
///
/// ```
/// use einsum_eval::call::{Argument, OptionValue, einsum_call};
/// use einsum_eval::NdArrayBackend;
/// use ndarray::{ArrayD, array};
///
/// let backend = NdArrayBackend::<f64>::new();
/// let err = einsum_call(
///     &backend,
///     &[Argument::Subscripts(""), Argument::Scalar(0.0)],
///     &[("bad_arg", OptionValue::Int(0))],
/// )
/// .unwrap_err();
/// assert!(err.is_type_error());
///
/// // Without the keyword the scalar reaches validation
/// let err = einsum_call(
///     &backend,
///     &[Argument::Subscripts(""), Argument::Scalar(0.0)],
///     &[],
/// )
/// .unwrap_err();
/// assert!(err.is_value_error());
///
/// let v = array![1.0, 2.0, 3.0].into_dyn();
/// let s: ArrayD<f64> = einsum_call(
///     &backend,
///     &[Argument::Subscripts("i->"), Argument::Tensor(&v)],
///     &[],
/// )
/// .unwrap();
/// assert_eq!(s[[]], 6.0);
/// ```
pub fn einsum_call<B: TensorBackend>(
    backend: &B,
    args: &[Argument<'_, B::Tensor, B::Elem>],
    options: &[(&str, OptionValue<'_>)],
) -> EinsumResult<B::Tensor> {
    let Some((first, rest)) = args.split_first() else {
        return Err(EinsumError::NoInputs);
    };
    let config = parse_options(options)?;

    let subscripts = match first {
        Argument::Subscripts(s) => *s,
        other => {
            return Err(EinsumError::SubscriptNotString {
                found: other.type_name(),
            });
        }
    };

    let scalars: Vec<Option<B::Tensor>> = rest
        .iter()
        .map(|arg| match arg {
            Argument::Scalar(value) => Some(backend.scalar(*value)),
            _ => None,
        })
        .collect();
    let operands = rest
        .iter()
        .zip(&scalars)
        .enumerate()
        .map(|(i, (arg, scalar))| match (arg, scalar) {
            (Argument::Tensor(t), _) => Ok(*t),
            (_, Some(t)) => Ok(t),
            (other, None) => Err(EinsumError::OperandNotArray {
                position: i,
                found: other.type_name(),
            }),
        })
        .collect::<EinsumResult<Vec<_>>>()?;

    einsum_with_config(backend, subscripts, &operands, &config)
}
