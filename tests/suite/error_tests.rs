//! Rejection rules, checked through the public call surfaces.

use einsum_eval::call::{Argument, OptionValue, einsum_call};
use einsum_eval::{EinsumError, ErrorKind, NdArrayBackend, einsum};
use ndarray::ArrayD;
use pretty_assertions::assert_eq;

use crate::utils::{arange, scalar};

fn run(expr: &str, operands: &[&ArrayD<f64>]) -> EinsumError {
    einsum(&NdArrayBackend::new(), expr, operands).unwrap_err()
}

#[test]
fn test_no_operands() {
    let backend = NdArrayBackend::<f64>::new();
    assert_eq!(einsum(&backend, "", &[]).unwrap_err(), EinsumError::NoInputs);
    assert_eq!(einsum(&backend, "i", &[]).unwrap_err(), EinsumError::NoInputs);
    assert_eq!(
        einsum_call(&backend, &[], &[]).unwrap_err().kind(),
        ErrorKind::Value
    );
}

#[test]
fn test_empty_subscript_with_operand() {
    let err = run("", &[&scalar(0.0)]);
    assert_eq!(err, EinsumError::EmptySubscript);
    assert!(err.is_value_error());
}

#[test]
fn test_unknown_keyword_is_type_error() {
    let zero = scalar(0.0);
    let err = einsum_call(
        &NdArrayBackend::new(),
        &[Argument::Subscripts(""), Argument::Tensor(&zero)],
        &[("bad_arg", OptionValue::Int(0))],
    )
    .unwrap_err();
    assert_eq!(
        err,
        EinsumError::UnexpectedKeyword {
            name: "bad_arg".into()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_non_string_subscripts_is_type_error() {
    let a = arange(&[2]);
    let err = einsum_call(
        &NdArrayBackend::new(),
        &[Argument::Scalar(0.0), Argument::Tensor(&a)],
        &[],
    )
    .unwrap_err();
    assert_eq!(err, EinsumError::SubscriptNotString { found: "scalar" });
    assert!(err.is_type_error());
}

#[test]
fn test_scalar_operands_reach_validation() {
    let backend = NdArrayBackend::<f64>::new();
    let call = |args: &[Argument<'_, ArrayD<f64>, f64>]| {
        einsum_call(&backend, args, &[]).unwrap_err()
    };

    let err = call(&[
        Argument::Subscripts(""),
        Argument::Scalar(0.0),
        Argument::Scalar(0.0),
    ]);
    assert_eq!(err.kind(), ErrorKind::Value);

    let err = call(&[Argument::Subscripts(","), Argument::Scalar(0.0)]);
    assert_eq!(
        err,
        EinsumError::OperandCountMismatch {
            groups: 2,
            operands: 1
        }
    );
    assert_eq!(err.kind(), ErrorKind::Value);

    let err = call(&[Argument::Subscripts("i"), Argument::Scalar(0.0)]);
    assert!(matches!(err, EinsumError::TooManySubscripts { .. }));
    assert_eq!(err.kind(), ErrorKind::Value);
}

#[test]
fn test_group_count_mismatch() {
    let a = arange(&[2]);
    assert_eq!(
        run("i,i", &[&a]),
        EinsumError::OperandCountMismatch {
            groups: 2,
            operands: 1
        }
    );
    assert_eq!(
        run("i", &[&a, &a]),
        EinsumError::OperandCountMismatch {
            groups: 1,
            operands: 2
        }
    );
}

#[test]
fn test_too_many_subscripts() {
    let err = run("ij", &[&arange(&[3])]);
    assert!(matches!(
        err,
        EinsumError::TooManySubscripts {
            operand: 0,
            labels: 2,
            ndim: 1,
            ..
        }
    ));
    assert!(matches!(
        run("i", &[&scalar(1.0)]),
        EinsumError::TooManySubscripts { .. }
    ));
}

#[test]
fn test_too_few_subscripts() {
    let err = run("i->i", &[&arange(&[2, 2])]);
    assert!(matches!(
        err,
        EinsumError::TooFewSubscripts {
            labels: 1,
            ndim: 2,
            ..
        }
    ));
    assert!(err.is_value_error());
}

#[test]
fn test_invalid_characters() {
    let a = arange(&[2, 2]);
    for expr in ["i%", "$i", "i&", "i.", "i_"] {
        let err = run(expr, &[&a]);
        assert!(
            matches!(err, EinsumError::InvalidCharacter { .. }),
            "{}: {:?}",
            expr,
            err
        );
    }
}

#[test]
fn test_output_label_not_in_inputs() {
    // i->ij would broadcast into a new axis
    assert_eq!(
        run("i->ij", &[&arange(&[2])]),
        EinsumError::OutputLabelNotInInputs { label: 'j' }
    );
    assert_eq!(
        run("ij->ik", &[&arange(&[2, 2])]),
        EinsumError::OutputLabelNotInInputs { label: 'k' }
    );
}

#[test]
fn test_duplicate_output_label() {
    assert_eq!(
        run("ij->jij", &[&arange(&[2, 2])]),
        EinsumError::DuplicateOutputLabel { label: 'j' }
    );
    assert_eq!(
        run("ij->ii", &[&arange(&[2, 2])]),
        EinsumError::DuplicateOutputLabel { label: 'i' }
    );
}

#[test]
fn test_dimension_mismatch_across_operands() {
    let err = run("ij,jk", &[&arange(&[2, 3]), &arange(&[4, 2])]);
    assert_eq!(
        err,
        EinsumError::DimensionMismatch {
            label: 'j',
            expected: 3,
            got: 4
        }
    );
}

#[test]
fn test_dimension_mismatch_on_diagonal() {
    let err = run("ii", &[&arange(&[2, 3])]);
    assert_eq!(
        err,
        EinsumError::DimensionMismatch {
            label: 'i',
            expected: 2,
            got: 3
        }
    );
}

#[test]
fn test_no_broadcast_of_unit_dimension() {
    let err = run("i,i", &[&arange(&[1]), &arange(&[3])]);
    assert!(matches!(err, EinsumError::DimensionMismatch { label: 'i', .. }));
}

#[test]
fn test_malformed_arrows() {
    let a = arange(&[2, 2]);
    for expr in ["ij-ji", "ij>ji", "ij->->ji", "i->j->i", "ij- >ji"] {
        let err = run(expr, &[&a]);
        assert!(matches!(err, EinsumError::InvalidArrow { .. }), "{}: {:?}", expr, err);
        assert!(err.is_value_error());
    }
}

#[test]
fn test_parse_errors_precede_shape_errors() {
    // Both the character and the rank are wrong; the character is reported
    let err = run("i%j", &[&arange(&[2])]);
    assert!(matches!(err, EinsumError::InvalidCharacter { ch: '%', .. }));
}
