//! Error types for einsum operations.

use std::fmt;

/// Broad classification of an [`EinsumError`].
///
/// `Type` covers requests whose arguments have the wrong kind (a subscript
/// that is not text, an unknown keyword). Everything else is a `Value` error:
/// a well-typed request that is structurally or dimensionally invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Value,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Type => write!(f, "type error"),
            ErrorKind::Value => write!(f, "value error"),
        }
    }
}

/// Errors that can occur during einsum parsing, validation and execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EinsumError {
    /// No operands were supplied.
    #[error("at least one operand is required")]
    NoInputs,

    /// Empty subscript string while operands were supplied.
    #[error("empty subscript string not allowed")]
    EmptySubscript,

    /// The subscript argument is not a string.
    #[error("subscripts must be a string, got {found}")]
    SubscriptNotString { found: &'static str },

    /// An operand position holds something other than an array.
    #[error("operand {position} must be an array, got {found}")]
    OperandNotArray { position: usize, found: &'static str },

    /// A keyword option outside the recognized set.
    #[error("einsum() got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { name: String },

    /// A recognized keyword option with an unusable value.
    #[error("invalid value for option '{name}': {message}")]
    InvalidOption { name: String, message: String },

    /// Comma-separated group count differs from the operand count.
    #[error("subscript has {groups} operand group(s) but {operands} operand(s) were supplied")]
    OperandCountMismatch { groups: usize, operands: usize },

    /// Character that is neither a label, a separator, the arrow, nor whitespace.
    #[error("invalid subscript character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    /// Malformed `->` token.
    #[error("invalid '->' in subscript: {message}")]
    InvalidArrow { message: String },

    /// More labels than the operand has dimensions.
    #[error("too many subscripts '{subscript}' for operand {operand}: {labels} labels, {ndim} dimensions")]
    TooManySubscripts {
        operand: usize,
        subscript: String,
        labels: usize,
        ndim: usize,
    },

    /// Fewer labels than the operand has dimensions.
    #[error(
        "operand {operand} has {ndim} dimensions but subscript '{subscript}' names only {labels}; \
         broadcasting to new dimensions must be requested explicitly"
    )]
    TooFewSubscripts {
        operand: usize,
        subscript: String,
        labels: usize,
        ndim: usize,
    },

    /// Output label not present in any input.
    #[error("output subscript '{label}' does not appear in any input")]
    OutputLabelNotInInputs { label: char },

    /// Output label named more than once.
    #[error("output subscript '{label}' appears more than once")]
    DuplicateOutputLabel { label: char },

    /// Sizes bound to the same label disagree.
    #[error("dimension mismatch for subscript '{label}': expected {expected}, got {got}")]
    DimensionMismatch {
        label: char,
        expected: usize,
        got: usize,
    },

    /// Operands handed to a prepared plan differ from the shapes it was built for.
    #[error("operand {operand} has shape {got:?} but the plan was built for {expected:?}")]
    PlanShapeMismatch {
        operand: usize,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// The array backend rejected a primitive.
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl EinsumError {
    pub fn arrow(message: impl Into<String>) -> Self {
        Self::InvalidArrow {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn option(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns whether this is a type error or a value error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SubscriptNotString { .. }
            | Self::OperandNotArray { .. }
            | Self::UnexpectedKeyword { .. } => ErrorKind::Type,
            _ => ErrorKind::Value,
        }
    }

    #[inline]
    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    #[inline]
    pub fn is_value_error(&self) -> bool {
        self.kind() == ErrorKind::Value
    }
}

/// Result type for einsum operations.
pub type EinsumResult<T> = Result<T, EinsumError>;
