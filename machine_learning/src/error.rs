use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    /// Two things that must agree in size don't.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// Training was requested over a partition without samples.
    EmptyPartition,
    /// A sample doesn't fit the dataset it's being added to.
    InvalidSample { index: usize, reason: String },
    /// An argument is invalid for semantic reasons.
    InvalidInput(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            MlErr::EmptyPartition => f.write_str("cannot train over an empty partition"),
            MlErr::InvalidSample { index, reason } => write!(f, "invalid sample {index}: {reason}"),
            MlErr::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl Error for MlErr {}
