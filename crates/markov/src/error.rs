//! Error types for the drift-markov crate.

/// Error type for all fallible operations in the drift-markov crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkovError {
    /// Returned when a chain is constructed without any values.
    #[error("no values provided")]
    EmptyValues,

    /// Returned when the number of values differs from the matrix dimension.
    #[error("number of values ({values}) should match provided matrix size of {size}")]
    SizeMismatch {
        /// Number of values supplied.
        values: usize,
        /// Dimension of the transition matrix.
        size: usize,
    },

    /// Returned when an explicit initial state lies outside `[0, len)`.
    #[error("initial state {index} is out of bounds: must be in [0, {len})")]
    InitialStateOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of states.
        len: usize,
    },

    /// Returned when a transition table has no rows.
    #[error("transition table is empty")]
    EmptyMatrix,

    /// Returned when a row length differs from the number of rows.
    #[error("transition table is not square: row {row} has {len} columns, expected {size}")]
    NotSquare {
        /// Zero-based row index.
        row: usize,
        /// Length of that row.
        len: usize,
        /// Number of rows in the table.
        size: usize,
    },

    /// Returned when a weight is negative.
    #[error("negative weight at [{row}][{col}]: {value}")]
    NegativeWeight {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        col: usize,
        /// The offending weight.
        value: f64,
    },

    /// Returned when a weight is NaN or infinite.
    #[error("non-finite weight at [{row}][{col}]: {value}")]
    NonFiniteWeight {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        col: usize,
        /// The offending weight.
        value: f64,
    },

    /// Returned when a row is not a probability distribution.
    #[error("row {row} sums to {sum}, expected ~1.0")]
    RowSum {
        /// Zero-based row index.
        row: usize,
        /// Actual row sum.
        sum: f64,
    },

    /// Returned when a row is requested outside `[0, size)`.
    #[error("row index {index} is out of bounds for matrix of size {size}")]
    RowOutOfBounds {
        /// The requested row.
        index: usize,
        /// Matrix dimension.
        size: usize,
    },

    /// Returned when a configuration value is invalid.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

impl MarkovError {
    /// Returns `true` for errors describing a structurally malformed table.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyMatrix
                | Self::NotSquare { .. }
                | Self::NegativeWeight { .. }
                | Self::NonFiniteWeight { .. }
        )
    }
}
