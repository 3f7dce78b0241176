//! Configuration for matrix validation and chain construction.

use crate::error::MarkovError;

/// Default row-sum tolerance for [`RowPolicy::Reject`].
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Exclusive upper bound on a [`RowPolicy::Reject`] tolerance.
pub const MAX_TOLERANCE: f64 = 0.5;

/// Specifies how a row whose weights do not sum to 1 is treated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowPolicy {
    /// Reject any row whose sum differs from 1.0 by more than `tolerance`.
    Reject {
        /// Maximum absolute deviation of a row sum from 1.0.
        tolerance: f64,
    },
    /// Divide every row by its sum. Rows summing to zero are still rejected.
    Normalize,
}

impl RowPolicy {
    /// Checks that a `Reject` tolerance is finite and in `[0, MAX_TOLERANCE)`.
    pub fn validate(self) -> Result<(), MarkovError> {
        match self {
            Self::Reject { tolerance } if !(0.0..MAX_TOLERANCE).contains(&tolerance) => {
                Err(MarkovError::InvalidConfig {
                    reason: format!(
                        "row-sum tolerance must be in [0, {MAX_TOLERANCE}), got {tolerance}"
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for RowPolicy {
    fn default() -> Self {
        Self::Reject {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Configuration for building a [`MarkovChain`](crate::MarkovChain) from a raw table.
///
/// Use the builder methods to customise parameters.
///
/// # Example
///
/// ```
/// use drift_markov::{MarkovConfig, RowPolicy};
///
/// let config = MarkovConfig::new()
///     .with_row_policy(RowPolicy::Normalize)
///     .with_initial_state(2);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MarkovConfig {
    row_policy: RowPolicy,
    initial_state: Option<usize>,
}

impl MarkovConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `row_policy = Reject { tolerance: 1e-6 }`, no initial state
    /// (the chain starts at index 0 with no current value).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row-sum policy.
    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    /// Sets an explicit initial state index.
    pub fn with_initial_state(mut self, index: usize) -> Self {
        self.initial_state = Some(index);
        self
    }

    /// Returns the row-sum policy.
    pub fn row_policy(&self) -> RowPolicy {
        self.row_policy
    }

    /// Returns the explicit initial state, if any.
    pub fn initial_state(&self) -> Option<usize> {
        self.initial_state
    }

    /// Validates this configuration.
    ///
    /// A `Reject` tolerance must be finite and in `[0, 0.5)`. The initial
    /// state is bounds-checked against the matrix at chain construction
    /// instead.
    pub fn validate(&self) -> Result<(), MarkovError> {
        self.row_policy.validate()
    }
}
