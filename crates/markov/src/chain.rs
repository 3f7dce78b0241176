//! Stateful Markov chain over an ordered set of values.

use std::fmt;

use tracing::{debug, trace};

use crate::config::{MarkovConfig, RowPolicy};
use crate::error::MarkovError;
use crate::matrix::ProbabilityMatrix;
use crate::sample::select_index;

/// A raw transition table, as returned by a [`TransitionFn`].
pub type Table = Vec<Vec<f64>>;

/// Callback invoked after every sampled decision with `(previous, next)`
/// state indices. Its return value replaces the chain's transition table.
pub type TransitionFn = Box<dyn FnMut(usize, usize) -> Table + Send>;

/// A discrete-time Markov chain whose states are the elements of `values`.
///
/// The chain samples one decision per [`advance`](Self::advance) from the
/// active [`ProbabilityMatrix`]. An optional [`TransitionFn`] may rewrite the
/// matrix after each decision, giving a non-stationary process.
///
/// # Example
///
/// ```
/// use drift_markov::{MarkovChain, ProbabilityMatrix};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let matrix = ProbabilityMatrix::new(&[[0.0, 1.0], [1.0, 0.0]]).unwrap();
/// let mut chain = MarkovChain::new(vec!["ping", "pong"], matrix).unwrap();
/// let mut rng = StdRng::seed_from_u64(7);
///
/// assert_eq!(chain.current(), None);
/// assert_eq!(chain.advance(&mut rng).unwrap(), &"pong");
/// assert_eq!(chain.advance(&mut rng).unwrap(), &"ping");
/// assert_eq!(chain.decisions_made(), 2);
/// ```
pub struct MarkovChain<T> {
    values: Vec<T>,
    matrix: ProbabilityMatrix,
    current: usize,
    /// Set when an explicit initial state was supplied.
    started: bool,
    decisions: u64,
    transition_fn: Option<TransitionFn>,
}

impl<T> MarkovChain<T> {
    /// Creates a chain starting at index 0 with no current value.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::EmptyValues`] if `values` is empty and
    /// [`MarkovError::SizeMismatch`] if `values.len() != matrix.size()`.
    pub fn new(values: Vec<T>, matrix: ProbabilityMatrix) -> Result<Self, MarkovError> {
        Self::build(values, matrix, None)
    }

    /// Creates a chain whose current value is `values[initial]` immediately.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`MarkovError::InitialStateOutOfBounds`]
    /// if `initial >= values.len()`.
    pub fn with_initial_state(
        values: Vec<T>,
        matrix: ProbabilityMatrix,
        initial: usize,
    ) -> Result<Self, MarkovError> {
        Self::build(values, matrix, Some(initial))
    }

    /// Creates a chain from a raw table validated under the default policy.
    pub fn from_table<R: AsRef<[f64]>>(
        values: Vec<T>,
        table: &[R],
    ) -> Result<Self, MarkovError> {
        Self::from_config(values, table, &MarkovConfig::default())
    }

    /// Creates a chain from a raw table using `config` for the row policy and
    /// the optional initial state.
    pub fn from_config<R: AsRef<[f64]>>(
        values: Vec<T>,
        table: &[R],
        config: &MarkovConfig,
    ) -> Result<Self, MarkovError> {
        config.validate()?;
        if values.is_empty() {
            return Err(MarkovError::EmptyValues);
        }
        let matrix = ProbabilityMatrix::with_policy(table, config.row_policy())?;
        Self::build(values, matrix, config.initial_state())
    }

    fn build(
        values: Vec<T>,
        matrix: ProbabilityMatrix,
        initial: Option<usize>,
    ) -> Result<Self, MarkovError> {
        if values.is_empty() {
            return Err(MarkovError::EmptyValues);
        }
        if values.len() != matrix.size() {
            return Err(MarkovError::SizeMismatch {
                values: values.len(),
                size: matrix.size(),
            });
        }
        if let Some(index) = initial.filter(|&i| i >= values.len()) {
            return Err(MarkovError::InitialStateOutOfBounds {
                index,
                len: values.len(),
            });
        }

        Ok(Self {
            values,
            matrix,
            current: initial.unwrap_or(0),
            started: initial.is_some(),
            decisions: 0,
            transition_fn: None,
        })
    }

    /// Returns the current value, or `None` if no initial state was given and
    /// no decision has been made yet.
    pub fn current(&self) -> Option<&T> {
        if self.started || self.decisions > 0 {
            Some(&self.values[self.current])
        } else {
            None
        }
    }

    /// Returns the index of the state the next decision is sampled from.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Returns the number of states.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `false` for every constructed chain.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the state values in index order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns the number of decisions sampled since construction.
    pub fn decisions_made(&self) -> u64 {
        self.decisions
    }

    /// Returns the active transition matrix.
    pub fn matrix(&self) -> &ProbabilityMatrix {
        &self.matrix
    }

    /// Returns a deep copy of the active transition table.
    pub fn matrix_snapshot(&self) -> Table {
        self.matrix.snapshot()
    }

    /// Installs a callback that rewrites the transition table after every
    /// decision, replacing any previous one.
    ///
    /// The callback receives `(previous, next)` indices after `next` is
    /// sampled and before the chain moves to it. Its table is validated under
    /// the active matrix's [`RowPolicy`] and must keep the same size.
    pub fn set_transition_fn<F>(&mut self, f: F)
    where
        F: FnMut(usize, usize) -> Table + Send + 'static,
    {
        self.transition_fn = Some(Box::new(f));
    }

    /// Removes the rewrite callback, if any.
    pub fn clear_transition_fn(&mut self) {
        self.transition_fn = None;
    }

    /// Returns `true` if a rewrite callback is installed.
    pub fn has_transition_fn(&self) -> bool {
        self.transition_fn.is_some()
    }

    /// Returns `true` if another decision can change the current value.
    ///
    /// Always `true` before the first decision. Afterwards, `false` exactly
    /// when the current state is absorbing.
    pub fn has_next(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns `true` once the chain has settled in an absorbing state.
    pub fn is_terminal(&self) -> bool {
        self.decisions > 0 && self.matrix.row_is_absorbing(self.current)
    }

    /// Samples one decision and returns the new current value.
    ///
    /// Draws one uniform number from `rng`. If a rewrite callback is
    /// installed, it runs before the chain commits the move.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the callback's table is malformed or
    /// has the wrong size. The chain's state and matrix are left untouched.
    pub fn advance(&mut self, rng: &mut impl rand::Rng) -> Result<&T, MarkovError> {
        let prev = self.current;
        let u: f64 = rng.random();
        let next = select_index(self.matrix.row(prev), u);
        trace!(prev, next, u, "sampled transition");

        if let Some(rewrite) = self.transition_fn.as_mut() {
            let table = rewrite(prev, next);
            match rebuild(&table, self.matrix.policy(), self.values.len()) {
                Ok(matrix) => {
                    debug!(prev, next, "installed rewritten transition matrix");
                    self.matrix = matrix;
                }
                Err(e) => {
                    debug!(prev, next, error = %e, "rejected rewritten transition matrix");
                    return Err(e);
                }
            }
        }

        self.current = next;
        self.decisions += 1;
        Ok(&self.values[next])
    }

    /// Advances `steps` times and collects the visited values.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected rewrite and returns its error; decisions
    /// made before it stay committed.
    #[tracing::instrument(skip_all, fields(steps = steps))]
    pub fn walk(&mut self, steps: usize, rng: &mut impl rand::Rng) -> Result<Vec<T>, MarkovError>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(steps);
        for _ in 0..steps {
            out.push(self.advance(rng)?.clone());
        }
        Ok(out)
    }

    /// Advances once per slot of `out`, writing each visited value.
    ///
    /// # Errors
    ///
    /// As [`walk`](Self::walk). Slots after the failing step keep their
    /// previous contents.
    #[tracing::instrument(skip_all, fields(steps = out.len()))]
    pub fn walk_into(
        &mut self,
        rng: &mut impl rand::Rng,
        out: &mut [T],
    ) -> Result<(), MarkovError>
    where
        T: Clone,
    {
        for slot in out.iter_mut() {
            *slot = self.advance(rng)?.clone();
        }
        Ok(())
    }
}

/// Validates a rewritten table and checks it still matches the chain size.
fn rebuild(
    table: &[Vec<f64>],
    policy: RowPolicy,
    len: usize,
) -> Result<ProbabilityMatrix, MarkovError> {
    let matrix = ProbabilityMatrix::with_policy(table, policy)?;
    if matrix.size() != len {
        return Err(MarkovError::SizeMismatch {
            values: len,
            size: matrix.size(),
        });
    }
    Ok(matrix)
}

impl<T: fmt::Debug> fmt::Debug for MarkovChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkovChain")
            .field("values", &self.values)
            .field("matrix", &self.matrix)
            .field("current", &self.current)
            .field("decisions", &self.decisions)
            .field("has_transition_fn", &self.transition_fn.is_some())
            .finish()
    }
}
