//! Validated row-stochastic transition matrices.

use crate::config::RowPolicy;
use crate::error::MarkovError;
use crate::sample::select_index;

/// An n×n row-stochastic transition matrix.
///
/// Row `i` holds the probabilities of moving from state `i` to each state
/// `0..n`. The matrix is validated on construction and immutable afterwards;
/// every owned read ([`row_at`](Self::row_at), [`snapshot`](Self::snapshot))
/// is a fresh copy.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMatrix {
    size: usize,
    /// Row-major `size * size` weights.
    probs: Vec<f64>,
    policy: RowPolicy,
}

impl ProbabilityMatrix {
    /// Builds a matrix under the default [`RowPolicy`] (reject rows that do
    /// not sum to 1 within `1e-6`).
    ///
    /// # Errors
    ///
    /// Returns a shape error ([`MarkovError::is_shape_error`]) if the table is
    /// empty, not square, or holds a negative or non-finite weight, and
    /// [`MarkovError::RowSum`] if a row is not a distribution.
    pub fn new<R: AsRef<[f64]>>(table: &[R]) -> Result<Self, MarkovError> {
        Self::with_policy(table, RowPolicy::default())
    }

    /// Builds a matrix under an explicit [`RowPolicy`].
    ///
    /// With [`RowPolicy::Normalize`] each row is divided by its sum. Under
    /// either policy a row summing to zero is rejected with
    /// [`MarkovError::RowSum`].
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`MarkovError::InvalidConfig`] if the
    /// policy's tolerance is out of range.
    pub fn with_policy<R: AsRef<[f64]>>(
        table: &[R],
        policy: RowPolicy,
    ) -> Result<Self, MarkovError> {
        policy.validate()?;
        let size = table.len();
        if size == 0 {
            return Err(MarkovError::EmptyMatrix);
        }

        let mut probs = Vec::with_capacity(size * size);
        for (i, row) in table.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != size {
                return Err(MarkovError::NotSquare {
                    row: i,
                    len: row.len(),
                    size,
                });
            }
            for (j, &p) in row.iter().enumerate() {
                if !p.is_finite() {
                    return Err(MarkovError::NonFiniteWeight {
                        row: i,
                        col: j,
                        value: p,
                    });
                }
                if p < 0.0 {
                    return Err(MarkovError::NegativeWeight {
                        row: i,
                        col: j,
                        value: p,
                    });
                }
            }
            probs.extend_from_slice(row);
        }

        for (i, row) in probs.chunks_exact_mut(size).enumerate() {
            let sum: f64 = row.iter().sum();
            if sum <= 0.0 {
                return Err(MarkovError::RowSum { row: i, sum });
            }
            match policy {
                RowPolicy::Reject { tolerance } => {
                    if (sum - 1.0).abs() > tolerance {
                        return Err(MarkovError::RowSum { row: i, sum });
                    }
                }
                RowPolicy::Normalize => {
                    for p in row.iter_mut() {
                        *p /= sum;
                    }
                }
            }
        }

        Ok(Self {
            size,
            probs,
            policy,
        })
    }

    /// Returns the number of states `n`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the policy this matrix was validated under.
    pub fn policy(&self) -> RowPolicy {
        self.policy
    }

    /// Returns a copy of row `index`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::RowOutOfBounds`] if `index >= size`.
    pub fn row_at(&self, index: usize) -> Result<Vec<f64>, MarkovError> {
        self.check_index(index)?;
        Ok(self.row(index).to_vec())
    }

    /// Returns the probability of moving from `from` to `to`.
    pub fn prob(&self, from: usize, to: usize) -> Result<f64, MarkovError> {
        self.check_index(from)?;
        self.check_index(to)?;
        Ok(self.probs[from * self.size + to])
    }

    /// Returns a deep copy of the whole table.
    pub fn snapshot(&self) -> Vec<Vec<f64>> {
        self.probs
            .chunks_exact(self.size)
            .map(<[f64]>::to_vec)
            .collect()
    }

    /// Returns `true` if row `index` places its whole mass on `index` itself.
    ///
    /// Every other weight must be exactly zero; near-zero leakage keeps the
    /// state transient.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::RowOutOfBounds`] if `index >= size`.
    pub fn is_absorbing(&self, index: usize) -> Result<bool, MarkovError> {
        self.check_index(index)?;
        Ok(self.row_is_absorbing(index))
    }

    /// Samples the next state index from row `from` using the inverse CDF.
    ///
    /// Draws one uniform number from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::RowOutOfBounds`] if `from >= size`.
    pub fn sample(&self, from: usize, rng: &mut impl rand::Rng) -> Result<usize, MarkovError> {
        self.check_index(from)?;
        let u: f64 = rng.random();
        Ok(select_index(self.row(from), u))
    }

    /// Borrowed view of a row. `index` must already be in bounds.
    pub(crate) fn row(&self, index: usize) -> &[f64] {
        let start = index * self.size;
        &self.probs[start..start + self.size]
    }

    /// Unchecked form of [`is_absorbing`](Self::is_absorbing).
    pub(crate) fn row_is_absorbing(&self, index: usize) -> bool {
        self.row(index)
            .iter()
            .enumerate()
            .all(|(j, &p)| j == index || p == 0.0)
    }

    fn check_index(&self, index: usize) -> Result<(), MarkovError> {
        if index >= self.size {
            return Err(MarkovError::RowOutOfBounds {
                index,
                size: self.size,
            });
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<f64>>> for ProbabilityMatrix {
    type Error = MarkovError;

    fn try_from(table: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(&table)
    }
}

impl TryFrom<&[Vec<f64>]> for ProbabilityMatrix {
    type Error = MarkovError;

    fn try_from(table: &[Vec<f64>]) -> Result<Self, Self::Error> {
        Self::new(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn cyclic() -> ProbabilityMatrix {
        ProbabilityMatrix::new(&[[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]).unwrap()
    }

    // 1. size_and_row_access
    #[test]
    fn size_and_row_access() {
        let m = ProbabilityMatrix::new(&[[0.5, 0.3, 0.2], [0.1, 0.7, 0.2], [0.2, 0.3, 0.5]])
            .unwrap();
        assert_eq!(m.size(), 3);
        assert_eq!(m.row_at(0).unwrap(), vec![0.5, 0.3, 0.2]);
        assert_eq!(m.row_at(1).unwrap(), vec![0.1, 0.7, 0.2]);
        assert_eq!(m.row_at(2).unwrap(), vec![0.2, 0.3, 0.5]);
    }

    // 2. prob_access
    #[test]
    fn prob_access() {
        let m = ProbabilityMatrix::new(&[[0.5, 0.3, 0.2], [0.1, 0.7, 0.2], [0.2, 0.3, 0.5]])
            .unwrap();
        assert_abs_diff_eq!(m.prob(0, 1).unwrap(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(m.prob(1, 2).unwrap(), 0.2, epsilon = 1e-12);
        assert!(matches!(
            m.prob(3, 0),
            Err(MarkovError::RowOutOfBounds { index: 3, size: 3 })
        ));
    }

    // 3. row_at_out_of_bounds
    #[test]
    fn row_at_out_of_bounds() {
        let m = cyclic();
        assert!(matches!(
            m.row_at(3),
            Err(MarkovError::RowOutOfBounds { index: 3, size: 3 })
        ));
    }

    // 4. row_at_is_a_copy
    #[test]
    fn row_at_is_a_copy() {
        let m = cyclic();
        let mut row = m.row_at(0).unwrap();
        row[0] = 42.0;
        assert_eq!(m.row_at(0).unwrap(), vec![0.0, 1.0, 0.0]);
    }

    // 5. snapshot_is_independent
    #[test]
    fn snapshot_is_independent() {
        let m = cyclic();
        let mut first = m.snapshot();
        let second = m.snapshot();
        assert_eq!(first, second);

        first[0] = vec![1.0, 0.0, 0.0];
        first[2][0] = -7.0;
        assert_eq!(m.snapshot(), second);
        assert_ne!(m.snapshot(), first);
    }

    // 6. empty_table_rejected
    #[test]
    fn empty_table_rejected() {
        let table: Vec<Vec<f64>> = Vec::new();
        let err = ProbabilityMatrix::new(&table).unwrap_err();
        assert_eq!(err, MarkovError::EmptyMatrix);
        assert!(err.is_shape_error());
    }

    // 7. non_square_rejected
    #[test]
    fn non_square_rejected() {
        let table = vec![vec![1.0, 0.0], vec![1.0]];
        assert!(matches!(
            ProbabilityMatrix::new(&table),
            Err(MarkovError::NotSquare {
                row: 1,
                len: 1,
                size: 2
            })
        ));

        let wide = vec![vec![0.5, 0.5, 0.0], vec![0.5, 0.5, 0.0]];
        assert!(matches!(
            ProbabilityMatrix::new(&wide),
            Err(MarkovError::NotSquare {
                row: 0,
                len: 3,
                size: 2
            })
        ));
    }

    // 8. negative_weight_rejected
    #[test]
    fn negative_weight_rejected() {
        let table = vec![vec![1.5, -0.5], vec![0.0, 1.0]];
        assert!(matches!(
            ProbabilityMatrix::new(&table),
            Err(MarkovError::NegativeWeight { row: 0, col: 1, .. })
        ));
        // Normalizing does not rescue a negative weight.
        assert!(matches!(
            ProbabilityMatrix::with_policy(&table, RowPolicy::Normalize),
            Err(MarkovError::NegativeWeight { .. })
        ));
    }

    // 9. non_finite_weight_rejected
    #[test]
    fn non_finite_weight_rejected() {
        let table = vec![vec![1.0, 0.0], vec![f64::NAN, 1.0]];
        assert!(matches!(
            ProbabilityMatrix::new(&table),
            Err(MarkovError::NonFiniteWeight { row: 1, col: 0, .. })
        ));
    }

    // 10. bad_row_sum_rejected
    #[test]
    fn bad_row_sum_rejected() {
        let table = vec![vec![0.5, 0.3, 0.3], vec![0.1, 0.7, 0.2], vec![0.2, 0.3, 0.5]];
        match ProbabilityMatrix::new(&table) {
            Err(MarkovError::RowSum { row, sum }) => {
                assert_eq!(row, 0);
                assert_abs_diff_eq!(sum, 1.1, epsilon = 1e-12);
            }
            other => panic!("expected RowSum, got {other:?}"),
        }
    }

    // 11. tolerance_is_configurable
    #[test]
    fn tolerance_is_configurable() {
        let table = [[0.5, 0.49], [0.0, 1.0]];
        assert!(ProbabilityMatrix::new(&table).is_err());
        assert!(ProbabilityMatrix::with_policy(&table, RowPolicy::Reject { tolerance: 0.02 }).is_ok());
    }

    // 12. normalize_policy_rescales_rows
    #[test]
    fn normalize_policy_rescales_rows() {
        let m = ProbabilityMatrix::with_policy(&[[2.0, 2.0], [0.0, 5.0]], RowPolicy::Normalize)
            .unwrap();
        assert_eq!(m.policy(), RowPolicy::Normalize);
        let snap = m.snapshot();
        assert_abs_diff_eq!(snap[0][0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(snap[0][1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(snap[1][0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(snap[1][1], 1.0, epsilon = 1e-12);
    }

    // 13. normalize_policy_rejects_zero_row
    #[test]
    fn normalize_policy_rejects_zero_row() {
        let result = ProbabilityMatrix::with_policy(&[[1.0, 0.0], [0.0, 0.0]], RowPolicy::Normalize);
        assert!(matches!(result, Err(MarkovError::RowSum { row: 1, .. })));
    }

    // 14. is_absorbing
    #[test]
    fn is_absorbing() {
        let m = ProbabilityMatrix::new(&[[1.0, 0.0], [0.5, 0.5]]).unwrap();
        assert!(m.is_absorbing(0).unwrap());
        assert!(!m.is_absorbing(1).unwrap());
        assert!(m.is_absorbing(2).is_err());

        // Mass concentrated elsewhere is not absorbing.
        let m = ProbabilityMatrix::new(&[[0.0, 1.0], [0.0, 1.0]]).unwrap();
        assert!(!m.is_absorbing(0).unwrap());
        assert!(m.is_absorbing(1).unwrap());
    }

    // 15. sample_distribution
    #[test]
    fn sample_distribution() {
        let m = ProbabilityMatrix::new(&[[0.5, 0.3, 0.2], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 10_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[m.sample(0, &mut rng).unwrap()] += 1;
        }

        let expected = [0.5, 0.3, 0.2];
        for (j, &c) in counts.iter().enumerate() {
            let f = c as f64 / n as f64;
            assert!(
                (f - expected[j]).abs() < 0.03,
                "state {j} frequency: {f}, expected ~{}",
                expected[j]
            );
        }
    }

    // 16. sample_deterministic_rows
    #[test]
    fn sample_deterministic_rows() {
        let m = cyclic();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(m.sample(0, &mut rng).unwrap(), 1);
            assert_eq!(m.sample(1, &mut rng).unwrap(), 2);
            assert_eq!(m.sample(2, &mut rng).unwrap(), 0);
        }
    }

    // 17. try_from_nested_vecs
    #[test]
    fn try_from_nested_vecs() {
        let table = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let from_slice = ProbabilityMatrix::try_from(table.as_slice()).unwrap();
        let from_owned = ProbabilityMatrix::try_from(table.clone()).unwrap();
        assert_eq!(from_slice, from_owned);
        assert_eq!(from_owned.snapshot(), table);
    }

    // 18. zero_row_rejected_under_any_tolerance
    #[test]
    fn zero_row_rejected_under_any_tolerance() {
        let table = [[0.0, 0.0], [0.0, 1.0]];
        let result = ProbabilityMatrix::with_policy(&table, RowPolicy::Reject { tolerance: 0.49 });
        assert!(matches!(result, Err(MarkovError::RowSum { row: 0, .. })));
    }

    // 19. oversized_tolerance_rejected
    #[test]
    fn oversized_tolerance_rejected() {
        let table = [[0.0, 0.0], [0.0, 1.0]];
        let result = ProbabilityMatrix::with_policy(&table, RowPolicy::Reject { tolerance: 1.0 });
        assert!(matches!(result, Err(MarkovError::InvalidConfig { .. })));
    }

    // 20. loose_tolerance_samples_by_weight
    #[test]
    fn loose_tolerance_samples_by_weight() {
        let m = ProbabilityMatrix::with_policy(
            &[[0.45, 0.45], [0.0, 1.0]],
            RowPolicy::Reject { tolerance: 0.1 },
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let mut counts = [0usize; 2];
        for _ in 0..n {
            counts[m.sample(0, &mut rng).unwrap()] += 1;
        }
        let f1 = counts[1] as f64 / n as f64;
        assert!((f1 - 0.5).abs() < 0.02, "state 1 frequency: {f1}, expected ~0.5");
    }
}
