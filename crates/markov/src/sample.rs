//! Inverse-CDF index selection over a single row of weights.

/// Selects an index from `row` for a uniform draw `u` in `[0, 1)`.
///
/// Scales `u` by the row sum, walks the row's cumulative distribution and
/// returns the first positive-weight index whose cumulative sum meets or
/// exceeds the scaled draw. Rows validated within a tolerance are therefore
/// sampled in proportion to their weights. Zero-weight columns are never
/// returned, even for `u == 0.0`. If rounding leaves the draw beyond the
/// final cumulative sum, falls back to the last positive-weight index.
///
/// `row` must contain at least one positive weight; validated matrices
/// guarantee this.
pub(crate) fn select_index(row: &[f64], u: f64) -> usize {
    let target = u * row.iter().sum::<f64>();
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (j, &p) in row.iter().enumerate() {
        if p <= 0.0 {
            continue;
        }
        cumulative += p;
        last_positive = j;
        if cumulative >= target {
            return j;
        }
    }
    last_positive
}
