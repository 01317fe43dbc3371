//! Index-based selection on kinematic vectors.

use nalgebra::DVector;

/// Returns a copy of `values` without the entries at `indices`.
///
/// Order of the remaining entries is preserved. Indices outside `values`
/// and repeated indices are ignored.
///
/// # Example
///
/// ```
/// use mimic_body::remove_by_indices;
///
/// let values = [10, 11, 12, 13, 14];
/// assert_eq!(remove_by_indices(&values, &[0, 3]), vec![11, 12, 14]);
/// ```
#[must_use]
pub fn remove_by_indices<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| !indices.contains(i))
        .map(|(_, v)| *v)
        .collect()
}

/// [`remove_by_indices`] for column vectors.
#[must_use]
pub fn remove_rows(values: &DVector<f64>, indices: &[usize]) -> DVector<f64> {
    DVector::from_vec(remove_by_indices(values.as_slice(), indices))
}

/// Entries of `values` at `indices`, in the order given.
///
/// Indices outside `values` are skipped.
#[must_use]
pub fn select_rows(values: &DVector<f64>, indices: &[usize]) -> DVector<f64> {
    DVector::from_iterator(
        indices.iter().filter(|&&i| i < values.len()).count(),
        indices.iter().filter_map(|&i| values.get(i).copied()),
    )
}
