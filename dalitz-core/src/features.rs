//! Accumulation of accepted observables into the output feature matrix.

use crate::error::{Error, Result};
use crate::selection::ObservableTriple;
use ndarray::Array2;

/// Number of feature columns.
pub const FEATURE_COLUMNS: usize = 3;

/// Append-only rows of accepted observables.
///
/// Rows keep event order. [`finalize`](Self::finalize) turns them into a
/// fixed-shape `(N, 3)` array for the downstream consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<ObservableTriple>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Appends one accepted event.
    pub fn push(&mut self, row: ObservableTriple) {
        self.rows.push(row);
    }

    /// Appends all rows of `other`, keeping their order.
    pub fn append(&mut self, other: &mut FeatureMatrix) {
        self.rows.append(&mut other.rows);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Accumulated rows in event order.
    #[must_use]
    pub fn rows(&self) -> &[ObservableTriple] {
        &self.rows
    }

    /// Converts the rows into an `(N, 3)` array with columns
    /// `[s_pos_neg, s_pos_pi0, s_neg_pi0]`.
    ///
    /// # Errors
    /// Returns [`Error::EmptyResult`] when no row was accumulated.
    pub fn finalize(self) -> Result<Array2<f64>> {
        if self.rows.is_empty() {
            return Err(Error::EmptyResult);
        }
        let n = self.rows.len();
        let flat: Vec<f64> = self.rows.iter().flat_map(ObservableTriple::to_array).collect();
        Array2::from_shape_vec((n, FEATURE_COLUMNS), flat)
            .map_err(|e| Error::Source(format!("feature matrix shape: {e}")))
    }
}

impl Extend<ObservableTriple> for FeatureMatrix {
    fn extend<I: IntoIterator<Item = ObservableTriple>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl FromIterator<ObservableTriple> for FeatureMatrix {
    fn from_iter<I: IntoIterator<Item = ObservableTriple>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(v: f64) -> ObservableTriple {
        ObservableTriple {
            s_pos_neg: v,
            s_pos_pi0: v + 1.0,
            s_neg_pi0: v + 2.0,
        }
    }

    #[test]
    fn test_finalize_shape_and_order() {
        let mut matrix = FeatureMatrix::with_capacity(2);
        matrix.push(row(0.5));
        matrix.push(row(10.0));
        assert_eq!(matrix.len(), 2);

        let array = matrix.finalize().unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array[[0, 0]], 0.5);
        assert_eq!(array[[0, 2]], 2.5);
        assert_eq!(array[[1, 1]], 11.0);
    }

    #[test]
    fn test_empty_finalize_fails() {
        let matrix = FeatureMatrix::new();
        assert!(matrix.is_empty());
        assert!(matches!(matrix.finalize(), Err(Error::EmptyResult)));
    }

    #[test]
    fn test_append_and_collect() {
        let mut a: FeatureMatrix = [row(1.0)].into_iter().collect();
        let mut b: FeatureMatrix = [row(2.0), row(3.0)].into_iter().collect();
        a.append(&mut b);
        assert!(b.is_empty());
        let firsts: Vec<f64> = a.rows().iter().map(|r| r.s_pos_neg).collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
    }
}
