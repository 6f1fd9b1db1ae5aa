//! Observation matrix with missing-value bookkeeping.
//!
//! Purpose
//! -------
//! Carry one component family's observation block — an n x d matrix plus the
//! coordinates of missing entries — as a validated container, so every
//! downstream read can assume complete, finite data.
//!
//! Key behaviors
//! -------------
//! - Validate observed entries (finite) and missing coordinates (in range,
//!   unique) at construction via [`MixtureData::new`].
//! - Fill missing cells with observed column means
//!   ([`MixtureData::fill_missing_with_column_means`]) so the matrix is
//!   complete before the first E-step; the coordinate list is retained for
//!   later expectation-based imputation rounds.
//!
//! Invariants & assumptions
//! ------------------------
//! - After construction plus the initial fill, `data` contains only finite
//!   values; family-specific domain checks (positivity, integrality) are the
//!   responsibility of the component constructors and apply to *observed*
//!   entries only.
//! - A column with no observed entries is filled with 0.0; families whose
//!   domain excludes that value will report the degeneracy through their
//!   M-step rather than at construction.
//!
//! Conventions
//! -----------
//! - Rows index samples, columns index variables; all indices are 0-based.
//! - Missing coordinates are `(row, col)` pairs into this block's local
//!   column range, not into any wider host dataset.
use std::collections::HashSet;

use ndarray::Array2;

use crate::mixture::errors::{MixtureError, MixtureResult};

/// One family's observation block and its missing-entry coordinates.
///
/// Construct via [`MixtureData::new`]; components call
/// [`MixtureData::fill_missing_with_column_means`] once before estimation
/// and overwrite the listed cells on every imputation round thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureData {
    /// The n x d observation matrix (complete after the initial fill).
    pub data: Array2<f64>,
    /// Coordinates of entries that were missing in the source data.
    missing: Vec<(usize, usize)>,
}

impl MixtureData {
    /// Construct a validated observation block.
    ///
    /// # Behavior
    /// - Rejects empty matrices.
    /// - Rejects non-finite *observed* entries; cells listed in `missing` are
    ///   exempt (their stored value is ignored and overwritten by the fill).
    /// - Rejects out-of-range and duplicate missing coordinates.
    ///
    /// # Errors
    /// - [`MixtureError::EmptyData`] for a zero-row or zero-column matrix.
    /// - [`MixtureError::MissingOutOfRange`] / [`MixtureError::DuplicateMissing`]
    ///   for ill-formed coordinate lists.
    /// - [`MixtureError::NonFiniteData`] for a NaN/±inf observed entry.
    pub fn new(data: Array2<f64>, missing: Vec<(usize, usize)>) -> MixtureResult<Self> {
        let (nb_sample, nb_variable) = data.dim();
        if nb_sample == 0 || nb_variable == 0 {
            return Err(MixtureError::EmptyData);
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(missing.len());
        for &(row, col) in &missing {
            if row >= nb_sample || col >= nb_variable {
                return Err(MixtureError::MissingOutOfRange { row, col, nb_sample, nb_variable });
            }
            if !seen.insert((row, col)) {
                return Err(MixtureError::DuplicateMissing { row, col });
            }
        }

        for ((row, col), &value) in data.indexed_iter() {
            if !value.is_finite() && !seen.contains(&(row, col)) {
                return Err(MixtureError::NonFiniteData { row, col, value });
            }
        }

        Ok(MixtureData { data, missing })
    }

    /// Number of samples (rows).
    pub fn nb_sample(&self) -> usize {
        self.data.nrows()
    }

    /// Number of variables (columns).
    pub fn nb_variable(&self) -> usize {
        self.data.ncols()
    }

    /// Whether any entry was missing in the source data.
    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    /// The missing-entry coordinates, in declaration order.
    pub fn missing(&self) -> &[(usize, usize)] {
        &self.missing
    }

    /// One observation; the matrix is complete after the initial fill.
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.data[[i, j]]
    }

    /// Replace every missing cell with the mean of its column's observed
    /// entries.
    ///
    /// Run once before the first E-step so log-densities never see the
    /// placeholder values stored at missing coordinates. Columns with no
    /// observed entry are filled with 0.0.
    pub fn fill_missing_with_column_means(&mut self) {
        if self.missing.is_empty() {
            return;
        }
        let missing: HashSet<(usize, usize)> = self.missing.iter().copied().collect();
        let nb_variable = self.nb_variable();
        let mut col_means = vec![0.0_f64; nb_variable];
        for col in 0..nb_variable {
            let mut sum = 0.0;
            let mut count = 0_usize;
            for (row, &value) in self.data.column(col).iter().enumerate() {
                if !missing.contains(&(row, col)) {
                    sum += value;
                    count += 1;
                }
            }
            if count > 0 {
                col_means[col] = sum / count as f64;
            }
        }
        for &(row, col) in &self.missing {
            self.data[[row, col]] = col_means[col];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation of observed entries and missing coordinate lists.
    // - The initial column-mean fill.
    //
    // They intentionally DO NOT cover:
    // - Expectation-based imputation rounds, which live with the component
    //   families.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that a finite matrix with a well-formed missing list constructs
    // and reports its shape.
    //
    // Given
    // -----
    // - A 3 x 2 matrix with one missing coordinate.
    //
    // Expect
    // ------
    // - Construction succeeds; accessors report 3 samples, 2 variables, and
    //   a non-empty missing set.
    fn data_accepts_valid_input() {
        // Arrange
        let raw = array![[1.0, 2.0], [3.0, f64::NAN], [5.0, 6.0]];

        // Act
        let data = MixtureData::new(raw, vec![(1, 1)]).expect("valid data block");

        // Assert
        assert_eq!(data.nb_sample(), 3);
        assert_eq!(data.nb_variable(), 2);
        assert!(data.has_missing());
    }

    #[test]
    // Purpose
    // -------
    // Ensure a non-finite entry that is NOT declared missing is rejected.
    //
    // Given
    // -----
    // - A matrix with a NaN at (1, 1) and an empty missing list.
    //
    // Expect
    // ------
    // - `Err(MixtureError::NonFiniteData)` carrying the coordinate.
    fn data_rejects_undeclared_nan() {
        // Arrange
        let raw = array![[1.0, 2.0], [3.0, f64::NAN]];

        // Act
        let err = MixtureData::new(raw, vec![]).unwrap_err();

        // Assert
        assert!(matches!(err, MixtureError::NonFiniteData { row: 1, col: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure out-of-range and duplicate missing coordinates are rejected.
    //
    // Given
    // -----
    // - A 2 x 2 matrix with (5, 0) out of range, then (0, 0) listed twice.
    //
    // Expect
    // ------
    // - `MissingOutOfRange` and `DuplicateMissing` respectively.
    fn data_rejects_bad_missing_lists() {
        // Arrange
        let raw = array![[1.0, 2.0], [3.0, 4.0]];

        // Act + Assert
        let err = MixtureData::new(raw.clone(), vec![(5, 0)]).unwrap_err();
        assert!(matches!(err, MixtureError::MissingOutOfRange { row: 5, col: 0, .. }));

        let err = MixtureData::new(raw, vec![(0, 0), (0, 0)]).unwrap_err();
        assert!(matches!(err, MixtureError::DuplicateMissing { row: 0, col: 0 }));
    }

    #[test]
    // Purpose
    // -------
    // Verify that the initial fill replaces missing cells with the mean of
    // the observed entries in the same column.
    //
    // Given
    // -----
    // - A column [1.0, NaN, 5.0] whose middle entry is declared missing.
    //
    // Expect
    // ------
    // - After the fill, the missing cell holds (1.0 + 5.0) / 2 = 3.0 and the
    //   observed cells are untouched.
    fn fill_uses_observed_column_mean() {
        // Arrange
        let raw = array![[1.0], [f64::NAN], [5.0]];
        let mut data = MixtureData::new(raw, vec![(1, 0)]).expect("valid data block");

        // Act
        data.fill_missing_with_column_means();

        // Assert
        assert_eq!(data.value(0, 0), 1.0);
        assert_eq!(data.value(1, 0), 3.0);
        assert_eq!(data.value(2, 0), 5.0);
    }
}
