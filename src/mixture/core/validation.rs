//! Shared validation helpers for family constructors and the predict path.
//!
//! Families validate the *observed* entries of their data block against the
//! family domain at construction time, so estimation code never needs to
//! re-check. Cells listed as missing are exempt; they are overwritten by the
//! initial fill and by imputation rounds.
use std::collections::HashSet;

use ndarray::Array1;

use crate::mixture::core::data::MixtureData;
use crate::mixture::errors::{MixtureError, MixtureResult};

/// Check that every observed entry is strictly positive (Gamma domain).
///
/// # Errors
/// - [`MixtureError::NonPositiveData`] at the first offending coordinate.
pub fn validate_positive_entries(data: &MixtureData) -> MixtureResult<()> {
    let missing: HashSet<(usize, usize)> = data.missing().iter().copied().collect();
    for ((row, col), &value) in data.data.indexed_iter() {
        if missing.contains(&(row, col)) {
            continue;
        }
        if value <= 0.0 {
            return Err(MixtureError::NonPositiveData { row, col, value });
        }
    }
    Ok(())
}

/// Check that every observed entry is a non-negative integer (Poisson
/// domain).
///
/// # Errors
/// - [`MixtureError::NonIntegerData`] at the first offending coordinate.
pub fn validate_count_entries(data: &MixtureData) -> MixtureResult<()> {
    let missing: HashSet<(usize, usize)> = data.missing().iter().copied().collect();
    for ((row, col), &value) in data.data.indexed_iter() {
        if missing.contains(&(row, col)) {
            continue;
        }
        if value < 0.0 || value.fract() != 0.0 {
            return Err(MixtureError::NonIntegerData { row, col, value });
        }
    }
    Ok(())
}

/// Check that every observed entry is an integer modality index inside
/// `0..nb_modality` (Categorical domain).
///
/// # Errors
/// - [`MixtureError::NonIntegerData`] for fractional or negative entries.
/// - [`MixtureError::ModalityOutOfRange`] for indices >= `nb_modality`.
pub fn validate_modality_entries(data: &MixtureData, nb_modality: usize) -> MixtureResult<()> {
    let missing: HashSet<(usize, usize)> = data.missing().iter().copied().collect();
    for ((row, col), &value) in data.data.indexed_iter() {
        if missing.contains(&(row, col)) {
            continue;
        }
        if value < 0.0 || value.fract() != 0.0 {
            return Err(MixtureError::NonIntegerData { row, col, value });
        }
        if value >= nb_modality as f64 {
            return Err(MixtureError::ModalityOutOfRange { row, col, value, nb_modality });
        }
    }
    Ok(())
}

/// Check that a proportions vector supplied for prediction is a valid
/// discrete distribution over K clusters.
///
/// Entries must be finite, non-negative, and sum to 1 within `1e-9`.
///
/// # Errors
/// - [`MixtureError::InvalidNbCluster`] for an empty vector, an entry
///   outside [0, 1], or a sum away from 1.
pub fn validate_proportions(proportions: &Array1<f64>) -> MixtureResult<()> {
    let k = proportions.len();
    if k == 0 {
        return Err(MixtureError::InvalidNbCluster {
            nb_cluster: 0,
            nb_sample: 0,
            reason: "a proportions vector cannot be empty.",
        });
    }
    let mut sum = 0.0;
    for &p in proportions {
        if !p.is_finite() || p < 0.0 || p > 1.0 {
            return Err(MixtureError::InvalidNbCluster {
                nb_cluster: k,
                nb_sample: 0,
                reason: "proportions must be finite values in [0, 1].",
            });
        }
        sum += p;
    }
    if (sum - 1.0).abs() > 1e-9 {
        return Err(MixtureError::InvalidNbCluster {
            nb_cluster: k,
            nb_sample: 0,
            reason: "proportions must sum to 1.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Acceptance and first-offender rejection for each domain validator.
    // - That missing cells are exempt from domain checks.
    //
    // They intentionally DO NOT cover:
    // - Which families call which validator; that is covered by the family
    //   constructor tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that positivity validation accepts positive data and skips
    // declared-missing cells.
    //
    // Given
    // -----
    // - A matrix with a non-positive value only at a missing coordinate.
    //
    // Expect
    // ------
    // - Validation succeeds.
    fn positive_validator_exempts_missing() {
        // Arrange
        let data = MixtureData::new(array![[1.0], [0.0], [2.5]], vec![(1, 0)]).unwrap();

        // Act + Assert
        assert!(validate_positive_entries(&data).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Ensure positivity validation reports the first observed offender.
    //
    // Given
    // -----
    // - A matrix with a zero entry at (1, 0) that is not missing.
    //
    // Expect
    // ------
    // - `Err(MixtureError::NonPositiveData)` at (1, 0).
    fn positive_validator_rejects_zero() {
        // Arrange
        let data = MixtureData::new(array![[1.0], [0.0]], vec![]).unwrap();

        // Act
        let err = validate_positive_entries(&data).unwrap_err();

        // Assert
        assert!(matches!(err, MixtureError::NonPositiveData { row: 1, col: 0, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure count validation rejects fractional and negative entries.
    //
    // Given
    // -----
    // - Matrices holding 2.5 and -1.0 respectively.
    //
    // Expect
    // ------
    // - `Err(MixtureError::NonIntegerData)` in both cases.
    fn count_validator_rejects_non_counts() {
        for bad in [2.5, -1.0] {
            // Arrange
            let data = MixtureData::new(array![[0.0], [bad]], vec![]).unwrap();

            // Act + Assert
            assert!(
                matches!(validate_count_entries(&data), Err(MixtureError::NonIntegerData { .. })),
                "value = {bad}"
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure modality validation enforces the declared range.
    //
    // Given
    // -----
    // - A matrix holding modality 3 with a declared range of 3 (0, 1, 2).
    //
    // Expect
    // ------
    // - `Err(MixtureError::ModalityOutOfRange)`.
    fn modality_validator_enforces_range() {
        // Arrange
        let data = MixtureData::new(array![[0.0], [3.0]], vec![]).unwrap();

        // Act
        let err = validate_modality_entries(&data, 3).unwrap_err();

        // Assert
        assert!(matches!(err, MixtureError::ModalityOutOfRange { row: 1, col: 0, nb_modality: 3, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify the proportions validator on valid and invalid vectors.
    //
    // Given
    // -----
    // - A valid distribution, a non-normalized vector, and a negative entry.
    //
    // Expect
    // ------
    // - Ok for the first; `InvalidNbCluster` for the others.
    fn proportions_validator_checks_distribution() {
        // Act + Assert
        assert!(validate_proportions(&array![0.25, 0.75]).is_ok());
        assert!(validate_proportions(&array![0.5, 0.6]).is_err());
        assert!(validate_proportions(&array![-0.1, 1.1]).is_err());
    }
}
