//! Problem size (K, n) for mixture models.
//!
//! - `nb_cluster`: number of mixture components K.
//! - `nb_sample`: number of observations n.
//!
//! K is fixed for the lifetime of a composer; every state container
//! (proportions, responsibilities, labels) is sized from this pair.
use crate::mixture::errors::{MixtureError, MixtureResult};

/// Size of the mixture problem.
///
/// - `nb_cluster`: number of clusters K
/// - `nb_sample`: number of observations n
///
/// Invariant: `1 <= K <= n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixtureShape {
    pub nb_cluster: usize,
    pub nb_sample: usize,
}

impl MixtureShape {
    /// Construct a [`MixtureShape`] and validate it.
    ///
    /// # Invariants
    /// - `nb_cluster >= 1`: a mixture needs at least one component.
    /// - `nb_cluster <= nb_sample`: more clusters than observations leaves at
    ///   least one cluster without any sample to estimate from.
    ///
    /// # Arguments
    /// - `nb_cluster`: number of clusters K.
    /// - `nb_sample`: number of observations in the dataset to fit.
    ///
    /// # Errors
    /// - [`MixtureError::InvalidNbCluster`] if `nb_cluster == 0`.
    /// - [`MixtureError::InvalidNbCluster`] if `nb_cluster > nb_sample`.
    ///
    /// # Rationale
    /// Responsibility rows, cluster sizes, and per-cluster parameters are all
    /// sized from `(K, n)`. Failing fast on under-identified configurations
    /// lets downstream code assume `n >= K >= 1` without rechecking.
    pub fn new(nb_cluster: usize, nb_sample: usize) -> MixtureResult<Self> {
        if nb_cluster == 0 {
            return Err(MixtureError::InvalidNbCluster {
                nb_cluster,
                nb_sample,
                reason: "at least one cluster is required.",
            });
        }
        if nb_cluster > nb_sample {
            return Err(MixtureError::InvalidNbCluster {
                nb_cluster,
                nb_sample,
                reason: "the cluster count cannot exceed the sample count.",
            });
        }
        Ok(MixtureShape { nb_cluster, nb_sample })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation behavior of `MixtureShape::new` for admissible and
    //   inadmissible (K, n) pairs.
    //
    // They intentionally DO NOT cover:
    // - How the shape is consumed when sizing composer state; that is tested
    //   at the composer level.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that an admissible (K, n) pair constructs unchanged.
    //
    // Given
    // -----
    // - K = 3 clusters over n = 100 samples.
    //
    // Expect
    // ------
    // - Construction succeeds and both fields round-trip.
    fn shape_accepts_admissible_pair() {
        // Arrange + Act
        let shape = MixtureShape::new(3, 100).expect("3 clusters over 100 samples is valid");

        // Assert
        assert_eq!(shape.nb_cluster, 3);
        assert_eq!(shape.nb_sample, 100);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a zero cluster count is rejected.
    //
    // Given
    // -----
    // - K = 0 over any sample count.
    //
    // Expect
    // ------
    // - `Err(MixtureError::InvalidNbCluster)` carrying the inputs.
    fn shape_rejects_zero_clusters() {
        // Arrange + Act
        let err = MixtureShape::new(0, 10).unwrap_err();

        // Assert
        match err {
            MixtureError::InvalidNbCluster { nb_cluster, nb_sample, .. } => {
                assert_eq!(nb_cluster, 0);
                assert_eq!(nb_sample, 10);
            }
            other => panic!("expected InvalidNbCluster, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure more clusters than samples is rejected.
    //
    // Given
    // -----
    // - K = 11 over n = 10 samples.
    //
    // Expect
    // ------
    // - `Err(MixtureError::InvalidNbCluster)`.
    fn shape_rejects_more_clusters_than_samples() {
        // Arrange + Act
        let err = MixtureShape::new(11, 10).unwrap_err();

        // Assert
        assert!(matches!(err, MixtureError::InvalidNbCluster { nb_cluster: 11, nb_sample: 10, .. }));
    }
}
