//! Online parameter statistics for stochastic estimation.
//!
//! Purpose
//! -------
//! Accumulate a running mean of every parameter field across post-burn-in
//! iterations of a stochastic run (SEM / semi-SEM), so the final estimate can
//! be the iteration average rather than the last draw.
//!
//! Key behaviors
//! -------------
//! - One generic accumulator, [`RunningMean`], works for scalar vectors,
//!   matrices, and probability cubes alike — the dimensionality is a type
//!   parameter, not a per-family copy.
//! - `update` folds the current parameter value into the mean online (no
//!   history is stored); `set_into` writes the mean back into the parameter
//!   storage and resets; `release` discards the accumulator on failure
//!   without touching parameters.
//!
//! Invariants & assumptions
//! ------------------------
//! - `resize` is the only shape-changing operation and is called exactly once
//!   per run, before the first `update`.
//! - `update` is called with arrays of the accumulator's shape; mismatched
//!   shapes are a programming error.
//! - `set_into` followed by `release` leaves the destination unchanged by
//!   the release: release only clears accumulator state.
//!
//! Conventions
//! -----------
//! - No operation fails; the accumulator holds plain finite arithmetic over
//!   values whose domain validity is enforced upstream by the families.
use ndarray::{Array, Dimension, Ix1, Ix2, Ix3, ShapeBuilder, Zip};

/// Running mean over iterations of one parameter field.
///
/// `D` is the ndarray dimensionality of the field: [`Ix1`] for proportions
/// and rate vectors, [`Ix2`] for per-cluster-per-variable matrices, [`Ix3`]
/// for categorical probability cubes. The update is the textbook online
/// mean, `m += (x - m) / n`, applied elementwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningMean<D: Dimension> {
    mean: Array<f64, D>,
    count: usize,
}

/// Accumulator for vector-shaped parameters.
pub type VectorStats = RunningMean<Ix1>;
/// Accumulator for matrix-shaped parameters.
pub type MatrixStats = RunningMean<Ix2>;
/// Accumulator for cube-shaped parameters.
pub type CubeStats = RunningMean<Ix3>;

impl<D: Dimension> RunningMean<D> {
    /// Allocate a zeroed accumulator for the given shape.
    pub fn new<Sh>(shape: Sh) -> Self
    where
        Sh: ShapeBuilder<Dim = D>,
    {
        RunningMean { mean: Array::zeros(shape), count: 0 }
    }

    /// Reallocate storage for a (possibly new) shape and reset the count.
    ///
    /// The one memory-affecting operation of the accumulator protocol;
    /// called once per run before the first iteration.
    pub fn resize<Sh>(&mut self, shape: Sh)
    where
        Sh: ShapeBuilder<Dim = D>,
    {
        self.mean = Array::zeros(shape);
        self.count = 0;
    }

    /// Number of updates folded in since the last reset.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The current running mean.
    pub fn mean(&self) -> &Array<f64, D> {
        &self.mean
    }

    /// Fold the current parameter value into the running mean.
    pub fn update(&mut self, current: &Array<f64, D>) {
        self.count += 1;
        let weight = 1.0 / self.count as f64;
        Zip::from(&mut self.mean).and(current).for_each(|m, &c| *m += (c - *m) * weight);
    }

    /// Write the accumulated mean into `out`, then reset the accumulator.
    ///
    /// Used on successful run completion to install the iteration-averaged
    /// estimate. A subsequent [`RunningMean::release`] is a no-op on `out`.
    pub fn set_into(&mut self, out: &mut Array<f64, D>) {
        out.assign(&self.mean);
        self.release();
    }

    /// Discard accumulated state without touching any parameters.
    ///
    /// Used on estimation failure so a broken run leaves no half-averaged
    /// values behind.
    pub fn release(&mut self) {
        self.mean.fill(0.0);
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Online-mean arithmetic across several updates.
    // - The set-then-release round-trip contract on the destination.
    // - `resize` reallocating and resetting.
    //
    // They intentionally DO NOT cover:
    // - Which parameter fields the families attach accumulators to; that is
    //   covered by the family tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that the running mean equals the arithmetic mean of the
    // updates, which is the averaging contract SEM relies on.
    //
    // Given
    // -----
    // - Three vector updates [1, 4], [3, 2], [5, 0].
    //
    // Expect
    // ------
    // - The mean is [3, 2] and the count is 3.
    fn running_mean_matches_arithmetic_mean() {
        // Arrange
        let mut stats = VectorStats::new(2);

        // Act
        stats.update(&array![1.0, 4.0]);
        stats.update(&array![3.0, 2.0]);
        stats.update(&array![5.0, 0.0]);

        // Assert
        assert_eq!(stats.count(), 3);
        assert!((stats.mean()[0] - 3.0).abs() < 1e-12);
        assert!((stats.mean()[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify the round-trip contract: `set_into` installs the mean and a
    // following `release` does not disturb the destination.
    //
    // Given
    // -----
    // - An accumulator holding two updates and a destination vector.
    //
    // Expect
    // ------
    // - After `set_into`, the destination holds the mean; after `release`,
    //   the destination is unchanged and the count is zero.
    fn set_then_release_leaves_parameters_unchanged() {
        // Arrange
        let mut stats = VectorStats::new(2);
        stats.update(&array![2.0, 10.0]);
        stats.update(&array![4.0, 20.0]);
        let mut params: Array1<f64> = array![0.0, 0.0];

        // Act
        stats.set_into(&mut params);
        let snapshot = params.clone();
        stats.release();

        // Assert
        assert_eq!(params, snapshot);
        assert_eq!(params, array![3.0, 15.0]);
        assert_eq!(stats.count(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Verify that `resize` reallocates to the new shape and drops any
    // accumulated state.
    //
    // Given
    // -----
    // - A matrix accumulator with one update, resized to a wider shape.
    //
    // Expect
    // ------
    // - The mean has the new shape, is zero, and the count is reset.
    fn resize_reallocates_and_resets() {
        // Arrange
        let mut stats = MatrixStats::new((2, 2));
        stats.update(&array![[1.0, 1.0], [1.0, 1.0]]);

        // Act
        stats.resize((2, 3));

        // Assert
        assert_eq!(stats.mean().dim(), (2, 3));
        assert_eq!(stats.count(), 0);
        assert!(stats.mean().iter().all(|&v| v == 0.0));
    }
}
