//! Algorithm configuration for estimation runs.
//!
//! Purpose
//! -------
//! Collect the iteration budget and convergence tolerance that drive every
//! estimation strategy in one immutable, validated value object, so run
//! behavior is explicit and reproducible.
//!
//! Key behaviors
//! -------------
//! - Represent the burn-in iteration count, the long-run iteration cap, and
//!   the log-likelihood convergence tolerance ε via [`AlgoConfig`].
//! - Reject inadmissible configurations (zero long-run budget, non-finite or
//!   non-positive ε) with typed errors instead of panicking at call sites.
//!
//! Invariants & assumptions
//! ------------------------
//! - `nb_iter >= 1`: every strategy performs at least one long-run iteration.
//! - `epsilon` is finite and strictly positive.
//! - `nb_burn_in_iter` may be zero; burn-in is optional.
//! - The struct is immutable after construction; strategies copy it freely.
//!
//! Conventions
//! -----------
//! - ε gates the *increase* of the observed log-likelihood between
//!   consecutive long-run iterations for ε-converging strategies (EM, CEM,
//!   predict-EM); stochastic strategies (SEM, semi-SEM) run the full
//!   `nb_iter` budget and average parameters instead.
//! - A run either converges by ε, exhausts `nb_iter`, or fails outright;
//!   there is no external cancellation signal.
use crate::mixture::errors::{MixtureError, MixtureResult};

/// Iteration budget and convergence tolerance for one estimation run.
///
/// Fields:
/// - `nb_burn_in_iter`: iterations run before statistics accumulation or
///   convergence checks begin (escaping poor initial basins).
/// - `nb_iter`: long-run iteration cap.
/// - `epsilon`: log-likelihood convergence threshold for ε-gated strategies.
///
/// Construct via [`AlgoConfig::new`]; `Default` yields
/// `{ nb_burn_in_iter: 20, nb_iter: 100, epsilon: 1e-8 }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgoConfig {
    /// Burn-in iteration count (may be zero).
    pub nb_burn_in_iter: usize,
    /// Long-run iteration cap (>= 1).
    pub nb_iter: usize,
    /// Convergence tolerance on the log-likelihood increase (finite, > 0).
    pub epsilon: f64,
}

impl AlgoConfig {
    /// Construct validated algorithm configuration.
    ///
    /// # Rules
    /// - `nb_iter` must be `>= 1`.
    /// - `epsilon` must be finite and strictly positive.
    /// - `nb_burn_in_iter` is unconstrained (zero disables burn-in).
    ///
    /// # Errors
    /// - [`MixtureError::InvalidNbIter`] if `nb_iter == 0`.
    /// - [`MixtureError::InvalidEpsilon`] for non-finite or non-positive ε.
    pub fn new(nb_burn_in_iter: usize, nb_iter: usize, epsilon: f64) -> MixtureResult<Self> {
        if nb_iter == 0 {
            return Err(MixtureError::InvalidNbIter { nb_iter });
        }
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(MixtureError::InvalidEpsilon { value: epsilon });
        }
        Ok(AlgoConfig { nb_burn_in_iter, nb_iter, epsilon })
    }
}

impl Default for AlgoConfig {
    /// Conservative defaults: 20 burn-in iterations, a 100-iteration long
    /// run, and ε = 1e-8.
    fn default() -> Self {
        AlgoConfig { nb_burn_in_iter: 20, nb_iter: 100, epsilon: 1e-8 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation behavior of `AlgoConfig::new` for valid and invalid
    //   budgets and tolerances.
    // - The documented `Default` values.
    //
    // They intentionally DO NOT cover:
    // - How strategies interpret the budget; that is tested with the
    //   strategies themselves.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that a valid configuration constructs unchanged, including a
    // zero burn-in.
    //
    // Given
    // -----
    // - `nb_burn_in_iter = 0`, `nb_iter = 50`, `epsilon = 1e-6`.
    //
    // Expect
    // ------
    // - Construction succeeds and all three fields round-trip.
    fn config_accepts_valid_values() {
        // Arrange + Act
        let config = AlgoConfig::new(0, 50, 1e-6).expect("valid configuration");

        // Assert
        assert_eq!(config.nb_burn_in_iter, 0);
        assert_eq!(config.nb_iter, 50);
        assert_eq!(config.epsilon, 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a zero long-run budget is rejected.
    //
    // Given
    // -----
    // - `nb_iter = 0`.
    //
    // Expect
    // ------
    // - `Err(MixtureError::InvalidNbIter)`.
    fn config_rejects_zero_long_run() {
        // Arrange + Act
        let err = AlgoConfig::new(10, 0, 1e-6).unwrap_err();

        // Assert
        assert!(matches!(err, MixtureError::InvalidNbIter { nb_iter: 0 }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure non-finite and non-positive tolerances are rejected.
    //
    // Given
    // -----
    // - ε in { NaN, 0.0, -1e-3 }.
    //
    // Expect
    // ------
    // - `Err(MixtureError::InvalidEpsilon)` for each.
    fn config_rejects_bad_epsilon() {
        for epsilon in [f64::NAN, 0.0, -1e-3] {
            // Act
            let err = AlgoConfig::new(10, 50, epsilon).unwrap_err();

            // Assert
            assert!(matches!(err, MixtureError::InvalidEpsilon { .. }), "epsilon = {epsilon}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that `Default` matches the documented values.
    //
    // Given
    // -----
    // - The `Default` implementation for `AlgoConfig`.
    //
    // Expect
    // ------
    // - 20 burn-in iterations, a 100-iteration long run, ε = 1e-8.
    fn config_default_matches_documented_values() {
        // Arrange + Act
        let config = AlgoConfig::default();

        // Assert
        assert_eq!(config.nb_burn_in_iter, 20);
        assert_eq!(config.nb_iter, 100);
        assert_eq!(config.epsilon, 1e-8);
    }
}
