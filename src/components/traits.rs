//! Public contract between the composer/strategies and component families.
//!
//! - [`MixtureComponent`]: trait each variable family implements.
//! - [`MStepOptions`]: explicit configuration for iterative M-steps.
//!
//! Convention: the composer is fully family-agnostic. It only ever calls
//! trait methods; no family-specific code exists outside the family's own
//! module. Numeric M-step failures are reported as `false` (cheap, no
//! allocation on the hot path); strategies convert them into typed errors
//! with human-readable reasons at the run boundary.
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;

/// One variable family participating in a mixture.
///
/// An implementation owns its observation block, its parameters, and its
/// parameter-statistics accumulators. The composer owns the global state
/// (proportions, responsibilities, labels) and never reaches into
/// component-internal fields.
///
/// Required behavior:
/// - `ln_component_probability(i, k)`: log-density of sample `i` under
///   cluster `k`'s current parameters, summed over this family's variables.
///   Returns `-inf` — never NaN — when any per-variable density is exactly
///   zero or the point is outside the family domain, so impossibility
///   propagates through the log-likelihood sum without poisoning it.
/// - `random_init`: weakly informative initialization from simple moment
///   statistics or family-appropriate random draws. Must always land inside
///   the valid parameter domain.
/// - `m_step(tik)`: recompute all parameters from the responsibilities.
///   Returns `false` when a required statistic is non-positive or
///   non-finite, or when a required solve fails *and* the moment fallback is
///   itself outside the domain. On success, parameters are mutated in
///   place; on failure, previously valid parameters are left untouched.
/// - `nb_free_parameters`: exact count of free scalar parameters for this
///   family configuration (consumed externally by model-selection criteria).
/// - Statistics protocol (consumed by the stochastic strategies):
///   `resize_statistics` allocates accumulator storage for the declared
///   variable range (once per run, before the first iteration);
///   `update_statistics` folds the current parameters into the running
///   means; `set_parameters` installs the accumulated means as the final
///   estimate and resets; `release_statistics` discards accumulated state
///   without touching parameters.
/// - Missing data: `has_missing` reports whether the family's block had
///   missing entries; `impute_step(tik)` refreshes those cells from the
///   current parameter expectations under the given responsibilities.
/// - `param_table`: the family's parameters packed as a rectangular matrix
///   with a documented per-family row layout (rows grouped per cluster,
///   columns indexing variables), for the host-facing result surface.
pub trait MixtureComponent {
    /// Short family name used in error messages.
    fn name(&self) -> &'static str;

    /// Number of samples in this family's observation block.
    fn nb_sample(&self) -> usize;

    /// Number of variables in this family's observation block.
    fn nb_variable(&self) -> usize;

    /// Log-density of sample `i` under cluster `k`, summed over variables.
    fn ln_component_probability(&self, i: usize, k: usize) -> f64;

    /// Weakly informative random initialization of all parameters.
    fn random_init(&mut self, rng: &mut StdRng);

    /// Recompute parameters from responsibilities; `false` on degeneracy.
    fn m_step(&mut self, tik: ArrayView2<f64>) -> bool;

    /// Exact count of free scalar parameters.
    fn nb_free_parameters(&self) -> usize;

    /// Allocate statistics storage for the declared variable range.
    fn resize_statistics(&mut self);

    /// Fold the current parameters into the running means.
    fn update_statistics(&mut self);

    /// Install the accumulated means as the final parameters, then reset.
    fn set_parameters(&mut self);

    /// Discard accumulated statistics without touching parameters.
    fn release_statistics(&mut self);

    /// Whether this family's block had missing entries.
    fn has_missing(&self) -> bool;

    /// Refresh missing cells from current parameter expectations.
    fn impute_step(&mut self, tik: ArrayView2<f64>);

    /// Parameters packed as the documented rectangular export table.
    fn param_table(&self) -> Array2<f64>;
}

/// Explicit configuration for iterative M-steps.
///
/// The Gamma family's coordinate ascent stops once the expected
/// complete-data log-likelihood improves by less than `epsilon` or after
/// `max_iter` rounds; hitting the cap is normal termination, not failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MStepOptions {
    /// Improvement threshold on the expected complete-data log-likelihood.
    pub epsilon: f64,
    /// Cap on inner coordinate-ascent rounds.
    pub max_iter: usize,
}

impl Default for MStepOptions {
    /// `epsilon = 1e-6`, `max_iter = 400`.
    fn default() -> Self {
        MStepOptions { epsilon: 1e-6, max_iter: 400 }
    }
}
