//! Estimation outcome: the host-facing result surface of one run.
//!
//! Mirrors everything a caller needs after a strategy finishes: final
//! proportions, the responsibility matrix, hard labels, per-sample observed
//! log-likelihood, the per-family parameter tables, and run diagnostics
//! (iterations, convergence flag, status string).
use ndarray::{Array1, Array2};

use crate::mixture::composer::MixtureComposer;

/// Result surface produced by a successful estimation or prediction run.
///
/// - `proportions`, `tik`, `labels`, `cluster_sizes`: snapshots of the
///   final composer state.
/// - `ln_likelihood` / `ln_obs_per_sample`: observed log-likelihood of the
///   final E-step, total and per sample.
/// - `param_tables`: one rectangular table per registered component, rows
///   grouped per cluster with the layout documented on each family.
/// - `nb_free_parameters`: free scalars of the whole mixture (K − 1
///   proportions plus every family's own count), the input to external
///   model-selection criteria.
/// - `nb_iter_done`, `converged`, `status`: run diagnostics; `status` is a
///   human-readable termination summary.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimOutcome {
    pub proportions: Array1<f64>,
    pub tik: Array2<f64>,
    pub labels: Array1<usize>,
    pub cluster_sizes: Array1<f64>,
    pub ln_likelihood: f64,
    pub ln_obs_per_sample: Array1<f64>,
    pub param_tables: Vec<Array2<f64>>,
    pub nb_free_parameters: usize,
    pub nb_iter_done: usize,
    pub converged: bool,
    pub status: String,
}

impl EstimOutcome {
    /// Snapshot a finalized composer into an owned outcome.
    pub(crate) fn from_composer(
        composer: &MixtureComposer, nb_iter_done: usize, converged: bool, status: String,
    ) -> EstimOutcome {
        EstimOutcome {
            proportions: composer.proportions().clone(),
            tik: composer.tik().clone(),
            labels: composer.labels().clone(),
            cluster_sizes: composer.cluster_sizes().clone(),
            ln_likelihood: composer.ln_likelihood(),
            ln_obs_per_sample: composer.ln_obs_per_sample().clone(),
            param_tables: composer.param_tables(),
            nb_free_parameters: composer.nb_free_parameters(),
            nb_iter_done,
            converged,
            status,
        }
    }
}
