//! Global mixture state: proportions, responsibilities, labels, likelihood.
//!
//! Purpose
//! -------
//! Hold the composer-owned global state of one estimation run in a single
//! container sized from a validated [`MixtureShape`]: cluster proportions,
//! the responsibility matrix, hard labels, derived cluster sizes, and the
//! observed log-likelihood (total and per sample).
//!
//! Key behaviors
//! -------------
//! - Allocate all arrays once at construction; shapes never change for the
//!   lifetime of the composer.
//! - Provide the state-machine tag [`ComposerState`] tracking the lifecycle
//!   of the owning composer.
//!
//! Invariants & assumptions
//! ------------------------
//! - `proportions` sums to 1 after every proportion step; `tik` rows each
//!   sum to 1 after every E-step; `cluster_sizes` is the column sum of
//!   `tik`. These invariants are maintained by the composer's step methods,
//!   which are the only mutation path.
//! - K is fixed for the lifetime of the state.
//!
//! Conventions
//! -----------
//! - `tik[[i, k]]` is the posterior probability that sample `i` belongs to
//!   cluster `k`; `labels[i]` is a hard assignment in `0..K`.
//! - The state performs no I/O and no validation of its own beyond sizing;
//!   it is a plain data carrier for the composer.
use ndarray::{Array1, Array2};

use crate::mixture::core::shape::MixtureShape;

/// Lifecycle of a [`crate::mixture::composer::MixtureComposer`].
///
/// Transitions: `Created` → (init method + E-step) → `Initialized` →
/// (strategy run) → `Running` → `Finished` on success or `Failed` on an
/// aborted run. A failed run keeps the last valid state in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Created,
    Initialized,
    Running,
    Finished,
    Failed,
}

/// Composer-owned global state of one estimation run.
///
/// All fields are sized from `(K, n)` at construction and mutated only
/// through the composer's step methods.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureState {
    /// Cluster proportions π (length K, sums to 1).
    pub proportions: Array1<f64>,
    /// Responsibility matrix t_ik (n x K, row-stochastic).
    pub tik: Array2<f64>,
    /// Hard labels (length n, entries in 0..K).
    pub labels: Array1<usize>,
    /// Responsibility mass per cluster (length K, column sums of `tik`).
    pub cluster_sizes: Array1<f64>,
    /// Total observed log-likelihood of the last E-step.
    pub ln_likelihood: f64,
    /// Per-sample observed log-likelihood of the last E-step (length n).
    pub ln_obs_per_sample: Array1<f64>,
}

impl MixtureState {
    /// Allocate state for a validated problem size.
    ///
    /// Proportions start uniform at 1/K so label simulation is well-defined
    /// before any estimation has run; everything else starts at zero.
    pub fn new(shape: &MixtureShape) -> MixtureState {
        let k = shape.nb_cluster;
        let n = shape.nb_sample;
        MixtureState {
            proportions: Array1::from_elem(k, 1.0 / k as f64),
            tik: Array2::zeros((n, k)),
            labels: Array1::zeros(n),
            cluster_sizes: Array1::zeros(k),
            ln_likelihood: f64::NEG_INFINITY,
            ln_obs_per_sample: Array1::from_elem(n, f64::NEG_INFINITY),
        }
    }

    /// Number of clusters K.
    pub fn nb_cluster(&self) -> usize {
        self.proportions.len()
    }

    /// Number of samples n.
    pub fn nb_sample(&self) -> usize {
        self.labels.len()
    }
}
