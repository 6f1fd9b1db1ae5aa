//! mixture — the mixture-model estimation stack: core state, composer,
//! strategies, and errors.
//!
//! Purpose
//! -------
//! Provide a cohesive finite-mixture layer that bundles the structural core
//! (shapes, configuration, data blocks, state, statistics), the
//! family-agnostic estimation engine ([`MixtureComposer`]), the run-level
//! strategies (EM / CEM / SEM / semi-SEM / predict), and shared error types
//! under a single namespace. This is the surface most consumers should
//! depend on.
//!
//! Key behaviors
//! -------------
//! - Collect the structural building blocks in [`core`]: validated problem
//!   sizing and configuration, observation blocks with missing-value
//!   bookkeeping, composer state, and the generic running-mean statistics
//!   accumulator.
//! - Drive estimation through [`composer::MixtureComposer`], which owns the
//!   global state (proportions, responsibilities, labels, cluster sizes,
//!   log-likelihood) and implements the E/C/S/P/MAP/M steps generically
//!   over any [`crate::components::MixtureComponent`] set.
//! - Expose run-level drivers in [`models`]: [`EmStrategy`],
//!   [`SemStrategy`], and [`PredictStrategy`], each returning an
//!   [`EstimOutcome`] result surface.
//! - Centralize error types in [`errors`] ([`MixtureError`],
//!   [`MixtureResult`]) so callers see one uniform error surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - K is fixed for the lifetime of a composer; the responsibility matrix
//!   stays row-stochastic and proportions sum to 1 after the corresponding
//!   steps.
//! - Within one iteration the E-step fully completes before the M-step
//!   reads responsibilities; statistics accumulation happens strictly after
//!   the E-step of the same iteration.
//! - All loops execute sequentially to completion; the only parallelism in
//!   the crate is the optional Gram-matrix precomputation in
//!   [`crate::components::kernel`], which finishes before estimation
//!   begins.
//! - A failed run keeps the last valid state in place and surfaces a
//!   human-readable reason; a successful run always leaves the
//!   log-likelihood populated and consistent with the returned parameters.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based throughout; `tik[[i, k]]` is the posterior
//!   probability that sample `i` belongs to cluster `k`.
//! - The estimation core performs no I/O; strategies emit `log` warnings
//!   for the likelihood-decrease anomaly and debug lines per iteration.
//! - Stochastic entry points take an explicit optional seed; `None`
//!   delegates to system entropy.
//!
//! Downstream usage
//! ----------------
//! - Build one [`crate::components::MixtureComponent`] per variable family
//!   over its validated [`core::MixtureData`] block, register them with a
//!   [`composer::MixtureComposer`], and drive the composer with a strategy
//!   from [`models`].
//! - Prediction constructs components through their `with_parameters`
//!   constructors over the new data and runs [`PredictStrategy`] with the
//!   fitted proportions.
//!
//! Testing notes
//! -------------
//! - Unit tests live with each submodule; end-to-end estimation scenarios
//!   (Gaussian recovery, degenerate-data failure, Gamma shape/scale
//!   recovery, SEM averaging) live in `tests/`.

pub mod composer;
pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::composer::MixtureComposer;
pub use self::core::{AlgoConfig, ComposerState, MixtureData, MixtureShape, RunningMean};
pub use self::errors::{MixtureError, MixtureResult};
pub use self::models::{
    EmStrategy, EstimOutcome, PredictStrategy, PredictVariant, SemStrategy, SemVariant,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_mixtures::mixture::prelude::*;
//
// to import the main estimation surface in a single line.

pub mod prelude {
    pub use super::composer::MixtureComposer;
    pub use super::core::{AlgoConfig, ComposerState, MixtureData, MixtureShape};
    pub use super::errors::{MixtureError, MixtureResult};
    pub use super::models::{
        EmStrategy, EstimOutcome, PredictStrategy, PredictVariant, SemStrategy, SemVariant,
    };
}
