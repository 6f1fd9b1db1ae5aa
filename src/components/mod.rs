//! components — the variable-family strategies of the mixture engine.
//!
//! Purpose
//! -------
//! House one implementation of the [`MixtureComponent`] contract per
//! supported variable family: diagonal Gaussian (with four variance-pooling
//! variants), Gamma with cluster-shared scale and per-variable shape,
//! Poisson, Categorical, and the kernel-space Gaussian over a precomputed
//! Gram matrix.
//!
//! Key behaviors
//! -------------
//! - Express family polymorphism through the object-safe
//!   [`MixtureComponent`] trait, keeping the composer and strategies fully
//!   family-agnostic.
//! - Each family owns its observation block, parameters, and statistics
//!   accumulators; shared parameters (pooled sigmas, shared scales/shapes)
//!   are stored exactly once and read by every per-cluster computation.
//! - Numerically delicate maximum-likelihood sub-problems (the Gamma shape
//!   solve) go through [`crate::rootfind`] with moment-estimate fallbacks.
//!
//! Invariants & assumptions
//! ------------------------
//! - Family domains are enforced at construction on observed entries
//!   (positivity for Gamma, counts for Poisson, modality range for
//!   Categorical); estimation code never re-validates.
//! - `ln_component_probability` returns `-inf` (never NaN) for impossible
//!   observations; M-steps return `false` on degeneracy and leave previous
//!   parameters untouched.
//! - Parameter-statistics accumulators follow the resize/update/set/release
//!   protocol consumed by the stochastic strategies.
//!
//! Conventions
//! -----------
//! - All indices are 0-based; parameters are packed per cluster in the
//!   export tables with layouts documented on each `param_table` impl.
//! - These modules perform no I/O and no logging.

pub mod categorical;
pub mod gamma;
pub mod gaussian;
pub mod kernel;
pub mod poisson;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::categorical::CategoricalMixture;
pub use self::gamma::GammaMixture;
pub use self::gaussian::{GaussianMixture, GaussianVariance};
pub use self::kernel::{linear_gram, rbf_gram, KernelGaussian};
pub use self::poisson::PoissonMixture;
pub use self::traits::{MStepOptions, MixtureComponent};
