//! rust_mixtures — finite mixture models over heterogeneous variable
//! families.
//!
//! Purpose
//! -------
//! Estimate finite mixture models (clustering by probabilistic model
//! fitting) over heterogeneous variable families — diagonal Gaussian,
//! Gamma, Poisson, Categorical, and kernel-space Gaussian — using
//! Expectation-Maximization and its stochastic variants (CEM, SEM,
//! semi-SEM), plus a predict mode that scores new data against an
//! already-fitted model.
//!
//! Key behaviors
//! -------------
//! - A family-agnostic orchestrator ([`mixture::MixtureComposer`]) drives
//!   E/C/S/P/MAP/M iterations over any set of pluggable component families
//!   implementing [`components::MixtureComponent`].
//! - Per-family parameter statistics follow one online running-mean
//!   protocol ([`mixture::RunningMean`]) so stochastic runs can install
//!   iteration-averaged estimates with rollback on failure.
//! - Non-closed-form maximum-likelihood sub-problems (the Gamma shape) go
//!   through a safeguarded bisection/secant zero finder
//!   ([`rootfind::find_zero`]) with moment-estimate fallbacks.
//!
//! Invariants & assumptions
//! ------------------------
//! - Responsibilities are row-stochastic and proportions sum to 1 after
//!   every corresponding step; EM's observed log-likelihood is
//!   non-decreasing up to numerical slack, and a decrease is logged as a
//!   warning rather than treated as fatal.
//! - Numeric failures are recovered as close to the source as possible
//!   (component-local fallbacks); only unrecoverable failures bubble up,
//!   always carrying a human-readable reason.
//! - Estimation is single-threaded and synchronous; the optional parallel
//!   Gram-matrix precomputation completes before fitting begins.
//!
//! Downstream usage
//! ----------------
//! - Build component families over validated [`mixture::MixtureData`]
//!   blocks, register them with a [`mixture::MixtureComposer`], and drive
//!   the run with [`mixture::EmStrategy`], [`mixture::SemStrategy`], or
//!   [`mixture::PredictStrategy`]. The returned
//!   [`mixture::EstimOutcome`] carries proportions, responsibilities,
//!   labels, per-sample log-likelihood, and per-family parameter tables.
//!
//! Testing notes
//! -------------
//! - Unit tests are colocated with each module; end-to-end estimation
//!   scenarios live in `tests/integration_mixture_pipeline.rs`.

pub mod components;
pub mod mixture;
pub mod rootfind;
pub mod utils;
