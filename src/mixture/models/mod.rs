//! models — the estimation strategies driving a composer.
//!
//! Purpose
//! -------
//! Provide the run-level drivers on top of [`crate::mixture::composer`]:
//! deterministic EM and CEM ([`EmStrategy`]), stochastic SEM and semi-SEM
//! with parameter averaging ([`SemStrategy`]), and prediction against a
//! fitted model ([`PredictStrategy`]), all returning the host-facing
//! [`EstimOutcome`].
//!
//! Key behaviors
//! -------------
//! - State machine `burn-in → long run → finalize`, with transitions gated
//!   by ε-convergence (EM/CEM, predict-EM) or the iteration cap (SEM
//!   variants, predict-semi-SEM).
//! - Stochastic strategies accumulate parameter statistics strictly after
//!   the E-step of each post-burn-in iteration and install the iteration
//!   average on success (`set_parameters`) or discard it on failure
//!   (`release_statistics`).
//! - Every failure path finalizes the composer so a broken run still leaves
//!   the last valid state behind, and surfaces a typed error with a
//!   human-readable reason.
//! - A log-likelihood decrease beyond numerical slack is logged as a
//!   warning, never treated as fatal.
//!
//! Conventions
//! -----------
//! - Strategies own no mixture state; they only sequence composer steps.
//! - Iteration budgets and ε come from one validated
//!   [`crate::mixture::core::config::AlgoConfig`] supplied at construction.

pub mod em;
pub mod outcome;
pub mod predict;
pub mod sem;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::em::EmStrategy;
pub use self::outcome::EstimOutcome;
pub use self::predict::{PredictStrategy, PredictVariant};
pub use self::sem::{SemStrategy, SemVariant};
