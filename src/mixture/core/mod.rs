//! core — shared mixture data, state, and statistics building blocks.
//!
//! Purpose
//! -------
//! Collect the structural building blocks the composer and strategies are
//! assembled from: problem sizing, algorithm configuration, validated
//! observation blocks with missing-value bookkeeping, the composer-owned
//! global state, online parameter statistics, and shared validators.
//!
//! Key behaviors
//! -------------
//! - Validate every configuration and data container at construction
//!   ([`MixtureShape`], [`AlgoConfig`], [`MixtureData`]) so estimation code
//!   can assume well-formed inputs without rechecking.
//! - Provide the single generic statistics accumulator ([`RunningMean`])
//!   behind the resize/update/set/release protocol used by the stochastic
//!   strategies for every parameter field.
//! - Track the composer lifecycle via [`ComposerState`] and carry the
//!   global estimation state in [`MixtureState`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `1 <= nb_cluster <= nb_sample`; K is fixed for the lifetime of a
//!   composer and every state array is sized from `(K, n)` exactly once.
//! - Observed data entries are finite; family-domain checks (positivity,
//!   counts, modality ranges) live in [`validation`] and are invoked by the
//!   component constructors on observed entries only.
//! - The responsibility matrix is row-stochastic and proportions sum to 1
//!   after the corresponding composer steps; these invariants are
//!   maintained by the step methods, which are the only mutation path.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based throughout; rows are samples, columns variables.
//! - This module performs no I/O and no logging; it operates purely on
//!   `ndarray` containers and scalar values, reporting problems via
//!   [`crate::mixture::errors::MixtureResult`].

pub mod config;
pub mod data;
pub mod shape;
pub mod state;
pub mod statistics;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::config::AlgoConfig;
pub use self::data::MixtureData;
pub use self::shape::MixtureShape;
pub use self::state::{ComposerState, MixtureState};
pub use self::statistics::{CubeStats, MatrixStats, RunningMean, VectorStats};
pub use self::validation::{
    validate_count_entries, validate_modality_entries, validate_positive_entries,
    validate_proportions,
};
