//! MixtureComposer: the family-agnostic estimation engine.
//!
//! Owns the global mixture state (proportions, responsibilities, labels,
//! cluster sizes, log-likelihood) and implements the E-step, classification
//! step, stochastic step, proportion step, MAP step, and M-step generically
//! over any set of [`MixtureComponent`]s. Per-cluster, per-family numeric
//! work is always delegated to the components; no family-specific code
//! exists here.
//!
//! ## E-step stabilization
//! For every sample the row of log-terms `ln π_k + Σ_f ln f(x_i | k)` is
//! normalized by subtracting its maximum before exponentiating, so at least
//! one term has magnitude 1 and the normalization never divides by zero.
//! The only exception is a row whose maximum is `-inf` (the documented
//! impossible-sample edge case), which is surfaced as
//! [`MixtureError::DegenerateSample`].
//!
//! ## Ordering guarantees
//! Within one iteration the E-step fully completes (responsibilities and
//! log-likelihood) before the M-step reads them; the composer never
//! interleaves the two. Statistics accumulation is driven by the strategies
//! strictly after the E-step of the same iteration.
use ndarray::{Array1, Array2};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::components::traits::MixtureComponent;
use crate::mixture::core::shape::MixtureShape;
use crate::mixture::core::state::{ComposerState, MixtureState};
use crate::mixture::core::statistics::VectorStats;
use crate::mixture::core::validation::validate_proportions;
use crate::mixture::errors::{MixtureError, MixtureResult};
use crate::utils::log_sum_exp;

/// Orchestrator of one mixture estimation run.
///
/// State machine: `Created` → `Initialized` (after an init method, which
/// ends with an E-step) → `Running` (set by the strategies) → `Finished` or
/// `Failed` (via [`MixtureComposer::finalize`]). Step methods reject calls
/// on a `Created` composer; a failed run keeps the last valid state.
pub struct MixtureComposer {
    shape: MixtureShape,
    state: MixtureState,
    status: ComposerState,
    components: Vec<Box<dyn MixtureComponent>>,
    proportion_stats: VectorStats,
    rng: StdRng,
}

impl MixtureComposer {
    /// Build a composer over `nb_cluster` clusters and the given component
    /// families.
    ///
    /// All components must agree on the sample count; `seed` makes the
    /// stochastic steps reproducible (`None` draws from system entropy).
    ///
    /// # Errors
    /// - [`MixtureError::NoComponents`] for an empty component list.
    /// - [`MixtureError::SampleCountMismatch`] when blocks disagree.
    /// - [`MixtureError::InvalidNbCluster`] from shape validation.
    pub fn new(
        nb_cluster: usize, components: Vec<Box<dyn MixtureComponent>>, seed: Option<u64>,
    ) -> MixtureResult<Self> {
        if components.is_empty() {
            return Err(MixtureError::NoComponents);
        }
        let nb_sample = components[0].nb_sample();
        for component in &components {
            if component.nb_sample() != nb_sample {
                return Err(MixtureError::SampleCountMismatch {
                    component: component.name(),
                    expected: nb_sample,
                    actual: component.nb_sample(),
                });
            }
        }
        let shape = MixtureShape::new(nb_cluster, nb_sample)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(MixtureComposer {
            state: MixtureState::new(&shape),
            status: ComposerState::Created,
            proportion_stats: VectorStats::new(nb_cluster),
            shape,
            components,
            rng,
        })
    }

    // ---- Accessors ---------------------------------------------------------

    pub fn nb_cluster(&self) -> usize {
        self.shape.nb_cluster
    }

    pub fn nb_sample(&self) -> usize {
        self.shape.nb_sample
    }

    pub fn status(&self) -> ComposerState {
        self.status
    }

    pub fn proportions(&self) -> &Array1<f64> {
        &self.state.proportions
    }

    pub fn tik(&self) -> &Array2<f64> {
        &self.state.tik
    }

    pub fn labels(&self) -> &Array1<usize> {
        &self.state.labels
    }

    pub fn cluster_sizes(&self) -> &Array1<f64> {
        &self.state.cluster_sizes
    }

    pub fn ln_likelihood(&self) -> f64 {
        self.state.ln_likelihood
    }

    pub fn ln_obs_per_sample(&self) -> &Array1<f64> {
        &self.state.ln_obs_per_sample
    }

    /// Whether any component's block carries missing entries.
    pub fn has_missing(&self) -> bool {
        self.components.iter().any(|c| c.has_missing())
    }

    /// Free parameters of the whole mixture: K − 1 proportions plus every
    /// component's own count. Consumed by model-selection criteria.
    pub fn nb_free_parameters(&self) -> usize {
        self.shape.nb_cluster - 1
            + self.components.iter().map(|c| c.nb_free_parameters()).sum::<usize>()
    }

    /// Every component's parameter export table, in registration order.
    pub fn param_tables(&self) -> Vec<Array2<f64>> {
        self.components.iter().map(|c| c.param_table()).collect()
    }

    // ---- Initialization ----------------------------------------------------

    /// Random *class* initialization: component parameters from
    /// `random_init`, hard responsibilities simulated from the (uniform)
    /// proportions, then immediately an E-step.
    ///
    /// Transitions to `Initialized` on success.
    pub fn random_class_init(&mut self) -> MixtureResult<()> {
        for component in &mut self.components {
            component.random_init(&mut self.rng);
        }
        let sampler = WeightedIndex::new(self.state.proportions.iter())
            .map_err(|_| MixtureError::DegenerateSample { sample: 0 })?;
        for i in 0..self.shape.nb_sample {
            self.state.labels[i] = sampler.sample(&mut self.rng);
        }
        self.reseed_empty_clusters();
        self.harden_from_labels();
        self.e_step()?;
        self.status = ComposerState::Initialized;
        Ok(())
    }

    /// Random *fuzzy* initialization: component parameters from
    /// `random_init`, soft responsibilities proportional to `π_k · u_ik`
    /// with uniform `u`, then immediately an E-step.
    ///
    /// Transitions to `Initialized` on success.
    pub fn random_fuzzy_init(&mut self) -> MixtureResult<()> {
        for component in &mut self.components {
            component.random_init(&mut self.rng);
        }
        for i in 0..self.shape.nb_sample {
            let mut row_sum = 0.0;
            for k in 0..self.shape.nb_cluster {
                let weight = self.state.proportions[k] * self.rng.gen::<f64>();
                self.state.tik[[i, k]] = weight;
                row_sum += weight;
            }
            if row_sum <= 0.0 {
                return Err(MixtureError::DegenerateSample { sample: i });
            }
            for k in 0..self.shape.nb_cluster {
                self.state.tik[[i, k]] /= row_sum;
            }
        }
        self.refresh_cluster_sizes();
        self.e_step()?;
        self.status = ComposerState::Initialized;
        Ok(())
    }

    /// Prediction initialization: install fitted proportions and seed every
    /// responsibility row with them (the prior), so imputation is
    /// well-defined before the first E-step. No M-step ever runs on a
    /// predict composer.
    pub fn init_predict(&mut self, proportions: Array1<f64>) -> MixtureResult<()> {
        validate_proportions(&proportions)?;
        for i in 0..self.shape.nb_sample {
            for k in 0..self.shape.nb_cluster {
                self.state.tik[[i, k]] = proportions[k];
            }
        }
        self.state.proportions = proportions;
        self.refresh_cluster_sizes();
        self.status = ComposerState::Initialized;
        Ok(())
    }

    /// Mark the composer as being driven by a strategy.
    pub fn set_running(&mut self) {
        self.status = ComposerState::Running;
    }

    // ---- Steps -------------------------------------------------------------

    /// E-step: recompute responsibilities and the observed log-likelihood.
    ///
    /// For each sample the log-terms `ln π_k + Σ_f ln f` are stabilized by
    /// their row maximum, exponentiated, and normalized; `max + ln Σ`
    /// accumulates into the total and per-sample log-likelihood.
    ///
    /// # Errors
    /// - [`MixtureError::NotInitialized`] on a `Created` composer.
    /// - [`MixtureError::DegenerateSample`] when a row is entirely `-inf`.
    pub fn e_step(&mut self) -> MixtureResult<()> {
        if self.status == ComposerState::Created {
            return Err(MixtureError::NotInitialized { operation: "e_step" });
        }
        let nb_cluster = self.shape.nb_cluster;
        let components = &self.components;
        let state = &mut self.state;

        let mut total = 0.0;
        let mut row = Array1::<f64>::zeros(nb_cluster);
        for i in 0..self.shape.nb_sample {
            for k in 0..nb_cluster {
                let mut ln_term = state.proportions[k].ln();
                for component in components {
                    ln_term += component.ln_component_probability(i, k);
                }
                row[k] = ln_term;
            }
            let ln_obs = log_sum_exp(row.view());
            if ln_obs == f64::NEG_INFINITY {
                return Err(MixtureError::DegenerateSample { sample: i });
            }
            for k in 0..nb_cluster {
                state.tik[[i, k]] = (row[k] - ln_obs).exp();
            }
            state.ln_obs_per_sample[i] = ln_obs;
            total += ln_obs;
        }
        state.ln_likelihood = total;
        self.refresh_cluster_sizes();
        Ok(())
    }

    /// Classification step: harden responsibilities to the MAP one-hot
    /// labels. Returns the minimum cluster occupancy so callers can detect
    /// emptied clusters.
    pub fn c_step(&mut self) -> f64 {
        self.map_step();
        self.harden_from_labels()
    }

    /// Stochastic step: draw each label from its responsibility row, then
    /// harden. Returns the minimum cluster occupancy.
    ///
    /// # Errors
    /// - [`MixtureError::DegenerateSample`] when a responsibility row cannot
    ///   be sampled (all-zero mass).
    pub fn s_step(&mut self) -> MixtureResult<f64> {
        for i in 0..self.shape.nb_sample {
            let row = self.state.tik.row(i);
            let sampler = WeightedIndex::new(row.iter())
                .map_err(|_| MixtureError::DegenerateSample { sample: i })?;
            self.state.labels[i] = sampler.sample(&mut self.rng);
        }
        Ok(self.harden_from_labels())
    }

    /// Proportion step: proportions are the column means of the
    /// responsibility matrix.
    pub fn p_step(&mut self) {
        let n = self.shape.nb_sample as f64;
        self.refresh_cluster_sizes();
        for k in 0..self.shape.nb_cluster {
            self.state.proportions[k] = self.state.cluster_sizes[k] / n;
        }
    }

    /// MAP step: labels are the arg-max of each responsibility row (final
    /// hard assignment for reporting). Responsibilities are left soft.
    pub fn map_step(&mut self) {
        for i in 0..self.shape.nb_sample {
            let row = self.state.tik.row(i);
            let mut best = 0;
            let mut best_value = f64::NEG_INFINITY;
            for (k, &value) in row.iter().enumerate() {
                if value > best_value {
                    best_value = value;
                    best = k;
                }
            }
            self.state.labels[i] = best;
        }
    }

    /// M-step: proportion step, then every component's M-step. A component
    /// failure aborts with [`MixtureError::MStepFailed`] naming the family
    /// and iteration; earlier components may already hold refreshed
    /// parameters but each family's own parameters are never half-written.
    pub fn m_step(&mut self, iteration: usize) -> MixtureResult<()> {
        self.p_step();
        let tik = &self.state.tik;
        for component in &mut self.components {
            if !component.m_step(tik.view()) {
                return Err(MixtureError::MStepFailed { component: component.name(), iteration });
            }
        }
        Ok(())
    }

    /// Imputation step: every component refreshes its missing cells from
    /// the current parameter expectations under the current
    /// responsibilities.
    pub fn impute_step(&mut self) {
        let tik = &self.state.tik;
        for component in &mut self.components {
            component.impute_step(tik.view());
        }
    }

    // ---- Statistics protocol (delegated to components + proportions) ------

    /// Allocate statistics storage; once per run, before the first
    /// iteration.
    pub fn resize_statistics(&mut self) {
        self.proportion_stats.resize(self.shape.nb_cluster);
        for component in &mut self.components {
            component.resize_statistics();
        }
    }

    /// Fold current parameters (including proportions) into the running
    /// means.
    pub fn update_statistics(&mut self) {
        self.proportion_stats.update(&self.state.proportions);
        for component in &mut self.components {
            component.update_statistics();
        }
    }

    /// Install iteration-averaged parameters everywhere and reset the
    /// accumulators. The averaged proportions are re-normalized to absorb
    /// rounding drift.
    pub fn set_parameters(&mut self) {
        self.proportion_stats.set_into(&mut self.state.proportions);
        let sum = self.state.proportions.sum();
        if sum > 0.0 {
            self.state.proportions.mapv_inplace(|p| p / sum);
        }
        for component in &mut self.components {
            component.set_parameters();
        }
    }

    /// Discard all accumulated statistics without touching parameters.
    pub fn release_statistics(&mut self) {
        self.proportion_stats.release();
        for component in &mut self.components {
            component.release_statistics();
        }
    }

    // ---- Finalization ------------------------------------------------------

    /// Leave the model in a well-defined state at the end of a run: refresh
    /// the MAP labels and record the terminal status. Called on success and
    /// on failure alike.
    pub fn finalize(&mut self, succeeded: bool) {
        self.map_step();
        self.status = if succeeded { ComposerState::Finished } else { ComposerState::Failed };
    }

    // ---- Internal helpers --------------------------------------------------

    /// Give every cluster at least one simulated label by moving samples
    /// out of multiply-occupied clusters. `n >= K` guarantees a donor
    /// exists whenever a cluster is empty.
    fn reseed_empty_clusters(&mut self) {
        let mut counts = vec![0_usize; self.shape.nb_cluster];
        for i in 0..self.shape.nb_sample {
            counts[self.state.labels[i]] += 1;
        }
        for k in 0..self.shape.nb_cluster {
            while counts[k] == 0 {
                let i = self.rng.gen_range(0..self.shape.nb_sample);
                let donor = self.state.labels[i];
                if counts[donor] > 1 {
                    counts[donor] -= 1;
                    counts[k] += 1;
                    self.state.labels[i] = k;
                }
            }
        }
    }

    /// One-hot the responsibility matrix from the current labels and return
    /// the minimum cluster occupancy (as a count).
    fn harden_from_labels(&mut self) -> f64 {
        let mut counts = vec![0_usize; self.shape.nb_cluster];
        self.state.tik.fill(0.0);
        for i in 0..self.shape.nb_sample {
            let label = self.state.labels[i];
            self.state.tik[[i, label]] = 1.0;
            counts[label] += 1;
        }
        for k in 0..self.shape.nb_cluster {
            self.state.cluster_sizes[k] = counts[k] as f64;
        }
        counts.iter().copied().min().unwrap_or(0) as f64
    }

    /// Cluster sizes are the column sums of the responsibility matrix.
    fn refresh_cluster_sizes(&mut self) {
        for k in 0..self.shape.nb_cluster {
            self.state.cluster_sizes[k] = self.state.tik.column(k).sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::gaussian::{GaussianMixture, GaussianVariance};
    use crate::mixture::core::data::MixtureData;
    use ndarray::array;

    fn gaussian_composer(nb_cluster: usize) -> MixtureComposer {
        let data = MixtureData::new(
            array![[0.0], [0.5], [1.0], [9.0], [9.5], [10.0]],
            vec![],
        )
        .unwrap();
        let component = GaussianMixture::new(data, nb_cluster, GaussianVariance::Free).unwrap();
        MixtureComposer::new(nb_cluster, vec![Box::new(component)], Some(1234)).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction validation (components present, sample counts agree).
    // - The state machine rejecting steps before initialization.
    // - Row-stochastic responsibilities and unit-sum proportions after
    //   E- and P-steps.
    // - Hardening semantics of the C- and S-steps and occupancy reporting.
    // - Free-parameter totals.
    //
    // They intentionally DO NOT cover:
    // - Full strategy runs; those live in the strategy and integration
    //   tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure construction rejects an empty component list and mismatched
    // sample counts.
    //
    // Given
    // -----
    // - No components; then two Gaussian blocks of different lengths.
    //
    // Expect
    // ------
    // - `NoComponents` and `SampleCountMismatch` respectively.
    fn constructor_validates_components() {
        // Act + Assert
        assert!(matches!(
            MixtureComposer::new(2, vec![], None),
            Err(MixtureError::NoComponents)
        ));

        let a = GaussianMixture::new(
            MixtureData::new(array![[0.0], [1.0], [2.0]], vec![]).unwrap(),
            2,
            GaussianVariance::Free,
        )
        .unwrap();
        let b = GaussianMixture::new(
            MixtureData::new(array![[0.0], [1.0]], vec![]).unwrap(),
            2,
            GaussianVariance::Free,
        )
        .unwrap();
        assert!(matches!(
            MixtureComposer::new(2, vec![Box::new(a), Box::new(b)], None),
            Err(MixtureError::SampleCountMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify the state machine rejects an E-step before initialization.
    //
    // Given
    // -----
    // - A freshly constructed composer.
    //
    // Expect
    // ------
    // - `Err(MixtureError::NotInitialized)` naming the operation.
    fn e_step_requires_initialization() {
        // Arrange
        let mut composer = gaussian_composer(2);

        // Act + Assert
        assert!(matches!(
            composer.e_step(),
            Err(MixtureError::NotInitialized { operation: "e_step" })
        ));
        assert_eq!(composer.status(), ComposerState::Created);
    }

    #[test]
    // Purpose
    // -------
    // Verify that initialization plus E-step leaves a row-stochastic
    // responsibility matrix and a populated log-likelihood, and that the
    // P-step renormalizes proportions to unit sum.
    //
    // Given
    // -----
    // - A two-cluster Gaussian composer over well-separated data.
    //
    // Expect
    // ------
    // - Every responsibility row sums to 1 within 1e-9; proportions sum to
    //   1 within 1e-9; the log-likelihood is finite.
    fn e_and_p_steps_maintain_stochasticity() {
        // Arrange
        let mut composer = gaussian_composer(2);

        // Act
        composer.random_class_init().expect("init should succeed on separated data");
        composer.p_step();

        // Assert
        for i in 0..composer.nb_sample() {
            let row_sum: f64 = composer.tik().row(i).sum();
            assert!((row_sum - 1.0).abs() < 1e-9, "row {i} sums to {row_sum}");
        }
        let prop_sum: f64 = composer.proportions().sum();
        assert!((prop_sum - 1.0).abs() < 1e-9);
        assert!(composer.ln_likelihood().is_finite());
        assert_eq!(composer.status(), ComposerState::Initialized);
    }

    #[test]
    // Purpose
    // -------
    // Verify hardening semantics: after a C-step every row is one-hot on
    // the MAP label and the reported occupancy is the smallest cluster
    // count.
    //
    // Given
    // -----
    // - An initialized two-cluster composer.
    //
    // Expect
    // ------
    // - One-hot rows consistent with `labels`; occupancies sum to n.
    fn c_step_hardens_to_map_labels() {
        // Arrange
        let mut composer = gaussian_composer(2);
        composer.random_class_init().unwrap();

        // Act
        let min_occupancy = composer.c_step();

        // Assert
        let mut counts = [0.0, 0.0];
        for i in 0..composer.nb_sample() {
            let label = composer.labels()[i];
            assert_eq!(composer.tik()[[i, label]], 1.0);
            assert_eq!(composer.tik().row(i).sum(), 1.0);
            counts[label] += 1.0;
        }
        assert_eq!(counts[0] + counts[1], composer.nb_sample() as f64);
        assert_eq!(min_occupancy, counts[0].min(counts[1]));
    }

    #[test]
    // Purpose
    // -------
    // Verify the S-step samples valid labels and hardens responsibilities,
    // with reproducible draws under a fixed seed.
    //
    // Given
    // -----
    // - An initialized two-cluster composer with seed 1234.
    //
    // Expect
    // ------
    // - Labels in range, one-hot rows, and min occupancy consistent with
    //   cluster sizes.
    fn s_step_samples_and_hardens() {
        // Arrange
        let mut composer = gaussian_composer(2);
        composer.random_class_init().unwrap();

        // Act
        let min_occupancy = composer.s_step().expect("rows are valid distributions");

        // Assert
        for i in 0..composer.nb_sample() {
            assert!(composer.labels()[i] < 2);
            assert_eq!(composer.tik().row(i).sum(), 1.0);
        }
        let sizes = composer.cluster_sizes();
        assert_eq!(min_occupancy, sizes[0].min(sizes[1]));
    }

    #[test]
    // Purpose
    // -------
    // Verify the mixture-level free-parameter count: K − 1 proportions plus
    // the component's own parameters.
    //
    // Given
    // -----
    // - A two-cluster free-variance Gaussian over one variable.
    //
    // Expect
    // ------
    // - (2 − 1) + (2 means + 2 sigmas) = 5.
    fn nb_free_parameters_includes_proportions() {
        // Arrange
        let composer = gaussian_composer(2);

        // Act + Assert
        assert_eq!(composer.nb_free_parameters(), 5);
    }
}
