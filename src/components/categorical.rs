//! Categorical family: per-cluster-per-variable probability vectors.
//!
//! Observations are integer modality indices in a globally declared range
//! `0..nb_modality`; the range is fixed at construction (explicitly or as
//! the maximum observed modality plus one) and never changes afterwards, so
//! every cluster's probability vectors share one layout.
//!
//! The M-step accumulates responsibility-weighted modality counts and
//! normalizes per cluster; each row of the probability cube then sums to 1
//! by construction. The step fails only when a cluster loses all
//! responsibility mass.
//!
//! Missing cells cannot hold a fractional column mean, so this family does
//! its own modal fill at construction (observed column mode) and imputes
//! with the responsibility-weighted most probable modality.
use ndarray::{Array2, Array3, ArrayView2};
use rand::rngs::StdRng;
use rand_distr::{Dirichlet, Distribution};

use crate::components::traits::MixtureComponent;
use crate::mixture::core::data::MixtureData;
use crate::mixture::core::statistics::CubeStats;
use crate::mixture::core::validation::validate_modality_entries;
use crate::mixture::errors::MixtureResult;

/// Categorical component model over a fixed modality range.
#[derive(Debug, Clone)]
pub struct CategoricalMixture {
    data: MixtureData,
    nb_cluster: usize,
    nb_modality: usize,
    /// Probabilities (K x d x m); each (k, j) row sums to 1.
    probas: Array3<f64>,
    proba_stats: CubeStats,
}

impl CategoricalMixture {
    /// Construct the family over an integer-valued data block.
    ///
    /// `nb_modality` declares the global modality range; pass `None` to use
    /// the maximum observed modality plus one. Missing cells are filled with
    /// the observed column mode. Probabilities start uniform.
    ///
    /// # Errors
    /// - [`crate::mixture::errors::MixtureError::NonIntegerData`] /
    ///   [`crate::mixture::errors::MixtureError::ModalityOutOfRange`] for
    ///   observed entries outside the declared range.
    pub fn new(
        mut data: MixtureData, nb_cluster: usize, nb_modality: Option<usize>,
    ) -> MixtureResult<Self> {
        let observed_max = {
            let missing: std::collections::HashSet<(usize, usize)> =
                data.missing().iter().copied().collect();
            data.data
                .indexed_iter()
                .filter(|(coord, _)| !missing.contains(&(coord.0, coord.1)))
                .map(|(_, &v)| v)
                .fold(0.0_f64, f64::max)
        };
        let nb_modality = nb_modality.unwrap_or(observed_max as usize + 1).max(1);
        validate_modality_entries(&data, nb_modality)?;
        Self::fill_missing_with_column_modes(&mut data, nb_modality);

        let nb_variable = data.nb_variable();
        let probas =
            Array3::from_elem((nb_cluster, nb_variable, nb_modality), 1.0 / nb_modality as f64);
        Ok(CategoricalMixture {
            data,
            nb_cluster,
            nb_modality,
            probas,
            proba_stats: CubeStats::new((nb_cluster, nb_variable, nb_modality)),
        })
    }

    /// Construct the family with already-fitted probabilities (predict
    /// path). The cube is (K x d x m).
    pub fn with_parameters(mut data: MixtureData, probas: Array3<f64>) -> MixtureResult<Self> {
        let (nb_cluster, nb_variable, nb_modality) = probas.dim();
        debug_assert_eq!(nb_variable, data.nb_variable());
        validate_modality_entries(&data, nb_modality)?;
        Self::fill_missing_with_column_modes(&mut data, nb_modality);
        Ok(CategoricalMixture {
            data,
            nb_cluster,
            nb_modality,
            proba_stats: CubeStats::new((nb_cluster, nb_variable, nb_modality)),
            probas,
        })
    }

    /// Current probability cube (K x d x m).
    pub fn probas(&self) -> &Array3<f64> {
        &self.probas
    }

    /// The declared modality range.
    pub fn nb_modality(&self) -> usize {
        self.nb_modality
    }

    /// Replace missing cells with the most frequent observed modality of
    /// their column (ties broken toward the smaller index).
    fn fill_missing_with_column_modes(data: &mut MixtureData, nb_modality: usize) {
        if !data.has_missing() {
            return;
        }
        let missing: std::collections::HashSet<(usize, usize)> =
            data.missing().iter().copied().collect();
        let nb_variable = data.nb_variable();
        let mut modes = vec![0.0_f64; nb_variable];
        for j in 0..nb_variable {
            let mut counts = vec![0_usize; nb_modality];
            for (i, &value) in data.data.column(j).iter().enumerate() {
                if !missing.contains(&(i, j)) {
                    counts[value as usize] += 1;
                }
            }
            let mode = counts
                .iter()
                .enumerate()
                .max_by_key(|&(index, &count)| (count, std::cmp::Reverse(index)))
                .map(|(index, _)| index)
                .unwrap_or(0);
            modes[j] = mode as f64;
        }
        let coords = data.missing().to_vec();
        for (i, j) in coords {
            data.data[[i, j]] = modes[j];
        }
    }
}

impl MixtureComponent for CategoricalMixture {
    fn name(&self) -> &'static str {
        "categorical"
    }

    fn nb_sample(&self) -> usize {
        self.data.nb_sample()
    }

    fn nb_variable(&self) -> usize {
        self.data.nb_variable()
    }

    /// Sum over variables of `ln P[k, j, x_ij]`; a zero probability yields
    /// `-inf`, never NaN.
    fn ln_component_probability(&self, i: usize, k: usize) -> f64 {
        let mut ln_prob = 0.0;
        for j in 0..self.data.nb_variable() {
            let modality = self.data.value(i, j) as usize;
            let p = self.probas[[k, j, modality]];
            if p <= 0.0 {
                return f64::NEG_INFINITY;
            }
            ln_prob += p.ln();
        }
        ln_prob
    }

    /// Each (cluster, variable) probability vector is drawn from a flat
    /// Dirichlet, which is supported on the open simplex and therefore
    /// always inside the valid domain.
    fn random_init(&mut self, rng: &mut StdRng) {
        if self.nb_modality == 1 {
            self.probas.fill(1.0);
            return;
        }
        let dirichlet = match Dirichlet::new_with_size(1.0, self.nb_modality) {
            Ok(d) => d,
            Err(_) => return,
        };
        for k in 0..self.nb_cluster {
            for j in 0..self.data.nb_variable() {
                let draw = dirichlet.sample(rng);
                for (m, &p) in draw.iter().enumerate() {
                    self.probas[[k, j, m]] = p;
                }
            }
        }
    }

    fn m_step(&mut self, tik: ArrayView2<f64>) -> bool {
        let nb_variable = self.data.nb_variable();
        let mut new_probas = Array3::<f64>::zeros((self.nb_cluster, nb_variable, self.nb_modality));
        for k in 0..self.nb_cluster {
            let w = tik.column(k).sum();
            if !w.is_finite() || w <= 0.0 {
                return false;
            }
            for i in 0..self.data.nb_sample() {
                let t = tik[[i, k]];
                for j in 0..nb_variable {
                    let modality = self.data.value(i, j) as usize;
                    new_probas[[k, j, modality]] += t;
                }
            }
            for j in 0..nb_variable {
                for m in 0..self.nb_modality {
                    new_probas[[k, j, m]] /= w;
                }
            }
        }
        self.probas = new_probas;
        true
    }

    fn nb_free_parameters(&self) -> usize {
        self.nb_cluster * self.data.nb_variable() * (self.nb_modality - 1)
    }

    fn resize_statistics(&mut self) {
        self.proba_stats.resize((self.nb_cluster, self.data.nb_variable(), self.nb_modality));
    }

    fn update_statistics(&mut self) {
        self.proba_stats.update(&self.probas);
    }

    fn set_parameters(&mut self) {
        self.proba_stats.set_into(&mut self.probas);
    }

    fn release_statistics(&mut self) {
        self.proba_stats.release();
    }

    fn has_missing(&self) -> bool {
        self.data.has_missing()
    }

    /// Missing cells take the responsibility-weighted most probable
    /// modality, `argmax_m Σ_k t_ik P[k, j, m]`, so imputed values stay
    /// valid modality indices.
    fn impute_step(&mut self, tik: ArrayView2<f64>) {
        let missing = self.data.missing().to_vec();
        for (i, j) in missing {
            let mut best = 0;
            let mut best_score = f64::NEG_INFINITY;
            for m in 0..self.nb_modality {
                let score: f64 =
                    (0..self.nb_cluster).map(|k| tik[[i, k]] * self.probas[[k, j, m]]).sum();
                if score > best_score {
                    best_score = score;
                    best = m;
                }
            }
            self.data.data[[i, j]] = best as f64;
        }
    }

    /// Layout: `m` rows per cluster — row `k·m + q` holds, per variable,
    /// the probability of modality `q` under cluster `k`.
    fn param_table(&self) -> Array2<f64> {
        let nb_variable = self.data.nb_variable();
        let mut table = Array2::zeros((self.nb_cluster * self.nb_modality, nb_variable));
        for k in 0..self.nb_cluster {
            for j in 0..nb_variable {
                for m in 0..self.nb_modality {
                    table[[k * self.nb_modality + m, j]] = self.probas[[k, j, m]];
                }
            }
        }
        table
    }
}
