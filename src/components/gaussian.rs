//! Diagonal Gaussian family with selectable variance pooling.
//!
//! Each cluster carries one mean per variable; the standard deviations are
//! pooled according to [`GaussianVariance`]:
//!
//! - `Free`: one sigma per cluster and variable (K·d sigmas),
//! - `Cluster`: one sigma per cluster, shared across variables (K),
//! - `Variable`: one sigma per variable, shared across clusters (d),
//! - `Pooled`: a single sigma shared by everything (1).
//!
//! Pooled sigmas are stored exactly once in a flat vector sized by the
//! variant; per-cluster computations read through [`GaussianMixture::sigma`]
//! rather than holding duplicated copies.
//!
//! ## M-step
//! Means are the responsibility-weighted column means. Variances are the
//! corresponding weighted second moments, averaged across whichever
//! dimensions the variant shares. The step fails (`false`) when a cluster
//! loses all responsibility mass or a pooled variance is non-positive or
//! non-finite — degenerate inputs must surface as failures, never as silent
//! zero or NaN sigmas.
use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::Rng;

use crate::components::traits::MixtureComponent;
use crate::mixture::core::data::MixtureData;
use crate::mixture::core::statistics::{MatrixStats, VectorStats};
use crate::mixture::errors::MixtureResult;
use crate::utils::{column_variance, weighted_mean, weighted_variance};

/// Variance-pooling variant for the diagonal Gaussian family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaussianVariance {
    /// One sigma per cluster and variable.
    Free,
    /// One sigma per cluster, shared across variables.
    Cluster,
    /// One sigma per variable, shared across clusters.
    Variable,
    /// A single sigma shared by all clusters and variables.
    Pooled,
}

impl GaussianVariance {
    /// Number of sigma slots for `nb_cluster` clusters and `nb_variable`
    /// variables under this pooling.
    fn nb_sigma(&self, nb_cluster: usize, nb_variable: usize) -> usize {
        match self {
            GaussianVariance::Free => nb_cluster * nb_variable,
            GaussianVariance::Cluster => nb_cluster,
            GaussianVariance::Variable => nb_variable,
            GaussianVariance::Pooled => 1,
        }
    }

    /// Flat index of the sigma governing cluster `k`, variable `j`.
    fn sigma_index(&self, k: usize, j: usize, nb_variable: usize) -> usize {
        match self {
            GaussianVariance::Free => k * nb_variable + j,
            GaussianVariance::Cluster => k,
            GaussianVariance::Variable => j,
            GaussianVariance::Pooled => 0,
        }
    }
}

/// Diagonal Gaussian component model.
///
/// Parameters: `means` (K x d) and a flat `sigmas` vector holding each
/// pooled standard deviation exactly once. Statistics accumulators mirror
/// both fields for SEM averaging.
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    data: MixtureData,
    nb_cluster: usize,
    variance: GaussianVariance,
    means: Array2<f64>,
    sigmas: Array1<f64>,
    mean_stats: MatrixStats,
    sigma_stats: VectorStats,
}

impl GaussianMixture {
    /// Construct the family over a validated data block.
    ///
    /// Missing cells are filled with observed column means so the first
    /// E-step sees complete data. Parameters start at the observed column
    /// moments (every cluster identical); call `random_init` or supply
    /// fitted parameters before estimation.
    pub fn new(
        mut data: MixtureData, nb_cluster: usize, variance: GaussianVariance,
    ) -> MixtureResult<Self> {
        data.fill_missing_with_column_means();
        let nb_variable = data.nb_variable();
        let nb_sigma = variance.nb_sigma(nb_cluster, nb_variable);
        let mut component = GaussianMixture {
            data,
            nb_cluster,
            variance,
            means: Array2::zeros((nb_cluster, nb_variable)),
            sigmas: Array1::from_elem(nb_sigma, 1.0),
            mean_stats: MatrixStats::new((nb_cluster, nb_variable)),
            sigma_stats: VectorStats::new(nb_sigma),
        };
        component.moment_init();
        Ok(component)
    }

    /// Construct the family with already-fitted parameters (predict path).
    ///
    /// `sigmas` must have the flat length implied by the variant; all
    /// entries must be strictly positive.
    pub fn with_parameters(
        mut data: MixtureData, variance: GaussianVariance, means: Array2<f64>,
        sigmas: Array1<f64>,
    ) -> MixtureResult<Self> {
        data.fill_missing_with_column_means();
        let nb_cluster = means.nrows();
        let nb_variable = data.nb_variable();
        let nb_sigma = variance.nb_sigma(nb_cluster, nb_variable);
        debug_assert_eq!(sigmas.len(), nb_sigma);
        Ok(GaussianMixture {
            data,
            nb_cluster,
            variance,
            means,
            mean_stats: MatrixStats::new((nb_cluster, nb_variable)),
            sigma_stats: VectorStats::new(nb_sigma),
            sigmas,
        })
    }

    /// The sigma governing cluster `k`, variable `j`.
    pub fn sigma(&self, k: usize, j: usize) -> f64 {
        self.sigmas[self.variance.sigma_index(k, j, self.data.nb_variable())]
    }

    /// Current means (K x d).
    pub fn means(&self) -> &Array2<f64> {
        &self.means
    }

    /// Seed every cluster at the observed column moments.
    fn moment_init(&mut self) {
        let nb_variable = self.data.nb_variable();
        for j in 0..nb_variable {
            let column = self.data.data.column(j);
            let mean = column.mean().unwrap_or(0.0);
            let std = column_variance(column, mean).sqrt();
            let std = if std.is_finite() && std > 0.0 { std } else { 1.0 };
            for k in 0..self.nb_cluster {
                self.means[[k, j]] = mean;
                let idx = self.variance.sigma_index(k, j, nb_variable);
                self.sigmas[idx] = std;
            }
        }
    }
}

impl MixtureComponent for GaussianMixture {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn nb_sample(&self) -> usize {
        self.data.nb_sample()
    }

    fn nb_variable(&self) -> usize {
        self.data.nb_variable()
    }

    /// Sum over variables of the diagonal Gaussian log-density.
    fn ln_component_probability(&self, i: usize, k: usize) -> f64 {
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        let mut ln_prob = 0.0;
        for j in 0..self.data.nb_variable() {
            let sigma = self.sigma(k, j);
            let standardized = (self.data.value(i, j) - self.means[[k, j]]) / sigma;
            let term = -sigma.ln() - 0.5 * ln_2pi - 0.5 * standardized * standardized;
            if term.is_nan() {
                return f64::NEG_INFINITY;
            }
            ln_prob += term;
        }
        ln_prob
    }

    /// Means drawn from randomly chosen observations; sigmas at the observed
    /// column moments (pooled per variant). Always lands in the valid
    /// domain: the sigma floor is 1.0 when a column is constant.
    fn random_init(&mut self, rng: &mut StdRng) {
        self.moment_init();
        let nb_sample = self.data.nb_sample();
        for k in 0..self.nb_cluster {
            let row = rng.gen_range(0..nb_sample);
            for j in 0..self.data.nb_variable() {
                self.means[[k, j]] = self.data.value(row, j);
            }
        }
    }

    fn m_step(&mut self, tik: ArrayView2<f64>) -> bool {
        let nb_variable = self.data.nb_variable();
        let nb_sample = self.data.nb_sample() as f64;

        // Cluster masses; an emptied cluster is a hard degeneracy.
        let mut weights = Array1::<f64>::zeros(self.nb_cluster);
        for k in 0..self.nb_cluster {
            let w = tik.column(k).sum();
            if !w.is_finite() || w <= 0.0 {
                return false;
            }
            weights[k] = w;
        }

        // Weighted means, then weighted second moments around them.
        let mut new_means = Array2::<f64>::zeros((self.nb_cluster, nb_variable));
        let mut moments = Array2::<f64>::zeros((self.nb_cluster, nb_variable));
        for k in 0..self.nb_cluster {
            let weights_k = tik.column(k);
            for j in 0..nb_variable {
                let column = self.data.data.column(j);
                let mean = weighted_mean(column, weights_k, weights[k]);
                if !mean.is_finite() {
                    return false;
                }
                new_means[[k, j]] = mean;
                moments[[k, j]] = weighted_variance(column, weights_k, weights[k], mean);
            }
        }

        // Pool the second moments across whichever dimensions the variant
        // shares, then validate before committing.
        let nb_sigma = self.variance.nb_sigma(self.nb_cluster, nb_variable);
        let mut new_sigmas = Array1::<f64>::zeros(nb_sigma);
        match self.variance {
            GaussianVariance::Free => {
                for k in 0..self.nb_cluster {
                    for j in 0..nb_variable {
                        new_sigmas[k * nb_variable + j] = moments[[k, j]];
                    }
                }
            }
            GaussianVariance::Cluster => {
                for k in 0..self.nb_cluster {
                    new_sigmas[k] = moments.row(k).sum() / nb_variable as f64;
                }
            }
            GaussianVariance::Variable => {
                for j in 0..nb_variable {
                    let pooled: f64 =
                        (0..self.nb_cluster).map(|k| weights[k] * moments[[k, j]]).sum();
                    new_sigmas[j] = pooled / nb_sample;
                }
            }
            GaussianVariance::Pooled => {
                let pooled: f64 = (0..self.nb_cluster)
                    .map(|k| weights[k] * moments.row(k).sum())
                    .sum();
                new_sigmas[0] = pooled / (nb_sample * nb_variable as f64);
            }
        }
        for variance in new_sigmas.iter_mut() {
            if !variance.is_finite() || *variance <= 0.0 {
                return false;
            }
            *variance = variance.sqrt();
        }

        self.means = new_means;
        self.sigmas = new_sigmas;
        true
    }

    fn nb_free_parameters(&self) -> usize {
        let nb_variable = self.data.nb_variable();
        self.nb_cluster * nb_variable + self.variance.nb_sigma(self.nb_cluster, nb_variable)
    }

    fn resize_statistics(&mut self) {
        let nb_variable = self.data.nb_variable();
        self.mean_stats.resize((self.nb_cluster, nb_variable));
        self.sigma_stats.resize(self.variance.nb_sigma(self.nb_cluster, nb_variable));
    }

    fn update_statistics(&mut self) {
        self.mean_stats.update(&self.means);
        self.sigma_stats.update(&self.sigmas);
    }

    fn set_parameters(&mut self) {
        self.mean_stats.set_into(&mut self.means);
        self.sigma_stats.set_into(&mut self.sigmas);
    }

    fn release_statistics(&mut self) {
        self.mean_stats.release();
        self.sigma_stats.release();
    }

    fn has_missing(&self) -> bool {
        self.data.has_missing()
    }

    /// Missing cells take their posterior expectation Σ_k t_ik μ_kj.
    fn impute_step(&mut self, tik: ArrayView2<f64>) {
        let missing = self.data.missing().to_vec();
        for (i, j) in missing {
            let expected: f64 =
                (0..self.nb_cluster).map(|k| tik[[i, k]] * self.means[[k, j]]).sum();
            self.data.data[[i, j]] = expected;
        }
    }

    /// Layout: two rows per cluster — row `2k` holds cluster `k`'s means,
    /// row `2k + 1` the (pooled) sigmas expanded per variable.
    fn param_table(&self) -> Array2<f64> {
        let nb_variable = self.data.nb_variable();
        let mut table = Array2::zeros((2 * self.nb_cluster, nb_variable));
        for k in 0..self.nb_cluster {
            for j in 0..nb_variable {
                table[[2 * k, j]] = self.means[[k, j]];
                table[[2 * k + 1, j]] = self.sigma(k, j);
            }
        }
        table
    }
}
