//! Poisson family: one rate per cluster and variable.
//!
//! The M-step is fully closed form — rates are responsibility-weighted
//! column means — so this family needs no root finding. It fails only when
//! a cluster loses all responsibility mass.
//!
//! The log-pmf is evaluated by the explicit formula
//! `x ln λ − λ − ln Γ(x + 1)`, which extends continuously to the fractional
//! values produced by expectation imputation. The `λ = 0` edge is handled
//! exactly: probability 1 at `x = 0`, impossible (`-inf`) elsewhere.
use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};
use statrs::function::gamma::ln_gamma;

use crate::components::traits::MixtureComponent;
use crate::mixture::core::data::MixtureData;
use crate::mixture::core::statistics::MatrixStats;
use crate::mixture::core::validation::validate_count_entries;
use crate::mixture::errors::MixtureResult;
use crate::utils::weighted_mean;

/// Poisson component model with per-cluster-per-variable rates.
#[derive(Debug, Clone)]
pub struct PoissonMixture {
    data: MixtureData,
    nb_cluster: usize,
    /// Rates λ (K x d).
    rates: Array2<f64>,
    rate_stats: MatrixStats,
}

impl PoissonMixture {
    /// Construct the family over a count-valued data block.
    ///
    /// Observed entries must be non-negative integers; missing cells are
    /// filled with observed column means. Rates start at the column means.
    ///
    /// # Errors
    /// - [`crate::mixture::errors::MixtureError::NonIntegerData`] for a
    ///   fractional or negative observed entry.
    pub fn new(mut data: MixtureData, nb_cluster: usize) -> MixtureResult<Self> {
        validate_count_entries(&data)?;
        data.fill_missing_with_column_means();
        let nb_variable = data.nb_variable();
        let mut rates = Array2::zeros((nb_cluster, nb_variable));
        for j in 0..nb_variable {
            let mean = data.data.column(j).mean().unwrap_or(1.0).max(1e-3);
            rates.column_mut(j).fill(mean);
        }
        Ok(PoissonMixture {
            data,
            nb_cluster,
            rates,
            rate_stats: MatrixStats::new((nb_cluster, nb_variable)),
        })
    }

    /// Construct the family with already-fitted rates (predict path).
    pub fn with_parameters(mut data: MixtureData, rates: Array2<f64>) -> MixtureResult<Self> {
        validate_count_entries(&data)?;
        data.fill_missing_with_column_means();
        let nb_cluster = rates.nrows();
        let nb_variable = data.nb_variable();
        debug_assert_eq!(rates.ncols(), nb_variable);
        Ok(PoissonMixture {
            data,
            nb_cluster,
            rate_stats: MatrixStats::new((nb_cluster, nb_variable)),
            rates,
        })
    }

    /// Current rates (K x d).
    pub fn rates(&self) -> &Array2<f64> {
        &self.rates
    }

    /// Log-pmf of one observation under one rate, with the λ = 0 edge
    /// handled exactly.
    fn ln_pmf(x: f64, rate: f64) -> f64 {
        if rate <= 0.0 {
            return if x == 0.0 { 0.0 } else { f64::NEG_INFINITY };
        }
        x * rate.ln() - rate - ln_gamma(x + 1.0)
    }
}

impl MixtureComponent for PoissonMixture {
    fn name(&self) -> &'static str {
        "poisson"
    }

    fn nb_sample(&self) -> usize {
        self.data.nb_sample()
    }

    fn nb_variable(&self) -> usize {
        self.data.nb_variable()
    }

    fn ln_component_probability(&self, i: usize, k: usize) -> f64 {
        let mut ln_prob = 0.0;
        for j in 0..self.data.nb_variable() {
            let term = Self::ln_pmf(self.data.value(i, j), self.rates[[k, j]]);
            if term.is_nan() {
                return f64::NEG_INFINITY;
            }
            ln_prob += term;
        }
        ln_prob
    }

    /// Rates drawn from an Exponential with mean equal to the observed
    /// column mean, floored away from zero.
    fn random_init(&mut self, rng: &mut StdRng) {
        for j in 0..self.data.nb_variable() {
            let mean = self.data.data.column(j).mean().unwrap_or(1.0);
            let rate_param = if mean.is_finite() && mean > 0.0 { 1.0 / mean } else { 1.0 };
            for k in 0..self.nb_cluster {
                let draw = match Exp::new(rate_param) {
                    Ok(exp) => exp.sample(rng),
                    Err(_) => 1.0,
                };
                self.rates[[k, j]] = draw.max(1e-3);
            }
        }
    }

    fn m_step(&mut self, tik: ArrayView2<f64>) -> bool {
        let nb_variable = self.data.nb_variable();
        let mut new_rates = Array2::<f64>::zeros((self.nb_cluster, nb_variable));
        for k in 0..self.nb_cluster {
            let weights_k = tik.column(k);
            let w = weights_k.sum();
            if !w.is_finite() || w <= 0.0 {
                return false;
            }
            for j in 0..nb_variable {
                let rate = weighted_mean(self.data.data.column(j), weights_k, w);
                if !rate.is_finite() || rate < 0.0 {
                    return false;
                }
                new_rates[[k, j]] = rate;
            }
        }
        self.rates = new_rates;
        true
    }

    fn nb_free_parameters(&self) -> usize {
        self.nb_cluster * self.data.nb_variable()
    }

    fn resize_statistics(&mut self) {
        self.rate_stats.resize((self.nb_cluster, self.data.nb_variable()));
    }

    fn update_statistics(&mut self) {
        self.rate_stats.update(&self.rates);
    }

    fn set_parameters(&mut self) {
        self.rate_stats.set_into(&mut self.rates);
    }

    fn release_statistics(&mut self) {
        self.rate_stats.release();
    }

    fn has_missing(&self) -> bool {
        self.data.has_missing()
    }

    /// Missing cells take their posterior expectation Σ_k t_ik λ_kj.
    fn impute_step(&mut self, tik: ArrayView2<f64>) {
        let missing = self.data.missing().to_vec();
        for (i, j) in missing {
            let expected: f64 =
                (0..self.nb_cluster).map(|k| tik[[i, k]] * self.rates[[k, j]]).sum();
            self.data.data[[i, j]] = expected;
        }
    }

    /// Layout: one row per cluster holding its per-variable rates.
    fn param_table(&self) -> Array2<f64> {
        self.rates.clone()
    }
}
