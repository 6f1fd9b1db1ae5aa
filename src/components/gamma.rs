//! Gamma family with cluster-shared scale and per-variable shape.
//!
//! Model: `x_ij | cluster k ~ Gamma(shape_j, scale_k)` — one shape per
//! variable shared across clusters, one scale per cluster shared across
//! variables. Each shared parameter is stored exactly once and read by every
//! per-cluster computation.
//!
//! ## M-step
//! The maximum-likelihood system has no closed form. The step runs a
//! coordinate ascent on the expected complete-data log-likelihood (the
//! q-value):
//!
//! 1. For each variable `j`, solve
//!    `digamma(shape_j) = Σ_k (L_kj − w_k ln scale_k) / n`
//!    with [`inverse_digamma`], seeded at the current shape. A non-finite
//!    root is replaced by the moment estimate `mean² / var` (graceful
//!    degradation); the step only fails when that fallback is itself outside
//!    the domain.
//! 2. Every scale is updated in closed form:
//!    `scale_k = Σ_j S1_kj / (w_k Σ_j shape_j)`.
//!
//! The ascent stops when the q-value improves by less than
//! `MStepOptions::epsilon` or after `MStepOptions::max_iter` rounds; hitting
//! the cap is normal termination. Here `S1_kj = Σ_i t_ik x_ij` and
//! `L_kj = Σ_i t_ik ln x_ij` are the responsibility-weighted sufficient
//! statistics and `w_k` the cluster masses.
use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use statrs::function::gamma::ln_gamma;

use crate::components::traits::{MStepOptions, MixtureComponent};
use crate::mixture::core::data::MixtureData;
use crate::mixture::core::statistics::VectorStats;
use crate::mixture::core::validation::validate_positive_entries;
use crate::mixture::errors::MixtureResult;
use crate::rootfind::{inverse_digamma, RootOptions};
use crate::utils::column_variance;

/// Gamma component model with per-variable shapes and per-cluster scales.
#[derive(Debug, Clone)]
pub struct GammaMixture {
    data: MixtureData,
    nb_cluster: usize,
    /// One shape per variable, shared across clusters.
    shapes: Array1<f64>,
    /// One scale per cluster, shared across variables.
    scales: Array1<f64>,
    shape_stats: VectorStats,
    scale_stats: VectorStats,
    m_step_opts: MStepOptions,
    root_opts: RootOptions,
}

impl GammaMixture {
    /// Construct the family over a strictly positive data block.
    ///
    /// Observed entries must be strictly positive (the Gamma domain);
    /// missing cells are filled with observed column means. Parameters start
    /// at the moment estimates.
    ///
    /// # Errors
    /// - [`crate::mixture::errors::MixtureError::NonPositiveData`] for a
    ///   non-positive observed entry.
    pub fn new(
        mut data: MixtureData, nb_cluster: usize, m_step_opts: MStepOptions,
        root_opts: RootOptions,
    ) -> MixtureResult<Self> {
        validate_positive_entries(&data)?;
        data.fill_missing_with_column_means();
        let nb_variable = data.nb_variable();
        let mut component = GammaMixture {
            data,
            nb_cluster,
            shapes: Array1::from_elem(nb_variable, 1.0),
            scales: Array1::from_elem(nb_cluster, 1.0),
            shape_stats: VectorStats::new(nb_variable),
            scale_stats: VectorStats::new(nb_cluster),
            m_step_opts,
            root_opts,
        };
        component.moment_init();
        Ok(component)
    }

    /// Construct the family with already-fitted parameters (predict path).
    pub fn with_parameters(
        mut data: MixtureData, shapes: Array1<f64>, scales: Array1<f64>,
        m_step_opts: MStepOptions, root_opts: RootOptions,
    ) -> MixtureResult<Self> {
        validate_positive_entries(&data)?;
        data.fill_missing_with_column_means();
        let nb_variable = data.nb_variable();
        let nb_cluster = scales.len();
        debug_assert_eq!(shapes.len(), nb_variable);
        Ok(GammaMixture {
            data,
            nb_cluster,
            shape_stats: VectorStats::new(nb_variable),
            scale_stats: VectorStats::new(nb_cluster),
            shapes,
            scales,
            m_step_opts,
            root_opts,
        })
    }

    /// Current per-variable shapes.
    pub fn shapes(&self) -> &Array1<f64> {
        &self.shapes
    }

    /// Current per-cluster scales.
    pub fn scales(&self) -> &Array1<f64> {
        &self.scales
    }

    /// Per-variable moment estimate of the shape, `mean² / var`, from
    /// unweighted column moments. Entries are NaN when a column variance is
    /// not strictly positive; callers must check the domain.
    fn moment_shapes(&self) -> Array1<f64> {
        let nb_variable = self.data.nb_variable();
        let mut shapes = Array1::from_elem(nb_variable, f64::NAN);
        for j in 0..nb_variable {
            let column = self.data.data.column(j);
            let mean = column.mean().unwrap_or(f64::NAN);
            if !mean.is_finite() {
                continue;
            }
            let var = column_variance(column, mean);
            if var.is_finite() && var > 0.0 {
                shapes[j] = mean * mean / var;
            }
        }
        shapes
    }

    /// Seed shapes at their moment estimates and scales at `mean / shape`.
    fn moment_init(&mut self) {
        let moment = self.moment_shapes();
        for (shape, m) in self.shapes.iter_mut().zip(moment.iter()) {
            *shape = if m.is_finite() && *m > 0.0 { *m } else { 1.0 };
        }
        let base = self.base_scale();
        self.scales.fill(base);
    }

    /// A domain-safe scale seed: the average of `mean_j / shape_j`.
    fn base_scale(&self) -> f64 {
        let nb_variable = self.data.nb_variable() as f64;
        let base: f64 = (0..self.data.nb_variable())
            .map(|j| {
                let mean = self.data.data.column(j).mean().unwrap_or(1.0);
                mean / self.shapes[j]
            })
            .sum::<f64>()
            / nb_variable;
        if base.is_finite() && base > 0.0 { base } else { 1.0 }
    }

    /// Expected complete-data log-likelihood given the sufficient
    /// statistics; the coordinate ascent's objective.
    fn q_value(
        &self, shapes: &Array1<f64>, scales: &Array1<f64>, s1: &Array2<f64>, lx: &Array2<f64>,
        weights: &Array1<f64>,
    ) -> f64 {
        let mut q = 0.0;
        for k in 0..self.nb_cluster {
            let ln_scale = scales[k].ln();
            for j in 0..self.data.nb_variable() {
                q += (shapes[j] - 1.0) * lx[[k, j]] - s1[[k, j]] / scales[k]
                    - weights[k] * (shapes[j] * ln_scale + ln_gamma(shapes[j]));
            }
        }
        q
    }
}

impl MixtureComponent for GammaMixture {
    fn name(&self) -> &'static str {
        "gamma"
    }

    fn nb_sample(&self) -> usize {
        self.data.nb_sample()
    }

    fn nb_variable(&self) -> usize {
        self.data.nb_variable()
    }

    /// Sum over variables of the Gamma log-density
    /// `(a_j − 1) ln x − x / b_k − a_j ln b_k − ln Γ(a_j)`.
    fn ln_component_probability(&self, i: usize, k: usize) -> f64 {
        let scale = self.scales[k];
        let ln_scale = scale.ln();
        let mut ln_prob = 0.0;
        for j in 0..self.data.nb_variable() {
            let x = self.data.value(i, j);
            if x <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let shape = self.shapes[j];
            let term = (shape - 1.0) * x.ln() - x / scale - shape * ln_scale - ln_gamma(shape);
            if term.is_nan() {
                return f64::NEG_INFINITY;
            }
            ln_prob += term;
        }
        ln_prob
    }

    /// Shapes drawn from an Exponential whose rate is `var_j / mean_j²`
    /// (expected value at the moment estimate); scales at `mean / shape`
    /// with a per-cluster multiplicative jitter to break symmetry.
    fn random_init(&mut self, rng: &mut StdRng) {
        for j in 0..self.data.nb_variable() {
            let column = self.data.data.column(j);
            let mean = column.mean().unwrap_or(1.0);
            let var = column_variance(column, mean);
            let rate = if mean.is_finite() && mean != 0.0 && var.is_finite() && var > 0.0 {
                var / (mean * mean)
            } else {
                1.0
            };
            let draw = match Exp::new(rate) {
                Ok(exp) => exp.sample(rng),
                Err(_) => 1.0,
            };
            self.shapes[j] = draw.max(0.05);
        }
        let base = self.base_scale();
        for scale in self.scales.iter_mut() {
            *scale = base * rng.gen_range(0.5..1.5);
        }
    }

    fn m_step(&mut self, tik: ArrayView2<f64>) -> bool {
        let nb_variable = self.data.nb_variable();
        let nb_sample = self.data.nb_sample();

        let mut weights = Array1::<f64>::zeros(self.nb_cluster);
        for k in 0..self.nb_cluster {
            let w = tik.column(k).sum();
            if !w.is_finite() || w <= 0.0 {
                return false;
            }
            weights[k] = w;
        }
        let n_eff: f64 = weights.sum();

        // Responsibility-weighted sufficient statistics.
        let mut s1 = Array2::<f64>::zeros((self.nb_cluster, nb_variable));
        let mut lx = Array2::<f64>::zeros((self.nb_cluster, nb_variable));
        for i in 0..nb_sample {
            for j in 0..nb_variable {
                let x = self.data.value(i, j);
                let ln_x = x.ln();
                for k in 0..self.nb_cluster {
                    let t = tik[[i, k]];
                    s1[[k, j]] += t * x;
                    lx[[k, j]] += t * ln_x;
                }
            }
        }

        let moment = self.moment_shapes();
        let mut shapes = self.shapes.clone();
        let mut scales = self.scales.clone();
        let mut prev_q = f64::NEG_INFINITY;

        for _ in 0..self.m_step_opts.max_iter {
            // Shape solves, one variable at a time, seeded at the current
            // shape. Non-finite roots degrade to the moment estimate.
            for j in 0..nb_variable {
                let target = (0..self.nb_cluster)
                    .map(|k| lx[[k, j]] - weights[k] * scales[k].ln())
                    .sum::<f64>()
                    / n_eff;
                let mut shape = inverse_digamma(target, shapes[j], &self.root_opts);
                if !shape.is_finite() || shape <= 0.0 {
                    shape = moment[j];
                    if !shape.is_finite() || shape <= 0.0 {
                        return false;
                    }
                }
                shapes[j] = shape;
            }

            // Closed-form scale update for every cluster.
            let shape_sum: f64 = shapes.sum();
            for k in 0..self.nb_cluster {
                let scale = s1.row(k).sum() / (weights[k] * shape_sum);
                if !scale.is_finite() || scale <= 0.0 {
                    return false;
                }
                scales[k] = scale;
            }

            let q = self.q_value(&shapes, &scales, &s1, &lx, &weights);
            if !q.is_finite() {
                return false;
            }
            if (q - prev_q).abs() < self.m_step_opts.epsilon {
                break;
            }
            prev_q = q;
        }

        self.shapes = shapes;
        self.scales = scales;
        true
    }

    fn nb_free_parameters(&self) -> usize {
        self.data.nb_variable() + self.nb_cluster
    }

    fn resize_statistics(&mut self) {
        self.shape_stats.resize(self.data.nb_variable());
        self.scale_stats.resize(self.nb_cluster);
    }

    fn update_statistics(&mut self) {
        self.shape_stats.update(&self.shapes);
        self.scale_stats.update(&self.scales);
    }

    fn set_parameters(&mut self) {
        self.shape_stats.set_into(&mut self.shapes);
        self.scale_stats.set_into(&mut self.scales);
    }

    fn release_statistics(&mut self) {
        self.shape_stats.release();
        self.scale_stats.release();
    }

    fn has_missing(&self) -> bool {
        self.data.has_missing()
    }

    /// Missing cells take their posterior expectation
    /// `shape_j · Σ_k t_ik scale_k`.
    fn impute_step(&mut self, tik: ArrayView2<f64>) {
        let missing = self.data.missing().to_vec();
        for (i, j) in missing {
            let expected_scale: f64 =
                (0..self.nb_cluster).map(|k| tik[[i, k]] * self.scales[k]).sum();
            self.data.data[[i, j]] = self.shapes[j] * expected_scale;
        }
    }

    /// Layout: two rows per cluster — row `2k` holds the per-variable
    /// shapes (identical for every cluster), row `2k + 1` cluster `k`'s
    /// scale replicated across variables.
    fn param_table(&self) -> Array2<f64> {
        let nb_variable = self.data.nb_variable();
        let mut table = Array2::zeros((2 * self.nb_cluster, nb_variable));
        for k in 0..self.nb_cluster {
            for j in 0..nb_variable {
                table[[2 * k, j]] = self.shapes[j];
                table[[2 * k + 1, j]] = self.scales[k];
            }
        }
        table
    }
}
