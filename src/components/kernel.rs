//! Kernel-space Gaussian family over a precomputed Gram matrix.
//!
//! Instead of raw coordinates, this family consumes an N x N Gram matrix of
//! feature-space inner products `G_ij = <φ(x_i), φ(x_j)>` together with an
//! externally supplied effective dimension. The squared distance of sample
//! `i` to cluster `k`'s feature-space centroid is computed from the Gram
//! entries alone:
//!
//! `d²_ik = G_ii − (2 / w_k) Σ_j t_jk G_ij + (1 / w_k²) Σ_{j,l} t_jk t_lk G_jl`
//!
//! and the per-cluster variance is the responsibility-weighted mean of
//! `d²_ik` divided by the effective dimension. The log-density is the
//! isotropic Gaussian in kernel space.
//!
//! ## Gram precomputation
//! [`linear_gram`] and [`rbf_gram`] build the Gram matrix ahead of fitting.
//! The RBF helper is embarrassingly parallel over pairwise entries and
//! accepts an optional thread-count hint; the resulting matrix is read-only
//! input for the (strictly sequential) estimation core.
use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;

use crate::components::traits::MixtureComponent;
use crate::mixture::core::statistics::VectorStats;
use crate::mixture::errors::{MixtureError, MixtureResult};

/// Kernel-space Gaussian component model.
///
/// Owns the Gram matrix, the per-cluster variances, and the cached squared
/// distances to cluster centroids (refreshed by every M-step).
#[derive(Debug, Clone)]
pub struct KernelGaussian {
    gram: Array2<f64>,
    effective_dim: f64,
    nb_cluster: usize,
    /// Per-cluster kernel-space variances σ²_k.
    sigma2: Array1<f64>,
    /// Squared distances to centroids (N x K), from the last refresh.
    dist2: Array2<f64>,
    sigma2_stats: VectorStats,
}

impl KernelGaussian {
    /// Construct the family over a validated Gram matrix.
    ///
    /// # Errors
    /// - [`MixtureError::InvalidGramMatrix`] for a non-square or empty
    ///   matrix, or non-finite entries.
    /// - [`MixtureError::InvalidEffectiveDim`] for a non-positive or
    ///   non-finite effective dimension.
    pub fn new(
        gram: Array2<f64>, nb_cluster: usize, effective_dim: f64,
    ) -> MixtureResult<Self> {
        let (nb_row, nb_col) = gram.dim();
        if nb_row == 0 || nb_row != nb_col {
            return Err(MixtureError::InvalidGramMatrix {
                nb_row,
                nb_col,
                reason: "the Gram matrix must be square and non-empty.",
            });
        }
        if gram.iter().any(|v| !v.is_finite()) {
            return Err(MixtureError::InvalidGramMatrix {
                nb_row,
                nb_col,
                reason: "the Gram matrix must contain only finite entries.",
            });
        }
        if !effective_dim.is_finite() || effective_dim <= 0.0 {
            return Err(MixtureError::InvalidEffectiveDim { value: effective_dim });
        }
        let mut component = KernelGaussian {
            gram,
            effective_dim,
            nb_cluster,
            sigma2: Array1::from_elem(nb_cluster, 1.0),
            dist2: Array2::zeros((nb_row, nb_cluster)),
            sigma2_stats: VectorStats::new(nb_cluster),
        };
        // A deterministic uniform-responsibility pass gives every cluster a
        // sane variance before any initialization strategy runs.
        let uniform = Array2::from_elem((nb_row, nb_cluster), 1.0 / nb_cluster as f64);
        component.refresh(uniform.view());
        Ok(component)
    }

    /// Per-cluster kernel-space standard deviations.
    pub fn sigmas(&self) -> Array1<f64> {
        self.sigma2.mapv(f64::sqrt)
    }

    /// Recompute centroid distances and variances from responsibilities,
    /// flooring degenerate variances instead of failing (used by
    /// initialization only; the M-step proper rejects degeneracy).
    fn refresh(&mut self, tik: ArrayView2<f64>) {
        if self.compute_distances(tik) {
            let floor = self.variance_floor();
            for k in 0..self.nb_cluster {
                let w: f64 = tik.column(k).sum();
                let sigma2 = self.weighted_variance(tik, k, w);
                self.sigma2[k] =
                    if sigma2.is_finite() && sigma2 > 0.0 { sigma2 } else { floor };
            }
        }
    }

    /// Squared distances of every sample to every cluster centroid; `false`
    /// when a cluster has no responsibility mass.
    fn compute_distances(&mut self, tik: ArrayView2<f64>) -> bool {
        let nb_sample = self.gram.nrows();
        for k in 0..self.nb_cluster {
            let weights_k = tik.column(k);
            let w: f64 = weights_k.sum();
            if !w.is_finite() || w <= 0.0 {
                return false;
            }
            // Centroid self-inner-product (1 / w²) Σ_{j,l} t_jk t_lk G_jl.
            let mut centroid_norm = 0.0;
            for j in 0..nb_sample {
                let t_j = weights_k[j];
                if t_j == 0.0 {
                    continue;
                }
                let row = self.gram.row(j);
                let mut inner = 0.0;
                for l in 0..nb_sample {
                    inner += weights_k[l] * row[l];
                }
                centroid_norm += t_j * inner;
            }
            centroid_norm /= w * w;

            for i in 0..nb_sample {
                let row = self.gram.row(i);
                let mut cross = 0.0;
                for j in 0..nb_sample {
                    cross += weights_k[j] * row[j];
                }
                let d2 = self.gram[[i, i]] - 2.0 * cross / w + centroid_norm;
                self.dist2[[i, k]] = d2.max(0.0);
            }
        }
        true
    }

    /// Responsibility-weighted mean squared distance divided by the
    /// effective dimension.
    fn weighted_variance(&self, tik: ArrayView2<f64>, k: usize, w: f64) -> f64 {
        let total: f64 = self
            .dist2
            .column(k)
            .iter()
            .zip(tik.column(k).iter())
            .map(|(&d2, &t)| t * d2)
            .sum();
        total / (w * self.effective_dim)
    }

    /// A positive fallback variance: the mean Gram diagonal scaled down,
    /// used only to keep initialization inside the domain.
    fn variance_floor(&self) -> f64 {
        let diag_mean =
            (0..self.gram.nrows()).map(|i| self.gram[[i, i]]).sum::<f64>() / self.gram.nrows() as f64;
        let floor = 1e-3 * diag_mean.abs() / self.effective_dim;
        if floor.is_finite() && floor > 0.0 { floor } else { 1e-6 }
    }
}

impl MixtureComponent for KernelGaussian {
    fn name(&self) -> &'static str {
        "kernel-gaussian"
    }

    fn nb_sample(&self) -> usize {
        self.gram.nrows()
    }

    /// The kernel block acts as a single (implicit) variable.
    fn nb_variable(&self) -> usize {
        1
    }

    /// Isotropic Gaussian in kernel space with the externally supplied
    /// effective dimension.
    fn ln_component_probability(&self, i: usize, k: usize) -> f64 {
        let sigma2 = self.sigma2[k];
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        let term = -0.5 * self.effective_dim * (ln_2pi + sigma2.ln())
            - self.dist2[[i, k]] / (2.0 * sigma2);
        if term.is_nan() { f64::NEG_INFINITY } else { term }
    }

    /// A random hard assignment (each cluster guaranteed one seed sample)
    /// provides centroids and variances; degenerate singleton variances are
    /// floored to stay inside the domain.
    fn random_init(&mut self, rng: &mut StdRng) {
        let nb_sample = self.gram.nrows();
        let mut hard = Array2::<f64>::zeros((nb_sample, self.nb_cluster));
        for i in 0..nb_sample {
            let k = if i < self.nb_cluster { i } else { rng.gen_range(0..self.nb_cluster) };
            hard[[i, k]] = 1.0;
        }
        self.refresh(hard.view());
    }

    fn m_step(&mut self, tik: ArrayView2<f64>) -> bool {
        if !self.compute_distances(tik) {
            return false;
        }
        let mut new_sigma2 = Array1::<f64>::zeros(self.nb_cluster);
        for k in 0..self.nb_cluster {
            let w: f64 = tik.column(k).sum();
            let sigma2 = self.weighted_variance(tik, k, w);
            if !sigma2.is_finite() || sigma2 <= 0.0 {
                return false;
            }
            new_sigma2[k] = sigma2;
        }
        self.sigma2 = new_sigma2;
        true
    }

    fn nb_free_parameters(&self) -> usize {
        self.nb_cluster
    }

    fn resize_statistics(&mut self) {
        self.sigma2_stats.resize(self.nb_cluster);
    }

    fn update_statistics(&mut self) {
        self.sigma2_stats.update(&self.sigma2);
    }

    fn set_parameters(&mut self) {
        self.sigma2_stats.set_into(&mut self.sigma2);
    }

    fn release_statistics(&mut self) {
        self.sigma2_stats.release();
    }

    /// The Gram matrix is precomputed and complete; missing raw entries are
    /// rejected upstream.
    fn has_missing(&self) -> bool {
        false
    }

    fn impute_step(&mut self, _tik: ArrayView2<f64>) {}

    /// Layout: one row per cluster holding its kernel-space standard
    /// deviation.
    fn param_table(&self) -> Array2<f64> {
        let mut table = Array2::zeros((self.nb_cluster, 1));
        for k in 0..self.nb_cluster {
            table[[k, 0]] = self.sigma2[k].sqrt();
        }
        table
    }
}

/// Gram matrix of plain inner products, `G = X Xᵀ`.
pub fn linear_gram(data: &Array2<f64>) -> Array2<f64> {
    data.dot(&data.t())
}

/// Gaussian RBF Gram matrix `exp(−‖x_i − x_j‖² / (2 h²))`.
///
/// Pairwise entries are independent, so the computation is parallelized
/// with `rayon`; `nb_thread` optionally caps the worker count (falling back
/// to the global pool when the dedicated pool cannot be built). The output
/// is a read-only input for the sequential estimation core.
///
/// # Errors
/// - [`MixtureError::InvalidBandwidth`] for a non-finite or non-positive
///   bandwidth.
pub fn rbf_gram(
    data: &Array2<f64>, bandwidth: f64, nb_thread: Option<usize>,
) -> MixtureResult<Array2<f64>> {
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(MixtureError::InvalidBandwidth { value: bandwidth });
    }
    let inner = linear_gram(data);
    let nb_sample = data.nrows();
    let norms: Vec<f64> = (0..nb_sample).map(|i| inner[[i, i]]).collect();

    let fill = |norms: &Vec<f64>, inner: &Array2<f64>| -> Vec<f64> {
        (0..nb_sample)
            .into_par_iter()
            .flat_map_iter(|i| {
                let row: Vec<f64> = (0..nb_sample)
                    .map(|j| {
                        let d2 = (norms[i] + norms[j] - 2.0 * inner[[i, j]]).max(0.0);
                        (-d2 / (2.0 * bandwidth * bandwidth)).exp()
                    })
                    .collect();
                row
            })
            .collect()
    };

    let entries = match nb_thread {
        Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| fill(&norms, &inner)),
            Err(_) => fill(&norms, &inner),
        },
        None => fill(&norms, &inner),
    };
    Ok(Array2::from_shape_vec((nb_sample, nb_sample), entries)
        .expect("entry count matches the square shape by construction"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use statrs::distribution::{Continuous, Normal};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Gram validation at construction.
    // - Centroid-distance and variance recovery on a linear Gram, checked
    //   against the equivalent raw-coordinate Gaussian.
    // - Degenerate-variance failure of the M-step.
    // - RBF Gram entries and the thread-hint path.
    //
    // They intentionally DO NOT cover:
    // - Full clustering runs on kernelized data; integration tests do that.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure non-square Gram matrices and bad effective dimensions are
    // rejected.
    //
    // Given
    // -----
    // - A 2 x 3 matrix; then a valid Gram with effective dimension 0.
    //
    // Expect
    // ------
    // - `InvalidGramMatrix` and `InvalidEffectiveDim` respectively.
    fn constructor_validates_inputs() {
        // Act + Assert
        let err = KernelGaussian::new(Array2::zeros((2, 3)), 2, 1.0).unwrap_err();
        assert!(matches!(err, MixtureError::InvalidGramMatrix { .. }));

        let gram = linear_gram(&array![[0.0], [1.0]]);
        let err = KernelGaussian::new(gram, 2, 0.0).unwrap_err();
        assert!(matches!(err, MixtureError::InvalidEffectiveDim { value } if value == 0.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify that, on a linear Gram over 1-D data, the kernel family's
    // M-step and log-density coincide with the ordinary Gaussian around the
    // cluster centroid.
    //
    // Given
    // -----
    // - Points {0, 2} and {4, 6} under one-hot responsibilities, effective
    //   dimension 1.
    //
    // Expect
    // ------
    // - Both variances equal 1, and the log-density of sample 0 under
    //   cluster 0 equals N(1, 1).ln_pdf(0).
    fn linear_gram_matches_raw_gaussian() {
        // Arrange
        let data = array![[0.0], [2.0], [4.0], [6.0]];
        let gram = linear_gram(&data);
        let tik = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];
        let mut component = KernelGaussian::new(gram, 2, 1.0).unwrap();

        // Act
        let ok = component.m_step(tik.view());

        // Assert
        assert!(ok);
        assert!((component.sigma2[0] - 1.0).abs() < 1e-12);
        assert!((component.sigma2[1] - 1.0).abs() < 1e-12);
        let reference = Normal::new(1.0, 1.0).unwrap().ln_pdf(0.0);
        assert!((component.ln_component_probability(0, 0) - reference).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a degenerate (zero-distance) cluster fails the M-step rather
    // than producing a zero variance.
    //
    // Given
    // -----
    // - All points identical, one cluster.
    //
    // Expect
    // ------
    // - `m_step` returns `false`.
    fn m_step_fails_on_collapsed_cluster() {
        // Arrange
        let data = array![[3.0], [3.0], [3.0]];
        let gram = linear_gram(&data);
        let tik = Array2::from_elem((3, 1), 1.0);
        let mut component = KernelGaussian::new(gram, 1, 1.0).unwrap();

        // Act + Assert
        assert!(!component.m_step(tik.view()));
    }

    #[test]
    // Purpose
    // -------
    // Verify RBF Gram entries: unit diagonal, symmetry, a hand-computed
    // off-diagonal value, and identical output under a thread-count hint.
    //
    // Given
    // -----
    // - Two 1-D points at distance 2 with bandwidth 1.
    //
    // Expect
    // ------
    // - Diagonal 1, off-diagonal exp(−2), sequential == hinted.
    fn rbf_gram_entries_and_thread_hint() {
        // Arrange
        let data = array![[0.0], [2.0]];

        // Act
        let gram = rbf_gram(&data, 1.0, None).unwrap();
        let hinted = rbf_gram(&data, 1.0, Some(2)).unwrap();

        // Assert
        assert!((gram[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((gram[[1, 1]] - 1.0).abs() < 1e-12);
        assert!((gram[[0, 1]] - (-2.0_f64).exp()).abs() < 1e-12);
        assert!((gram[[0, 1]] - gram[[1, 0]]).abs() < 1e-15);
        assert_eq!(gram, hinted);

        // Bad bandwidth is rejected.
        assert!(matches!(
            rbf_gram(&data, 0.0, None),
            Err(MixtureError::InvalidBandwidth { value }) if value == 0.0
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify random initialization leaves every variance strictly positive
    // even when singleton clusters would be degenerate.
    //
    // Given
    // -----
    // - Three samples, three clusters (every cluster a singleton).
    //
    // Expect
    // ------
    // - All variances strictly positive after initialization.
    fn random_init_floors_singleton_variances() {
        // Arrange
        let data = array![[0.0], [5.0], [9.0]];
        let gram = linear_gram(&data);
        let mut component = KernelGaussian::new(gram, 3, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        // Act
        component.random_init(&mut rng);

        // Assert
        assert!(component.sigma2.iter().all(|&s| s > 0.0));
    }
}
