//! Prediction: score new data against an already-fitted model.
//!
//! The components are constructed with fitted parameters (each family's
//! `with_parameters` constructor) over the *new* observation block, and the
//! fitted proportions are installed by `init_predict`. No M-step ever runs:
//! parameters stay frozen, only responsibilities, labels, and imputed
//! values move.
//!
//! With missing entries, every iteration imputes from the current
//! parameter expectations and re-runs the E-step — responsibilities and
//! imputations feed each other until the observed log-likelihood stops
//! moving (`Em` variant) or the fixed budget ends (`SemiSem` variant).
//! Without missing entries a single E-step is exact, so the loop is skipped
//! entirely (the fast path).
use ndarray::Array1;

use crate::mixture::composer::MixtureComposer;
use crate::mixture::core::config::AlgoConfig;
use crate::mixture::errors::MixtureResult;
use crate::mixture::models::outcome::EstimOutcome;

/// Which convergence regime drives the imputation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictVariant {
    /// ε-gated: stop once the observed log-likelihood increase drops below
    /// the configured tolerance.
    Em,
    /// Fixed budget: always run `nb_iter` imputation/E-step rounds.
    SemiSem,
}

/// Prediction strategy over a composer holding fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictStrategy {
    config: AlgoConfig,
    variant: PredictVariant,
}

impl PredictStrategy {
    pub fn new(config: AlgoConfig, variant: PredictVariant) -> Self {
        PredictStrategy { config, variant }
    }

    /// Score the composer's data under the fitted parameters and
    /// `proportions`.
    ///
    /// # Errors
    /// - Propagated init/E-step failures; proportion validation errors from
    ///   `init_predict`.
    pub fn run(
        &self, composer: &mut MixtureComposer, proportions: Array1<f64>,
    ) -> MixtureResult<EstimOutcome> {
        match self.drive(composer, proportions) {
            Ok((nb_iter_done, converged, status)) => {
                composer.finalize(true);
                Ok(EstimOutcome::from_composer(composer, nb_iter_done, converged, status))
            }
            Err(err) => {
                composer.finalize(false);
                Err(err)
            }
        }
    }

    fn drive(
        &self, composer: &mut MixtureComposer, proportions: Array1<f64>,
    ) -> MixtureResult<(usize, bool, String)> {
        composer.init_predict(proportions)?;
        composer.set_running();

        if !composer.has_missing() {
            // Fast path: complete data makes a single E-step exact.
            composer.e_step()?;
            return Ok((1, true, "Scored complete data in one E-step.".to_string()));
        }

        let mut previous = f64::NEG_INFINITY;
        let mut nb_iter_done = 0;
        for iteration in 0..self.config.nb_iter {
            composer.impute_step();
            composer.e_step()?;
            nb_iter_done = iteration + 1;
            let current = composer.ln_likelihood();
            log::debug!("predict iteration {iteration}: ln-likelihood {current:.6}");
            if self.variant == PredictVariant::Em && current - previous < self.config.epsilon {
                return Ok((
                    nb_iter_done,
                    true,
                    format!("Imputation converged after {nb_iter_done} iterations."),
                ));
            }
            previous = current;
        }
        let converged = self.variant == PredictVariant::SemiSem;
        let status = match self.variant {
            PredictVariant::Em => {
                format!("Imputation budget of {nb_iter_done} exhausted without convergence.")
            }
            PredictVariant::SemiSem => {
                format!("Completed the fixed imputation budget of {nb_iter_done} iterations.")
            }
        };
        Ok((nb_iter_done, converged, status))
    }
}
