//! SEM and semi-SEM estimation strategies.
//!
//! Stochastic EM replaces the deterministic fixed point with a Markov chain
//! over parameter draws: after burn-in, every iteration performs a
//! stochastic class-sampling step (SEM only), an M-step, and an E-step, and
//! then folds the freshly estimated parameters into the running means. The
//! final estimate is the iteration average (Rao-Blackwellized averaging)
//! installed by `set_parameters` — not the last draw — after which one more
//! E-step refreshes the responsibilities under the averaged parameters.
//!
//! Semi-SEM skips the label sampling and keeps soft responsibilities in the
//! M-step; missing entries are still re-imputed every iteration, so the
//! chain only averages over the imputation path.
//!
//! Both variants run the full iteration budget; there is no ε gate. On any
//! failure the accumulated statistics are released so a broken run leaves
//! no half-averaged parameters behind.
use crate::mixture::composer::MixtureComposer;
use crate::mixture::core::config::AlgoConfig;
use crate::mixture::errors::MixtureResult;
use crate::mixture::models::em::empty_cluster_error;
use crate::mixture::models::outcome::EstimOutcome;

/// Which stochastic variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemVariant {
    /// Labels are sampled from the responsibilities every iteration.
    Sem,
    /// No label sampling; only imputation is stochastic in effect.
    SemiSem,
}

/// Stochastic EM strategy with parameter averaging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemStrategy {
    config: AlgoConfig,
    variant: SemVariant,
}

impl SemStrategy {
    pub fn new(config: AlgoConfig, variant: SemVariant) -> Self {
        SemStrategy { config, variant }
    }

    /// Run the strategy to completion on `composer`.
    ///
    /// Burn-in iterations run without statistics accumulation; long-run
    /// iterations accumulate after their E-step, strictly before the next
    /// iteration's M-step overwrites parameters. On success the averaged
    /// parameters are installed and responsibilities refreshed under them.
    ///
    /// # Errors
    /// - Propagated step failures; [`crate::mixture::errors::MixtureError::EmptyCluster`]
    ///   when label sampling empties a cluster.
    pub fn run(&self, composer: &mut MixtureComposer) -> MixtureResult<EstimOutcome> {
        match self.drive(composer) {
            Ok(nb_iter_done) => {
                composer.set_parameters();
                if let Err(err) = composer.e_step() {
                    composer.finalize(false);
                    return Err(err);
                }
                composer.finalize(true);
                let status = format!(
                    "Averaged parameters over {nb_iter_done} post-burn-in iterations."
                );
                Ok(EstimOutcome::from_composer(composer, nb_iter_done, true, status))
            }
            Err(err) => {
                composer.release_statistics();
                composer.finalize(false);
                Err(err)
            }
        }
    }

    /// Burn-in plus accumulating long run; returns iterations done.
    fn drive(&self, composer: &mut MixtureComposer) -> MixtureResult<usize> {
        composer.random_class_init()?;
        composer.set_running();
        composer.resize_statistics();
        let has_missing = composer.has_missing();

        for iteration in 0..self.config.nb_burn_in_iter {
            self.one_iteration(composer, iteration, has_missing)?;
        }
        for iteration in 0..self.config.nb_iter {
            self.one_iteration(composer, iteration, has_missing)?;
            composer.update_statistics();
            log::debug!(
                "stochastic iteration {iteration}: ln-likelihood {:.6}",
                composer.ln_likelihood()
            );
        }
        Ok(self.config.nb_iter)
    }

    /// One (S,) M, E sweep; the E-step always completes before statistics
    /// are touched by the caller.
    fn one_iteration(
        &self, composer: &mut MixtureComposer, iteration: usize, has_missing: bool,
    ) -> MixtureResult<()> {
        if has_missing {
            composer.impute_step();
        }
        if self.variant == SemVariant::Sem {
            let min_occupancy = composer.s_step()?;
            if min_occupancy < 1.0 {
                return Err(empty_cluster_error(composer, iteration));
            }
        }
        composer.m_step(iteration)?;
        composer.e_step()?;
        Ok(())
    }
}
