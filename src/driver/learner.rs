//! Learner: orchestrates training over a `DataSet` (§4.5, §7 of the spec).

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::algorithm::Algorithm;
use crate::data::DataSet;
use crate::error::{CrfError, Result};
use crate::feature::{FeatureFunction, FeatureKind};
use crate::flags::Flags;
use crate::numeric::FeatureVec;
use crate::optimizer::{self, ObjectiveFunction, OptimizerConfig, OptimizerFlags};
use crate::weights::Weights;

use super::likelihood::Likelihood;

/// Hyperparameters and flags a training run is configured with.
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    pub optimizer_name: String,
    pub e0: f64,
    pub re: f64,
    pub ae: f64,
    pub max_iteration: usize,
    pub l2_coefficient: f64,
    pub max_length: usize,
    pub flags: Flags,
}

pub struct Learner {
    dataset: DataSet,
    feature: FeatureKind,
    weights: Weights,
    config: LearnerConfig,
}

impl Learner {
    /// `preProcess`: builds the feature function and weight vector from the
    /// dataset's declared dimensions, optionally seeded with `initial`.
    pub fn new(dataset: DataSet, config: LearnerConfig, initial: Option<Weights>) -> Result<Self> {
        let mut feature = FeatureKind::by_name(&dataset.feature)?;
        feature.set_x_dim(dataset.x_dim).map_err(|_| {
            CrfError::Dimension("dimension mismatch between data file and feature function".into())
        })?;
        feature.set_y_dim(dataset.y_dim);
        feature.set_max_length(config.max_length);

        let dim = feature.get_dim();
        let mut weights = match initial {
            Some(w) => {
                if w.len() != dim {
                    return Err(CrfError::Dimension(format!(
                        "initial weights have dimension {} but feature function expects {dim}",
                        w.len()
                    )));
                }
                w
            }
            None => Weights::zeros(dim),
        };
        weights.meta.feature = dataset.feature.clone();
        weights.meta.x_dim = dataset.x_dim;
        weights.meta.y_dim = dataset.y_dim;
        weights.meta.max_length = config.max_length;

        Ok(Self {
            dataset,
            feature,
            weights,
            config,
        })
    }

    pub fn dataset(&self) -> &DataSet {
        &self.dataset
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut Weights {
        &mut self.weights
    }

    pub fn feature(&self) -> &FeatureKind {
        &self.feature
    }

    pub fn l2_coefficient(&self) -> f64 {
        if self.config.flags.has(Flags::DISABLE_REGULARIZATION) {
            0.0
        } else {
            self.config.l2_coefficient
        }
    }

    /// Aggregate log-likelihood and (optionally) its gradient across every
    /// sequence in the dataset (`Learner::computeGrad` in the original).
    /// Sequences are independent given the current weights, so this runs
    /// them with rayon (§5's "parallelism across sequences is permitted").
    pub fn compute_grad(&self, with_grad: bool) -> Result<(f64, Option<FeatureVec>)> {
        let l2 = self.l2_coefficient();
        let disable_cache = self.config.flags.has(Flags::DISABLE_WG_CACHE);
        let max_length = self.config.max_length;
        let likelihood_only = self.config.flags.has(Flags::ENABLE_LIKELIHOOD_ONLY);

        let contributions: Vec<Result<(f64, Option<FeatureVec>)>> = self
            .dataset
            .sequences
            .par_iter()
            .map(|data| {
                let mut algo = Algorithm::new(
                    self.dataset.y_dim,
                    max_length,
                    &self.weights,
                    &self.feature,
                )?;
                if disable_cache {
                    algo.disable_wg_cache();
                }
                let grad = algo.sequence_gradient(data, l2, with_grad)?;
                if likelihood_only {
                    debug!(log_likelihood = grad.log_likelihood, "sequence likelihood");
                }
                Ok((grad.log_likelihood, grad.gradient))
            })
            .collect();

        let mut total_l = 0.0;
        let mut total_grad: Option<FeatureVec> = None;
        for result in contributions {
            let (ll, grad) = result?;
            total_l += ll;
            if with_grad {
                let g = grad.expect("with_grad requested a gradient from every sequence");
                match &mut total_grad {
                    Some(acc) => *acc += &g,
                    None => total_grad = Some(g),
                }
            }
        }

        Ok((total_l, total_grad))
    }

    /// `Learner::compute`: runs the configured optimizer to convergence, or
    /// (with `ENABLE_LIKELIHOOD_ONLY`) computes the likelihood once and
    /// stops.
    pub fn compute(&mut self) -> Result<()> {
        if self.config.flags.has(Flags::ENABLE_LIKELIHOOD_ONLY) {
            let (l, _grad) = self.compute_grad(false)?;
            info!(log_likelihood = l, "likelihood-only run, skipping optimization");
            return Ok(());
        }

        info!(optimizer = %self.config.optimizer_name, "training started");
        let mut optimizer = optimizer::by_name(&self.config.optimizer_name)?;

        let mut optimizer_flags = OptimizerFlags::empty();
        if !self.config.flags.has(Flags::DISABLE_ADAGRAD) {
            optimizer_flags.set(OptimizerFlags::ENABLE_ADAGRAD, true);
        }
        let opt_config = OptimizerConfig {
            e0: self.config.e0,
            re: self.config.re,
            ae: self.config.ae,
            max_iteration: self.config.max_iteration,
            flags: optimizer_flags,
        };

        let dim = self.weights.len();
        let mut likelihood = Likelihood::new(self);
        // `Likelihood::post_process` installs the optimized point into the
        // weight vector; nothing further is needed here.
        let result = optimizer.optimize(&mut likelihood, dim, opt_config)?;

        info!(
            iterations = result.iterations,
            converged = result.converged,
            value = result.value,
            "training finished"
        );
        Ok(())
    }

    /// `postProcess`: writes the trained weights (with duration-statistics
    /// metadata) to `path`.
    pub fn save_weights(&mut self, path: &Path) -> Result<()> {
        self.weights.meta.mean = self
            .dataset
            .sequences
            .first()
            .map(|s| s.duration_stats().mean_map().clone())
            .unwrap_or_default();
        self.weights.meta.variance = self
            .dataset
            .sequences
            .first()
            .map(|s| s.duration_stats().variance_map().clone())
            .unwrap_or_default();
        self.weights.save(path)
    }
}
