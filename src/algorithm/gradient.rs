//! Gradient assembly for training (§4.5).
//!
//! `empirical_feature_sum` (the original's `computeG`) sums the feature
//! vectors of the gold segmentation's actual segments — the "observed"
//! half of the gradient. `model_expectation` (`computeGm`) is `η(n-1, ·)`
//! summed over labels and normalized by `Z` — the "expected under the
//! current model" half. Their difference, minus the L2 penalty gradient, is
//! the gradient of the regularized conditional log-likelihood.

use crate::algorithm::forward::Zvalue;
use crate::algorithm::Algorithm;
use crate::cache::WgCache;
use crate::data::Sequence;
use crate::error::{CrfError, Result};
use crate::label::Label;
use crate::numeric::FeatureVec;

/// One sequence's contribution to the training objective: log-likelihood
/// (unregularized) and, if `with_grad`, the empirical-minus-expected
/// feature difference.
pub struct SequenceGrad {
    pub log_likelihood: f64,
    pub gradient: Option<FeatureVec>,
}

impl<'a> Algorithm<'a> {
    /// Sum of feature vectors along the gold segmentation, and the total
    /// score `WG` they accumulate (§4.5's `computeG`).
    pub fn empirical_feature_sum(
        &self,
        data: &Sequence,
        cache: &mut WgCache,
    ) -> Result<(FeatureVec, f64)> {
        let segments = data
            .segments()
            .ok_or_else(|| CrfError::Input("sequence has no gold segmentation".into()))?;

        let dim = self.feature_dim();
        let mut sum = FeatureVec::zeros(dim);
        let mut wg_total = 0.0;
        let mut gs = FeatureVec::zeros(dim);
        let mut y_prev = Label::ZERO;

        for seg in segments {
            let d = seg.duration();
            let wg = self.wg(
                cache,
                data,
                seg.label.as_usize(),
                y_prev.as_usize(),
                seg.end,
                d,
                &mut gs,
            )?;
            wg_total += wg;
            sum += &gs;
            y_prev = seg.label;
        }

        Ok((sum, wg_total))
    }

    /// The model's expected feature vector under the current weights,
    /// `Σ_y η(n-1, y) / Z` (§4.5's `computeGm`).
    pub fn model_expectation(&self, data: &Sequence, cache: &mut WgCache) -> Result<FeatureVec> {
        let (alpha, Zvalue(z)) = self.forward(data, cache)?;
        let eta = self.expectation(data, &alpha, cache)?;

        let dim = self.feature_dim();
        let mut sum = FeatureVec::zeros(dim);
        let n = data.len();
        for y in self.labels().iter() {
            let v = eta
                .get(n - 1, y)
                .expect("forward pass fills every (n-1, y) slot");
            sum += v;
        }
        Ok(sum * (1.0 / z))
    }

    /// The per-sequence regularized log-likelihood contribution and, if
    /// `with_grad`, its gradient. `l2` is the L2 regularization coefficient
    /// (`rp` in the original); pass 0.0 to disable regularization.
    pub fn sequence_gradient(
        &self,
        data: &Sequence,
        l2: f64,
        with_grad: bool,
    ) -> Result<SequenceGrad> {
        let mut cache = self.new_wg_cache();
        let (alpha, Zvalue(z)) = self.forward(data, &mut cache)?;
        let (empirical, wg_total) = self.empirical_feature_sum(data, &mut cache)?;

        let mut log_likelihood = wg_total - z.ln();
        if l2 > 0.0 {
            log_likelihood -= l2 * self.weights.l2_norm_sq();
        }

        if !with_grad {
            return Ok(SequenceGrad {
                log_likelihood,
                gradient: None,
            });
        }

        let eta = self.expectation(data, &alpha, &mut cache)?;
        let dim = self.feature_dim();
        let n = data.len();
        let mut expected = FeatureVec::zeros(dim);
        for y in self.labels().iter() {
            let v = eta
                .get(n - 1, y)
                .expect("forward pass fills every (n-1, y) slot");
            expected += v;
        }
        expected = expected * (1.0 / z);

        let mut grad = empirical;
        grad.accumulate_scaled(&expected, -1.0);

        if l2 > 0.0 {
            let weights = FeatureVec::from_vec(self.weights.as_slice().to_vec());
            grad.accumulate_scaled(&weights, -2.0 * l2);
        }

        Ok(SequenceGrad {
            log_likelihood,
            gradient: Some(grad),
        })
    }
}
