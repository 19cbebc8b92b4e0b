//! The Semi-CRF dynamic-programming core (§4.2–§4.6).
//!
//! `Algorithm` bundles the pieces every recursion needs — the label set, the
//! maximum segment duration, the weight vector, the feature function, and a
//! working gradient buffer reused across `wg` calls so the hot loop doesn't
//! allocate. The four recursions (`forward`, `expectation`, `viterbi`,
//! `gradient`) are implemented bottom-up (ascending `i`), per the spec's own
//! design note that the natural top-down recursive reading would otherwise
//! blow the stack on long sequences.

pub mod expectation;
pub mod forward;
pub mod gradient;
pub mod viterbi;

use crate::cache::WgCache;
use crate::data::Sequence;
use crate::error::{CrfError, Result};
use crate::feature::FeatureFunction;
use crate::label::Labels;
use crate::numeric::FeatureVec;
use crate::weights::Weights;

pub use forward::Zvalue;
pub use viterbi::ViterbiResult;

/// Upper bound on segment duration considered at any position (§2.1). The
/// DP cost is `O(n * L * y_dim^2)`; this keeps it bounded.
pub struct Algorithm<'a> {
    labels: Labels,
    max_length: usize,
    weights: &'a Weights,
    feature: &'a dyn FeatureFunction,
    wg_cache_enabled: bool,
}

impl<'a> Algorithm<'a> {
    pub fn new(
        y_dim: usize,
        max_length: usize,
        weights: &'a Weights,
        feature: &'a dyn FeatureFunction,
    ) -> Result<Self> {
        if max_length == 0 {
            return Err(CrfError::Dimension("max_length must be positive".into()));
        }
        if weights.len() != feature.get_dim() {
            return Err(CrfError::Dimension(format!(
                "weight dimension {} does not match feature dimension {}",
                weights.len(),
                feature.get_dim()
            )));
        }
        Ok(Self {
            labels: Labels::new(y_dim),
            max_length,
            weights,
            feature,
            wg_cache_enabled: true,
        })
    }

    pub fn disable_wg_cache(&mut self) {
        self.wg_cache_enabled = false;
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Duration cap at position `i`: a segment ending at `i` cannot reach
    /// further back than position 0, nor exceed `max_length`.
    fn max_duration_at(&self, i: usize) -> usize {
        self.max_length.min(i + 1)
    }

    /// Score and gradient for the segment `(y_prev -> y)` spanning
    /// `[i-d+1, i]`, consulting the WG cache first when enabled.
    fn wg(
        &self,
        cache: &mut WgCache,
        data: &Sequence,
        y: usize,
        y_prev: usize,
        i: usize,
        d: usize,
        out_gradient: &mut FeatureVec,
    ) -> Result<f64> {
        let j = i + 1 - d;
        let y_label = crate::label::Label::new(y as u16);
        let y_prev_label = crate::label::Label::new(y_prev as u16);
        if !self.wg_cache_enabled {
            return self
                .feature
                .wg(self.weights, y_label, y_prev_label, data, j, i, out_gradient);
        }

        let key = WgCache::key(
            self.labels.len(),
            data.len(),
            self.max_length,
            y,
            y_prev,
            i,
            d,
        );
        if let Some((score, gradient)) = cache.get(key) {
            out_gradient.as_mut_slice().copy_from_slice(gradient.as_slice());
            return Ok(score);
        }
        let score = self
            .feature
            .wg(self.weights, y_label, y_prev_label, data, j, i, out_gradient)?;
        cache.install(key, score, out_gradient.clone());
        Ok(score)
    }

    pub fn new_wg_cache(&self) -> WgCache {
        WgCache::new(crate::cache::DEFAULT_CAPACITY, self.feature.get_dim())
    }
}
