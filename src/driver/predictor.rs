//! Predictor: Viterbi-decodes every sequence in a `DataSet` against a
//! trained weight vector (§4.6).

use crate::algorithm::Algorithm;
use crate::data::DataSet;
use crate::error::{CrfError, Result};
use crate::feature::{FeatureFunction, FeatureKind};
use crate::flags::Flags;
use crate::weights::Weights;

pub struct Predictor {
    dataset: DataSet,
    feature: FeatureKind,
    weights: Weights,
    max_length: usize,
    flags: Flags,
}

impl Predictor {
    /// `preProcess`: loads weights, derives the feature function and
    /// `max_length` from them (unless explicitly overridden), and checks
    /// the dataset's declared feature name against the weight file's.
    pub fn new(
        mut dataset: DataSet,
        weights: Weights,
        max_length_override: Option<usize>,
        flags: Flags,
    ) -> Result<Self> {
        let max_length = match max_length_override {
            Some(m) if m > 0 => m,
            _ => {
                if weights.meta.max_length > 0 {
                    weights.meta.max_length
                } else {
                    return Err(CrfError::Input(
                        "negative maxLength specified in weight file".into(),
                    ));
                }
            }
        };

        let mut feature = FeatureKind::by_name(&weights.meta.feature)?;
        feature.set_x_dim(weights.meta.x_dim)?;
        feature.set_y_dim(weights.meta.y_dim);
        feature.set_max_length(max_length);

        if weights.len() != feature.get_dim() {
            return Err(CrfError::Dimension(
                "dimension mismatch between feature function and weight file".into(),
            ));
        }

        if dataset.feature != weights.meta.feature {
            return Err(CrfError::Input(
                "feature mismatch between data file and weight file".into(),
            ));
        }
        dataset.x_dim = weights.meta.x_dim;
        dataset.y_dim = weights.meta.y_dim;

        let stats_mean = weights.meta.mean.clone();
        let stats_variance = weights.meta.variance.clone();
        for seq in &mut dataset.sequences {
            *seq = std::mem::replace(seq, crate::data::Sequence::new(Vec::new()))
                .with_duration_stats(crate::data::DurationStats::new(
                    stats_mean.clone(),
                    stats_variance.clone(),
                ));
        }

        Ok(Self {
            dataset,
            feature,
            weights,
            max_length,
            flags,
        })
    }

    /// `compute`: Viterbi-decodes every sequence in place, attaching the
    /// predicted segmentation.
    pub fn compute(&mut self) -> Result<()> {
        for seq in &mut self.dataset.sequences {
            let mut algo = Algorithm::new(
                self.dataset.y_dim,
                self.max_length,
                &self.weights,
                &self.feature,
            )?;
            if self.flags.has(Flags::DISABLE_WG_CACHE) {
                algo.disable_wg_cache();
            }
            let mut cache = algo.new_wg_cache();
            let result = algo.viterbi(seq, &mut cache)?;

            if self.flags.has(Flags::ENABLE_LIKELIHOOD_ONLY) {
                tracing::debug!(score = result.score, "best path score");
            }
            seq.set_segments(result.segments);
        }
        Ok(())
    }

    /// `postProcess`: the annotated dataset, ready for serialization.
    pub fn into_dataset(self) -> DataSet {
        self.dataset
    }
}
