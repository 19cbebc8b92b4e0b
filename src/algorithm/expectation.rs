//! The expected-feature recursion η(i, y) (§4.4), vector-valued.
//!
//! ```text
//! η(-1, y) = 0
//! η(i, y)  = Σ_d Σ_{y'} [ η(i-d, y') + α(i-d, y') * g(y', y, i, d) ] * exp(wg(y', y, i, d))
//! ```
//!
//! `g` is the feature vector for the `(y', y, i, d)` candidate segment — the
//! same quantity `wg` writes into its gradient output. Only the vector form
//! is implemented; the original's scalar `eta(i, y, k)` (one coordinate at a
//! time) is equivalent but asymptotically worse once `k` is iterated over
//! the full dimension, and is dead code in the original for exactly that
//! reason.

use crate::algorithm::Algorithm;
use crate::cache::{AlphaTable, EtaTable, WgCache};
use crate::data::Sequence;
use crate::error::{CrfError, Result};
use crate::label::Label;
use crate::numeric::FeatureVec;

impl<'a> Algorithm<'a> {
    pub fn expectation(
        &self,
        data: &Sequence,
        alpha: &AlphaTable,
        cache: &mut WgCache,
    ) -> Result<EtaTable> {
        let n = data.len();
        let dim = self.feature_dim();
        let mut table = EtaTable::new(self.labels().len(), n);
        let mut gs = FeatureVec::zeros(dim);

        for i in 0..n {
            for y in self.labels().iter() {
                let mut v = FeatureVec::zeros(dim);
                for d in 1..=self.max_duration_at(i) {
                    for y_prev in self.labels().iter() {
                        if i == 0 && y_prev != Label::ZERO {
                            continue;
                        }
                        let (eta_prev, alpha_prev) = if d == i + 1 {
                            (None, 1.0)
                        } else {
                            let a = match alpha.get(i - d, y_prev) {
                                Some(a) => a,
                                None => continue,
                            };
                            (table.get(i - d, y_prev), a)
                        };

                        let wg = self.wg(
                            cache,
                            data,
                            y.as_usize(),
                            y_prev.as_usize(),
                            i,
                            d,
                            &mut gs,
                        )?;
                        let ex = wg.exp();
                        if ex.is_infinite() || ex.is_nan() {
                            return Err(CrfError::Numerical(format!(
                                "eta({i}, {y}) diverged"
                            )));
                        }

                        // cof = eta_prev + alpha_prev * gs
                        let mut cof = match eta_prev {
                            Some(prev) => prev.clone(),
                            None => FeatureVec::zeros(dim),
                        };
                        cof.accumulate_scaled(&gs, alpha_prev);
                        v.accumulate_scaled(&cof, ex);
                    }
                }
                table.set(i, y, v);
            }
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Digit, FeatureFunction};
    use crate::weights::Weights;

    #[test]
    fn eta_has_matching_dimension() {
        let mut feature = Digit::new();
        feature.set_x_dim(2).unwrap();
        feature.set_y_dim(2);
        feature.set_max_length(2);
        let weights = Weights::zeros(feature.get_dim());
        let algo = Algorithm::new(2, 2, &weights, &feature).unwrap();
        let data = Sequence::new(vec![vec!["0".into()], vec!["1".into()]]);
        let mut cache = algo.new_wg_cache();

        let (alpha, _z) = algo.forward(&data, &mut cache).unwrap();
        let eta = algo.expectation(&data, &alpha, &mut cache).unwrap();
        let v = eta.get(1, Label::ZERO).unwrap();
        assert_eq!(v.len(), feature.get_dim());
    }
}
