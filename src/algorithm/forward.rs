//! The forward recursion α(i, y) and partition function Z (§4.3).
//!
//! ```text
//! α(-1, y)  = 1                                         (implicit base case)
//! α(i, y)   = Σ_d Σ_{y'} α(i-d, y') * exp(wg(y', y, i, d))     0 <= i
//! Z         = Σ_y α(n-1, y)
//! ```
//!
//! At `i == 0` the previous label `y'` is fixed to `Label::ZERO` (the "no
//! real predecessor" sentinel) since there is no position -1 segment to have
//! carried a real label. Computed bottom-up: `i` ascends from 0, so every
//! `α(i-d, y')` consulted is already in the table.

use crate::algorithm::Algorithm;
use crate::cache::{AlphaTable, WgCache};
use crate::data::Sequence;
use crate::error::{CrfError, Result};
use crate::label::Label;
use crate::numeric::FeatureVec;

pub struct Zvalue(pub f64);

impl<'a> Algorithm<'a> {
    /// Fills an `AlphaTable` for `data` bottom-up and returns it alongside Z.
    pub fn forward(&self, data: &Sequence, cache: &mut WgCache) -> Result<(AlphaTable, Zvalue)> {
        let n = data.len();
        if n == 0 {
            return Err(CrfError::Input("empty sequence".into()));
        }
        let mut table = AlphaTable::new(self.labels().len(), n);
        let mut gs = FeatureVec::zeros(self.feature_dim());

        for i in 0..n {
            for y in self.labels().iter() {
                let mut v = 0.0;
                for d in 1..=self.max_duration_at(i) {
                    for y_prev in self.labels().iter() {
                        if i == 0 && y_prev != Label::ZERO {
                            continue;
                        }
                        let base = if d == i + 1 {
                            1.0
                        } else {
                            match table.get(i - d, y_prev) {
                                Some(a) => a,
                                None => continue,
                            }
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
                        v += base * wg.exp();
                        if v.is_infinite() || v.is_nan() {
                            return Err(CrfError::Numerical(format!(
                                "alpha({i}, {y}) diverged"
                            )));
                        }
                    }
                }
                table.set(i, y, v);
            }
        }

        let mut z = 0.0;
        for y in self.labels().iter() {
            z += table
                .get(n - 1, y)
                .expect("every (n-1, y) slot is filled by the loop above");
        }
        Ok((table, Zvalue(z)))
    }

    pub(crate) fn feature_dim(&self) -> usize {
        self.weights.len()
    }
}
