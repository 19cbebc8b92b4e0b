//! The `DIGIT` feature function (§4.1): a segment is scored by three
//! feature groups concatenated into one dense vector —
//!
//! - `y2x`: for every token in the segment, a one-hot-accumulated
//!   `(label, token value)` count, in block `[0, yDim*xDim)`.
//! - `y2y`: a one-hot `(y_prev, y)` transition indicator, in block
//!   `[yDim*xDim, yDim*(xDim+yDim))`.
//! - `y2l`: a per-label squared z-score of the segment's duration against
//!   that label's fitted mean/variance, in the final `yDim` slots.
//!
//! Ported from the original `Digit::wg`/`Digit::getDim`. Token values are
//! parsed from column 0 of each row as an integer index into `0..xDim`.

use crate::data::Sequence;
use crate::error::{CrfError, Result};
use crate::feature::FeatureFunction;
use crate::label::Label;
use crate::numeric::FeatureVec;
use crate::weights::Weights;

const VARIANCE_EPS: f64 = 1.0e-5;

#[derive(Debug, Default)]
pub struct Digit {
    x_dim: usize,
    y_dim: usize,
    #[allow(dead_code)]
    max_length: usize,
}

impl Digit {
    pub fn new() -> Self {
        Self::default()
    }

    fn dim0(&self) -> usize {
        self.y_dim * self.x_dim
    }

    fn dim1(&self) -> usize {
        self.y_dim * (self.x_dim + self.y_dim)
    }
}

impl FeatureFunction for Digit {
    fn get_dim(&self) -> usize {
        self.y_dim * (self.x_dim + self.y_dim + 1)
    }

    fn set_x_dim(&mut self, x_dim: usize) -> Result<()> {
        if x_dim == 0 {
            return Err(CrfError::Dimension("x_dim must be positive".into()));
        }
        self.x_dim = x_dim;
        Ok(())
    }

    fn set_y_dim(&mut self, y_dim: usize) {
        self.y_dim = y_dim;
    }

    fn set_max_length(&mut self, max_length: usize) {
        self.max_length = max_length;
    }

    fn wg(
        &self,
        weights: &Weights,
        y: Label,
        y_prev: Label,
        data: &Sequence,
        j: usize,
        i: usize,
        out_gradient: &mut FeatureVec,
    ) -> Result<f64> {
        if self.x_dim == 0 || self.y_dim == 0 {
            return Err(CrfError::Dimension(
                "Digit::wg called before set_x_dim/set_y_dim".into(),
            ));
        }

        let dim = self.get_dim();
        if out_gradient.len() != dim || weights.len() != dim {
            return Err(CrfError::Dimension(format!(
                "Digit expects dimension {dim}, got gradient={} weights={}",
                out_gradient.len(),
                weights.len()
            )));
        }

        let yval = y.as_usize();
        let ydval = y_prev.as_usize();
        let dim0 = self.dim0();
        let dim1 = self.dim1();

        let mut fvec = FeatureVec::zeros(dim);

        // y2x: one token per row in the segment, column 0 is the digit value.
        let d = i - j + 1;
        for l in 0..d {
            let row = &data.rows()[j + l];
            let token = row.first().ok_or_else(|| {
                CrfError::Input(format!("row {} has no columns", j + l))
            })?;
            let xval: usize = token.parse().map_err(|_| {
                CrfError::Input(format!("row {} column 0 is not an integer: {token:?}", j + l))
            })?;
            if xval >= self.x_dim {
                return Err(CrfError::Input(format!(
                    "token value {xval} out of range for x_dim {}",
                    self.x_dim
                )));
            }
            let idx = yval * self.x_dim + xval;
            fvec.set(idx, fvec.get(idx) + 1.0);
        }

        // y2y: transition indicator.
        fvec.set(dim0 + ydval * self.y_dim + yval, 1.0);

        // y2l: duration deviation against this label's fitted stats.
        let mean = data.duration_stats().mean(y);
        let variance = data.duration_stats().variance(y);
        let f = if variance > VARIANCE_EPS {
            let dm = d as f64 - mean;
            (dm * dm) / (2.0 * variance)
        } else {
            1.0
        };
        fvec.set(dim1 + yval, f);

        let v = fvec.dot(weights.as_slice());
        out_gradient.as_mut_slice().copy_from_slice(fvec.as_slice());
        Ok(v)
    }
}
