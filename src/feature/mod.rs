//! Feature Function Interface (§4.1).
//!
//! A feature function turns a candidate segment `(y_prev, y, j..=i)` into a
//! sparse contribution against the weight vector, expressed as a dense
//! gradient vector of the same dimension as the weights. The interface is
//! deliberately narrow: set the dimensions once, then score segments.

mod digit;

use crate::data::Sequence;
use crate::error::Result;
use crate::label::Label;
use crate::numeric::FeatureVec;
use crate::weights::Weights;

pub use digit::Digit;

/// Implemented by a concrete feature function. `wg` computes the score of
/// placing a segment ending at `i` (inclusive) starting at `j`, transitioning
/// from `y_prev` to `y`, as an inner product against `weights`, and
/// accumulates the corresponding gradient (the feature vector itself) into
/// `out_gradient`.
pub trait FeatureFunction: Send + Sync {
    /// Dimension of the weight vector this feature function expects.
    fn get_dim(&self) -> usize;

    fn set_x_dim(&mut self, x_dim: usize) -> Result<()>;

    fn set_y_dim(&mut self, y_dim: usize);

    fn set_max_length(&mut self, max_length: usize);

    /// Score and gradient for one candidate segment: `out_gradient` is
    /// overwritten with the feature vector for this `(y_prev, y, j..=i)`
    /// candidate (the gradient of a log-linear score w.r.t. the weights is
    /// the feature vector itself), and the return value is their dot
    /// product against `weights`.
    #[allow(clippy::too_many_arguments)]
    fn wg(
        &self,
        weights: &Weights,
        y: Label,
        y_prev: Label,
        data: &Sequence,
        j: usize,
        i: usize,
        out_gradient: &mut FeatureVec,
    ) -> Result<f64>;
}

/// The closed set of feature function kinds (§9's "tagged variant is
/// equivalent and preferable when the set of feature kinds is closed" note).
/// The original's `App::createFeatureFunction` factory is the direct
/// analogue: a name string selects one concrete implementation.
pub enum FeatureKind {
    Digit(Digit),
}

impl FeatureKind {
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "DIGIT" | "digit" => Ok(FeatureKind::Digit(Digit::new())),
            other => Err(crate::error::CrfError::Feature(format!(
                "unknown feature function: {other}"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Digit(_) => "DIGIT",
        }
    }
}

impl FeatureFunction for FeatureKind {
    fn get_dim(&self) -> usize {
        match self {
            FeatureKind::Digit(f) => f.get_dim(),
        }
    }

    fn set_x_dim(&mut self, x_dim: usize) -> Result<()> {
        match self {
            FeatureKind::Digit(f) => f.set_x_dim(x_dim),
        }
    }

    fn set_y_dim(&mut self, y_dim: usize) {
        match self {
            FeatureKind::Digit(f) => f.set_y_dim(y_dim),
        }
    }

    fn set_max_length(&mut self, max_length: usize) {
        match self {
            FeatureKind::Digit(f) => f.set_max_length(max_length),
        }
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
        match self {
            FeatureKind::Digit(f) => f.wg(weights, y, y_prev, data, j, i, out_gradient),
        }
    }
}
