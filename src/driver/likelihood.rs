//! The training objective function (§4.5, §4.8): wraps a `Learner` as an
//! `ObjectiveFunction`, negating log-likelihood and its gradient since the
//! optimizer minimizes (`(-L)`, `(-∇L)` in the original).

use crate::error::Result;
use crate::numeric::FeatureVec;
use crate::optimizer::ObjectiveFunction;

use super::learner::Learner;

pub struct Likelihood<'a> {
    learner: &'a mut Learner,
    last_value: f64,
}

impl<'a> Likelihood<'a> {
    pub fn new(learner: &'a mut Learner) -> Self {
        Self {
            learner,
            last_value: 0.0,
        }
    }

    fn install(&mut self, x: &[f64]) {
        self.learner.weights_mut().set_from_slice(x);
    }
}

impl<'a> ObjectiveFunction for Likelihood<'a> {
    fn pre_process(&mut self, x: &mut [f64]) {
        x.copy_from_slice(self.learner.weights().as_slice());
    }

    fn value(&mut self, x: &[f64]) -> Result<f64> {
        self.install(x);
        let (l, _grad) = self.learner.compute_grad(false)?;
        self.last_value = -l;
        Ok(self.last_value)
    }

    fn saved_value(&self) -> f64 {
        self.last_value
    }

    fn grad(&mut self, x: &[f64]) -> Result<Vec<f64>> {
        self.install(x);
        let (l, grad) = self.learner.compute_grad(true)?;
        self.last_value = -l;
        let grad: FeatureVec = grad.expect("compute_grad(true) always returns a gradient");
        Ok(grad.iter().map(|g| -g).collect())
    }

    fn post_process(&mut self, x: &[f64]) {
        self.install(x);
    }
}
