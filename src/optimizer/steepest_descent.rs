//! Steepest descent, with optional AdaGrad per-coordinate step scaling.

use tracing::debug;

use crate::error::Result;
use crate::optimizer::{
    converged, ObjectiveFunction, OptimizeResult, Optimizer, OptimizerConfig, OptimizerFlags,
};

const ADAGRAD_EPS: f64 = 1.0e-8;

pub struct SteepestDescent;

impl SteepestDescent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SteepestDescent {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SteepestDescent {
    fn optimize(
        &mut self,
        objective: &mut dyn ObjectiveFunction,
        dim: usize,
        config: OptimizerConfig,
    ) -> Result<OptimizeResult> {
        let mut x = vec![0.0; dim];
        objective.pre_process(&mut x);

        let mut accum_sq = vec![0.0; dim];
        let mut prev_value = objective.value(&x)?;
        let mut converged_flag = false;
        let mut iterations = 0;

        for iter in 0..config.max_iteration {
            iterations = iter + 1;
            objective.begin_loop_process(&x);

            let grad = objective.grad(&x)?;
            let adagrad = config.flags.has(OptimizerFlags::ENABLE_ADAGRAD);

            let mut step = vec![0.0; dim];
            for k in 0..dim {
                let scale = if adagrad {
                    accum_sq[k] += grad[k] * grad[k];
                    config.e0 / (accum_sq[k].sqrt() + ADAGRAD_EPS)
                } else {
                    config.e0
                };
                step[k] = -scale * grad[k];
            }

            for k in 0..dim {
                x[k] += step[k];
            }
            objective.after_update_x_process(&x);

            let value = objective.value(&x)?;
            debug!(iteration = iter, value, "steepest_descent iteration");

            if converged(prev_value, value, config.re, config.ae) {
                converged_flag = true;
                objective.end_loop_process(&x);
                prev_value = value;
                break;
            }
            prev_value = value;
            objective.end_loop_process(&x);
        }

        objective.post_process(&x);
        Ok(OptimizeResult {
            x,
            value: prev_value,
            iterations,
            converged: converged_flag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(x) = sum(x_i^2), grad = 2x, minimum at origin.
    struct Quadratic {
        start: Vec<f64>,
        last_value: f64,
    }

    impl ObjectiveFunction for Quadratic {
        fn pre_process(&mut self, x: &mut [f64]) {
            x.copy_from_slice(&self.start);
        }

        fn value(&mut self, x: &[f64]) -> Result<f64> {
            self.last_value = x.iter().map(|v| v * v).sum();
            Ok(self.last_value)
        }

        fn saved_value(&self) -> f64 {
            self.last_value
        }

        fn grad(&mut self, x: &[f64]) -> Result<Vec<f64>> {
            Ok(x.iter().map(|v| 2.0 * v).collect())
        }
    }

    #[test]
    fn descends_toward_the_minimum() {
        let mut obj = Quadratic {
            start: vec![5.0, -3.0],
            last_value: 0.0,
        };
        let mut opt = SteepestDescent::new();
        let config = OptimizerConfig {
            e0: 0.1,
            re: 1.0e-9,
            ae: 1.0e-12,
            max_iteration: 500,
            flags: OptimizerFlags::empty(),
        };
        let result = opt.optimize(&mut obj, 2, config).unwrap();
        assert!(result.value < 1.0e-3);
    }
}
