//! BFGS with a backtracking line search and a dense inverse-Hessian
//! approximation, updated via the standard rank-two BFGS formula.
//!
//! AdaGrad, when enabled, scales the initial search direction per
//! coordinate before the line search rather than replacing BFGS's own
//! curvature estimate — the two are combined, not mutually exclusive,
//! matching the original's "optional AdaGrad scaling flag" framing (§4.8).

use tracing::debug;

use crate::error::{CrfError, Result};
use crate::optimizer::{
    converged, ObjectiveFunction, OptimizeResult, Optimizer, OptimizerConfig, OptimizerFlags,
};

const ADAGRAD_EPS: f64 = 1.0e-8;
const ARMIJO_C1: f64 = 1.0e-4;
const BACKTRACK_FACTOR: f64 = 0.5;
const MAX_LINE_SEARCH_STEPS: usize = 40;

pub struct Bfgs;

impl Bfgs {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Bfgs {
    fn default() -> Self {
        Self::new()
    }
}

/// Dense `n x n` matrix stored row-major, just enough arithmetic for BFGS.
struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Matrix { n, data }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    fn set(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.n + j] = v;
    }

    fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n];
        for i in 0..self.n {
            let mut acc = 0.0;
            for j in 0..self.n {
                acc += self.get(i, j) * v[j];
            }
            out[i] = acc;
        }
        out
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

impl Optimizer for Bfgs {
    fn optimize(
        &mut self,
        objective: &mut dyn ObjectiveFunction,
        dim: usize,
        config: OptimizerConfig,
    ) -> Result<OptimizeResult> {
        let mut x = vec![0.0; dim];
        objective.pre_process(&mut x);

        let mut h = Matrix::identity(dim);
        let mut accum_sq = vec![0.0; dim];
        let adagrad = config.flags.has(OptimizerFlags::ENABLE_ADAGRAD);

        let mut value = objective.value(&x)?;
        let mut grad = objective.grad(&x)?;
        let mut converged_flag = false;
        let mut iterations = 0;

        for iter in 0..config.max_iteration {
            iterations = iter + 1;
            objective.begin_loop_process(&x);

            if adagrad {
                for k in 0..dim {
                    accum_sq[k] += grad[k] * grad[k];
                }
            }

            let mut direction = h.mul_vec(&grad);
            for d in direction.iter_mut() {
                *d = -*d;
            }
            if adagrad {
                for k in 0..dim {
                    direction[k] /= accum_sq[k].sqrt() + ADAGRAD_EPS;
                }
            }

            let directional_derivative = dot(&grad, &direction);
            if directional_derivative >= 0.0 {
                // Not a descent direction (can happen after a bad curvature
                // update); fall back to plain negative gradient.
                direction = grad.iter().map(|g| -g).collect();
            }

            let mut step = config.e0;
            let mut new_x = x.clone();
            let mut new_value = value;
            let mut accepted = false;
            for _ in 0..MAX_LINE_SEARCH_STEPS {
                for k in 0..dim {
                    new_x[k] = x[k] + step * direction[k];
                }
                new_value = objective.value(&new_x)?;
                if new_value <= value + ARMIJO_C1 * step * directional_derivative {
                    accepted = true;
                    break;
                }
                step *= BACKTRACK_FACTOR;
            }
            if !accepted {
                return Err(CrfError::Numerical(
                    "bfgs line search failed to find a descent step".into(),
                ));
            }

            objective.after_update_x_process(&new_x);
            let new_grad = objective.grad(&new_x)?;

            let s: Vec<f64> = (0..dim).map(|k| new_x[k] - x[k]).collect();
            let y: Vec<f64> = (0..dim).map(|k| new_grad[k] - grad[k]).collect();
            let sy = dot(&s, &y);
            if sy > 1.0e-12 {
                bfgs_update(&mut h, &s, &y, sy);
            }

            debug!(iteration = iter, value = new_value, step, "bfgs iteration");

            let stop = converged(value, new_value, config.re, config.ae);
            x = new_x;
            value = new_value;
            grad = new_grad;
            objective.end_loop_process(&x);

            if stop {
                converged_flag = true;
                break;
            }
        }

        objective.post_process(&x);
        Ok(OptimizeResult {
            x,
            value,
            iterations,
            converged: converged_flag,
        })
    }
}

/// `H <- (I - rho*s*y^T) H (I - rho*y*s^T) + rho*s*s^T`, the standard BFGS
/// inverse-Hessian update.
fn bfgs_update(h: &mut Matrix, s: &[f64], y: &[f64], sy: f64) {
    let n = h.n;
    let rho = 1.0 / sy;

    let hy = h.mul_vec(y);
    let yhy = dot(y, &hy);

    for i in 0..n {
        for j in 0..n {
            let term = h.get(i, j) - rho * (s[i] * hy[j] + hy[i] * s[j])
                + rho * rho * yhy * s[i] * s[j]
                + rho * s[i] * s[j];
            h.set(i, j, term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn converges_on_a_quadratic_bowl() {
        let mut obj = Quadratic {
            start: vec![5.0, -3.0, 2.0],
            last_value: 0.0,
        };
        let mut opt = Bfgs::new();
        let config = OptimizerConfig {
            e0: 1.0,
            re: 1.0e-10,
            ae: 1.0e-12,
            max_iteration: 100,
            flags: OptimizerFlags::empty(),
        };
        let result = opt.optimize(&mut obj, 3, config).unwrap();
        assert!(result.value < 1.0e-6);
        assert!(result.converged);
    }
}
