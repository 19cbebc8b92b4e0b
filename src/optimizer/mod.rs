//! Unconstrained numerical optimizer interface (§4.8).
//!
//! An `ObjectiveFunction` exposes a value, a gradient, and lifecycle hooks
//! around an optimization run; an `Optimizer` drives it to convergence.
//! Selection between concrete optimizers is by name, matching the original's
//! `"bfgs"` / `"steepest_decent"` convention.

pub mod bfgs;
pub mod steepest_descent;

use crate::error::{CrfError, Result};

/// Optimizer-level behavior flags (§6.4), a plain bit mask in the original's
/// own style. `ENABLE_ADAGRAD` is the only bit consumed here; the rest of
/// the spec's flag bitset lives in [`crate::flags`] and governs the driver,
/// not the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptimizerFlags(pub u32);

impl OptimizerFlags {
    pub const ENABLE_ADAGRAD: u32 = 0x01;

    pub fn empty() -> Self {
        OptimizerFlags(0)
    }

    pub fn has(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u32, enabled: bool) {
        if enabled {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// Convergence and iteration-budget parameters, set once before `optimize`.
#[derive(Debug, Clone, Copy)]
pub struct OptimizerConfig {
    /// Initial step size.
    pub e0: f64,
    /// Relative convergence tolerance.
    pub re: f64,
    /// Absolute convergence tolerance.
    pub ae: f64,
    pub max_iteration: usize,
    pub flags: OptimizerFlags,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            e0: 1.0,
            re: 1.0e-5,
            ae: 1.0e-8,
            max_iteration: 200,
            flags: OptimizerFlags::empty(),
        }
    }
}

/// The function being minimized. The driver's `Likelihood` wrapper negates
/// its internal log-likelihood and gradient so that minimizing `value`
/// maximizes the regularized conditional log-likelihood (§4.5's sign-flip
/// note).
pub trait ObjectiveFunction {
    /// Called once before the first iteration: seeds `x` with the
    /// objective's current parameters (the weight vector).
    fn pre_process(&mut self, x: &mut [f64]);

    /// Objective value at `x`.
    fn value(&mut self, x: &[f64]) -> Result<f64>;

    /// The value last returned by `value`, without recomputing.
    fn saved_value(&self) -> f64;

    /// Gradient at `x`.
    fn grad(&mut self, x: &[f64]) -> Result<Vec<f64>>;

    /// Called at the start of every iteration, before the line search.
    fn begin_loop_process(&mut self, x: &[f64]) {
        let _ = x;
    }

    /// Called after `x` is updated within an iteration (e.g. after a line
    /// search step), before the next iteration's convergence check.
    fn after_update_x_process(&mut self, x: &[f64]) {
        let _ = x;
    }

    /// Called at the end of every iteration.
    fn end_loop_process(&mut self, x: &[f64]) {
        let _ = x;
    }

    /// Called once after the final iteration, with the optimized point.
    fn post_process(&mut self, x: &[f64]) {
        let _ = x;
    }
}

/// Outcome of a completed optimization run.
#[derive(Debug, Clone)]
pub struct OptimizeResult {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Implemented by concrete optimizers (BFGS, steepest descent).
pub trait Optimizer {
    /// `dim` is the dimension of the parameter vector; the optimizer calls
    /// `objective.pre_process` to obtain the starting point rather than
    /// taking one as an argument, matching the original's `preProcess(x)`
    /// seeding convention.
    fn optimize(
        &mut self,
        objective: &mut dyn ObjectiveFunction,
        dim: usize,
        config: OptimizerConfig,
    ) -> Result<OptimizeResult>;
}

/// Construct a named optimizer. Unknown names are an error (§4.8).
pub fn by_name(name: &str) -> Result<Box<dyn Optimizer>> {
    match name {
        "bfgs" => Ok(Box::new(bfgs::Bfgs::new())),
        "steepest_decent" | "steepest_descent" => {
            Ok(Box::new(steepest_descent::SteepestDescent::new()))
        }
        other => Err(CrfError::Input(format!(
            "unknown optimizer method: {other}"
        ))),
    }
}

/// Relative-or-absolute convergence check shared by both optimizers: stop
/// when the step or the value change is small compared to `re`/`ae`.
pub(crate) fn converged(prev: f64, curr: f64, re: f64, ae: f64) -> bool {
    let delta = (curr - prev).abs();
    delta <= ae + re * curr.abs()
}
