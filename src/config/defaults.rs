//! Default training hyperparameters.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Optimizer
// ============================================================================

/// Default optimizer method name (§4.8).
pub const OPTIMIZER: &str = "bfgs";

/// Default initial step size.
pub const E0: f64 = 1.0;

/// Default relative convergence tolerance.
pub const RE: f64 = 1.0e-5;

/// Default absolute convergence tolerance.
pub const AE: f64 = 1.0e-8;

/// Default maximum optimizer iterations.
pub const MAX_ITERATION: usize = 200;

// ============================================================================
// Regularization
// ============================================================================

/// Default L2 regularization coefficient (`rp` in the original).
pub const L2_COEFFICIENT: f64 = 0.01;

// ============================================================================
// Segmentation
// ============================================================================

/// Default maximum segment duration considered at any position, when the
/// corpus itself doesn't imply a tighter bound.
pub const MAX_LENGTH: usize = 8;
