//! Error taxonomy for the Semi-CRF core.
//!
//! One enum covers the whole core (§7 of the spec defines a single taxonomy
//! for the engine, not per-module ones), matching how the teacher scopes an
//! error enum to the conceptual unit that owns it.

use thiserror::Error;

/// Errors raised anywhere in the Semi-CRF core.
#[derive(Debug, Error)]
pub enum CrfError {
    /// Missing/invalid CLI option, missing file, malformed JSON, missing
    /// required field.
    #[error("input error: {0}")]
    Input(String),

    /// Mismatch between feature dim, weight length, or declared x/y dim.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// Unsupported feature name, or feature preconditions violated.
    #[error("feature error: {0}")]
    Feature(String),

    /// alpha, V, or exp produced Inf or NaN.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Internal invariant violated (e.g. a recursion escaped its domain).
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrfError>;

impl CrfError {
    /// Process exit code per §6.3: 1 for a domain error, 2 for anything
    /// unexpected. Every variant here is a domain error; §6.3's exit code 2
    /// is reserved for failures this taxonomy doesn't model (a panic
    /// unwinding past `main`, for instance) and never comes from `CrfError`
    /// itself.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
