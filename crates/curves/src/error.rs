use thiserror::Error;

use crate::curves::DegeneracyKind;

/// Errors produced by curve construction, decomposition and parameterization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("degenerate curve: {kind}")]
    Degenerate { kind: DegeneracyKind },

    #[error("invalid knot vector: {reason}")]
    InvalidKnotVector { reason: String },

    #[error("tolerance {requested} not reached: achieved error bound is {achieved}")]
    ToleranceUnreachable { requested: f64, achieved: f64 },

    #[error("invalid tolerance {0}: must be positive and finite")]
    InvalidTolerance(f64),

    #[error("invalid weight at index {index}: {value} (must be positive and finite)")]
    InvalidWeight { index: usize, value: f64 },

    #[error("insufficient control points: need at least {required}, got {actual}")]
    InsufficientControlPoints { required: usize, actual: usize },

    #[error("invalid degree {0}: must be at least 1")]
    InvalidDegree(usize),

    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("invalid arc-length table: {reason}")]
    InvalidTable { reason: String },
}

impl CurveError {
    pub fn invalid_knot_vector(reason: impl Into<String>) -> Self {
        Self::InvalidKnotVector {
            reason: reason.into(),
        }
    }

    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
        }
    }

    pub fn invalid_table(reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results using [`CurveError`].
pub type Result<T> = std::result::Result<T, CurveError>;
