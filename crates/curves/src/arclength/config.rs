//! Configuration for arc-length parameterization.

use serde::{Deserialize, Serialize};

use crate::error::{CurveError, Result};
use crate::geometry::Length;

/// Controls how finely a curve is subdivided when building its arc-length
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterizationConfig {
    /// Bound on the error of the total arc length (and of every cumulative
    /// table entry).
    pub max_error: Length,
    /// Bisection depth at which intervals are accepted regardless of error.
    pub max_depth: u32,
}

impl Default for ParameterizationConfig {
    fn default() -> Self {
        Self {
            max_error: Length::meters(1e-4),
            max_depth: 20,
        }
    }
}

impl ParameterizationConfig {
    pub fn new(max_error: Length) -> Self {
        Self {
            max_error,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// `max_error` must be positive and finite.
    pub fn validate(&self) -> Result<()> {
        let value = self.max_error.in_meters();
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(CurveError::InvalidTolerance(value))
        }
    }
}
