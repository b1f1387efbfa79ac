//! Validation of curve data produced by decomposition.

pub mod continuity;

pub use continuity::{check_chain, ChainContinuityReport, JointMetrics};
