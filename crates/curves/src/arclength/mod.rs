//! Arc-length parameterization: building the parameter/length table and
//! evaluating curves by distance along them.

pub mod config;
pub mod parameterization;
pub mod parameterized;

pub use config::ParameterizationConfig;
pub use parameterization::{ArcLengthParameterization, ArcLengthSample};
pub use parameterized::{ArcLengthCurve, ParameterizedCurve};
