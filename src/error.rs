//! Error and diagnostic types for trend analysis
//!
//! Nothing in this crate is fatal to the caller. Per-segment failures are
//! collected next to the results they were excluded from, and advisory
//! conditions surface as [`Diagnostic`] values.

use thiserror::Error;

use crate::Segment;

/// Error type for trend analysis operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Too few points for the requested statistical operation
    #[error("Insufficient data: expected at least {expected} points, got {actual}")]
    InsufficientData {
        /// Minimum number of points required
        expected: usize,
        /// Number of points available
        actual: usize,
    },

    /// Input whose variance makes the operation undefined or trivial
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Invalid configuration parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias using the crate [`Error`]
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Creates an error for a segment too short to regress
    pub fn too_few_points(actual: usize) -> Self {
        Self::InsufficientData {
            expected: 2,
            actual,
        }
    }

    /// Creates an error for a value that could not be represented in the target float type
    pub fn unrepresentable(context: &str) -> Self {
        Self::Computation(format!("{context} is not representable in the value type"))
    }
}

/// A segment excluded from regression, together with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFailure {
    /// The segment that could not be regressed
    pub segment: Segment,
    /// Why it was skipped
    pub error: Error,
}

/// Advisory conditions observed during one analysis run
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The series had no observations; every output is empty
    EmptySeries,
    /// The series values have zero standard deviation; deviation masks
    /// collapse onto the average masks
    ZeroVariance,
    /// A segment was excluded from the trend output
    SegmentSkipped(SegmentFailure),
}
