//! Error types for the planning engine

use thiserror::Error;

/// Errors surfaced to callers of the planning pipeline.
///
/// Validation failures are the only errors a well-formed deployment should
/// ever see; a malformed statistics snapshot is a collaborator
/// configuration problem, not user input.
#[derive(Error, Debug, Clone)]
pub enum PlannerError {
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("invalid statistics snapshot: {0}")]
    InvalidStatistics(String),
}

impl PlannerError {
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors internal to the allocation backends.
///
/// These never escape the pipeline: the mean-variance backend retries once
/// with a relaxed return constraint, and a failure after that hands off to
/// the rule-based backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("optimization failed to converge after {iterations} iterations")]
    ConvergenceFailed { iterations: usize },

    #[error("no feasible allocation exists under the weight bounds")]
    Infeasible,
}
