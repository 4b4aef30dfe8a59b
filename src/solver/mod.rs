//! Allocation backends
//!
//! Two implementations of one contract: the mean-variance QP backend
//! ([`qp::MeanVarianceBackend`]) and the deterministic rule-based table
//! ([`fallback::RuleBasedBackend`]). The planning pipeline is written once
//! against the trait; solver failure degrades to the rule-based path and
//! is visible to callers only through the result status.

pub mod fallback;
pub mod qp;

pub use fallback::RuleBasedBackend;
pub use qp::MeanVarianceBackend;

use crate::error::SolverError;
use crate::policy::WeightBounds;
use crate::stats::Matrix;
use crate::types::{OptimizationResult, OptimizationStatus, PortfolioAllocation, RiskProfile, ASSET_COUNT};

/// Everything a backend needs to produce an allocation.
#[derive(Debug, Clone, Copy)]
pub struct AllocationInputs<'a> {
    /// Annualized expected returns, `μ`.
    pub expected_returns: &'a [f64; ASSET_COUNT],
    /// Annualized covariance, `Σ`.
    pub covariance: &'a Matrix,
    pub bounds: &'a WeightBounds,
    /// Minimum required annualized return, `R_min`.
    pub min_return: f64,
    /// Used by the rule-based backend to pick its fixed row.
    pub risk_profile: RiskProfile,
}

/// A strategy for turning market statistics into portfolio weights.
pub trait AllocationBackend {
    fn allocate(&self, inputs: &AllocationInputs) -> Result<OptimizationResult, SolverError>;
}

/// `w · μ`
pub fn portfolio_return(weights: &[f64; ASSET_COUNT], mu: &[f64; ASSET_COUNT]) -> f64 {
    weights.iter().zip(mu).map(|(w, m)| w * m).sum()
}

/// `wᵀ Σ w`
pub fn portfolio_variance(weights: &[f64; ASSET_COUNT], cov: &Matrix) -> f64 {
    let mut var = 0.0;
    for i in 0..ASSET_COUNT {
        for j in 0..ASSET_COUNT {
            var += weights[i] * cov[i][j] * weights[j];
        }
    }
    var
}

pub(crate) fn build_result(
    weights: [f64; ASSET_COUNT],
    inputs: &AllocationInputs,
    status: OptimizationStatus,
) -> OptimizationResult {
    OptimizationResult {
        allocation: PortfolioAllocation::new(weights),
        expected_return: portfolio_return(&weights, inputs.expected_returns),
        portfolio_risk: portfolio_variance(&weights, inputs.covariance).max(0.0).sqrt(),
        status,
    }
}

/// Run the mean-variance backend and degrade to the rule-based table if it
/// fails. This path never errors; degraded behavior is visible only
/// through [`OptimizationStatus::RuleBased`].
pub fn allocate_with_fallback(inputs: &AllocationInputs) -> OptimizationResult {
    match MeanVarianceBackend.allocate(inputs) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!("mean-variance solver failed: {err}; using rule-based allocation");
            RuleBasedBackend::fixed_allocation(inputs)
        }
    }
}
