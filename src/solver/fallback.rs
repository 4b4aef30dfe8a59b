//! Rule-based fallback allocation
//!
//! A fixed, risk-profile-indexed weight table used when the QP backend
//! cannot produce a feasible, converged solution. The rows sum to 1 and
//! sit inside the unadjusted risk-profile equity band by construction, so
//! this path never fails. Expected return and risk are computed from the
//! same statistics the solver used, for output consistency.

use super::{build_result, AllocationBackend, AllocationInputs};
use crate::error::SolverError;
use crate::types::{OptimizationResult, OptimizationStatus, RiskProfile, ASSET_COUNT};

/// Fixed weights; order is equity, gold, bonds, cash.
pub fn fallback_weights(risk: RiskProfile) -> [f64; ASSET_COUNT] {
    match risk {
        RiskProfile::Low => [0.20, 0.15, 0.50, 0.15],
        RiskProfile::Medium => [0.45, 0.25, 0.20, 0.10],
        RiskProfile::High => [0.70, 0.15, 0.10, 0.05],
    }
}

pub struct RuleBasedBackend;

impl RuleBasedBackend {
    /// Infallible form of [`AllocationBackend::allocate`].
    pub fn fixed_allocation(inputs: &AllocationInputs) -> OptimizationResult {
        build_result(
            fallback_weights(inputs.risk_profile),
            inputs,
            OptimizationStatus::RuleBased,
        )
    }
}

impl AllocationBackend for RuleBasedBackend {
    fn allocate(&self, inputs: &AllocationInputs) -> Result<OptimizationResult, SolverError> {
        Ok(Self::fixed_allocation(inputs))
    }
}
