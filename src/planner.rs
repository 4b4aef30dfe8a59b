//! End-to-end planning pipeline
//!
//! One pipeline for both the optimized and the rule-based path: validate
//! the request, derive policy constraints, run the solver with fallback,
//! size the contribution, shape the response. The caller decides when to
//! invoke it and what to do with the result; the pipeline holds no state
//! between calls beyond the read-only statistics snapshot.

use crate::contribution::{self, ContributionPlan};
use crate::error::PlannerError;
use crate::inflation::GoalCategory;
use crate::policy::ConstraintPolicy;
use crate::solver::{allocate_with_fallback, AllocationInputs};
use crate::stats::SnapshotStore;
use crate::types::{InvestmentType, OptimizationStatus, RiskProfile, TimeHorizon};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// A goal-planning request.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    /// Inflation-adjusted target amount (pre-computed by the caller or by
    /// the projection endpoint).
    #[serde(alias = "inflated_goal")]
    pub goal_future_value: f64,
    /// Investment horizon in years; fractional values are allowed.
    pub years: f64,
    pub risk_profile: RiskProfile,
    #[serde(default)]
    pub time_horizon: TimeHorizon,
    pub investment_type: InvestmentType,
    /// Present-day cost, informational.
    #[serde(default)]
    pub current_price: Option<f64>,
    /// Upfront amount on hand, for lumpsum requests.
    #[serde(default)]
    pub lumpsum_available: Option<f64>,
    #[serde(default)]
    pub goal_category: Option<GoalCategory>,
}

/// A complete recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub plan_id: Uuid,
    pub goal_future_value: Decimal,
    /// Asset-name-keyed weights in stable order.
    pub portfolio: BTreeMap<&'static str, f64>,
    /// Annualized expected return of the allocation.
    pub expected_return: f64,
    /// Annualized standard deviation of the allocation.
    pub portfolio_risk: f64,
    pub investment_type: InvestmentType,
    pub monthly_amount: Option<Decimal>,
    pub lumpsum_amount: Option<Decimal>,
    pub supplemental_monthly: Option<Decimal>,
    pub is_hybrid: bool,
    pub total_invested: Decimal,
    pub expected_wealth: Decimal,
    pub optimization_status: OptimizationStatus,
    pub message: String,
    pub generated_at: DateTime<Utc>,
}

/// The planning engine. Cheap to clone; safe to share across requests.
#[derive(Clone)]
pub struct Planner {
    policy: ConstraintPolicy,
    store: Arc<SnapshotStore>,
}

impl Planner {
    pub fn new(policy: ConstraintPolicy, store: Arc<SnapshotStore>) -> Self {
        Self { policy, store }
    }

    pub fn snapshot_store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Produce a recommendation for one request.
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlannerError> {
        validate(request)?;

        let snapshot = self.store.current();
        let mu = snapshot.expected_returns();
        let covariance = snapshot.covariance()?;

        let bounds = self.policy.bounds(request.risk_profile, request.time_horizon);
        let solver_years = request.years.round().max(1.0);
        let min_return = self.policy.minimum_required_return(solver_years);

        let inputs = AllocationInputs {
            expected_returns: &mu,
            covariance: &covariance,
            bounds: &bounds,
            min_return,
            risk_profile: request.risk_profile,
        };
        let result = allocate_with_fallback(&inputs);

        tracing::info!(
            status = %result.status,
            expected_return = result.expected_return,
            risk = result.portfolio_risk,
            "allocation selected"
        );

        let months = (request.years * 12.0).round() as u32;
        let plan = contribution::build_plan(
            request.investment_type,
            request.goal_future_value,
            result.expected_return,
            request.years,
            months,
            request.lumpsum_available,
        );

        let message = describe(&plan, request.investment_type);

        Ok(PlanResponse {
            plan_id: Uuid::new_v4(),
            goal_future_value: money(request.goal_future_value),
            portfolio: result.allocation.to_map(),
            expected_return: result.expected_return,
            portfolio_risk: result.portfolio_risk,
            investment_type: request.investment_type,
            monthly_amount: plan.monthly_amount.map(money),
            lumpsum_amount: plan.lumpsum_amount.map(money),
            supplemental_monthly: plan.supplemental_monthly.map(money),
            is_hybrid: plan.is_hybrid,
            total_invested: money(plan.total_invested),
            expected_wealth: money(plan.expected_wealth),
            optimization_status: result.status,
            message,
            generated_at: Utc::now(),
        })
    }
}

fn validate(request: &PlanRequest) -> Result<(), PlannerError> {
    if !request.goal_future_value.is_finite() || request.goal_future_value <= 0.0 {
        return Err(PlannerError::invalid_input(
            "goal_future_value",
            format!("must be positive, got {}", request.goal_future_value),
        ));
    }
    if !request.years.is_finite() || request.years < 1.0 {
        return Err(PlannerError::invalid_input(
            "years",
            format!("must be at least 1, got {}", request.years),
        ));
    }
    if let Some(price) = request.current_price {
        if !price.is_finite() || price <= 0.0 {
            return Err(PlannerError::invalid_input(
                "current_price",
                format!("must be positive when given, got {price}"),
            ));
        }
    }
    if let Some(available) = request.lumpsum_available {
        if !available.is_finite() || available <= 0.0 {
            return Err(PlannerError::invalid_input(
                "lumpsum_available",
                format!("must be positive when given, got {available}"),
            ));
        }
    }
    Ok(())
}

/// Round a currency amount to two decimal places.
fn money(amount: f64) -> Decimal {
    Decimal::from_f64(amount)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

fn describe(plan: &ContributionPlan, investment_type: InvestmentType) -> String {
    if plan.is_hybrid {
        let lumpsum = plan.lumpsum_amount.unwrap_or(0.0);
        let supplemental = plan.supplemental_monthly.unwrap_or(0.0);
        return format!(
            "Invest {:.2} now and add {:.2} monthly to close the gap to your goal",
            lumpsum, supplemental
        );
    }
    match investment_type {
        InvestmentType::Sip => format!(
            "Invest {:.2} monthly via SIP to reach your goal",
            plan.monthly_amount.unwrap_or(0.0)
        ),
        InvestmentType::Lumpsum => format!(
            "Invest {:.2} as a lumpsum to reach your goal",
            plan.lumpsum_amount.unwrap_or(0.0)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn planner() -> Planner {
        Planner::new(ConstraintPolicy::default(), Arc::new(SnapshotStore::default()))
    }

    fn request() -> PlanRequest {
        PlanRequest {
            goal_future_value: 1_215_506.0,
            years: 4.0,
            risk_profile: RiskProfile::Medium,
            time_horizon: TimeHorizon::Medium,
            investment_type: InvestmentType::Sip,
            current_price: None,
            lumpsum_available: None,
            goal_category: None,
        }
    }

    #[test]
    fn non_positive_goal_rejected() {
        let mut req = request();
        req.goal_future_value = 0.0;
        let err = planner().plan(&req).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::InvalidInput { field: "goal_future_value", .. }
        ));
    }

    #[test]
    fn sub_year_horizon_rejected() {
        let mut req = request();
        req.years = 0.5;
        let err = planner().plan(&req).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput { field: "years", .. }));
    }

    #[test]
    fn negative_lumpsum_available_rejected() {
        let mut req = request();
        req.investment_type = InvestmentType::Lumpsum;
        req.lumpsum_available = Some(-100.0);
        assert!(planner().plan(&req).is_err());
    }

    #[test]
    fn malformed_snapshot_surfaces_invalid_statistics() {
        let store = Arc::new(SnapshotStore::default());
        let mut snapshot = store.current();
        snapshot.correlation[0][1] = 0.9;
        store.replace(snapshot);

        let planner = Planner::new(ConstraintPolicy::default(), store);
        let err = planner.plan(&request()).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidStatistics(_)));
    }

    #[test]
    fn money_rounds_to_two_places() {
        assert_eq!(money(1234.5678), dec!(1234.57));
        assert_eq!(money(0.004), dec!(0.00));
    }

    #[test]
    fn sip_response_has_recurring_fields_only() {
        let response = planner().plan(&request()).unwrap();
        assert!(response.monthly_amount.is_some());
        assert!(response.lumpsum_amount.is_none());
        assert!(!response.is_hybrid);
        assert!(response.message.contains("monthly"));
    }
}
