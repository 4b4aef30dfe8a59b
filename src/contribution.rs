//! Contribution arithmetic: SIP, lumpsum and hybrid plans
//!
//! Turns the chosen allocation's expected return into the contribution
//! required to reach the goal. The only degenerate case is a zero
//! expected return, where the annuity denominator `(1+r)^n − 1` vanishes;
//! that switches to the linear `FV / n` form, so no division here can
//! ever blow up.

use crate::types::InvestmentType;
use serde::{Deserialize, Serialize};

/// The funding side of a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPlan {
    /// Recurring monthly amount (SIP plans and the supplemental leg of
    /// hybrid plans leave this `None`/`Some` respectively by type).
    pub monthly_amount: Option<f64>,
    /// Upfront amount: the required lumpsum, or the user's available
    /// amount in the hybrid case.
    pub lumpsum_amount: Option<f64>,
    /// Supplemental monthly amount when the available lumpsum falls short.
    pub supplemental_monthly: Option<f64>,
    pub is_hybrid: bool,
    /// Sum of everything paid in over the horizon.
    pub total_invested: f64,
    /// Goal future value the plan is sized to reach.
    pub expected_wealth: f64,
}

/// Monthly SIP reaching `future_value` in `months` at `annual_return`.
///
/// `FV·r / ((1+r)^n − 1)` with `r` the monthly rate; a zero return
/// degenerates to saving linearly.
pub fn monthly_contribution(future_value: f64, annual_return: f64, months: u32) -> f64 {
    let n = f64::from(months);
    let r = annual_return / 12.0;
    if r == 0.0 {
        return future_value / n;
    }
    future_value * r / ((1.0 + r).powf(n) - 1.0)
}

/// Upfront amount compounding to `future_value` over `years`.
pub fn lumpsum_contribution(future_value: f64, annual_return: f64, years: f64) -> f64 {
    if annual_return == 0.0 {
        return future_value;
    }
    future_value / (1.0 + annual_return).powf(years)
}

/// Size the contribution side of a plan.
///
/// For lumpsum requests with an available amount below the requirement,
/// the plan becomes hybrid: invest the available amount now and bridge
/// the remaining gap with a supplemental SIP.
pub fn build_plan(
    investment_type: InvestmentType,
    future_value: f64,
    annual_return: f64,
    years: f64,
    months: u32,
    lumpsum_available: Option<f64>,
) -> ContributionPlan {
    match investment_type {
        InvestmentType::Sip => {
            let monthly = monthly_contribution(future_value, annual_return, months);
            ContributionPlan {
                monthly_amount: Some(monthly),
                lumpsum_amount: None,
                supplemental_monthly: None,
                is_hybrid: false,
                total_invested: monthly * f64::from(months),
                expected_wealth: future_value,
            }
        }
        InvestmentType::Lumpsum => {
            let required = lumpsum_contribution(future_value, annual_return, years);

            if let Some(available) = lumpsum_available.filter(|&a| a < required) {
                let grown = available * (1.0 + annual_return).powf(years);
                if grown < future_value {
                    let supplemental =
                        monthly_contribution(future_value - grown, annual_return, months);
                    return ContributionPlan {
                        monthly_amount: None,
                        lumpsum_amount: Some(available),
                        supplemental_monthly: Some(supplemental),
                        is_hybrid: true,
                        total_invested: available + supplemental * f64::from(months),
                        expected_wealth: future_value,
                    };
                }
            }

            ContributionPlan {
                monthly_amount: None,
                lumpsum_amount: Some(required),
                supplemental_monthly: None,
                is_hybrid: false,
                total_invested: required,
                expected_wealth: future_value,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FV: f64 = 1_215_506.0;

    /// Value of `monthly` contributed for `months` at `annual_return`.
    fn annuity_value(monthly: f64, annual_return: f64, months: u32) -> f64 {
        let r = annual_return / 12.0;
        if r == 0.0 {
            return monthly * f64::from(months);
        }
        monthly * ((1.0 + r).powf(f64::from(months)) - 1.0) / r
    }

    #[test]
    fn sip_compounds_back_to_goal() {
        let monthly = monthly_contribution(FV, 0.10, 48);
        assert!((annuity_value(monthly, 0.10, 48) - FV).abs() < 1e-4);
    }

    #[test]
    fn zero_return_sip_is_linear() {
        let monthly = monthly_contribution(120_000.0, 0.0, 48);
        assert!((monthly - 2_500.0).abs() < 1e-9);
    }

    #[test]
    fn lumpsum_round_trips_through_compounding() {
        let lumpsum = lumpsum_contribution(FV, 0.095, 4.0);
        assert!((lumpsum * 1.095_f64.powf(4.0) - FV).abs() < 1e-4);
    }

    #[test]
    fn zero_return_lumpsum_equals_goal() {
        assert_eq!(lumpsum_contribution(FV, 0.0, 4.0), FV);
    }

    #[test]
    fn sip_plan_totals_are_consistent() {
        let plan = build_plan(InvestmentType::Sip, FV, 0.10, 4.0, 48, None);
        let monthly = plan.monthly_amount.unwrap();
        assert!(!plan.is_hybrid);
        assert!(plan.lumpsum_amount.is_none());
        assert!((plan.total_invested - monthly * 48.0).abs() < 1e-9);
        assert_eq!(plan.expected_wealth, FV);
    }

    #[test]
    fn sufficient_lumpsum_stays_plain() {
        let required = lumpsum_contribution(FV, 0.10, 4.0);
        let plan = build_plan(
            InvestmentType::Lumpsum,
            FV,
            0.10,
            4.0,
            48,
            Some(required + 1.0),
        );
        assert!(!plan.is_hybrid);
        assert!((plan.lumpsum_amount.unwrap() - required).abs() < 1e-9);
        assert!(plan.supplemental_monthly.is_none());
    }

    #[test]
    fn short_lumpsum_becomes_hybrid_and_reaches_goal() {
        let rate = 0.10;
        let available = 300_000.0;
        let required = lumpsum_contribution(FV, rate, 4.0);
        assert!(available < required);

        let plan = build_plan(InvestmentType::Lumpsum, FV, rate, 4.0, 48, Some(available));
        assert!(plan.is_hybrid);
        assert_eq!(plan.lumpsum_amount, Some(available));

        let supplemental = plan.supplemental_monthly.unwrap();
        let wealth = available * (1.0 + rate).powf(4.0) + annuity_value(supplemental, rate, 48);
        assert!((wealth - FV).abs() < 1e-4, "hybrid plan misses goal: {wealth}");

        assert!((plan.total_invested - (available + supplemental * 48.0)).abs() < 1e-9);
    }

    #[test]
    fn no_available_amount_means_no_hybrid() {
        let plan = build_plan(InvestmentType::Lumpsum, FV, 0.10, 4.0, 48, None);
        assert!(!plan.is_hybrid);
        assert!(plan.supplemental_monthly.is_none());
    }
}
