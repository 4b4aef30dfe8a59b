//! Constraint policy: weight bounds and minimum required return
//!
//! Maps (risk profile, time horizon) to per-asset weight intervals and
//! derives the minimum-return threshold the solver must honor. Policy is
//! pure configuration; it produces inputs for the solver and never solves
//! anything itself.

use crate::types::{AssetClass, RiskProfile, TimeHorizon, ASSET_COUNT};
use serde::{Deserialize, Serialize};

/// Per-asset weight intervals for the solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub lower: [f64; ASSET_COUNT],
    pub upper: [f64; ASSET_COUNT],
}

impl WeightBounds {
    pub fn contains(&self, weights: &[f64; ASSET_COUNT], tolerance: f64) -> bool {
        weights
            .iter()
            .enumerate()
            .all(|(i, &w)| w >= self.lower[i] - tolerance && w <= self.upper[i] + tolerance)
    }
}

/// Fixed bounds for the non-equity classes.
const GOLD_BOUNDS: (f64, f64) = (0.0, 0.30);
const BONDS_BOUNDS: (f64, f64) = (0.0, 0.50);
const CASH_BOUNDS: (f64, f64) = (0.0, 0.40);

/// Policy knobs; defaults match the documented planning rules.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintPolicy {
    /// Fraction of the goal the reference schedule contributes out of
    /// pocket; the market is expected to bridge the remainder.
    pub funding_ratio: f64,
    /// Clamp interval for the minimum-required-return threshold.
    pub min_return_floor: f64,
    pub min_return_cap: f64,
}

impl Default for ConstraintPolicy {
    fn default() -> Self {
        Self {
            funding_ratio: 0.70,
            min_return_floor: 0.04,
            min_return_cap: 0.10,
        }
    }
}

impl ConstraintPolicy {
    /// Equity band by risk profile, before the horizon shift.
    fn equity_band(risk: RiskProfile) -> (f64, f64) {
        match risk {
            RiskProfile::Low => (0.00, 0.30),
            RiskProfile::Medium => (0.20, 0.60),
            RiskProfile::High => (0.40, 0.80),
        }
    }

    /// Additive shift applied to both equity bounds.
    fn horizon_shift(horizon: TimeHorizon) -> f64 {
        match horizon {
            TimeHorizon::Short => -0.10,
            TimeHorizon::Medium => 0.0,
            TimeHorizon::Long => 0.10,
        }
    }

    /// Per-asset bound intervals for the given profile and horizon.
    pub fn bounds(&self, risk: RiskProfile, horizon: TimeHorizon) -> WeightBounds {
        let (mut eq_lo, mut eq_hi) = Self::equity_band(risk);
        let shift = Self::horizon_shift(horizon);
        eq_lo = (eq_lo + shift).clamp(0.0, 1.0);
        eq_hi = (eq_hi + shift).clamp(0.0, 1.0);

        let mut lower = [0.0; ASSET_COUNT];
        let mut upper = [0.0; ASSET_COUNT];

        lower[AssetClass::Equity.index()] = eq_lo;
        upper[AssetClass::Equity.index()] = eq_hi;
        lower[AssetClass::Gold.index()] = GOLD_BOUNDS.0;
        upper[AssetClass::Gold.index()] = GOLD_BOUNDS.1;
        lower[AssetClass::Bonds.index()] = BONDS_BOUNDS.0;
        upper[AssetClass::Bonds.index()] = BONDS_BOUNDS.1;
        lower[AssetClass::Cash.index()] = CASH_BOUNDS.0;
        upper[AssetClass::Cash.index()] = CASH_BOUNDS.1;

        WeightBounds { lower, upper }
    }

    /// Minimum annualized return the allocation should target.
    ///
    /// Derived from the ratio of the goal to the reference funding
    /// baseline: the reference schedule contributes `funding_ratio` of the
    /// goal linearly over the horizon, so growth must bridge
    /// `1 / funding_ratio` over `years`. Clamped to the configured
    /// interval so a very short horizon cannot demand an unattainable
    /// return.
    pub fn minimum_required_return(&self, years: f64) -> f64 {
        let years = years.max(1.0);
        let implied = (1.0 / self.funding_ratio).powf(1.0 / years) - 1.0;
        implied.clamp(self.min_return_floor, self.min_return_cap)
    }
}
