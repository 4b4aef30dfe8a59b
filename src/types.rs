//! Core domain types: asset classes, risk profiles, allocations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Number of asset classes in the investable universe.
pub const ASSET_COUNT: usize = 4;

/// The fixed asset-class universe.
///
/// Enum-indexed rather than string-keyed so the bound and fallback tables
/// are checked for exhaustiveness at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Gold,
    Bonds,
    Cash,
}

impl AssetClass {
    pub const ALL: [AssetClass; ASSET_COUNT] = [
        AssetClass::Equity,
        AssetClass::Gold,
        AssetClass::Bonds,
        AssetClass::Cash,
    ];

    pub fn index(self) -> usize {
        match self {
            AssetClass::Equity => 0,
            AssetClass::Gold => 1,
            AssetClass::Bonds => 2,
            AssetClass::Cash => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Gold => "gold",
            AssetClass::Bonds => "bonds",
            AssetClass::Cash => "cash",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User risk appetite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Low,
    Medium,
    High,
}

impl FromStr for RiskProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskProfile::Low),
            "medium" => Ok(RiskProfile::Medium),
            "high" => Ok(RiskProfile::High),
            other => Err(format!("unknown risk profile '{other}' (expected low, medium or high)")),
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskProfile::Low => "low",
            RiskProfile::Medium => "medium",
            RiskProfile::High => "high",
        };
        f.write_str(s)
    }
}

/// Investment horizon bucket; shifts the equity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    Short,
    Medium,
    Long,
}

impl Default for TimeHorizon {
    fn default() -> Self {
        TimeHorizon::Medium
    }
}

impl FromStr for TimeHorizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(TimeHorizon::Short),
            "medium" => Ok(TimeHorizon::Medium),
            "long" => Ok(TimeHorizon::Long),
            other => Err(format!("unknown time horizon '{other}' (expected short, medium or long)")),
        }
    }
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeHorizon::Short => "short",
            TimeHorizon::Medium => "medium",
            TimeHorizon::Long => "long",
        };
        f.write_str(s)
    }
}

/// How the user intends to fund the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentType {
    /// Recurring monthly contribution.
    #[serde(alias = "recurring")]
    Sip,
    /// One-time upfront contribution.
    Lumpsum,
}

impl FromStr for InvestmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sip" | "recurring" => Ok(InvestmentType::Sip),
            "lumpsum" => Ok(InvestmentType::Lumpsum),
            other => Err(format!("unknown investment type '{other}' (expected sip or lumpsum)")),
        }
    }
}

/// How the returned allocation was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    Optimal,
    RuleBased,
}

impl fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptimizationStatus::Optimal => "optimal",
            OptimizationStatus::RuleBased => "rule_based",
        };
        f.write_str(s)
    }
}

/// Portfolio weights indexed by [`AssetClass`].
///
/// Invariant: weights sum to 1 within 1e-6 and lie inside the bound
/// intervals the producing backend was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioAllocation {
    weights: [f64; ASSET_COUNT],
}

impl PortfolioAllocation {
    pub fn new(weights: [f64; ASSET_COUNT]) -> Self {
        Self { weights }
    }

    pub fn weight(&self, asset: AssetClass) -> f64 {
        self.weights[asset.index()]
    }

    pub fn weights(&self) -> &[f64; ASSET_COUNT] {
        &self.weights
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Name-keyed map for serialization, in stable asset order.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        AssetClass::ALL
            .iter()
            .map(|&a| (a.name(), self.weights[a.index()]))
            .collect()
    }
}

/// Outcome of an allocation backend run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub allocation: PortfolioAllocation,
    /// Annualized expected return, `w·μ`.
    pub expected_return: f64,
    /// Annualized standard deviation, `sqrt(wᵀΣw)`.
    pub portfolio_risk: f64,
    pub status: OptimizationStatus,
}
