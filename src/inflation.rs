//! Goal cost projection under category-specific inflation
//!
//! Converts a present-day cost into its inflation-adjusted future value.
//! Per-category rates come from the statistics collaborator's historical
//! analysis (CAGR over the respective price series); they are constants
//! from the engine's point of view.

use crate::error::PlannerError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Goal category, mapped to an asset-class inflation rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Gold,
    #[serde(alias = "house")]
    RealEstate,
    #[serde(alias = "vehicle")]
    Car,
    #[serde(alias = "children_education")]
    Education,
    Other,
}

impl GoalCategory {
    pub const ALL: [GoalCategory; 5] = [
        GoalCategory::Gold,
        GoalCategory::RealEstate,
        GoalCategory::Car,
        GoalCategory::Education,
        GoalCategory::Other,
    ];

    /// Annualized inflation rate (historical CAGR) for this category.
    pub fn annual_rate(self) -> f64 {
        match self {
            GoalCategory::Gold => 0.1403,
            GoalCategory::RealEstate => 0.0726,
            GoalCategory::Car => 0.0550,
            GoalCategory::Education => 0.1150,
            GoalCategory::Other => 0.0600,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GoalCategory::Gold => "gold",
            GoalCategory::RealEstate => "real_estate",
            GoalCategory::Car => "car",
            GoalCategory::Education => "education",
            GoalCategory::Other => "other",
        }
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GoalCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gold" => Ok(GoalCategory::Gold),
            "real_estate" | "house" => Ok(GoalCategory::RealEstate),
            "car" | "vehicle" => Ok(GoalCategory::Car),
            "education" | "children_education" => Ok(GoalCategory::Education),
            "other" | "custom" => Ok(GoalCategory::Other),
            other => Err(format!("unknown goal category '{other}'")),
        }
    }
}

/// Inflation-adjusted projection of a goal's cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProjection {
    pub current_value: f64,
    pub future_value: f64,
    /// Whole months from now to the target date.
    pub months: u32,
    /// Fractional years, `months / 12`.
    pub years: f64,
    /// Annual inflation rate applied.
    pub annual_rate: f64,
    /// Total growth over the horizon, percent.
    pub total_inflation_pct: f64,
}

/// Whole months elapsed from `today` to `target`, floored at zero.
pub fn months_until(target: NaiveDate, today: NaiveDate) -> u32 {
    let mut months = (target.year() - today.year()) * 12 + (target.month() as i32 - today.month() as i32);
    if target.day() < today.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Project a present cost to a target date.
pub fn project_to_date(
    current_value: f64,
    annual_rate: f64,
    target: NaiveDate,
    today: NaiveDate,
) -> Result<GoalProjection, PlannerError> {
    project_over_months(current_value, annual_rate, months_until(target, today))
}

/// Project a present cost over a horizon in whole months.
///
/// `FV = P × (1 + i)^(months / 12)`
pub fn project_over_months(
    current_value: f64,
    annual_rate: f64,
    months: u32,
) -> Result<GoalProjection, PlannerError> {
    if !current_value.is_finite() || current_value <= 0.0 {
        return Err(PlannerError::invalid_input(
            "current_value",
            format!("must be positive, got {current_value}"),
        ));
    }
    if !annual_rate.is_finite() || annual_rate <= 0.0 {
        return Err(PlannerError::invalid_input(
            "annual_rate",
            format!("must be finite and positive, got {annual_rate}"),
        ));
    }

    let years = f64::from(months) / 12.0;
    let future_value = current_value * (1.0 + annual_rate).powf(years);

    Ok(GoalProjection {
        current_value,
        future_value,
        months,
        years,
        annual_rate,
        total_inflation_pct: (future_value / current_value - 1.0) * 100.0,
    })
}
