//! Planning HTTP API
//!
//! Thin axum layer over the planner: one POST endpoint per operation and
//! read-only views of the statistics snapshot and inflation table.
//! Validation failures map to 400 with the offending field in the body; a
//! malformed statistics snapshot maps to 500.

use crate::error::PlannerError;
use crate::inflation::{self, GoalCategory, GoalProjection};
use crate::planner::{PlanRequest, PlanResponse, Planner};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared server state.
pub struct AppState {
    pub planner: Planner,
}

/// Goal projection request: either a horizon or a target date, and either
/// a category or an explicit annual rate.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRequest {
    pub current_value: f64,
    #[serde(default)]
    pub years: Option<f64>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<GoalCategory>,
    #[serde(default)]
    pub annual_rate: Option<f64>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
struct ApiError(PlannerError);

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PlannerError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            PlannerError::InvalidStatistics(_) => {
                tracing::error!("statistics snapshot rejected: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

/// Generate an investment recommendation.
async fn recommend_portfolio(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let response = state.planner.plan(&request)?;
    Ok(Json(response))
}

/// Project a present-day cost to its inflated future value.
async fn project_goal(
    Json(request): Json<ProjectRequest>,
) -> Result<Json<GoalProjection>, ApiError> {
    let rate = match (request.annual_rate, request.category) {
        (Some(rate), _) => rate,
        (None, Some(category)) => category.annual_rate(),
        (None, None) => GoalCategory::Other.annual_rate(),
    };

    let projection = match (request.target_date, request.years) {
        (Some(target), _) => {
            inflation::project_to_date(request.current_value, rate, target, Utc::now().date_naive())?
        }
        (None, Some(years)) => {
            if !years.is_finite() || years < 0.0 {
                return Err(PlannerError::invalid_input(
                    "years",
                    format!("must be non-negative, got {years}"),
                )
                .into());
            }
            inflation::project_over_months(request.current_value, rate, (years * 12.0).round() as u32)?
        }
        (None, None) => {
            return Err(PlannerError::invalid_input(
                "target_date",
                "either target_date or years is required",
            )
            .into())
        }
    };

    Ok(Json(projection))
}

#[derive(Serialize)]
struct AssetStatisticsView {
    expected_annual_return_pct: f64,
    annual_volatility_pct: f64,
}

/// Current asset statistics, as percentages.
async fn asset_statistics(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<&'static str, AssetStatisticsView>> {
    let snapshot = state.planner.snapshot_store().current();
    let view = crate::types::AssetClass::ALL
        .iter()
        .map(|&asset| {
            let stats = snapshot.assets[asset.index()];
            (
                asset.name(),
                AssetStatisticsView {
                    expected_annual_return_pct: stats.expected_return * 100.0,
                    annual_volatility_pct: stats.volatility * 100.0,
                },
            )
        })
        .collect();
    Json(view)
}

#[derive(Serialize)]
struct InflationRateView {
    annual_rate_pct: f64,
}

/// The goal-category inflation table.
async fn inflation_rates() -> Json<BTreeMap<&'static str, InflationRateView>> {
    let view = GoalCategory::ALL
        .iter()
        .map(|&c| {
            (
                c.name(),
                InflationRateView {
                    annual_rate_pct: c.annual_rate() * 100.0,
                },
            )
        })
        .collect();
    Json(view)
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/recommend-portfolio", post(recommend_portfolio))
        .route("/api/project-goal", post(project_goal))
        .route("/api/asset-statistics", get(asset_statistics))
        .route("/api/inflation-rates", get(inflation_rates))
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{host}:{port}");
    tracing::info!("planning API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ConstraintPolicy;
    use crate::stats::SnapshotStore;
    use crate::types::{InvestmentType, RiskProfile, TimeHorizon};

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            planner: Planner::new(ConstraintPolicy::default(), Arc::new(SnapshotStore::default())),
        })
    }

    #[tokio::test]
    async fn recommend_handler_produces_plan() {
        let request = PlanRequest {
            goal_future_value: 500_000.0,
            years: 5.0,
            risk_profile: RiskProfile::High,
            time_horizon: TimeHorizon::Long,
            investment_type: InvestmentType::Sip,
            current_price: None,
            lumpsum_available: None,
            goal_category: None,
        };
        let Json(response) = recommend_portfolio(State(state()), Json(request)).await.unwrap();
        assert!(response.monthly_amount.is_some());
        assert!((response.portfolio.values().sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn project_handler_requires_a_horizon() {
        let request = ProjectRequest {
            current_value: 100_000.0,
            years: None,
            target_date: None,
            category: Some(GoalCategory::Car),
            annual_rate: None,
        };
        assert!(project_goal(Json(request)).await.is_err());
    }

    #[tokio::test]
    async fn project_handler_uses_category_rate() {
        let request = ProjectRequest {
            current_value: 100_000.0,
            years: Some(2.0),
            target_date: None,
            category: Some(GoalCategory::Car),
            annual_rate: None,
        };
        let Json(p) = project_goal(Json(request)).await.unwrap();
        assert!((p.annual_rate - 0.0550).abs() < 1e-12);
        assert_eq!(p.months, 24);
    }

    #[tokio::test]
    async fn statistics_view_is_percentage_scaled() {
        let Json(view) = asset_statistics(State(state())).await;
        let equity = view.get("equity").unwrap();
        assert!((equity.expected_annual_return_pct - 12.0).abs() < 1e-9);
        assert!((equity.annual_volatility_pct - 18.0).abs() < 1e-9);
    }
}
