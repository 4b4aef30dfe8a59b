//! Configuration loading
//!
//! TOML file plus `GOAL_PLANNER__*` environment overrides. Every section
//! is optional; defaults reproduce the documented planning rules and the
//! built-in statistics snapshot.

use crate::error::PlannerError;
use crate::policy::ConstraintPolicy;
use crate::stats::{AssetStatistics, StatisticsSnapshot};
use crate::types::ASSET_COUNT;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Optional statistics override; absent means the built-in snapshot.
    #[serde(default)]
    pub statistics: Option<StatisticsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_funding_ratio")]
    pub funding_ratio: f64,
    #[serde(default = "default_min_return_floor")]
    pub min_return_floor: f64,
    #[serde(default = "default_min_return_cap")]
    pub min_return_cap: f64,
}

fn default_funding_ratio() -> f64 {
    0.70
}

fn default_min_return_floor() -> f64 {
    0.04
}

fn default_min_return_cap() -> f64 {
    0.10
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            funding_ratio: default_funding_ratio(),
            min_return_floor: default_min_return_floor(),
            min_return_cap: default_min_return_cap(),
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> ConstraintPolicy {
        ConstraintPolicy {
            funding_ratio: self.funding_ratio,
            min_return_floor: self.min_return_floor,
            min_return_cap: self.min_return_cap,
        }
    }
}

/// Statistics snapshot override, in asset order equity, gold, bonds, cash.
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsConfig {
    pub expected_returns: Vec<f64>,
    pub volatilities: Vec<f64>,
    /// Row-major correlation matrix; defaults to the built-in one.
    #[serde(default)]
    pub correlation: Option<Vec<Vec<f64>>>,
}

impl StatisticsConfig {
    pub fn to_snapshot(&self) -> Result<StatisticsSnapshot, PlannerError> {
        if self.expected_returns.len() != ASSET_COUNT {
            return Err(PlannerError::InvalidStatistics(format!(
                "expected_returns must have {ASSET_COUNT} entries, got {}",
                self.expected_returns.len()
            )));
        }
        if self.volatilities.len() != ASSET_COUNT {
            return Err(PlannerError::InvalidStatistics(format!(
                "volatilities must have {ASSET_COUNT} entries, got {}",
                self.volatilities.len()
            )));
        }

        let mut snapshot = StatisticsSnapshot::default();
        for i in 0..ASSET_COUNT {
            snapshot.assets[i] = AssetStatistics {
                expected_return: self.expected_returns[i],
                volatility: self.volatilities[i],
            };
        }

        if let Some(rows) = &self.correlation {
            if rows.len() != ASSET_COUNT || rows.iter().any(|r| r.len() != ASSET_COUNT) {
                return Err(PlannerError::InvalidStatistics(format!(
                    "correlation must be a {ASSET_COUNT}x{ASSET_COUNT} matrix"
                )));
            }
            for (i, row) in rows.iter().enumerate() {
                for (j, &v) in row.iter().enumerate() {
                    snapshot.correlation[i][j] = v;
                }
            }
        }

        // Reject malformed overrides at load time rather than per request.
        snapshot.covariance()?;
        Ok(snapshot)
    }
}

impl Config {
    /// Load from a TOML file (missing file falls back to defaults) with
    /// environment overrides, e.g. `GOAL_PLANNER__SERVER__PORT=9000`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let path = shellexpand::tilde(path);
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("GOAL_PLANNER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// The snapshot to seed the store with.
    pub fn initial_snapshot(&self) -> anyhow::Result<StatisticsSnapshot> {
        match &self.statistics {
            Some(stats) => Ok(stats.to_snapshot()?),
            None => Ok(StatisticsSnapshot::default()),
        }
    }
}
