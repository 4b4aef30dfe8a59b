//! Market statistics snapshot and covariance construction
//!
//! The snapshot (per-asset expected return and volatility plus a
//! correlation matrix) is supplied by an external collaborator on its own
//! refresh schedule. The engine only ever reads the latest snapshot at
//! call time and treats it as immutable for the duration of one request.

use crate::error::PlannerError;
use crate::types::{AssetClass, ASSET_COUNT};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Square matrix over the asset universe.
pub type Matrix = [[f64; ASSET_COUNT]; ASSET_COUNT];

/// Annualized return and volatility for one asset class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetStatistics {
    pub expected_return: f64,
    pub volatility: f64,
}

/// One point-in-time view of the asset universe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Indexed by [`AssetClass::index`].
    pub assets: [AssetStatistics; ASSET_COUNT],
    pub correlation: Matrix,
}

impl Default for StatisticsSnapshot {
    /// Long-run historical estimates; normally replaced by the statistics
    /// collaborator at startup and on refresh.
    fn default() -> Self {
        Self {
            assets: [
                AssetStatistics { expected_return: 0.12, volatility: 0.18 }, // equity
                AssetStatistics { expected_return: 0.08, volatility: 0.12 }, // gold
                AssetStatistics { expected_return: 0.065, volatility: 0.05 }, // bonds
                AssetStatistics { expected_return: 0.055, volatility: 0.01 }, // cash
            ],
            correlation: [
                [1.00, 0.30, -0.15, -0.05],
                [0.30, 1.00, 0.10, 0.05],
                [-0.15, 0.10, 1.00, 0.20],
                [-0.05, 0.05, 0.20, 1.00],
            ],
        }
    }
}

impl StatisticsSnapshot {
    pub fn expected_returns(&self) -> [f64; ASSET_COUNT] {
        let mut mu = [0.0; ASSET_COUNT];
        for (i, a) in self.assets.iter().enumerate() {
            mu[i] = a.expected_return;
        }
        mu
    }

    pub fn volatilities(&self) -> [f64; ASSET_COUNT] {
        let mut vol = [0.0; ASSET_COUNT];
        for (i, a) in self.assets.iter().enumerate() {
            vol[i] = a.volatility;
        }
        vol
    }

    /// Validate the snapshot and derive `Σ = diag(vol) · Corr · diag(vol)`.
    pub fn covariance(&self) -> Result<Matrix, PlannerError> {
        build_covariance(&self.volatilities(), &self.correlation).and_then(|cov| {
            for a in &self.assets {
                if !a.expected_return.is_finite() {
                    return Err(PlannerError::InvalidStatistics(
                        "expected return is not finite".into(),
                    ));
                }
            }
            Ok(cov)
        })
    }
}

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Combine volatilities and a correlation matrix into a covariance matrix.
///
/// The correlation matrix must be symmetric with a unit diagonal and
/// entries in [-1, 1]; anything else is a malformed collaborator snapshot.
pub fn build_covariance(
    volatilities: &[f64; ASSET_COUNT],
    correlation: &Matrix,
) -> Result<Matrix, PlannerError> {
    for (i, &vol) in volatilities.iter().enumerate() {
        if !vol.is_finite() || vol < 0.0 {
            return Err(PlannerError::InvalidStatistics(format!(
                "volatility for {} must be finite and non-negative, got {vol}",
                AssetClass::ALL[i]
            )));
        }
    }

    for i in 0..ASSET_COUNT {
        if (correlation[i][i] - 1.0).abs() > SYMMETRY_TOLERANCE {
            return Err(PlannerError::InvalidStatistics(format!(
                "correlation diagonal [{i}][{i}] must be 1, got {}",
                correlation[i][i]
            )));
        }
        for j in 0..ASSET_COUNT {
            let c = correlation[i][j];
            if !c.is_finite() || c < -1.0 - SYMMETRY_TOLERANCE || c > 1.0 + SYMMETRY_TOLERANCE {
                return Err(PlannerError::InvalidStatistics(format!(
                    "correlation [{i}][{j}] out of range: {c}"
                )));
            }
            if (c - correlation[j][i]).abs() > SYMMETRY_TOLERANCE {
                return Err(PlannerError::InvalidStatistics(format!(
                    "correlation matrix is not symmetric at [{i}][{j}]"
                )));
            }
        }
    }

    let mut cov = [[0.0; ASSET_COUNT]; ASSET_COUNT];
    for i in 0..ASSET_COUNT {
        for j in 0..ASSET_COUNT {
            cov[i][j] = correlation[i][j] * volatilities[i] * volatilities[j];
        }
    }
    Ok(cov)
}

/// Shared holder for the latest snapshot.
///
/// The refresh collaborator swaps in new statistics via [`replace`];
/// requests take a copy so concurrent refreshes never affect an in-flight
/// computation.
///
/// [`replace`]: SnapshotStore::replace
pub struct SnapshotStore {
    inner: RwLock<StatisticsSnapshot>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(StatisticsSnapshot::default())
    }
}

impl SnapshotStore {
    pub fn new(snapshot: StatisticsSnapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    pub fn current(&self) -> StatisticsSnapshot {
        *self.inner.read()
    }

    pub fn replace(&self, snapshot: StatisticsSnapshot) {
        *self.inner.write() = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_covariance_matches_hand_calculation() {
        let snapshot = StatisticsSnapshot::default();
        let cov = snapshot.covariance().unwrap();

        // Diagonal is vol^2
        assert!((cov[0][0] - 0.18 * 0.18).abs() < 1e-12);
        assert!((cov[3][3] - 0.01 * 0.01).abs() < 1e-12);
        // Off-diagonal: corr * vol_i * vol_j
        assert!((cov[0][1] - 0.30 * 0.18 * 0.12).abs() < 1e-12);
        assert!((cov[0][2] - (-0.15) * 0.18 * 0.05).abs() < 1e-12);
        // Symmetry of the result
        for i in 0..ASSET_COUNT {
            for j in 0..ASSET_COUNT {
                assert!((cov[i][j] - cov[j][i]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn asymmetric_correlation_rejected() {
        let mut snapshot = StatisticsSnapshot::default();
        snapshot.correlation[0][1] = 0.30;
        snapshot.correlation[1][0] = 0.35;

        let err = snapshot.covariance().unwrap_err();
        assert!(matches!(err, PlannerError::InvalidStatistics(_)));
    }

    #[test]
    fn non_unit_diagonal_rejected() {
        let mut snapshot = StatisticsSnapshot::default();
        snapshot.correlation[2][2] = 0.99;

        assert!(snapshot.covariance().is_err());
    }

    #[test]
    fn negative_volatility_rejected() {
        let mut snapshot = StatisticsSnapshot::default();
        snapshot.assets[1].volatility = -0.05;

        assert!(snapshot.covariance().is_err());
    }

    #[test]
    fn correlation_out_of_range_rejected() {
        let mut snapshot = StatisticsSnapshot::default();
        snapshot.correlation[0][1] = 1.5;
        snapshot.correlation[1][0] = 1.5;

        assert!(snapshot.covariance().is_err());
    }

    #[test]
    fn zero_volatilities_produce_zero_covariance() {
        let cov = build_covariance(
            &[0.0; ASSET_COUNT],
            &StatisticsSnapshot::default().correlation,
        )
        .unwrap();
        for row in &cov {
            for &v in row {
                assert_eq!(v, 0.0);
            }
        }
    }

    #[test]
    fn store_replace_swaps_snapshot() {
        let store = SnapshotStore::default();
        let mut updated = StatisticsSnapshot::default();
        updated.assets[0].expected_return = 0.10;

        store.replace(updated);
        assert!((store.current().assets[0].expected_return - 0.10).abs() < 1e-12);
    }
}
