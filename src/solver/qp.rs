//! Mean-variance QP backend
//!
//! Minimizes `wᵀΣw` subject to a full-investment equality, per-asset box
//! bounds and a minimum-return halfspace. Projected gradient descent with
//! exact projection onto the feasible set: Dykstra's alternating
//! projections between the box-bounded simplex (capped-simplex projection
//! by bisection) and the return halfspace.
//!
//! A tiny Tikhonov pull toward the equal-weight prior makes the minimizer
//! unique when `Σ` is singular or near-singular; among equal-variance
//! feasible points the solver therefore returns the one closest to equal
//! weights.
//!
//! Failure handling is a two-attempt state machine: a strict attempt with
//! the policy's `R_min`, then exactly one retry with the return constraint
//! relaxed to the maximum achievable return under the bounds. At that
//! threshold the feasible set is the greedy max-return fill itself, so the
//! relaxed attempt returns it directly instead of grinding the QP against
//! a degenerate constraint. Only impossible bounds are surfaced to the
//! pipeline, which hands off to the rule-based backend.

use super::{build_result, portfolio_return, portfolio_variance, AllocationBackend, AllocationInputs};
use crate::error::SolverError;
use crate::policy::WeightBounds;
use crate::stats::Matrix;
use crate::types::{OptimizationResult, OptimizationStatus, ASSET_COUNT};

const MAX_ITERATIONS: usize = 1000;
/// Stop when the iterate moves less than this (sup norm).
const STEP_TOLERANCE: f64 = 1e-9;
/// Stop when the objective improves less than this.
const OBJECTIVE_TOLERANCE: f64 = 1e-9;
/// Allowed constraint violation in the returned point.
const CONSTRAINT_TOLERANCE: f64 = 1e-6;
/// Strength of the equal-weight tie-break term.
const TIE_BREAK_WEIGHT: f64 = 1e-8;
const DYKSTRA_SWEEPS: usize = 200;
const BISECTION_STEPS: usize = 100;

const EQUAL_WEIGHTS: [f64; ASSET_COUNT] = [1.0 / ASSET_COUNT as f64; ASSET_COUNT];

/// Which attempt of the strict-then-relaxed state machine produced a
/// solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveAttempt {
    /// The policy's `R_min` was honored as given.
    Strict,
    /// `R_min` was relaxed to the maximum achievable return.
    Relaxed,
}

pub struct MeanVarianceBackend;

impl AllocationBackend for MeanVarianceBackend {
    fn allocate(&self, inputs: &AllocationInputs) -> Result<OptimizationResult, SolverError> {
        let (weights, attempt) = solve_with_retry(inputs)?;
        if attempt == SolveAttempt::Relaxed {
            tracing::debug!(
                min_return = inputs.min_return,
                "return constraint was infeasible; solved with relaxed threshold"
            );
        }
        Ok(build_result(weights, inputs, OptimizationStatus::Optimal))
    }
}

/// Strict attempt, then exactly one relaxed retry.
pub fn solve_with_retry(
    inputs: &AllocationInputs,
) -> Result<([f64; ASSET_COUNT], SolveAttempt), SolverError> {
    // If the bounds themselves admit no full allocation, no retry helps.
    let max_portfolio = max_return_portfolio(inputs.expected_returns, inputs.bounds)?;
    let max_return = portfolio_return(&max_portfolio, inputs.expected_returns);

    let mut attempt = SolveAttempt::Strict;
    loop {
        match attempt {
            SolveAttempt::Strict => {
                let outcome = if inputs.min_return > max_return + CONSTRAINT_TOLERANCE {
                    Err(SolverError::Infeasible)
                } else {
                    solve(inputs.expected_returns, inputs.covariance, inputs.bounds, inputs.min_return)
                };
                match outcome {
                    Ok(weights) => return Ok((weights, attempt)),
                    Err(err) => {
                        tracing::debug!(
                            "strict solve failed ({err}); retrying with relaxed return constraint"
                        );
                        attempt = SolveAttempt::Relaxed;
                    }
                }
            }
            // The relaxed threshold is the maximum achievable return, and
            // the greedy fill is the portfolio attaining it.
            SolveAttempt::Relaxed => return Ok((max_portfolio, attempt)),
        }
    }
}

/// Portfolio with the highest `μᵀw` under the bounds: start every asset at
/// its lower bound and fill the remainder in descending-return order.
/// Assets with tied returns are filled toward a common weight level, so
/// the closest-to-equal-weights tie-break applies across a tied group as
/// well rather than being decided by asset order.
pub fn max_return_portfolio(
    mu: &[f64; ASSET_COUNT],
    bounds: &WeightBounds,
) -> Result<[f64; ASSET_COUNT], SolverError> {
    let lower_sum: f64 = bounds.lower.iter().sum();
    let upper_sum: f64 = bounds.upper.iter().sum();
    if lower_sum > 1.0 + CONSTRAINT_TOLERANCE || upper_sum < 1.0 - CONSTRAINT_TOLERANCE {
        return Err(SolverError::Infeasible);
    }

    let mut order: Vec<usize> = (0..ASSET_COUNT).collect();
    order.sort_by(|&a, &b| mu[b].partial_cmp(&mu[a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut weights = bounds.lower;
    let mut remaining = 1.0 - lower_sum;
    let mut start = 0;
    while start < ASSET_COUNT && remaining > 1e-12 {
        let mut end = start + 1;
        while end < ASSET_COUNT && mu[order[end]] == mu[order[start]] {
            end += 1;
        }
        let group = &order[start..end];
        let room: f64 = group.iter().map(|&i| bounds.upper[i] - weights[i]).sum();
        let take = remaining.min(room);
        if group.len() == 1 {
            weights[group[0]] += take;
        } else {
            fill_to_common_level(&mut weights, group, bounds, take);
        }
        remaining -= take;
        start = end;
    }

    Ok(weights)
}

/// Raise the group's weights toward a shared level until `take` has been
/// absorbed, respecting each member's upper bound (bisection on the
/// level; the absorbed amount is monotone in it).
fn fill_to_common_level(
    weights: &mut [f64; ASSET_COUNT],
    group: &[usize],
    bounds: &WeightBounds,
    take: f64,
) {
    let added_at = |level: f64, w: &[f64; ASSET_COUNT]| -> f64 {
        group
            .iter()
            .map(|&i| level.clamp(w[i], bounds.upper[i]) - w[i])
            .sum()
    };

    let mut lo = group.iter().map(|&i| weights[i]).fold(f64::INFINITY, f64::min);
    let mut hi = group
        .iter()
        .map(|&i| bounds.upper[i])
        .fold(f64::NEG_INFINITY, f64::max);
    for _ in 0..BISECTION_STEPS {
        let level = 0.5 * (lo + hi);
        if added_at(level, weights) < take {
            lo = level;
        } else {
            hi = level;
        }
    }

    let level = 0.5 * (lo + hi);
    for &i in group {
        weights[i] = level.clamp(weights[i], bounds.upper[i]);
    }
}

/// Highest `μᵀw` reachable under the bounds.
pub fn max_achievable_return(
    mu: &[f64; ASSET_COUNT],
    bounds: &WeightBounds,
) -> Result<f64, SolverError> {
    Ok(portfolio_return(&max_return_portfolio(mu, bounds)?, mu))
}

fn solve(
    mu: &[f64; ASSET_COUNT],
    cov: &Matrix,
    bounds: &WeightBounds,
    min_return: f64,
) -> Result<[f64; ASSET_COUNT], SolverError> {
    let mut w = project_feasible(EQUAL_WEIGHTS, bounds, mu, min_return);

    // Fixed step 1/L; Gershgorin row-sum bound on the Hessian 2Σ + 2λI.
    let max_row: f64 = cov
        .iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max);
    let step = 1.0 / (2.0 * max_row + 2.0 * TIE_BREAK_WEIGHT);

    let mut objective_prev = objective(&w, cov);
    for _ in 0..MAX_ITERATIONS {
        let mut candidate = [0.0; ASSET_COUNT];
        for i in 0..ASSET_COUNT {
            let mut grad = 2.0 * TIE_BREAK_WEIGHT * (w[i] - EQUAL_WEIGHTS[i]);
            for j in 0..ASSET_COUNT {
                grad += 2.0 * cov[i][j] * w[j];
            }
            candidate[i] = w[i] - step * grad;
        }

        let next = project_feasible(candidate, bounds, mu, min_return);
        let moved = w
            .iter()
            .zip(&next)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        w = next;

        let objective_now = objective(&w, cov);
        if moved < STEP_TOLERANCE || (objective_prev - objective_now).abs() < OBJECTIVE_TOLERANCE {
            return check_feasible(w, bounds, mu, min_return);
        }
        objective_prev = objective_now;
    }

    Err(SolverError::ConvergenceFailed { iterations: MAX_ITERATIONS })
}

fn objective(w: &[f64; ASSET_COUNT], cov: &Matrix) -> f64 {
    let mut tie_break = 0.0;
    for i in 0..ASSET_COUNT {
        let d = w[i] - EQUAL_WEIGHTS[i];
        tie_break += d * d;
    }
    portfolio_variance(w, cov) + TIE_BREAK_WEIGHT * tie_break
}

fn check_feasible(
    w: [f64; ASSET_COUNT],
    bounds: &WeightBounds,
    mu: &[f64; ASSET_COUNT],
    min_return: f64,
) -> Result<[f64; ASSET_COUNT], SolverError> {
    let sum: f64 = w.iter().sum();
    let feasible = (sum - 1.0).abs() <= CONSTRAINT_TOLERANCE
        && bounds.contains(&w, CONSTRAINT_TOLERANCE)
        && portfolio_return(&w, mu) >= min_return - CONSTRAINT_TOLERANCE;
    if feasible {
        Ok(w)
    } else {
        Err(SolverError::ConvergenceFailed { iterations: MAX_ITERATIONS })
    }
}

/// Projection onto the intersection of the box-bounded simplex and the
/// return halfspace (Dykstra's alternating projections). The simplex
/// projection runs last in each sweep so the returned point satisfies the
/// weight-sum and bound constraints exactly.
fn project_feasible(
    v: [f64; ASSET_COUNT],
    bounds: &WeightBounds,
    mu: &[f64; ASSET_COUNT],
    min_return: f64,
) -> [f64; ASSET_COUNT] {
    let mut x = v;
    let mut p = [0.0; ASSET_COUNT]; // halfspace correction
    let mut q = [0.0; ASSET_COUNT]; // simplex correction

    for _ in 0..DYKSTRA_SWEEPS {
        let mut xp = [0.0; ASSET_COUNT];
        for i in 0..ASSET_COUNT {
            xp[i] = x[i] + p[i];
        }
        let y = project_return_halfspace(xp, mu, min_return);
        for i in 0..ASSET_COUNT {
            p[i] = xp[i] - y[i];
        }

        let mut yq = [0.0; ASSET_COUNT];
        for i in 0..ASSET_COUNT {
            yq[i] = y[i] + q[i];
        }
        let next = project_capped_simplex(yq, bounds);
        for i in 0..ASSET_COUNT {
            q[i] = yq[i] - next[i];
        }

        let moved = x
            .iter()
            .zip(&next)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        x = next;
        if moved < 1e-12 {
            break;
        }
    }

    x
}

/// Euclidean projection onto `{w : μᵀw ≥ r}`.
fn project_return_halfspace(
    v: [f64; ASSET_COUNT],
    mu: &[f64; ASSET_COUNT],
    min_return: f64,
) -> [f64; ASSET_COUNT] {
    let attained = portfolio_return(&v, mu);
    if attained >= min_return {
        return v;
    }
    let norm_sq: f64 = mu.iter().map(|m| m * m).sum();
    if norm_sq <= f64::EPSILON {
        // A zero return vector makes the constraint vacuous or hopeless;
        // the relaxed retry handles the latter.
        return v;
    }
    let scale = (min_return - attained) / norm_sq;
    let mut out = v;
    for i in 0..ASSET_COUNT {
        out[i] += scale * mu[i];
    }
    out
}

/// Euclidean projection onto `{w : Σw = 1, lo ≤ w ≤ hi}` via bisection on
/// the shift `τ` in `w_i = clamp(v_i − τ, lo_i, hi_i)`; the clamped sum is
/// monotone non-increasing in `τ`.
fn project_capped_simplex(v: [f64; ASSET_COUNT], bounds: &WeightBounds) -> [f64; ASSET_COUNT] {
    let clamped_sum = |tau: f64| -> f64 {
        (0..ASSET_COUNT)
            .map(|i| (v[i] - tau).clamp(bounds.lower[i], bounds.upper[i]))
            .sum()
    };

    let mut lo = (0..ASSET_COUNT)
        .map(|i| v[i] - bounds.upper[i])
        .fold(f64::INFINITY, f64::min)
        - 1.0;
    let mut hi = (0..ASSET_COUNT)
        .map(|i| v[i] - bounds.lower[i])
        .fold(f64::NEG_INFINITY, f64::max)
        + 1.0;

    let mut tau = 0.5 * (lo + hi);
    for _ in 0..BISECTION_STEPS {
        tau = 0.5 * (lo + hi);
        if clamped_sum(tau) > 1.0 {
            lo = tau;
        } else {
            hi = tau;
        }
    }

    let mut out = [0.0; ASSET_COUNT];
    for i in 0..ASSET_COUNT {
        out[i] = (v[i] - tau).clamp(bounds.lower[i], bounds.upper[i]);
    }
    out
}
