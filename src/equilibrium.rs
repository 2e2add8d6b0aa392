//! Outer solver: the bond-price fixed point and equilibrium assembly.

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::policy::{solve_policy, PolicySolution};

/// Prices below this are treated as zero when backing out interest rates.
const MIN_PRICE: f64 = 1e-12;

/// Row sums of the transition matrix may deviate from one by at most this.
const STOCHASTIC_TOL: f64 = 1e-8;

/// A solved sovereign-default equilibrium.
///
/// All grids are `n_b x n_y`, indexed by debt level and income state. `q` and
/// `delta` are indexed by the *next-period* debt level and *current* income
/// state: lenders price tomorrow's debt with today's information.
#[derive(Clone, Debug, Serialize)]
pub struct EquilibriumSolution {
    /// Bond price schedule consistent with the default probabilities.
    pub q: DMatrix<f64>,
    /// Lenders' default probability forecast `delta = default * P^T`.
    pub delta: DMatrix<f64>,
    /// Value of repaying and re-optimizing debt.
    pub vc: DMatrix<f64>,
    /// Option value `max(vc, v_default)`.
    pub vo: DMatrix<f64>,
    /// Autarky value per income state, constant across debt levels.
    pub v_default: DVector<f64>,
    /// Optimal next-period debt index, conditional on repaying.
    pub policy_idx: DMatrix<usize>,
    /// 1 where default weakly dominates repayment.
    pub default_indicator: DMatrix<f64>,
    /// Optimal next-period debt level `B[policy_idx]`.
    pub policy_bprime: DMatrix<f64>,
    /// Bond price evaluated at the chosen debt level.
    pub q_on_policy: DMatrix<f64>,
    /// Interest rate implied by the price on policy, `1/q - 1`.
    pub rate_on_policy: DMatrix<f64>,
    /// Value-function iterations used by the last inner solve.
    pub inner_iterations: usize,
    /// Whether the last inner solve met its tolerance.
    pub inner_converged: bool,
    /// Outer price iterations performed.
    pub outer_iterations: usize,
    /// Whether both loops met their tolerances.
    pub converged: bool,
}

/// Finds the equilibrium bond-price schedule for the given grids.
///
/// Prices start at the risk-free level and are updated from the default
/// probabilities implied by the borrower's best response, with relaxation
/// `q_relax` damping each step. The final accepted update is applied without
/// relaxation so that the pricing identity `q = (1 - delta) / (1 + r)` holds
/// exactly at the returned solution.
///
/// Non-convergence of either loop is reported through the flags on
/// [`EquilibriumSolution`], never as an error; only malformed inputs fail.
pub fn solve_equilibrium(
    config: &ModelConfig,
    b_grid: &DVector<f64>,
    y_grid: &DVector<f64>,
    transition: &DMatrix<f64>,
) -> Result<EquilibriumSolution> {
    config.validate()?;
    validate_grids(b_grid, y_grid, transition)?;

    let n_b = b_grid.len();
    let n_y = y_grid.len();

    let v_default = DVector::from_element(n_y, config.v_default());
    let mut q = DMatrix::from_element(n_b, n_y, config.risk_free_price());
    let mut delta = DMatrix::zeros(n_b, n_y);

    let mut latest_inner: Option<PolicySolution> = None;
    let mut converged = false;
    let mut outer_iterations = config.max_outer_iter;

    for outer_it in 1..=config.max_outer_iter {
        let inner = solve_policy(&q, b_grid, y_grid, transition, config, &v_default)?;

        let delta_new = &inner.default_indicator * transition.transpose();
        let q_candidate = delta_new.map(|d| (1.0 - d) / (1.0 + config.r));
        let q_new = &q_candidate * config.q_relax + &q * (1.0 - config.q_relax);

        let mut gap = 0.0_f64;
        for (new, old) in q_new.iter().zip(q.iter()) {
            gap = gap.max((new - old).abs());
        }
        debug!(
            "price iteration {outer_it}: sup gap {gap:.3e}, inner iterations {}, inner converged {}",
            inner.iterations, inner.converged
        );

        let inner_converged = inner.converged;
        latest_inner = Some(inner);
        delta = delta_new;

        if gap < config.outer_tol && inner_converged {
            q = q_candidate;
            converged = true;
            outer_iterations = outer_it;
            break;
        }
        q = q_new;
    }

    let inner = latest_inner.ok_or_else(|| ModelError::internal("equilibrium assembly"))?;

    if converged {
        info!(
            "equilibrium converged after {outer_iterations} price iterations \
             ({} value iterations in the final inner solve)",
            inner.iterations
        );
    } else {
        warn!(
            "bond-price fixed point did not converge within {} iterations \
             (last inner solve converged: {})",
            config.max_outer_iter, inner.converged
        );
    }

    let policy_bprime = DMatrix::from_fn(n_b, n_y, |i, j| b_grid[inner.policy_idx[(i, j)]]);
    let q_on_policy = DMatrix::from_fn(n_b, n_y, |i, j| q[(inner.policy_idx[(i, j)], j)]);
    let rate_on_policy = q_on_policy.map(|price| {
        if price > MIN_PRICE {
            1.0 / price - 1.0
        } else {
            f64::INFINITY
        }
    });

    Ok(EquilibriumSolution {
        q,
        delta,
        vc: inner.vc,
        vo: inner.vo,
        v_default,
        policy_idx: inner.policy_idx,
        default_indicator: inner.default_indicator,
        policy_bprime,
        q_on_policy,
        rate_on_policy,
        inner_iterations: inner.iterations,
        inner_converged: inner.converged,
        outer_iterations,
        converged,
    })
}

/// Rejects malformed grids before any iteration runs.
fn validate_grids(
    b_grid: &DVector<f64>,
    y_grid: &DVector<f64>,
    transition: &DMatrix<f64>,
) -> Result<()> {
    let n_y = y_grid.len();
    if b_grid.len() < 2 {
        return Err(ModelError::dimension_mismatch(
            "asset grid length",
            2,
            b_grid.len(),
        ));
    }
    if n_y < 2 {
        return Err(ModelError::dimension_mismatch(
            "income grid length",
            2,
            n_y,
        ));
    }
    if transition.nrows() != n_y {
        return Err(ModelError::dimension_mismatch(
            "transition matrix rows",
            n_y,
            transition.nrows(),
        ));
    }
    if transition.ncols() != n_y {
        return Err(ModelError::dimension_mismatch(
            "transition matrix columns",
            n_y,
            transition.ncols(),
        ));
    }
    for row in 0..n_y {
        let sum: f64 = transition.row(row).iter().sum();
        if (sum - 1.0).abs() > STOCHASTIC_TOL {
            return Err(ModelError::NonStochasticRow { row, sum });
        }
    }
    for k in 1..b_grid.len() {
        if b_grid[k] <= b_grid[k - 1] {
            return Err(ModelError::NonIncreasingGrid {
                context: "asset grid",
                index: k,
            });
        }
    }
    for (index, value) in y_grid.iter().enumerate() {
        if *value <= 0.0 {
            return Err(ModelError::NonPositiveIncome {
                index,
                value: *value,
            });
        }
    }
    Ok(())
}
