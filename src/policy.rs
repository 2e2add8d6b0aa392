//! Inner solver: the borrower's debt/default dynamic program for fixed bond prices.

use log::trace;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};

/// Borrower policy recovered by value-function iteration at a fixed price grid.
#[derive(Clone, Debug)]
pub struct PolicySolution {
    /// Value of repaying today and choosing new debt optimally, `n_b x n_y`.
    pub vc: DMatrix<f64>,
    /// Option value `max(vc, v_default)`, the value before the default decision.
    pub vo: DMatrix<f64>,
    /// Index into the asset grid of the optimal next-period debt choice.
    pub policy_idx: DMatrix<usize>,
    /// 1 where defaulting weakly dominates repaying, 0 elsewhere.
    pub default_indicator: DMatrix<f64>,
    /// Number of value-function iterations performed.
    pub iterations: usize,
    /// Whether the sup-norm gap fell below the inner tolerance.
    pub converged: bool,
}

/// Log utility with infeasible consumption mapped to negative infinity.
///
/// The argmax then avoids infeasible choices on its own; a state where every
/// choice is infeasible keeps value `-inf` and is absorbed by the autarky
/// branch of the option value.
fn log_utility(consumption: f64) -> f64 {
    if consumption > 0.0 {
        consumption.ln()
    } else {
        f64::NEG_INFINITY
    }
}

/// Solves the borrower's problem by value-function iteration on the option value.
///
/// Prices are taken as given: `q[(i_prime, j)]` is the price of one unit of
/// next-period debt `B[i_prime]` quoted in income state `j` today. Exhausting
/// `max_inner_iter` is not an error; the best iterate is returned with
/// `converged = false` and the caller decides what to do with it.
pub fn solve_policy(
    q: &DMatrix<f64>,
    b_grid: &DVector<f64>,
    y_grid: &DVector<f64>,
    transition: &DMatrix<f64>,
    config: &ModelConfig,
    v_default: &DVector<f64>,
) -> Result<PolicySolution> {
    let n_b = b_grid.len();
    let n_y = y_grid.len();

    if q.nrows() != n_b || q.ncols() != n_y {
        return Err(ModelError::dimension_mismatch(
            "price grid rows",
            n_b,
            q.nrows(),
        ));
    }
    if transition.nrows() != n_y || transition.ncols() != n_y {
        return Err(ModelError::dimension_mismatch(
            "transition matrix rows",
            n_y,
            transition.nrows(),
        ));
    }
    if v_default.len() != n_y {
        return Err(ModelError::dimension_mismatch(
            "autarky value length",
            n_y,
            v_default.len(),
        ));
    }
    for price in q.iter() {
        if !(*price >= 0.0) {
            return Err(ModelError::invalid_parameter(
                "q",
                *price,
                "price grid entries must be nonnegative",
            ));
        }
    }

    // Consumption depends on prices but not on the value function, so the
    // utility tables are built once per price grid. Income states are
    // independent here, which makes this the one safely parallel axis.
    let utility_cache: Vec<DMatrix<f64>> = (0..n_y)
        .into_par_iter()
        .map(|j| {
            DMatrix::from_fn(n_b, n_b, |i, i_prime| {
                log_utility(y_grid[j] + b_grid[i] - q[(i_prime, j)] * b_grid[i_prime])
            })
        })
        .collect();

    let mut vc = DMatrix::zeros(n_b, n_y);
    let mut vo = DMatrix::from_fn(n_b, n_y, |_, j| v_default[j].max(0.0));
    let mut policy_idx = DMatrix::from_element(n_b, n_y, 0usize);

    let mut converged = false;
    let mut iterations = config.max_inner_iter;

    for it in 1..=config.max_inner_iter {
        // Expectation of the option value over tomorrow's income, taken from
        // today's state `j`; the row index is tomorrow's debt choice.
        let expected_vo = &vo * transition.transpose();

        let mut vc_new = DMatrix::zeros(n_b, n_y);
        let mut policy_new = DMatrix::from_element(n_b, n_y, 0usize);
        for j in 0..n_y {
            let utilities = &utility_cache[j];
            for i in 0..n_b {
                let mut best_value = f64::NEG_INFINITY;
                let mut best_choice = 0usize;
                for i_prime in 0..n_b {
                    let value = utilities[(i, i_prime)] + config.beta * expected_vo[(i_prime, j)];
                    // Strict comparison keeps the first maximizer on exact ties.
                    if value > best_value {
                        best_value = value;
                        best_choice = i_prime;
                    }
                }
                vc_new[(i, j)] = best_value;
                policy_new[(i, j)] = best_choice;
            }
        }

        let vo_new = DMatrix::from_fn(n_b, n_y, |i, j| vc_new[(i, j)].max(v_default[j]));
        let mut gap = 0.0_f64;
        for (new, old) in vo_new.iter().zip(vo.iter()) {
            gap = gap.max((new - old).abs());
        }

        vc = vc_new;
        vo = vo_new;
        policy_idx = policy_new;

        trace!("value iteration {it}: sup gap {gap:.3e}");
        if gap < config.inner_tol {
            converged = true;
            iterations = it;
            break;
        }
    }

    // Indifference resolves toward default.
    let default_indicator = DMatrix::from_fn(n_b, n_y, |i, j| {
        if v_default[j] >= vc[(i, j)] {
            1.0
        } else {
            0.0
        }
    });

    Ok(PolicySolution {
        vc,
        vo,
        policy_idx,
        default_indicator,
        iterations,
        converged,
    })
}
