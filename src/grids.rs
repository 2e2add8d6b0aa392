//! Income-process discretization and asset-grid construction.

use nalgebra::{DMatrix, DVector};

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};

/// Discretizes the AR(1) log-income process with the Rouwenhorst method.
///
/// Returns the income grid `exp(z)` together with the row-stochastic
/// transition matrix. The symmetric case `p = q = (1 + rho) / 2` is used, which
/// matches the process's unconditional moments exactly for any persistence.
pub fn rouwenhorst(rho: f64, sigma_eps: f64, n_states: usize) -> Result<(DVector<f64>, DMatrix<f64>)> {
    if n_states < 2 {
        return Err(ModelError::invalid_parameter(
            "n_states",
            n_states as f64,
            "must be at least 2",
        ));
    }
    if !(rho > -1.0 && rho < 1.0) {
        return Err(ModelError::invalid_parameter(
            "rho",
            rho,
            "must lie in (-1, 1)",
        ));
    }
    if !(sigma_eps > 0.0) {
        return Err(ModelError::invalid_parameter(
            "sigma_eps",
            sigma_eps,
            "must be positive",
        ));
    }

    let p = (1.0 + rho) / 2.0;
    let q = p;
    let mut transition = DMatrix::from_row_slice(2, 2, &[p, 1.0 - p, 1.0 - q, q]);

    for n in 3..=n_states {
        let prev = transition;
        let mut next = DMatrix::zeros(n, n);
        for row in 0..n - 1 {
            for col in 0..n - 1 {
                next[(row, col)] += p * prev[(row, col)];
                next[(row, col + 1)] += (1.0 - p) * prev[(row, col)];
                next[(row + 1, col)] += (1.0 - q) * prev[(row, col)];
                next[(row + 1, col + 1)] += q * prev[(row, col)];
            }
        }
        // Interior rows pick up mass from two parent rows and must be renormalized.
        for row in 1..n - 1 {
            for col in 0..n {
                next[(row, col)] *= 0.5;
            }
        }
        transition = next;
    }

    let sigma_stationary = sigma_eps / (1.0 - rho * rho).sqrt();
    let psi = sigma_stationary * ((n_states - 1) as f64).sqrt();
    let y_grid = DVector::from_fn(n_states, |j, _| {
        let z = -psi + 2.0 * psi * j as f64 / (n_states - 1) as f64;
        z.exp()
    });

    Ok((y_grid, transition))
}

/// Builds the nonlinear asset/debt grid used for both today's and tomorrow's debt.
///
/// The lower end is the natural borrowing limit at the worst income
/// realization, `-(1 + r) * y_min / r`; spacing follows the power rule
/// `B[k] = b_min + (b_max - b_min) * (k / (n_b - 1))^nu`. Returns the grid and
/// the borrowing limit it starts from.
pub fn build_asset_grid(config: &ModelConfig, y_grid: &DVector<f64>) -> (DVector<f64>, f64) {
    let y_min = y_grid.min();
    let b_min = -((1.0 + config.r) * y_min) / config.r;

    let span = config.b_max - b_min;
    let scale = (config.n_b - 1) as f64;
    let b_grid = DVector::from_fn(config.n_b, |k, _| {
        b_min + span * (k as f64 / scale).powf(config.nu)
    });
    (b_grid, b_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rouwenhorst_rows_are_stochastic() {
        let (y_grid, transition) = rouwenhorst(0.94, 0.03, 7).unwrap();
        assert_eq!(transition.nrows(), 7);
        assert_eq!(transition.ncols(), 7);
        for row in 0..7 {
            let sum: f64 = transition.row(row).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
        for value in y_grid.iter() {
            assert!(*value > 0.0);
        }
    }

    #[test]
    fn rouwenhorst_two_state_case_is_closed_form() {
        let (_, transition) = rouwenhorst(0.5, 0.1, 2).unwrap();
        assert_relative_eq!(transition[(0, 0)], 0.75, epsilon = 1e-12);
        assert_relative_eq!(transition[(1, 0)], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn rouwenhorst_rejects_degenerate_inputs() {
        assert!(rouwenhorst(0.9, 0.03, 1).is_err());
        assert!(rouwenhorst(1.0, 0.03, 5).is_err());
        assert!(rouwenhorst(0.9, 0.0, 5).is_err());
    }

    #[test]
    fn asset_grid_is_strictly_increasing_and_spans_bounds() {
        let config = ModelConfig::default().with_grid_sizes(50, 5);
        let (y_grid, _) = rouwenhorst(config.rho, config.sigma_z, config.n_y).unwrap();
        let (b_grid, b_min) = build_asset_grid(&config, &y_grid);

        assert_eq!(b_grid.len(), 50);
        assert_relative_eq!(b_grid[0], b_min, epsilon = 1e-12);
        assert_relative_eq!(b_grid[49], config.b_max, epsilon = 1e-9);
        for k in 1..b_grid.len() {
            assert!(b_grid[k] > b_grid[k - 1]);
        }
    }
}
