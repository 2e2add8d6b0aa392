//! One-call orchestration: discretize, build grids, solve, and check.

use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::config::ModelConfig;
use crate::diagnostics::{equilibrium_diagnostics, DiagnosticsReport};
use crate::equilibrium::{solve_equilibrium, EquilibriumSolution};
use crate::error::Result;
use crate::grids::{build_asset_grid, rouwenhorst};

/// Everything produced by a full model run: the inputs that were constructed,
/// the equilibrium, and the consistency report computed from it.
#[derive(Clone, Debug, Serialize)]
pub struct ModelResult {
    /// The configuration the run was solved under.
    pub config: ModelConfig,
    /// Discretized income realizations.
    pub y_grid: DVector<f64>,
    /// Income transition matrix.
    pub transition: DMatrix<f64>,
    /// Asset/debt grid.
    pub b_grid: DVector<f64>,
    /// Natural borrowing limit the asset grid starts from.
    pub b_min: f64,
    /// The solved equilibrium.
    pub solution: EquilibriumSolution,
    /// Identity checks recomputed from the solution.
    pub diagnostics: DiagnosticsReport,
}

/// Runs the full model: income discretization, asset grid, equilibrium solve,
/// and diagnostics.
pub fn run_model(config: &ModelConfig) -> Result<ModelResult> {
    config.validate()?;

    let (y_grid, transition) = rouwenhorst(config.rho, config.sigma_z, config.n_y)?;
    let (b_grid, b_min) = build_asset_grid(config, &y_grid);

    let solution = solve_equilibrium(config, &b_grid, &y_grid, &transition)?;
    let diagnostics = equilibrium_diagnostics(&solution, &b_grid, &y_grid, &transition, config);
    debug!(
        "diagnostics: price error {:.3e}, envelope error {:.3e}, bellman error {:.3e}",
        diagnostics.max_price_error,
        diagnostics.max_envelope_error,
        diagnostics.max_bellman_policy_error
    );

    Ok(ModelResult {
        config: config.clone(),
        y_grid,
        transition,
        b_grid,
        b_min,
        solution,
        diagnostics,
    })
}
