//! Model calibration and solver knobs, validated before any iteration runs.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Calibration and solver configuration for the sovereign-default model.
///
/// Defaults reproduce the standard permanent-exclusion calibration. All public
/// entry points call [`validate`](ModelConfig::validate) before touching the
/// grids, so a malformed configuration fails fast with an
/// [`InvalidParameter`](crate::error::ModelError::InvalidParameter) error
/// instead of surfacing mid-iteration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Borrower discount factor, in `(0, 1)`.
    pub beta: f64,
    /// Persistence of the AR(1) log-income process, in `(-1, 1)`.
    pub rho: f64,
    /// Standard deviation of log-income innovations, positive.
    pub sigma_z: f64,
    /// Risk-free interest rate faced by lenders, positive.
    pub r: f64,
    /// Income received while permanently excluded after default, positive.
    pub y_default: f64,
    /// Number of points on the asset/debt grid, at least 2.
    pub n_b: usize,
    /// Number of discretized income states, at least 2.
    pub n_y: usize,
    /// Upper end of the asset grid.
    pub b_max: f64,
    /// Curvature of the asset grid spacing (1 is linear), positive.
    pub nu: f64,
    /// Iteration cap for the inner value-function iteration.
    pub max_inner_iter: usize,
    /// Iteration cap for the outer bond-price fixed point.
    pub max_outer_iter: usize,
    /// Sup-norm tolerance on the option value, positive.
    pub inner_tol: f64,
    /// Sup-norm tolerance on the bond-price update, positive.
    pub outer_tol: f64,
    /// Relaxation applied to the price update, in `(0, 1]`; 1 replaces outright.
    pub q_relax: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            beta: 0.95,
            rho: 0.94,
            sigma_z: 0.03,
            r: 0.02,
            y_default: 0.8,
            n_b: 400,
            n_y: 7,
            b_max: 50.0,
            nu: 1.0,
            max_inner_iter: 5_000,
            max_outer_iter: 5_000,
            inner_tol: 1e-7,
            outer_tol: 1e-7,
            q_relax: 1.0,
        }
    }
}

impl ModelConfig {
    /// Checks every parameter against its admissible range.
    pub fn validate(&self) -> Result<()> {
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(ModelError::invalid_parameter(
                "beta",
                self.beta,
                "must lie in (0, 1)",
            ));
        }
        if !(self.rho > -1.0 && self.rho < 1.0) {
            return Err(ModelError::invalid_parameter(
                "rho",
                self.rho,
                "must lie in (-1, 1)",
            ));
        }
        if !(self.sigma_z > 0.0) {
            return Err(ModelError::invalid_parameter(
                "sigma_z",
                self.sigma_z,
                "must be positive",
            ));
        }
        if !(self.r > 0.0) {
            return Err(ModelError::invalid_parameter(
                "r",
                self.r,
                "must be positive",
            ));
        }
        if !(self.y_default > 0.0) {
            return Err(ModelError::invalid_parameter(
                "y_default",
                self.y_default,
                "must be positive",
            ));
        }
        if !(self.nu > 0.0) {
            return Err(ModelError::invalid_parameter(
                "nu",
                self.nu,
                "must be positive",
            ));
        }
        if self.n_b < 2 {
            return Err(ModelError::invalid_parameter(
                "n_b",
                self.n_b as f64,
                "must be at least 2",
            ));
        }
        if self.n_y < 2 {
            return Err(ModelError::invalid_parameter(
                "n_y",
                self.n_y as f64,
                "must be at least 2",
            ));
        }
        if !(self.inner_tol > 0.0) {
            return Err(ModelError::invalid_parameter(
                "inner_tol",
                self.inner_tol,
                "must be positive",
            ));
        }
        if !(self.outer_tol > 0.0) {
            return Err(ModelError::invalid_parameter(
                "outer_tol",
                self.outer_tol,
                "must be positive",
            ));
        }
        if self.max_inner_iter < 1 {
            return Err(ModelError::invalid_parameter(
                "max_inner_iter",
                self.max_inner_iter as f64,
                "must be at least 1",
            ));
        }
        if self.max_outer_iter < 1 {
            return Err(ModelError::invalid_parameter(
                "max_outer_iter",
                self.max_outer_iter as f64,
                "must be at least 1",
            ));
        }
        if !(self.q_relax > 0.0 && self.q_relax <= 1.0) {
            return Err(ModelError::invalid_parameter(
                "q_relax",
                self.q_relax,
                "must lie in (0, 1]",
            ));
        }
        Ok(())
    }

    /// Closed-form value of permanent autarky, `ln(y_default) / (1 - beta)`.
    ///
    /// Constant across debt levels and income states; exclusion is permanent,
    /// so the defaulter consumes `y_default` forever.
    pub fn v_default(&self) -> f64 {
        self.y_default.ln() / (1.0 - self.beta)
    }

    /// Risk-free bond price `1 / (1 + r)`, the price of debt carrying no default risk.
    pub fn risk_free_price(&self) -> f64 {
        1.0 / (1.0 + self.r)
    }

    /// Overrides the grid resolution while preserving other defaults.
    pub fn with_grid_sizes(mut self, n_b: usize, n_y: usize) -> Self {
        self.n_b = n_b;
        self.n_y = n_y;
        self
    }

    /// Overrides both convergence tolerances while preserving other defaults.
    pub fn with_tolerances(mut self, inner_tol: f64, outer_tol: f64) -> Self {
        self.inner_tol = inner_tol;
        self.outer_tol = outer_tol;
        self
    }

    /// Overrides both iteration caps while preserving other defaults.
    pub fn with_iteration_caps(mut self, max_inner_iter: usize, max_outer_iter: usize) -> Self {
        self.max_inner_iter = max_inner_iter;
        self.max_outer_iter = max_outer_iter;
        self
    }

    /// Overrides the price-update relaxation while preserving other defaults.
    pub fn with_relaxation(mut self, q_relax: f64) -> Self {
        self.q_relax = q_relax;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_configuration_validates() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_discount_factor_is_rejected() {
        let config = ModelConfig {
            beta: 1.0,
            ..ModelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidParameter { name: "beta", .. })
        ));
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let config = ModelConfig::default().with_tolerances(0.0, 1e-7);
        assert!(matches!(
            config.validate(),
            Err(ModelError::InvalidParameter {
                name: "inner_tol",
                ..
            })
        ));
    }

    #[test]
    fn autarky_value_matches_geometric_sum() {
        let config = ModelConfig::default();
        // ln(y_d) * (1 + beta + beta^2 + ...) == ln(y_d) / (1 - beta).
        assert_relative_eq!(
            config.v_default(),
            config.y_default.ln() / (1.0 - config.beta),
            epsilon = 1e-12
        );
        assert!(config.v_default() < 0.0);
    }
}
