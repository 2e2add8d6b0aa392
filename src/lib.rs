//! Equilibrium solver for the Arellano (2008) sovereign-default model.
//!
//! A sovereign borrower chooses debt issuance each period and may default;
//! competitive lenders price the debt so that expected returns equal the
//! risk-free rate net of default risk. The crate computes the
//! rational-expectations equilibrium of this model as a nested fixed point:
//!
//! - solve the borrower's optimal debt/default policy for a fixed bond-price
//!   schedule (`policy` module),
//! - update the price schedule from the implied default probabilities and
//!   repeat until both layers stabilize (`equilibrium` module),
//! - discretize the income process and build the asset grid (`grids` module),
//! - verify the theoretical identities after the fact (`diagnostics` module).
//!
//! Default carries permanent exclusion from credit markets, so the autarky
//! value has a closed form and the borrower's only margins are how much to
//! issue and whether to walk away.
//!
//! # Quick start
//!
//! ```no_run
//! use arellano::{run_model, ModelConfig};
//!
//! let config = ModelConfig::default()
//!     .with_grid_sizes(80, 5)
//!     .with_relaxation(0.8);
//!
//! let result = run_model(&config).expect("well-formed configuration");
//! println!(
//!     "converged: {} after {} price iterations",
//!     result.solution.converged, result.solution.outer_iterations
//! );
//! println!("max pricing error: {:.3e}", result.diagnostics.max_price_error);
//! ```
//!
//! Running out of iterations is never an error: both loops report convergence
//! through flags and iteration counts on the solution, and diagnostics carry
//! those flags along so downstream consumers can tell what they are looking at.

pub mod config;
pub mod diagnostics;
pub mod equilibrium;
pub mod error;
pub mod grids;
pub mod pipeline;
pub mod policy;

pub use config::ModelConfig;
pub use diagnostics::{equilibrium_diagnostics, DiagnosticsReport};
pub use equilibrium::{solve_equilibrium, EquilibriumSolution};
pub use error::{ModelError, Result};
pub use pipeline::{run_model, ModelResult};
pub use policy::{solve_policy, PolicySolution};
