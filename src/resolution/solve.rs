use clap::Args;
use serde::{Serialize, Deserialize};

use crate::error::AlpError;
use crate::instance::Instance;
use crate::model::{ConstraintModel, MilpModel};

use super::decomposition::{DecompositionLoop, DecompositionOutcome};
use super::report::{DecompositionReporter, LogReporter};

#[derive(Debug, Clone, PartialEq, Args, Serialize, Deserialize)]
pub struct DecompositionConfig {
    /// Maximum number of master/subproblem iterations
    #[clap(long, default_value="20")]
    pub max_iterations: usize,
    /// Tolerance of the convergence check
    #[clap(long, default_value="1e-4")]
    pub tolerance: f64,
    /// Integer factor applied to the penalties in the master problem
    #[clap(long, default_value="100")]
    pub cost_scale: i64,
    /// Optional overall time budget in seconds
    #[clap(short, long)]
    pub timeout: Option<u64>,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        DecompositionConfig { max_iterations: 20, tolerance: 1e-4, cost_scale: 100, timeout: None }
    }
}

impl DecompositionConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_cost_scale(mut self, cost_scale: i64) -> Self {
        self.cost_scale = cost_scale;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn validate(&self) -> Result<(), AlpError> {
        if self.max_iterations < 1 {
            return Err(AlpError::InvalidConfig("max_iterations must be at least 1".to_string()));
        }
        if self.cost_scale < 1 {
            return Err(AlpError::InvalidConfig("cost_scale must be at least 1".to_string()));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(AlpError::InvalidConfig(format!("tolerance {} is not a non-negative number", self.tolerance)));
        }
        Ok(())
    }
}

/// Runs the decomposition with the `microlp` backend, reporting through `log`.
pub fn solve(instance: &Instance, config: &DecompositionConfig) -> Result<DecompositionOutcome, AlpError> {
    solve_with::<MilpModel>(instance, config, &mut LogReporter)
}

pub fn solve_with<M: ConstraintModel + Default>(
    instance: &Instance,
    config: &DecompositionConfig,
    reporter: &mut dyn DecompositionReporter,
) -> Result<DecompositionOutcome, AlpError> {
    DecompositionLoop::<M>::new(instance, config)?.run(reporter)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        config: DecompositionConfig,
    }

    #[test]
    fn flattened_defaults_match_default() {
        let cli = Cli::try_parse_from(["alp"]).unwrap();
        assert_eq!(cli.config, DecompositionConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from(["alp", "--max-iterations", "5", "--cost-scale", "10", "-t", "30"]).unwrap();
        assert_eq!(cli.config.max_iterations, 5);
        assert_eq!(cli.config.cost_scale, 10);
        assert_eq!(cli.config.timeout, Some(30));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(DecompositionConfig::default().with_max_iterations(0).validate().is_err());
        assert!(DecompositionConfig::default().with_cost_scale(0).validate().is_err());
        let config = DecompositionConfig { tolerance: f64::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(AlpError::InvalidConfig(_))));
    }
}
