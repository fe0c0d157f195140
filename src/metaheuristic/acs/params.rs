use crate::config::ConfigError;

use decorum::R64;
use serde::{Deserialize, Serialize};

/// Controls how likely an ant follows the strongest trail instead of exploring.
///
/// The probability is `base + coeff * entropy^exp`, where entropy is the dispersion
/// of the colony at the end of the previous iteration.
#[derive(Copy, Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct ExploitationParams {
    pub base: f64,
    pub coeff: f64,
    pub exp: f64,
}

impl ExploitationParams {
    pub fn factor(&self, entropy: f64) -> f64 {
        self.base + self.coeff * entropy.powf(self.exp)
    }
}

/// Deposit and evaporation of one of the two pheromone update rules.
#[derive(Copy, Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct PheromoneParams {
    pub increment: f64,
    pub evaporation: f64,
}

impl PheromoneParams {
    /// Local rule, applied whenever an ant traverses an edge.
    /// Pulls the pheromone towards `increment`.
    pub fn local_update(&self, pheromone: R64) -> R64 {
        R64::from_inner(1.0 - self.evaporation) * pheromone
            + R64::from_inner(self.evaporation * self.increment)
    }

    pub fn decay(&self, pheromone: R64) -> R64 {
        R64::from_inner(1.0 - self.evaporation) * pheromone
    }

    /// Amount deposited on every edge of a best path visiting `path_nodes` nodes.
    pub fn reinforcement(&self, path_nodes: usize) -> R64 {
        R64::from_inner(self.evaporation * (self.increment / path_nodes as f64))
    }

    fn validate(&self, rule: &'static str) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.evaporation) {
            return Err(ConfigError::invalid(
                rule,
                format!("evaporation {} is not in [0, 1]", self.evaporation),
            ));
        }
        if !self.increment.is_finite() || self.increment < 0.0 {
            return Err(ConfigError::invalid(
                rule,
                format!("increment {} is not a finite, non-negative number", self.increment),
            ));
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct Params {
    pub ant_count: usize,
    pub max_steps: usize,
    pub max_iterations: usize,
    pub exploitation: ExploitationParams,
    pub local: PheromoneParams,
    pub global: PheromoneParams,
    pub break_on_path_change: f64,
    pub break_on_iterations: usize,
}

impl Params {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ant_count: usize,
        max_steps: usize,
        max_iterations: usize,
        exploitation: ExploitationParams,
        local: PheromoneParams,
        global: PheromoneParams,
        break_on_path_change: f64,
        break_on_iterations: usize,
    ) -> Self {
        Params {
            ant_count,
            max_steps,
            max_iterations,
            exploitation,
            local,
            global,
            break_on_path_change,
            break_on_iterations,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ant_count == 0 {
            return Err(ConfigError::invalid("ant_count", "at least one ant is needed"));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::invalid("max_steps", "ants need at least one step"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid(
                "max_iterations",
                "at least one iteration is needed",
            ));
        }
        if self.break_on_iterations == 0 {
            return Err(ConfigError::invalid(
                "break_on_iterations",
                "convergence needs at least one iteration",
            ));
        }
        if self.break_on_path_change.is_nan() || self.break_on_path_change < 0.0 {
            return Err(ConfigError::invalid(
                "break_on_path_change",
                format!("{} is not a non-negative number", self.break_on_path_change),
            ));
        }

        let ExploitationParams { base, coeff, exp } = self.exploitation;
        if !base.is_finite() || !coeff.is_finite() || !exp.is_finite() {
            return Err(ConfigError::invalid(
                "exploitation",
                "base, coeff and exp have to be finite",
            ));
        }

        self.local.validate("local")?;
        self.global.validate("global")
    }
}
