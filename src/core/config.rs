//! Simulation configuration
//!
//! Values here only affect scheduling and randomness, never the rules of the
//! reactor itself.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::error::{ReactorError, Result};

/// Tick cadence for an external driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
    Turbo,
}

impl StepSpeed {
    /// Wall-clock time between two ticks
    pub fn interval(self) -> Duration {
        Duration::from_millis(match self {
            StepSpeed::Slow => 1000,
            StepSpeed::Medium => 500,
            StepSpeed::Fast => 100,
            StepSpeed::Turbo => 10,
        })
    }
}

impl std::str::FromStr for StepSpeed {
    type Err = ReactorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(StepSpeed::Slow),
            "medium" => Ok(StepSpeed::Medium),
            "fast" => Ok(StepSpeed::Fast),
            "turbo" => Ok(StepSpeed::Turbo),
            other => Err(ReactorError::InvalidConfig(format!(
                "unknown step speed '{}'",
                other
            ))),
        }
    }
}

/// Configuration for a reactor run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// How long the scheduler waits for a program to yield its next action
    ///
    /// A program that takes longer is treated as stuck and the run is aborted.
    pub rendezvous_timeout_ms: u64,

    /// Cadence used by the timed driver
    pub step_speed: StepSpeed,

    /// Base seed for the per-region input generators
    ///
    /// Region `i` (in layout order) is seeded with `seed + i`.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rendezvous_timeout_ms: 1000,
            step_speed: StepSpeed::Medium,
            seed: 12345,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rendezvous_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn rendezvous_timeout(&self) -> Duration {
        Duration::from_millis(self.rendezvous_timeout_ms)
    }

    /// Seed for the region at `index` in layout order
    pub fn region_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rendezvous_timeout_ms == 0 {
            return Err(ReactorError::InvalidConfig(
                "rendezvous_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert_eq!(
            SimulationConfig::default().rendezvous_timeout(),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SimulationConfig::parse_toml("seed = 7\nstep_speed = \"turbo\"").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.step_speed, StepSpeed::Turbo);
        assert_eq!(config.rendezvous_timeout_ms, 1000);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = SimulationConfig::parse_toml("rendezvous_timeout_ms = 0").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_step_speed_intervals() {
        assert_eq!(StepSpeed::Slow.interval(), Duration::from_millis(1000));
        assert_eq!(StepSpeed::Turbo.interval(), Duration::from_millis(10));
        assert_eq!("FAST".parse::<StepSpeed>().unwrap(), StepSpeed::Fast);
    }

    #[test]
    fn test_region_seeds_differ() {
        let config = SimulationConfig::default().with_seed(u64::MAX);
        assert_eq!(config.region_seed(1), 0);
        assert_ne!(config.region_seed(0), config.region_seed(1));
    }
}
