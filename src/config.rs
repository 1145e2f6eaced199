//! Tunable constants, grouped by the stage that consumes them.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::file::ReadJsonFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub league_avg_goals: f64,
    pub home_advantage: f64,
    pub away_penalty: f64,
    pub bpa_home_weight: f64,
    pub bpa_away_weight: f64,
    pub home_lambda_bounds: RangeInclusive<f64>,
    pub away_lambda_bounds: RangeInclusive<f64>,
}
impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.home_advantage <= 0.0 || self.away_penalty <= 0.0 {
            bail!("site multipliers must be positive");
        }
        for (side, bounds) in [("home", &self.home_lambda_bounds), ("away", &self.away_lambda_bounds)] {
            if *bounds.start() <= 0.0 || bounds.start() > bounds.end() {
                bail!("{side} lambda bounds {bounds:?} must be positive and ordered");
            }
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            league_avg_goals: 1.35,
            home_advantage: 1.15,
            away_penalty: 0.90,
            bpa_home_weight: 1.5,
            bpa_away_weight: 1.0,
            home_lambda_bounds: 0.4..=5.0,
            away_lambda_bounds: 0.3..=4.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueConfig {
    /// Minimum expected value, as a fraction of the stake, for a market to be reported.
    pub min_value: f64,
    pub kelly_fraction: f64,
}
impl ValueConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.min_value < 0.0 {
            bail!("minimum value cannot be negative");
        }
        const VALID_KELLY_FRACTION: RangeInclusive<f64> = 0.0..=1.0;
        if !VALID_KELLY_FRACTION.contains(&self.kelly_fraction) {
            bail!("Kelly fraction must be in the range {VALID_KELLY_FRACTION:?}");
        }
        Ok(())
    }
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            min_value: 0.05,
            kelly_fraction: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub winner_threshold: f64,
    pub bias_step: f64,
    pub store_path: PathBuf,
}
impl CalibrationConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(0.0..1.0).contains(&self.winner_threshold) {
            bail!("winner threshold must be in the range [0, 1)");
        }
        if self.bias_step <= 0.0 {
            bail!("bias step must be positive");
        }
        Ok(())
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            winner_threshold: 0.45,
            bias_step: 0.02,
            store_path: PathBuf::from("data/bias_factors.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Stake under the fixed policy, as a fraction of the initial bankroll.
    pub fixed_stake_fraction: f64,
    /// Margin applied when odds have to be synthesised from model probabilities.
    pub synthetic_overround: f64,
}
impl SimulationConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(0.0..=1.0).contains(&self.fixed_stake_fraction) {
            bail!("fixed stake fraction must be in the range [0, 1]");
        }
        if self.synthetic_overround < 1.0 {
            bail!("synthetic overround cannot be less than 1");
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_stake_fraction: 0.02,
            synthetic_overround: 1.05,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub value: ValueConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}
impl Config {
    /// Reads a config from a JSON file, with absent sections taking their defaults, and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let config = Self::read_json_file(path).with_context(|| format!("reading config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.estimator.validate()?;
        self.value.validate()?;
        self.calibration.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"value": {"min_value": 0.1, "kelly_fraction": 0.5}}"#).unwrap();
        assert_eq!(0.1, config.value.min_value);
        assert_eq!(EstimatorConfig::default(), config.estimator);
        config.validate().unwrap();
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"calibration": {"winner_threshold": 0.5, "bias_step": 0.05, "store_path": "factors.json"}}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(0.05, config.calibration.bias_step);
        assert_eq!(ValueConfig::default(), config.value);

        assert!(Config::load(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        let mut config = Config::default();
        config.value.kelly_fraction = 1.5;
        assert_eq!(
            "Kelly fraction must be in the range 0.0..=1.0",
            config.validate().unwrap_err().to_string()
        );

        let mut config = Config::default();
        config.estimator.away_lambda_bounds = 2.0..=1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.synthetic_overround = 0.9;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.calibration.bias_step = 0.0;
        assert!(config.validate().is_err());
    }
}
