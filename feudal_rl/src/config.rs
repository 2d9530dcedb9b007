//! Configuration for FeUdal training.
//!
//! Every hyperparameter of the training loop is required except the two
//! value-loss coefficients, which default to 0.5. Configurations can be built
//! in code with [`FeudalConfig::new`] plus the `with_*` setters, or loaded
//! from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A count parameter must be positive.
    #[error("{field} must be > 0, got {value}")]
    InvalidCount { field: &'static str, value: usize },
    /// A parameter is outside its valid range.
    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// The configuration file could not be read or parsed.
    #[error("invalid configuration file: {0}")]
    Parse(String),
}

fn default_value_loss_coef() -> f32 {
    0.5
}

/// Hyperparameters of the manager/worker training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeudalConfig {
    /// Adam learning rate.
    pub lr: f64,
    /// Intrinsic reward multiplier for the worker return.
    pub alpha: f32,
    /// Entropy bonus coefficient (beta).
    pub entropy_coef: f32,
    /// GAE smoothing for the worker advantage.
    pub tau_worker: f32,
    /// Worker discount factor.
    pub gamma_worker: f32,
    /// Manager discount factor.
    pub gamma_manager: f32,
    /// Maximum steps per rollout.
    pub num_steps: usize,
    /// Episodes are cut once they reach this many steps.
    pub max_episode_length: usize,
    /// Global L2 gradient norm threshold.
    pub max_grad_norm: f32,
    #[serde(default = "default_value_loss_coef")]
    pub value_worker_loss_coef: f32,
    #[serde(default = "default_value_loss_coef")]
    pub value_manager_loss_coef: f32,
    /// Seed for the action-sampling RNG. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl FeudalConfig {
    /// Create a configuration from the required hyperparameters.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lr: f64,
        alpha: f32,
        entropy_coef: f32,
        tau_worker: f32,
        gamma_worker: f32,
        gamma_manager: f32,
        num_steps: usize,
        max_episode_length: usize,
        max_grad_norm: f32,
    ) -> Self {
        Self {
            lr,
            alpha,
            entropy_coef,
            tau_worker,
            gamma_worker,
            gamma_manager,
            num_steps,
            max_episode_length,
            max_grad_norm,
            value_worker_loss_coef: default_value_loss_coef(),
            value_manager_loss_coef: default_value_loss_coef(),
            seed: None,
        }
    }

    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.build()
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Validate all configuration parameters.
    ///
    /// # Validation Rules
    /// - `num_steps` and `max_episode_length` must be > 0
    /// - `lr` and `max_grad_norm` must be positive
    /// - discounts and `tau_worker` must be in [0.0, 1.0]
    /// - `alpha`, `entropy_coef` and the value-loss coefficients must be non-negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_steps == 0 {
            return Err(ConfigError::InvalidCount {
                field: "num_steps",
                value: 0,
            });
        }
        if self.max_episode_length == 0 {
            return Err(ConfigError::InvalidCount {
                field: "max_episode_length",
                value: 0,
            });
        }

        if !(self.lr > 0.0 && self.lr.is_finite()) {
            return Err(out_of_range("lr", self.lr, 0.0, f64::INFINITY));
        }
        if !(self.max_grad_norm > 0.0 && self.max_grad_norm.is_finite()) {
            return Err(out_of_range(
                "max_grad_norm",
                self.max_grad_norm as f64,
                0.0,
                f64::INFINITY,
            ));
        }

        for (field, value) in [
            ("gamma_worker", self.gamma_worker),
            ("gamma_manager", self.gamma_manager),
            ("tau_worker", self.tau_worker),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(out_of_range(field, value as f64, 0.0, 1.0));
            }
        }

        for (field, value) in [
            ("alpha", self.alpha),
            ("entropy_coef", self.entropy_coef),
            ("value_worker_loss_coef", self.value_worker_loss_coef),
            ("value_manager_loss_coef", self.value_manager_loss_coef),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(out_of_range(field, value as f64, 0.0, f64::INFINITY));
            }
        }

        Ok(())
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Set the worker value-loss coefficient.
    pub fn with_value_worker_loss_coef(mut self, coef: f32) -> Self {
        self.value_worker_loss_coef = coef;
        self
    }

    /// Set the manager value-loss coefficient.
    pub fn with_value_manager_loss_coef(mut self, coef: f32) -> Self {
        self.value_manager_loss_coef = coef;
        self
    }

    /// Seed the action-sampling RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the rollout length.
    pub fn with_num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    /// Set the episode length cap.
    pub fn with_max_episode_length(mut self, length: usize) -> Self {
        self.max_episode_length = length;
        self
    }
}

fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        value,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> FeudalConfig {
        FeudalConfig::new(1e-4, 0.5, 0.01, 1.0, 0.99, 0.999, 400, 1_000_000, 40.0)
    }

    #[test]
    fn test_new_applies_value_loss_defaults() {
        let config = base();
        assert_eq!(config.value_worker_loss_coef, 0.5);
        assert_eq!(config.value_manager_loss_coef, 0.5);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_num_steps() {
        let err = base().with_num_steps(0).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidCount {
                field: "num_steps",
                value: 0
            }
        );
    }

    #[test]
    fn test_rejects_zero_episode_length() {
        assert!(base().with_max_episode_length(0).build().is_err());
    }

    #[test]
    fn test_rejects_discount_above_one() {
        let mut config = base();
        config.gamma_manager = 1.5;
        match config.validate() {
            Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, "gamma_manager"),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_positive_lr_and_grad_norm() {
        let mut config = base();
        config.lr = 0.0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.max_grad_norm = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_coefficients() {
        let config = base().with_value_worker_loss_coef(-0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_defaults_value_loss_coefs() {
        let json = r#"{
            "lr": 0.0001,
            "alpha": 0.5,
            "entropy_coef": 0.01,
            "tau_worker": 1.0,
            "gamma_worker": 0.99,
            "gamma_manager": 0.999,
            "num_steps": 400,
            "max_episode_length": 1000000,
            "max_grad_norm": 40.0
        }"#;
        let config = FeudalConfig::from_json_str(json).unwrap();
        assert_eq!(config, base());
    }

    #[test]
    fn test_json_missing_required_field_is_rejected() {
        let json = r#"{ "lr": 0.0001, "alpha": 0.5 }"#;
        assert!(matches!(
            FeudalConfig::from_json_str(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_file_round_trip() {
        let config = base().with_seed(7);
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_string(&config).unwrap()).unwrap();
        let loaded = FeudalConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
