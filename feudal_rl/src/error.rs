//! Error type for the training loop.
//!
//! Training failures are fatal: nothing here is retried or skipped, the
//! iteration that hit the error applies no update.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while collecting rollouts or applying updates.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The environment returned an observation of the wrong length.
    #[error("observation has {actual} values, environment declares {expected}")]
    ObservationShape { expected: usize, actual: usize },
    /// The sampler produced an action the environment does not accept.
    #[error("action {action} out of range for {n_actions} actions")]
    InvalidAction { action: usize, n_actions: usize },
    /// The model and environment disagree on the number of actions.
    #[error("model has {model} actions, environment has {environment}")]
    ActionCountMismatch { model: usize, environment: usize },
    /// Total loss was NaN or infinite.
    #[error("non-finite total loss {value} at epoch {epoch}")]
    NonFiniteLoss { epoch: usize, value: f32 },
    /// Gradient norm was NaN or infinite.
    #[error("non-finite gradient norm at epoch {epoch}")]
    NonFiniteGradient { epoch: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
