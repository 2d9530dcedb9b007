//! Rollout collection and the FeUdal training loop.
//!
//! - [`RolloutCollector`]: drives one environment for up to `num_steps` steps
//! - [`FeudalTrainer`]: collect, estimate losses, clip, step; once per epoch

pub mod collector;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use collector::{Rollout, RolloutCollector, TrainerState};
pub use trainer::{create_optimizer, FeudalTrainer, IterationStats};
