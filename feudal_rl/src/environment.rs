//! Environment abstraction for the training loop.
//!
//! The trainer drives a single environment with batch size 1. Observations
//! are flat `f32` vectors of a fixed length and actions are discrete indices.

/// Result from stepping an environment.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Observation after the step [obs_size]
    pub observation: Vec<f32>,
    /// Raw (unclipped) reward
    pub reward: f32,
    /// Episode ended due to goal/failure
    pub terminal: bool,
    /// Episode ended due to an environment-side time limit
    pub truncated: bool,
}

impl StepResult {
    /// Create a new step result.
    pub fn new(observation: Vec<f32>, reward: f32, terminal: bool, truncated: bool) -> Self {
        Self {
            observation,
            reward,
            terminal,
            truncated,
        }
    }

    /// Done flag (terminal OR truncated).
    pub fn done(&self) -> bool {
        self.terminal || self.truncated
    }
}

/// Trait for discrete-action environments driven by the trainer.
///
/// `step` does NOT auto-reset: the collector calls `reset` itself once an
/// episode is done.
pub trait Environment {
    /// Size of the observation vector.
    fn obs_size(&self) -> usize;

    /// Number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Vec<f32>;

    /// Apply `action` and advance one step.
    fn step(&mut self, action: usize) -> StepResult;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn obs_size(&self) -> usize {
        (**self).obs_size()
    }

    fn n_actions(&self) -> usize {
        (**self).n_actions()
    }

    fn reset(&mut self) -> Vec<f32> {
        (**self).reset()
    }

    fn step(&mut self, action: usize) -> StepResult {
        (**self).step(action)
    }
}
