//! Trajectory storage for one FeUdal rollout.
//!
//! Key characteristics:
//! - Built step by step by the collector, in temporal order
//! - Differentiable entries keep their autodiff graph until the update
//! - Consumed once by the loss estimator, then dropped

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Everything the backward pass needs from one environment step.
///
/// Tensor fields are [1] (batch size 1) and keep their graph.
#[derive(Debug, Clone)]
pub struct StepRecord<B: Backend> {
    /// Worker value estimate V^W(s_t).
    pub value_worker: Tensor<B, 1>,
    /// Manager value estimate V^M(s_t).
    pub value_manager: Tensor<B, 1>,
    /// Log-probability of the sampled action.
    pub log_prob: Tensor<B, 1>,
    /// Entropy regularizer for this step.
    pub entropy: Tensor<B, 1>,
    /// Manager transition-prediction term recorded at this step.
    pub manager_partial_loss: Tensor<B, 1>,
    /// Environment reward clipped to [-1, 1].
    pub reward: f32,
    /// Worker intrinsic reward.
    pub intrinsic_reward: f32,
}

/// Ordered step records of one rollout.
#[derive(Debug, Clone)]
pub struct Trajectory<B: Backend> {
    steps: Vec<StepRecord<B>>,
}

impl<B: Backend> Default for Trajectory<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Trajectory<B> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Pre-allocate for a rollout of `capacity` steps.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, step: StepRecord<B>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepRecord<B>] {
        &self.steps
    }

    /// Clipped environment rewards [T].
    pub fn rewards(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.reward).collect()
    }

    /// Intrinsic rewards [T].
    pub fn intrinsic_rewards(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.intrinsic_reward).collect()
    }

    /// Sum of clipped environment rewards.
    pub fn total_reward(&self) -> f32 {
        self.steps.iter().map(|s| s.reward).sum()
    }

    /// Worker values stacked to [T]; `None` when empty.
    pub fn values_worker(&self) -> Option<Tensor<B, 1>> {
        self.stack(|s| s.value_worker.clone())
    }

    /// Manager values stacked to [T]; `None` when empty.
    pub fn values_manager(&self) -> Option<Tensor<B, 1>> {
        self.stack(|s| s.value_manager.clone())
    }

    /// Log-probabilities stacked to [T]; `None` when empty.
    pub fn log_probs(&self) -> Option<Tensor<B, 1>> {
        self.stack(|s| s.log_prob.clone())
    }

    /// Entropy terms stacked to [T]; `None` when empty.
    pub fn entropies(&self) -> Option<Tensor<B, 1>> {
        self.stack(|s| s.entropy.clone())
    }

    /// Manager prediction terms stacked to [T]; `None` when empty.
    pub fn manager_partial_losses(&self) -> Option<Tensor<B, 1>> {
        self.stack(|s| s.manager_partial_loss.clone())
    }

    fn stack<F>(&self, field: F) -> Option<Tensor<B, 1>>
    where
        F: Fn(&StepRecord<B>) -> Tensor<B, 1>,
    {
        if self.steps.is_empty() {
            return None;
        }
        Some(Tensor::cat(self.steps.iter().map(field).collect(), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    fn record(value: f32, reward: f32) -> StepRecord<B> {
        let device = Default::default();
        let scalar = |v: f32| Tensor::<B, 1>::from_floats([v], &device);
        StepRecord {
            value_worker: scalar(value),
            value_manager: scalar(value * 2.0),
            log_prob: scalar(-0.5),
            entropy: scalar(0.5),
            manager_partial_loss: scalar(0.1),
            reward,
            intrinsic_reward: 0.0,
        }
    }

    #[test]
    fn test_empty_trajectory_has_no_columns() {
        let trajectory = Trajectory::<B>::new();
        assert!(trajectory.is_empty());
        assert!(trajectory.values_worker().is_none());
        assert!(trajectory.log_probs().is_none());
        assert_eq!(trajectory.total_reward(), 0.0);
    }

    #[test]
    fn test_columns_keep_temporal_order() {
        let mut trajectory = Trajectory::<B>::with_capacity(3);
        trajectory.push(record(1.0, 0.0));
        trajectory.push(record(2.0, 1.0));
        trajectory.push(record(3.0, -1.0));

        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory.rewards(), vec![0.0, 1.0, -1.0]);

        let values: Vec<f32> = trajectory
            .values_manager()
            .unwrap()
            .into_data()
            .iter::<f32>()
            .collect();
        assert_eq!(values, vec![2.0, 4.0, 6.0]);
    }
}
