//! Categorical sampler over the worker's action probabilities.
//!
//! - [`Categorical::sample`]: detached draw, one action per batch row
//! - [`Categorical::log_prob`]: log-probability with gradient flow
//! - [`Categorical::entropy_proxy`]: the `-(log_prob * probs).sum()` regularizer

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

const LOG_EPS: f32 = 1e-8;

/// Categorical distribution parameterized by probabilities [batch, n_actions].
#[derive(Debug, Clone)]
pub struct Categorical<B: Backend> {
    probs: Tensor<B, 2>,
}

impl<B: Backend> Categorical<B> {
    /// Create from a probability tensor whose rows sum to 1.
    pub fn new(probs: Tensor<B, 2>) -> Self {
        Self { probs }
    }

    pub fn probs(&self) -> &Tensor<B, 2> {
        &self.probs
    }

    pub fn n_actions(&self) -> usize {
        self.probs.dims()[1]
    }

    pub fn batch_size(&self) -> usize {
        self.probs.dims()[0]
    }

    /// Draw one action per row.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Vec<usize> {
        let probs: Vec<f32> = self.probs.clone().detach().into_data().iter::<f32>().collect();
        let n_actions = self.n_actions();

        probs
            .chunks(n_actions)
            .map(|row| sample_index(row, rng.f32()))
            .collect()
    }

    /// Log-probability of `actions` [batch], with gradient flow into the probabilities.
    pub fn log_prob(&self, actions: &[usize]) -> Tensor<B, 1> {
        let device = self.probs.device();
        let batch_size = actions.len();

        let indices: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
        let indices: Tensor<B, 1, Int> = Tensor::from_ints(indices.as_slice(), &device);
        let indices: Tensor<B, 2, Int> = indices.reshape([batch_size, 1]);

        let selected: Tensor<B, 1> = self.probs.clone().gather(1, indices).flatten(0, 1);
        (selected + LOG_EPS).log()
    }

    /// `-(log_prob * probs).sum(1)` [batch].
    ///
    /// Not the categorical entropy `-Σ p log p`: the sampled action's
    /// log-probability is broadcast over the whole probability row. Gradients
    /// flow through both factors.
    pub fn entropy_proxy(&self, log_prob: Tensor<B, 1>) -> Tensor<B, 1> {
        let batch_size = self.batch_size();
        let log_prob: Tensor<B, 2> = log_prob.reshape([batch_size, 1]);
        let weighted: Tensor<B, 2> = (log_prob * self.probs.clone()).sum_dim(1);
        -weighted.flatten(0, 1)
    }
}

/// Inverse-CDF draw from one probability row.
///
/// Falls back to the last action when rounding leaves the cumulative sum just
/// under `u`.
fn sample_index(row: &[f32], u: f32) -> usize {
    let mut cumsum = 0.0;
    for (action, &p) in row.iter().enumerate() {
        cumsum += p;
        if u < cumsum {
            return action;
        }
    }
    row.len().saturating_sub(1)
}
