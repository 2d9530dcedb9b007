//! FeUdal loss estimation.
//!
//! Turns one rollout into the four loss terms of the manager/worker update:
//!
//! - `policy_loss = −Σ_t (log π(a_t) · A^W_t + β · H_t)`
//! - `manager_loss = −Σ_{t+c<T} (R^M_t − V^M_t) · d_cos_{t+c}`
//! - `value_worker_loss = ½ Σ_t (R^W_t − V^W_t)²`
//! - `value_manager_loss = ½ Σ_t (R^M_t − V^M_t)²`
//!
//! Return targets are built from rewards and the detached bootstrap, so they
//! are constants; the worker advantage A^W is a GAE over detached values and
//! only weights the log-probabilities. The manager advantage stays attached to
//! `V^M` in the goal term.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};

use super::returns::{
    discounted_returns, gae_advantages, manager_offset_pairs, worker_rewards, ReturnParams,
};
use crate::buffers::trajectory::Trajectory;

/// Detached value estimates of the state following the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bootstrap {
    pub worker: f32,
    pub manager: f32,
}

impl Bootstrap {
    /// Bootstrap after a terminal (or truncated) step.
    pub fn terminal() -> Self {
        Self::default()
    }

    /// Read the two value heads [1, 1] of a bootstrap forward pass.
    pub fn from_values<B: Backend>(value_worker: Tensor<B, 2>, value_manager: Tensor<B, 2>) -> Self {
        Self {
            worker: value_worker.detach().into_scalar().elem::<f32>(),
            manager: value_manager.detach().into_scalar().elem::<f32>(),
        }
    }
}

/// The four loss terms of one update, each a [1] tensor.
#[derive(Debug, Clone)]
pub struct FeudalLosses<B: Backend> {
    pub policy_loss: Tensor<B, 1>,
    pub manager_loss: Tensor<B, 1>,
    pub value_worker_loss: Tensor<B, 1>,
    pub value_manager_loss: Tensor<B, 1>,
}

impl<B: Backend> FeudalLosses<B> {
    fn zeros(device: &B::Device) -> Self {
        Self {
            policy_loss: Tensor::zeros([1], device),
            manager_loss: Tensor::zeros([1], device),
            value_worker_loss: Tensor::zeros([1], device),
            value_manager_loss: Tensor::zeros([1], device),
        }
    }

    /// `policy + manager + c_M · value_manager + c_W · value_worker`.
    pub fn total(&self, value_worker_coef: f32, value_manager_coef: f32) -> Tensor<B, 1> {
        self.policy_loss.clone()
            + self.manager_loss.clone()
            + self.value_manager_loss.clone().mul_scalar(value_manager_coef)
            + self.value_worker_loss.clone().mul_scalar(value_worker_coef)
    }
}

/// Build the FeUdal losses for one rollout.
///
/// # Arguments
///
/// * `trajectory` - step records in temporal order
/// * `bootstrap` - detached values after the last step (zero when done)
/// * `params` - discounts, GAE τ and intrinsic reward weight
/// * `entropy_coef` - entropy bonus weight β
/// * `horizon` - manager horizon `c`
/// * `device` - device for the zero losses of an empty trajectory
pub fn estimate_losses<B: Backend>(
    trajectory: &Trajectory<B>,
    bootstrap: Bootstrap,
    params: &ReturnParams,
    entropy_coef: f32,
    horizon: usize,
    device: &B::Device,
) -> FeudalLosses<B> {
    let (values_worker, values_manager, log_probs, entropies, partials) = match (
        trajectory.values_worker(),
        trajectory.values_manager(),
        trajectory.log_probs(),
        trajectory.entropies(),
        trajectory.manager_partial_losses(),
    ) {
        (Some(vw), Some(vm), Some(lp), Some(ent), Some(dcos)) => (vw, vm, lp, ent, dcos),
        _ => return FeudalLosses::zeros(device),
    };
    let device = values_worker.device();

    let rewards = trajectory.rewards();
    let worker_stream = worker_rewards(&rewards, &trajectory.intrinsic_rewards(), params.alpha);

    // Value targets
    let returns_worker = discounted_returns(&worker_stream, bootstrap.worker, params.gamma_worker);
    let returns_manager = discounted_returns(&rewards, bootstrap.manager, params.gamma_manager);

    let advantage_worker =
        Tensor::<B, 1>::from_floats(returns_worker.as_slice(), &device) - values_worker.clone();
    let advantage_manager =
        Tensor::<B, 1>::from_floats(returns_manager.as_slice(), &device) - values_manager;

    let value_worker_loss = advantage_worker.powf_scalar(2.0).sum().mul_scalar(0.5);
    let value_manager_loss = advantage_manager.clone().powf_scalar(2.0).sum().mul_scalar(0.5);

    // Worker policy gradient weighted by GAE over detached values
    let mut values: Vec<f32> = values_worker.detach().into_data().iter::<f32>().collect();
    values.push(bootstrap.worker);
    let gae = gae_advantages(&worker_stream, &values, params.gamma_worker, params.tau_worker);
    let gae = Tensor::<B, 1>::from_floats(gae.as_slice(), &device);

    let policy_loss = -(log_probs * gae + entropies.mul_scalar(entropy_coef)).sum();

    // Manager goal term, offset by the horizon
    let pairs = manager_offset_pairs(trajectory.len(), horizon);
    let manager_loss = if pairs.is_empty() {
        Tensor::zeros([1], &device)
    } else {
        let advantage_idx: Vec<i32> = pairs.iter().map(|&(i, _)| i as i32).collect();
        let prediction_idx: Vec<i32> = pairs.iter().map(|&(_, j)| j as i32).collect();
        let advantage_idx = Tensor::<B, 1, Int>::from_ints(advantage_idx.as_slice(), &device);
        let prediction_idx = Tensor::<B, 1, Int>::from_ints(prediction_idx.as_slice(), &device);

        -(advantage_manager.select(0, advantage_idx) * partials.select(0, prediction_idx)).sum()
    };

    FeudalLosses {
        policy_loss,
        manager_loss,
        value_worker_loss,
        value_manager_loss,
    }
}
