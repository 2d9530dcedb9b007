//! Model contract between the training loop and a FeUdal network.
//!
//! The loop never looks inside the network. It needs, per step, the two value
//! heads, the worker's action distribution, the manager's goal, the manager's
//! transition-prediction term (`nabla_dcos`) and the next recurrent state.
//!
//! # Usage Pattern
//!
//! ```ignore
//! let state = model.init_state(1, &device);
//! let out = model.forward(obs, state);          // builds the graph
//! let r_i = model.intrinsic_reward(&out.state); // cosine intrinsic reward
//! // next rollout, same episode:
//! let state = model.reset_states_grad(out.state);
//! ```
//!
//! Models implement [`FeudalPolicy`] for any `B: Backend`; the trainer
//! additionally requires `AutodiffModule<B>` so gradients can be taken.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Output of one forward pass.
#[derive(Debug, Clone)]
pub struct FeudalOutput<B: Backend, S> {
    /// Worker value estimates [batch, 1].
    pub value_worker: Tensor<B, 2>,
    /// Manager value estimates [batch, 1].
    pub value_manager: Tensor<B, 2>,
    /// Worker action probabilities [batch, n_actions].
    pub action_probs: Tensor<B, 2>,
    /// Manager goal [batch, goal_dim].
    pub goal: Tensor<B, 2>,
    /// Manager transition-prediction term [batch]: cosine between the latent
    /// transition over the last `c` steps and the goal emitted `c` steps ago.
    pub nabla_dcos: Tensor<B, 1>,
    /// Updated recurrent state.
    pub state: S,
}

/// A manager/worker policy with a shared recurrent state.
pub trait FeudalPolicy<B: Backend>: Module<B> + Clone {
    /// Recurrent state bundle, opaque to the training loop.
    type State: Clone;

    /// Manager horizon `c`.
    fn horizon(&self) -> usize;

    /// Number of discrete actions the worker chooses from.
    fn n_actions(&self) -> usize;

    /// Fresh state for the start of an episode.
    fn init_state(&self, batch_size: usize, device: &B::Device) -> Self::State;

    /// Same state values with the gradient history severed, so that
    /// backpropagation only reaches into the upcoming rollout.
    fn reset_states_grad(&self, state: Self::State) -> Self::State;

    /// Forward one timestep.
    ///
    /// # Arguments
    /// * `obs` - Observation batch [batch, obs_size]
    /// * `state` - State produced by the previous call (or `init_state`)
    fn forward(&self, obs: Tensor<B, 2>, state: Self::State) -> FeudalOutput<B, Self::State>;

    /// Intrinsic reward for the worker, computed from the state after a step [batch].
    fn intrinsic_reward(&self, state: &Self::State) -> Tensor<B, 1>;
}
