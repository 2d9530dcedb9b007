//! Reference FeUdal network.
//!
//! A compact manager/worker network satisfying [`FeudalPolicy`]:
//!
//! ```text
//! obs ─► percept ─► z ─┬─► Mspace ─► s ─► manager LSTM ─► ĝ ─► g = ĝ/‖ĝ‖
//!                      │                                   └─► V_manager
//!                      └─► worker LSTM ─► U [n_actions × k] ─► V_worker
//!
//! w = φ(Σ_{i<c} g_{t-i})  (no gradient into the manager)
//! π = softmax(U w)
//! ```
//!
//! The state keeps the last `c + 1` latents `s` and goals `g`, which is what
//! both the manager's transition-prediction term and the worker's intrinsic
//! reward read:
//!
//! - `nabla_dcos_t = d_cos(s_t − s_{t−c}, g_{t−c})`, gradient into `g` only
//! - `r^I_t = 1/c · Σ_{i=1..c} d_cos(s_t − s_{t−i}, g_{t−i})`, no gradient
//!
//! # References
//!
//! - Vezhnevets et al., "FeUdal Networks for Hierarchical Reinforcement
//!   Learning" (2017)

use std::collections::VecDeque;

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::core::recurrent::{HiddenState, LstmCell, LstmCellConfig};
use crate::model::{FeudalOutput, FeudalPolicy};

const COSINE_EPS: f32 = 1e-8;

/// Configuration for [`FeudalNet`].
#[derive(Debug, Clone)]
pub struct FeudalNetConfig {
    /// Observation vector size.
    pub obs_size: usize,
    /// Number of discrete actions.
    pub n_actions: usize,
    /// Latent / goal dimension `d`.
    pub d_latent: usize,
    /// Goal embedding dimension `k`.
    pub d_goal_embedding: usize,
    /// Manager horizon `c`.
    pub horizon: usize,
}

impl FeudalNetConfig {
    /// Create a config with the paper's shape ratios scaled down (d=64, k=16, c=10).
    pub fn new(obs_size: usize, n_actions: usize) -> Self {
        Self {
            obs_size,
            n_actions,
            d_latent: 64,
            d_goal_embedding: 16,
            horizon: 10,
        }
    }

    pub fn with_d_latent(mut self, d: usize) -> Self {
        self.d_latent = d;
        self
    }

    pub fn with_d_goal_embedding(mut self, k: usize) -> Self {
        self.d_goal_embedding = k;
        self
    }

    /// Set the manager horizon `c` (clamped to at least 1).
    pub fn with_horizon(mut self, c: usize) -> Self {
        self.horizon = c.max(1);
        self
    }

    /// Initialize the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeudalNet<B> {
        let d = self.d_latent;
        let u_size = self.n_actions * self.d_goal_embedding;

        FeudalNet {
            percept: LinearConfig::new(self.obs_size, d).init(device),
            manager_space: LinearConfig::new(d, d).init(device),
            manager_rnn: LstmCellConfig::new(d, d).init(device),
            manager_value: LinearConfig::new(d, 1).init(device),
            worker_rnn: LstmCellConfig::new(d, u_size).init(device),
            worker_value: LinearConfig::new(u_size, 1).init(device),
            phi: LinearConfig::new(d, self.d_goal_embedding)
                .with_bias(false)
                .init(device),
            n_actions: self.n_actions,
            d_latent: d,
            d_goal_embedding: self.d_goal_embedding,
            horizon: self.horizon.max(1),
        }
    }
}

/// Recurrent state of [`FeudalNet`].
#[derive(Debug, Clone)]
pub struct FeudalState<B: Backend> {
    /// Worker LSTM state.
    pub worker: HiddenState<B>,
    /// Manager LSTM state.
    pub manager: HiddenState<B>,
    /// Last `c + 1` goals, oldest first [batch, d].
    pub goals: VecDeque<Tensor<B, 2>>,
    /// Last `c + 1` manager latents, oldest first [batch, d].
    pub latents: VecDeque<Tensor<B, 2>>,
}

impl<B: Backend> FeudalState<B> {
    fn push(&mut self, goal: Tensor<B, 2>, latent: Tensor<B, 2>, capacity: usize) {
        self.goals.push_back(goal);
        self.latents.push_back(latent);
        while self.goals.len() > capacity {
            self.goals.pop_front();
        }
        while self.latents.len() > capacity {
            self.latents.pop_front();
        }
    }
}

#[derive(Module, Debug)]
pub struct FeudalNet<B: Backend> {
    percept: Linear<B>,
    manager_space: Linear<B>,
    manager_rnn: LstmCell<B>,
    manager_value: Linear<B>,
    worker_rnn: LstmCell<B>,
    worker_value: Linear<B>,
    phi: Linear<B>,
    #[module(skip)]
    n_actions: usize,
    #[module(skip)]
    d_latent: usize,
    #[module(skip)]
    d_goal_embedding: usize,
    #[module(skip)]
    horizon: usize,
}

impl<B: Backend> FeudalPolicy<B> for FeudalNet<B> {
    type State = FeudalState<B>;

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn init_state(&self, batch_size: usize, device: &B::Device) -> FeudalState<B> {
        let capacity = self.horizon + 1;
        let zeros = || Tensor::<B, 2>::zeros([batch_size, self.d_latent], device);

        FeudalState {
            worker: self.worker_rnn.initial_state(batch_size, device),
            manager: self.manager_rnn.initial_state(batch_size, device),
            goals: (0..capacity).map(|_| zeros()).collect(),
            latents: (0..capacity).map(|_| zeros()).collect(),
        }
    }

    fn reset_states_grad(&self, state: FeudalState<B>) -> FeudalState<B> {
        FeudalState {
            worker: state.worker.detach(),
            manager: state.manager.detach(),
            goals: state.goals.into_iter().map(|g| g.detach()).collect(),
            latents: state.latents.into_iter().map(|s| s.detach()).collect(),
        }
    }

    fn forward(&self, obs: Tensor<B, 2>, state: FeudalState<B>) -> FeudalOutput<B, FeudalState<B>> {
        let [batch_size, _] = obs.dims();
        let FeudalState {
            worker,
            manager,
            goals,
            latents,
        } = state;

        let z = relu(self.percept.forward(obs));

        // Manager
        let latent = relu(self.manager_space.forward(z.clone()));
        let (goal_hat, manager) = self.manager_rnn.step(latent.clone(), manager);
        let value_manager = self.manager_value.forward(goal_hat.clone());
        let goal = goal_hat.clone() / l2_norm(goal_hat);

        // Worker
        let (u_flat, worker) = self.worker_rnn.step(z, worker);
        let value_worker = self.worker_value.forward(u_flat.clone());

        let mut state = FeudalState {
            worker,
            manager,
            goals,
            latents,
        };
        state.push(goal.clone(), latent.clone(), self.horizon + 1);

        // Pooled goals of the last c steps, current included; the oldest
        // entry of the window is c steps back and is excluded.
        let pooled = state
            .goals
            .iter()
            .skip(1)
            .cloned()
            .reduce(|acc, g| acc + g)
            .unwrap_or_else(|| goal.clone())
            .detach();
        let w = self
            .phi
            .forward(pooled)
            .reshape([batch_size, self.d_goal_embedding, 1]);
        let u = u_flat.reshape([batch_size, self.n_actions, self.d_goal_embedding]);
        let logits = u.matmul(w).reshape([batch_size, self.n_actions]);
        let action_probs = softmax(logits, 1);

        let nabla_dcos = match (state.latents.front(), state.goals.front()) {
            (Some(past_latent), Some(past_goal)) => cosine_similarity(
                latent.detach() - past_latent.clone().detach(),
                past_goal.clone(),
            ),
            _ => Tensor::zeros([batch_size], &goal.device()),
        };

        FeudalOutput {
            value_worker,
            value_manager,
            action_probs,
            goal,
            nabla_dcos,
            state,
        }
    }

    fn intrinsic_reward(&self, state: &FeudalState<B>) -> Tensor<B, 1> {
        let len = state.latents.len();
        let current = match state.latents.back() {
            Some(latent) => latent.clone().detach(),
            None => return Tensor::zeros([1], &self.phi.weight.val().device()),
        };
        let [batch_size, _] = current.dims();
        let device = current.device();

        let mut total = Tensor::<B, 1>::zeros([batch_size], &device);
        for i in 1..=self.horizon.min(len.saturating_sub(1)) {
            let past_latent = state.latents[len - 1 - i].clone().detach();
            let past_goal = state.goals[len - 1 - i].clone().detach();
            total = total + cosine_similarity(current.clone() - past_latent, past_goal);
        }
        total.div_scalar(self.horizon as f32)
    }
}

/// Row-wise L2 norm [batch, 1], kept away from zero.
fn l2_norm<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    (x.powf_scalar(2.0).sum_dim(1) + COSINE_EPS).sqrt()
}

/// Row-wise cosine similarity [batch].
fn cosine_similarity<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch_size, _] = a.dims();
    let dot = (a.clone() * b.clone()).sum_dim(1);
    let norms = (l2_norm(a) * l2_norm(b)).clamp_min(COSINE_EPS);
    (dot / norms).reshape([batch_size])
}
