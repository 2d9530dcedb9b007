//! Test suite for the rollout collector and the training loop.
//!
//! # Test Organization
//!
//! - `collector_tests`: episode boundaries, reward clipping, state carry-over
//! - `trainer_tests`: end-to-end updates, determinism, error paths
//!
//! All tests run a small [`FeudalNet`] on `Autodiff<NdArray>` against a
//! scripted environment whose rewards and episode ends are fixed in advance.

use burn::backend::{Autodiff, NdArray};

use crate::config::FeudalConfig;
use crate::environment::{Environment, StepResult};
use crate::nn::feudal_net::{FeudalNet, FeudalNetConfig};

pub mod collector_tests;

pub type AB = Autodiff<NdArray<f32>>;

pub const OBS_SIZE: usize = 4;
pub const N_ACTIONS: usize = 3;

/// Environment replaying a fixed reward script.
///
/// Step `t` (1-based within the episode) pays `rewards[t - 1]` (0 past the
/// end). The episode terminates after `terminal_at` steps when set.
#[derive(Debug, Clone)]
pub struct ScriptedEnv {
    pub rewards: Vec<f32>,
    pub terminal_at: Option<usize>,
    pub t: usize,
    pub resets: usize,
    pub actions: Vec<usize>,
    /// Observation length returned from `step`; defaults to `OBS_SIZE`.
    pub step_obs_size: usize,
    /// Declared action count; defaults to `N_ACTIONS`.
    pub action_count: usize,
}

impl ScriptedEnv {
    pub fn new(rewards: Vec<f32>, terminal_at: Option<usize>) -> Self {
        Self {
            rewards,
            terminal_at,
            t: 0,
            resets: 0,
            actions: Vec::new(),
            step_obs_size: OBS_SIZE,
            action_count: N_ACTIONS,
        }
    }

    fn observation(&self, len: usize) -> Vec<f32> {
        (0..len).map(|i| (self.t as f32 * 0.1) + i as f32 * 0.05).collect()
    }
}

impl Environment for ScriptedEnv {
    fn obs_size(&self) -> usize {
        OBS_SIZE
    }

    fn n_actions(&self) -> usize {
        self.action_count
    }

    fn reset(&mut self) -> Vec<f32> {
        self.t = 0;
        self.resets += 1;
        self.observation(OBS_SIZE)
    }

    fn step(&mut self, action: usize) -> StepResult {
        self.actions.push(action);
        self.t += 1;
        let reward = self.rewards.get(self.t - 1).copied().unwrap_or(0.0);
        let terminal = self.terminal_at.map_or(false, |end| self.t >= end);
        StepResult::new(self.observation(self.step_obs_size), reward, terminal, false)
    }
}

pub fn small_net(horizon: usize) -> FeudalNet<AB> {
    FeudalNetConfig::new(OBS_SIZE, N_ACTIONS)
        .with_d_latent(8)
        .with_d_goal_embedding(4)
        .with_horizon(horizon)
        .init(&Default::default())
}

/// lr, alpha, entropy, tau, γ_W, γ_M, num_steps, max_episode_length, max_grad_norm
pub fn small_config(num_steps: usize) -> FeudalConfig {
    FeudalConfig::new(1e-3, 0.5, 0.01, 1.0, 0.99, 0.999, num_steps, 1000, 40.0).with_seed(7)
}
