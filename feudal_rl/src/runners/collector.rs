//! Rollout collection for a single environment.
//!
//! Each call drives the environment for at most `num_steps` steps with the
//! current policy and stops early on episode end. The recurrent state is
//! carried across calls through [`TrainerState`]:
//!
//! ```text
//! done last time?  ── yes ─► init_state(1)
//!                  └─ no ──► reset_states_grad(previous)   (BPTT limited to this rollout)
//! ```

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

use crate::algorithms::categorical::Categorical;
use crate::algorithms::feudal_loss::Bootstrap;
use crate::buffers::trajectory::{StepRecord, Trajectory};
use crate::config::FeudalConfig;
use crate::environment::Environment;
use crate::error::TrainError;
use crate::metrics::TrainingMetrics;
use crate::model::FeudalPolicy;

/// Loop state carried from one training iteration to the next.
#[derive(Debug, Clone)]
pub struct TrainerState<S> {
    /// Observation the next step acts on.
    pub observation: Vec<f32>,
    /// Recurrent state left by the previous rollout; `None` before the first.
    pub recurrent: Option<S>,
    /// Steps taken in the current episode.
    pub episode_length: usize,
    /// Whether the previous rollout ended its episode.
    pub done: bool,
    /// Completed training iterations.
    pub epoch: usize,
    /// Sum of clipped rewards in the current episode.
    pub episode_return: f32,
}

impl<S> TrainerState<S> {
    /// State at the start of training, right after `env.reset()`.
    ///
    /// `done` starts `true` so the first rollout begins from a fresh recurrent state.
    pub fn new(observation: Vec<f32>) -> Self {
        Self {
            observation,
            recurrent: None,
            episode_length: 0,
            done: true,
            epoch: 0,
            episode_return: 0.0,
        }
    }
}

/// Output of one collection call.
#[derive(Debug, Clone)]
pub struct Rollout<B: Backend> {
    pub trajectory: Trajectory<B>,
    /// Detached values after the last step; zero when `done`.
    pub bootstrap: Bootstrap,
    /// Whether the rollout ended on an episode end (terminal, truncated or length cap).
    pub done: bool,
}

/// Collects rollouts of at most `num_steps` steps.
#[derive(Debug, Clone)]
pub struct RolloutCollector {
    num_steps: usize,
    max_episode_length: usize,
}

impl RolloutCollector {
    pub fn new(num_steps: usize, max_episode_length: usize) -> Self {
        Self {
            num_steps,
            max_episode_length,
        }
    }

    pub fn from_config(config: &FeudalConfig) -> Self {
        Self::new(config.num_steps, config.max_episode_length)
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn max_episode_length(&self) -> usize {
        self.max_episode_length
    }

    /// Run the policy in `env` and record everything the update needs.
    ///
    /// On episode end the environment is reset, the finished episode is
    /// recorded in `metrics` and the rollout stops after that step.
    pub fn collect<B, M, E>(
        &self,
        env: &mut E,
        model: &M,
        state: &mut TrainerState<M::State>,
        rng: &mut fastrand::Rng,
        metrics: &mut TrainingMetrics,
        device: &B::Device,
    ) -> Result<Rollout<B>, TrainError>
    where
        B: Backend,
        M: FeudalPolicy<B>,
        E: Environment,
    {
        let obs_size = env.obs_size();
        let n_actions = env.n_actions();

        let mut recurrent = match state.recurrent.take() {
            Some(previous) if !state.done => model.reset_states_grad(previous),
            _ => model.init_state(1, device),
        };

        let mut trajectory = Trajectory::with_capacity(self.num_steps);
        let mut done = false;

        for _ in 0..self.num_steps {
            state.episode_length += 1;

            let obs = observation_tensor::<B>(&state.observation, obs_size, device)?;
            let out = model.forward(obs, recurrent);

            let dist = Categorical::new(out.action_probs);
            let actions = dist.sample(rng);
            let action = actions[0];
            if action >= n_actions {
                return Err(TrainError::InvalidAction { action, n_actions });
            }
            let log_prob = dist.log_prob(&actions);
            let entropy = dist.entropy_proxy(log_prob.clone());

            let step = env.step(action);
            check_observation(&step.observation, obs_size)?;

            done = step.done() || state.episode_length >= self.max_episode_length;
            let reward = step.reward.clamp(-1.0, 1.0);
            let intrinsic_reward = model
                .intrinsic_reward(&out.state)
                .into_scalar()
                .elem::<f32>();

            trajectory.push(StepRecord {
                value_worker: out.value_worker.reshape([1]),
                value_manager: out.value_manager.reshape([1]),
                log_prob,
                entropy,
                manager_partial_loss: out.nabla_dcos,
                reward,
                intrinsic_reward,
            });
            metrics.add_env_steps(1);
            state.episode_return += reward;
            recurrent = out.state;

            if done {
                log::debug!(
                    "episode finished after {} steps, return {:.3}",
                    state.episode_length,
                    state.episode_return
                );
                metrics.record_episode(state.episode_return);
                state.episode_length = 0;
                state.episode_return = 0.0;

                let observation = env.reset();
                check_observation(&observation, obs_size)?;
                state.observation = observation;
                break;
            }
            state.observation = step.observation;
        }

        let bootstrap = if done {
            Bootstrap::terminal()
        } else {
            let obs = observation_tensor::<B>(&state.observation, obs_size, device)?;
            let out = model.forward(obs, recurrent.clone());
            Bootstrap::from_values(out.value_worker, out.value_manager)
        };

        state.recurrent = Some(recurrent);
        state.done = done;

        Ok(Rollout {
            trajectory,
            bootstrap,
            done,
        })
    }
}

/// Error unless `observation` has exactly `expected` values.
pub fn check_observation(observation: &[f32], expected: usize) -> Result<(), TrainError> {
    if observation.len() != expected {
        return Err(TrainError::ObservationShape {
            expected,
            actual: observation.len(),
        });
    }
    Ok(())
}

/// Observation as a [1, obs_size] batch.
fn observation_tensor<B: Backend>(
    observation: &[f32],
    obs_size: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>, TrainError> {
    check_observation(observation, obs_size)?;
    Ok(Tensor::<B, 1>::from_floats(observation, device).reshape([1, obs_size]))
}
