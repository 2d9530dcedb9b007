//! FeUdal training loop.
//!
//! One iteration ("epoch"):
//!
//! ```text
//! collect ≤ num_steps steps ─► estimate 4 losses ─► total ─► backward
//!                                                      │
//!            Adam step ◄── clip global grad norm ◄─────┘
//! ```
//!
//! Everything is synchronous; the next rollout starts from the updated
//! parameters.
//!
//! # Usage
//!
//! ```ignore
//! let optimizer = create_optimizer::<B, FeudalNet<B>>();
//! let mut trainer = FeudalTrainer::new(config, model, optimizer, device)?;
//! let mut state = trainer.initial_state(&mut env)?;
//! trainer.run(&mut env, &mut state, Some(1000), &mut ConsoleLogger::new(10))?;
//! ```

use std::marker::PhantomData;

use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

use super::collector::{check_observation, RolloutCollector, TrainerState};
use crate::algorithms::feudal_loss::estimate_losses;
use crate::algorithms::grad_clip::clip_global_grad_norm;
use crate::algorithms::returns::ReturnParams;
use crate::config::FeudalConfig;
use crate::environment::Environment;
use crate::error::TrainError;
use crate::metrics::{MetricsLogger, TrainingMetrics, TrainingSnapshot};
use crate::model::FeudalPolicy;

/// Losses and diagnostics of one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStats {
    /// Index of the update.
    pub epoch: usize,
    /// Steps in the rollout.
    pub rollout_len: usize,
    /// Whether the rollout ended its episode.
    pub done: bool,
    pub total_loss: f32,
    pub policy_loss: f32,
    pub manager_loss: f32,
    /// Worker value loss times its coefficient.
    pub value_worker_loss: f32,
    /// Manager value loss times its coefficient.
    pub value_manager_loss: f32,
    /// Global gradient norm before clipping.
    pub grad_norm: f32,
}

impl IterationStats {
    /// Snapshot for loggers, with run-level counters from `metrics`.
    pub fn snapshot(&self, metrics: &TrainingMetrics, learning_rate: f64) -> TrainingSnapshot {
        TrainingSnapshot::new(
            self.epoch,
            metrics.env_steps(),
            metrics.episodes(),
            metrics.avg_reward(),
        )
        .with_losses(
            self.total_loss,
            self.policy_loss,
            self.manager_loss,
            self.value_worker_loss,
            self.value_manager_loss,
        )
        .with_gradient_norm(self.grad_norm)
        .with_rollout_len(self.rollout_len)
        .with_learning_rate(learning_rate)
    }
}

/// Adam optimizer for the FeUdal update.
///
/// Gradient clipping is applied by the trainer over the global norm, so the
/// optimizer itself does not clip.
pub fn create_optimizer<B, M>() -> impl Optimizer<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    AdamConfig::new().with_epsilon(1e-8).init()
}

/// Owns the model, optimizer and sampling RNG of a FeUdal run.
pub struct FeudalTrainer<B, M, O>
where
    B: AutodiffBackend,
    M: FeudalPolicy<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    config: FeudalConfig,
    model: M,
    optimizer: O,
    collector: RolloutCollector,
    rng: fastrand::Rng,
    metrics: TrainingMetrics,
    device: B::Device,
    _backend: PhantomData<B>,
}

impl<B, M, O> FeudalTrainer<B, M, O>
where
    B: AutodiffBackend,
    M: FeudalPolicy<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    /// Create a trainer after validating `config`.
    ///
    /// The sampling RNG is seeded from `config.seed` when set.
    pub fn new(config: FeudalConfig, model: M, optimizer: O, device: B::Device) -> Result<Self, TrainError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        Ok(Self {
            collector: RolloutCollector::from_config(&config),
            config,
            model,
            optimizer,
            rng,
            metrics: TrainingMetrics::new(),
            device,
            _backend: PhantomData,
        })
    }

    pub fn config(&self) -> &FeudalConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Reset `env` and build the loop state for the first iteration.
    ///
    /// Fails before touching `env` when the model and environment action
    /// counts differ.
    pub fn initial_state<E: Environment>(&self, env: &mut E) -> Result<TrainerState<M::State>, TrainError> {
        if self.model.n_actions() != env.n_actions() {
            return Err(TrainError::ActionCountMismatch {
                model: self.model.n_actions(),
                environment: env.n_actions(),
            });
        }
        let observation = env.reset();
        check_observation(&observation, env.obs_size())?;
        Ok(TrainerState::new(observation))
    }

    /// Collect one rollout and apply one optimizer update.
    ///
    /// On error no update is applied; `state` may already have advanced
    /// through the environment.
    pub fn train_iteration<E: Environment>(
        &mut self,
        env: &mut E,
        state: &mut TrainerState<M::State>,
    ) -> Result<IterationStats, TrainError> {
        let epoch = state.epoch;

        let rollout = self.collector.collect(
            env,
            &self.model,
            state,
            &mut self.rng,
            &mut self.metrics,
            &self.device,
        )?;

        let params = ReturnParams {
            alpha: self.config.alpha,
            gamma_worker: self.config.gamma_worker,
            gamma_manager: self.config.gamma_manager,
            tau_worker: self.config.tau_worker,
        };
        let losses = estimate_losses(
            &rollout.trajectory,
            rollout.bootstrap,
            &params,
            self.config.entropy_coef,
            self.model.horizon(),
            &self.device,
        );

        let value_worker_coef = self.config.value_worker_loss_coef;
        let value_manager_coef = self.config.value_manager_loss_coef;
        let total = losses.total(value_worker_coef, value_manager_coef);

        let total_loss = scalar(total.clone());
        if !total_loss.is_finite() {
            log::error!("epoch {}: total loss is {}", epoch, total_loss);
            return Err(TrainError::NonFiniteLoss {
                epoch,
                value: total_loss,
            });
        }

        let grads = total.backward();
        let mut grads = GradientsParams::from_grads(grads, &self.model);
        let grad_norm =
            clip_global_grad_norm::<B, M>(&self.model, &mut grads, self.config.max_grad_norm);
        if !grad_norm.is_finite() {
            log::error!("epoch {}: gradient norm is {}", epoch, grad_norm);
            return Err(TrainError::NonFiniteGradient { epoch });
        }

        self.model = self
            .optimizer
            .step(self.config.lr, self.model.clone(), grads);
        self.metrics.increment_train_steps();
        state.epoch += 1;

        let stats = IterationStats {
            epoch,
            rollout_len: rollout.trajectory.len(),
            done: rollout.done,
            total_loss,
            policy_loss: scalar(losses.policy_loss),
            manager_loss: scalar(losses.manager_loss),
            value_worker_loss: scalar(losses.value_worker_loss) * value_worker_coef,
            value_manager_loss: scalar(losses.value_manager_loss) * value_manager_coef,
            grad_norm,
        };

        log::debug!(
            "epoch {}: len={} total={:.4} policy={:.4} manager={:.4} vw={:.4} vm={:.4} grad_norm={:.4}",
            epoch,
            stats.rollout_len,
            stats.total_loss,
            stats.policy_loss,
            stats.manager_loss,
            stats.value_worker_loss,
            stats.value_manager_loss,
            stats.grad_norm
        );

        Ok(stats)
    }

    /// Train until `max_iterations` updates have been applied, or forever
    /// when `None`. Each update is reported to `logger`.
    pub fn run<E: Environment>(
        &mut self,
        env: &mut E,
        state: &mut TrainerState<M::State>,
        max_iterations: Option<usize>,
        logger: &mut dyn MetricsLogger,
    ) -> Result<(), TrainError> {
        log::info!(
            "training: num_steps={} horizon={} lr={}",
            self.config.num_steps,
            self.model.horizon(),
            self.config.lr
        );

        let mut iterations = 0;
        while max_iterations.map_or(true, |max| iterations < max) {
            let stats = self.train_iteration(env, state)?;
            logger.log(&stats.snapshot(&self.metrics, self.config.lr))?;
            iterations += 1;
        }

        logger.flush()?;
        log::info!(
            "training finished after {} updates, {} env steps, {} episodes",
            self.metrics.train_steps(),
            self.metrics.env_steps(),
            self.metrics.episodes()
        );
        Ok(())
    }
}

fn scalar<B: AutodiffBackend>(tensor: Tensor<B, 1>) -> f32 {
    tensor.into_scalar().elem::<f32>()
}
