//! # FeUdal: manager/worker reinforcement learning on Burn
//!
//! Training loop for FeUdal Networks: a manager sets directional goals in a
//! latent space every step and is trained on a horizon-offset transition
//! objective; a worker acts on the goals and is rewarded both by the
//! environment and by following them.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       FeudalTrainer                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  RolloutCollector ──► Trajectory + Bootstrap                 │
//! │        │                      │                              │
//! │   Environment            estimate_losses                     │
//! │   FeudalPolicy      (returns, GAE, manager offset c)         │
//! │                               │                              │
//! │                   total ─► backward ─► clip ─► Adam          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Training is single-threaded and synchronous. The loop only sees the model
//! through [`FeudalPolicy`]; [`FeudalNet`] is a reference implementation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feudal_rl::{create_optimizer, FeudalConfig, FeudalNet, FeudalNetConfig, FeudalTrainer};
//!
//! let config = FeudalConfig::from_json_file("feudal.json")?;
//! let model: FeudalNet<B> = FeudalNetConfig::new(obs_size, n_actions).init(&device);
//! let mut trainer = FeudalTrainer::new(config, model, create_optimizer(), device)?;
//! let mut state = trainer.initial_state(&mut env)?;
//! trainer.run(&mut env, &mut state, None, &mut ConsoleLogger::new(10))?;
//! ```

pub mod algorithms;
pub mod buffers;
pub mod config;
pub mod core;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod model;
pub mod nn;
pub mod runners;

pub use algorithms::{Bootstrap, Categorical, FeudalLosses, ReturnParams};
pub use buffers::{StepRecord, Trajectory};
pub use config::{ConfigError, FeudalConfig};
pub use environment::{Environment, StepResult};
pub use error::TrainError;
pub use metrics::{CSVLogger, ConsoleLogger, MetricsLogger, MultiLogger, TrainingMetrics, TrainingSnapshot};
pub use model::{FeudalOutput, FeudalPolicy};
pub use nn::{FeudalNet, FeudalNetConfig, FeudalState};
pub use runners::{create_optimizer, FeudalTrainer, IterationStats, Rollout, RolloutCollector, TrainerState};
