//! Rollout collector behavior.
//!
//! # Episode Boundaries
//! - Environment end: record the step, reset, stop, bootstrap 0
//! - Length cap: same as an environment end
//! - Rollout budget reached mid-episode: bootstrap from the value heads,
//!   carry the recurrent state into the next call

use burn::tensor::{ElementConversion, Tensor};

use super::{small_net, ScriptedEnv, AB, OBS_SIZE};
use crate::algorithms::feudal_loss::Bootstrap;
use crate::environment::Environment;
use crate::error::TrainError;
use crate::metrics::TrainingMetrics;
use crate::model::FeudalPolicy;
use crate::nn::feudal_net::FeudalState;
use crate::runners::collector::{Rollout, RolloutCollector, TrainerState};

struct Harness {
    env: ScriptedEnv,
    state: TrainerState<FeudalState<AB>>,
    rng: fastrand::Rng,
    metrics: TrainingMetrics,
}

impl Harness {
    fn new(mut env: ScriptedEnv) -> Self {
        let observation = env.reset();
        Self {
            env,
            state: TrainerState::new(observation),
            rng: fastrand::Rng::with_seed(11),
            metrics: TrainingMetrics::new(),
        }
    }

    fn collect(&mut self, collector: &RolloutCollector, horizon: usize) -> Result<Rollout<AB>, TrainError> {
        let model = small_net(horizon);
        collector.collect(
            &mut self.env,
            &model,
            &mut self.state,
            &mut self.rng,
            &mut self.metrics,
            &Default::default(),
        )
    }
}

// ============================================================================
// Episode Boundaries
// ============================================================================

#[test]
fn test_immediate_done_gives_single_step_rollout() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![1.0], Some(1)));
    let rollout = harness.collect(&RolloutCollector::new(20, 1000), 3).unwrap();

    assert_eq!(rollout.trajectory.len(), 1);
    assert!(rollout.done);
    assert_eq!(rollout.bootstrap, Bootstrap::terminal());
    assert_eq!(harness.env.resets, 2);
    assert_eq!(harness.state.episode_length, 0);
    assert!(harness.state.done);
    assert_eq!(harness.metrics.episodes(), 1);
}

#[test]
fn test_terminal_mid_rollout_keeps_completed_steps() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![0.0, 0.0, 0.0, 0.0, 1.0], Some(5)));
    let rollout = harness.collect(&RolloutCollector::new(20, 1000), 2).unwrap();

    assert_eq!(rollout.trajectory.len(), 5);
    assert_eq!(rollout.trajectory.rewards(), vec![0.0, 0.0, 0.0, 0.0, 1.0]);
    assert!(rollout.done);
    assert!((harness.metrics.avg_reward() - 1.0).abs() < 1e-6);
}

/// The length cap ends the episode even though the environment never does.
#[test]
fn test_episode_length_cap_resets_environment() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![], None));
    let rollout = harness.collect(&RolloutCollector::new(10, 3), 2).unwrap();

    assert_eq!(rollout.trajectory.len(), 3);
    assert!(rollout.done);
    assert_eq!(rollout.bootstrap, Bootstrap::terminal());
    assert_eq!(harness.env.resets, 2);
    assert_eq!(harness.state.episode_length, 0);
}

/// The cap counts steps across rollouts of the same episode.
#[test]
fn test_episode_length_spans_rollouts() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![], None));
    let collector = RolloutCollector::new(2, 3);

    let first = harness.collect(&collector, 2).unwrap();
    assert_eq!(first.trajectory.len(), 2);
    assert!(!first.done);
    assert_eq!(harness.state.episode_length, 2);

    let second = harness.collect(&collector, 2).unwrap();
    assert_eq!(second.trajectory.len(), 1);
    assert!(second.done);
    assert_eq!(harness.state.episode_length, 0);
}

// ============================================================================
// Rollout Contents
// ============================================================================

#[test]
fn test_rewards_are_clipped() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![5.0, -3.0, 0.25], None));
    let rollout = harness.collect(&RolloutCollector::new(3, 1000), 2).unwrap();

    assert_eq!(rollout.trajectory.rewards(), vec![1.0, -1.0, 0.25]);
    assert!((harness.state.episode_return - 0.25).abs() < 1e-6);
}

#[test]
fn test_budget_reached_bootstraps_from_values() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![], None));
    let rollout = harness.collect(&RolloutCollector::new(4, 1000), 2).unwrap();

    assert_eq!(rollout.trajectory.len(), 4);
    assert!(!rollout.done);
    assert!(rollout.bootstrap.worker.is_finite());
    assert!(rollout.bootstrap.manager.is_finite());
    assert!(harness.state.recurrent.is_some());
    assert!(!harness.state.done);
    assert_eq!(harness.state.observation.len(), OBS_SIZE);
}

#[test]
fn test_records_carry_probabilities_and_bounded_intrinsic_reward() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![], None));
    let rollout = harness.collect(&RolloutCollector::new(6, 1000), 2).unwrap();

    for step in rollout.trajectory.steps() {
        let log_prob: f32 = step.log_prob.clone().into_scalar().elem();
        assert!(log_prob <= 0.0 && log_prob.is_finite());
        assert!((-1.0..=1.0).contains(&step.intrinsic_reward));
        assert_eq!(step.value_worker.dims(), [1]);
        assert_eq!(step.manager_partial_loss.dims(), [1]);
    }
    assert_eq!(harness.env.actions.len(), 6);
    assert!(harness.env.actions.iter().all(|&a| a < super::N_ACTIONS));
}

/// A continuing rollout starts from the previous state with its graph cut.
#[test]
fn test_continuation_detaches_previous_state() {
    let mut harness = Harness::new(ScriptedEnv::new(vec![], None));
    let collector = RolloutCollector::new(2, 1000);
    let model = small_net(2);
    let device = Default::default();

    let _ = collector
        .collect::<AB, _, _>(
            &mut harness.env,
            &model,
            &mut harness.state,
            &mut harness.rng,
            &mut harness.metrics,
            &device,
        )
        .unwrap();
    let carried = harness.state.recurrent.clone().unwrap();
    let detached = model.reset_states_grad(carried.clone());

    let diff: f32 = (carried.worker.hidden - detached.worker.hidden.clone())
        .abs()
        .sum()
        .into_scalar()
        .elem();
    assert!(diff < 1e-7, "detaching must keep values");

    let obs: Tensor<AB, 2> = Tensor::ones([1, OBS_SIZE], &device);
    assert_eq!(model.forward(obs, detached).action_probs.dims(), [1, super::N_ACTIONS]);
}

/// Gradients of the next rollout stop at the carried state.
#[test]
fn test_continuation_blocks_gradient_into_previous_rollout() {
    let model = small_net(2);
    let device = Default::default();
    let first_obs: Tensor<AB, 2> = Tensor::ones([1, OBS_SIZE], &device).require_grad();

    let out = model.forward(first_obs.clone(), model.init_state(1, &device));
    let attached = out.state.clone();

    let loss_through = |state: FeudalState<AB>| {
        let out = model.forward(Tensor::ones([1, OBS_SIZE], &device), state);
        out.value_worker.sum() + out.value_manager.sum() + out.action_probs.sum()
    };

    let grads = loss_through(attached).backward();
    assert!(first_obs.grad(&grads).is_some());

    let grads = loss_through(model.reset_states_grad(out.state)).backward();
    assert!(first_obs.grad(&grads).is_none());
}

// ============================================================================
// Error Paths
// ============================================================================

#[test]
fn test_wrong_observation_length_is_fatal() {
    let mut env = ScriptedEnv::new(vec![], None);
    env.step_obs_size = OBS_SIZE + 1;
    let mut harness = Harness::new(env);

    let err = harness.collect(&RolloutCollector::new(3, 1000), 2).unwrap_err();
    match err {
        TrainError::ObservationShape { expected, actual } => {
            assert_eq!(expected, OBS_SIZE);
            assert_eq!(actual, OBS_SIZE + 1);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

/// An action the environment does not declare stops collection before stepping.
#[test]
fn test_action_outside_environment_range_is_fatal() {
    let mut env = ScriptedEnv::new(vec![], None);
    env.action_count = super::N_ACTIONS - 1;
    let mut harness = Harness::new(env);

    let err = harness.collect(&RolloutCollector::new(200, 1000), 2).unwrap_err();
    match err {
        TrainError::InvalidAction { action, n_actions } => {
            assert_eq!(action, super::N_ACTIONS - 1);
            assert_eq!(n_actions, super::N_ACTIONS - 1);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(harness.env.actions.iter().all(|&a| a < super::N_ACTIONS - 1));
}
