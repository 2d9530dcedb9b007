//! Scalar return and advantage recursions for the two FeUdal time-scales.
//!
//! All recursions walk the rollout backward from a bootstrap value.
//!
//! ## Worker
//!
//! R^W_t = γ_W R^W_{t+1} + r_t + α r^I_t
//! δ_t   = r_t + α r^I_t + γ_W V^W(s_{t+1}) − V^W(s_t)
//! A_t   = Σ_{l≥0} (γ_W τ)^l δ_{t+l}
//!
//! ## Manager
//!
//! R^M_t = γ_M R^M_{t+1} + r_t
//!
//! The manager's goal loss pairs the advantage at step `t` with the
//! transition-prediction term recorded at `t + c`; steps closer than `c` to
//! the end of the rollout have no partner.
//!
//! ## References
//!
//! - Schulman et al., "High-Dimensional Continuous Control Using
//!   Generalized Advantage Estimation" (2016)
//! - Vezhnevets et al., "FeUdal Networks for Hierarchical Reinforcement
//!   Learning" (2017)

/// Discount and smoothing factors shared by the recursions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnParams {
    /// Intrinsic reward multiplier.
    pub alpha: f32,
    /// Worker discount γ_W.
    pub gamma_worker: f32,
    /// Manager discount γ_M.
    pub gamma_manager: f32,
    /// GAE smoothing τ for the worker.
    pub tau_worker: f32,
}

/// Worker reward stream: `r_t + α r^I_t`.
pub fn worker_rewards(rewards: &[f32], intrinsic_rewards: &[f32], alpha: f32) -> Vec<f32> {
    assert_eq!(rewards.len(), intrinsic_rewards.len());
    rewards
        .iter()
        .zip(intrinsic_rewards)
        .map(|(&r, &ri)| r + alpha * ri)
        .collect()
}

/// Bootstrapped discounted returns.
///
/// # Arguments
///
/// * `rewards` - per-step rewards [T]
/// * `bootstrap` - value of the state after the last step (0 if terminal)
/// * `gamma` - discount factor
///
/// # Returns
///
/// returns [T], `returns[t] = rewards[t] + gamma * returns[t + 1]`
pub fn discounted_returns(rewards: &[f32], bootstrap: f32, gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0f32; rewards.len()];
    let mut running = bootstrap;
    for t in (0..rewards.len()).rev() {
        running = gamma * running + rewards[t];
        returns[t] = running;
    }
    returns
}

/// GAE advantages for the worker.
///
/// `values` has one more entry than `rewards`: the bootstrap value sits at
/// index `T`. No done masking happens here; a rollout ends at the first done
/// step and the bootstrap is zero in that case.
///
/// # Arguments
///
/// * `rewards` - worker reward stream [T] (extrinsic + α · intrinsic)
/// * `values` - worker value estimates [T + 1]
/// * `gamma` - worker discount
/// * `tau` - GAE smoothing
pub fn gae_advantages(rewards: &[f32], values: &[f32], gamma: f32, tau: f32) -> Vec<f32> {
    let n = rewards.len();
    assert_eq!(values.len(), n + 1, "values must include the bootstrap entry");

    let mut advantages = vec![0.0f32; n];
    let mut gae = 0.0f32;
    for t in (0..n).rev() {
        let delta = rewards[t] + gamma * values[t + 1] - values[t];
        gae = gae * gamma * tau + delta;
        advantages[t] = gae;
    }
    advantages
}

/// `(advantage_step, prediction_step)` pairs of the manager goal loss.
///
/// Step `i` contributes with the prediction recorded at `i + horizon`, for
/// every `i` with `i + horizon < len`.
pub fn manager_offset_pairs(len: usize, horizon: usize) -> Vec<(usize, usize)> {
    (0..len)
        .filter_map(|i| {
            let j = i.checked_add(horizon)?;
            (j < len).then_some((i, j))
        })
        .collect()
}
