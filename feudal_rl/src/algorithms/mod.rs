//! Algorithm components for FeUdal training.
//!
//! - `categorical`: action sampler over the worker's probabilities
//! - `returns`: scalar return / GAE recursions for both time-scales
//! - `feudal_loss`: the four FeUdal loss terms of one rollout
//! - `grad_clip`: global gradient-norm clipping

pub mod categorical;
pub mod feudal_loss;
pub mod grad_clip;
pub mod returns;

#[cfg(test)]
mod tests;

pub use categorical::Categorical;
pub use feudal_loss::{estimate_losses, Bootstrap, FeudalLosses};
pub use grad_clip::{clip_global_grad_norm, global_grad_norm};
pub use returns::{
    discounted_returns, gae_advantages, manager_offset_pairs, worker_rewards,
    ReturnParams,
};
