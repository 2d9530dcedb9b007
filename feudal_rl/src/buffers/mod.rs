//! Rollout storage.
//!
//! - `Trajectory`: per-step records of one rollout, consumed after each update

pub mod trajectory;

pub use trajectory::{StepRecord, Trajectory};
