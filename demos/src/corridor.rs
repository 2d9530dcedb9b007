//! One-dimensional corridor with a distant goal.
//!
//! The agent starts at cell 0 and must walk to the last cell. The reward is
//! sparse: 1 on reaching the goal, 0 otherwise. Observations are a one-hot
//! position, so the task needs memory-free but long-horizon credit
//! assignment.

use feudal_rl::{Environment, StepResult};

/// Number of actions: left, stay, right.
pub const N_ACTIONS: usize = 3;

#[derive(Debug, Clone)]
pub struct Corridor {
    length: usize,
    position: usize,
}

impl Corridor {
    /// Corridor of `length` cells (at least 2).
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(2),
            position: 0,
        }
    }

    fn observation(&self) -> Vec<f32> {
        let mut obs = vec![0.0; self.length];
        obs[self.position] = 1.0;
        obs
    }
}

impl Environment for Corridor {
    fn obs_size(&self) -> usize {
        self.length
    }

    fn n_actions(&self) -> usize {
        N_ACTIONS
    }

    fn reset(&mut self) -> Vec<f32> {
        self.position = 0;
        self.observation()
    }

    fn step(&mut self, action: usize) -> StepResult {
        match action {
            0 => self.position = self.position.saturating_sub(1),
            2 => self.position = (self.position + 1).min(self.length - 1),
            _ => {}
        }
        let terminal = self.position == self.length - 1;
        let reward = if terminal { 1.0 } else { 0.0 };
        StepResult::new(self.observation(), reward, terminal, false)
    }
}
