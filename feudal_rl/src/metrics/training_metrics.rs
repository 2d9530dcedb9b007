//! Training progress counters.

use std::collections::VecDeque;

/// Default number of finished episodes averaged by [`TrainingMetrics::avg_reward`].
pub const DEFAULT_REWARD_WINDOW: usize = 100;

/// Counters for a single-threaded training run.
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    /// Total environment steps
    env_steps: usize,
    /// Total optimizer updates
    train_steps: usize,
    /// Total episodes finished (terminal or truncated)
    episodes: usize,
    /// Returns of the most recent episodes
    recent_rewards: VecDeque<f32>,
    reward_window: usize,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::with_reward_window(DEFAULT_REWARD_WINDOW)
    }

    /// Average episode return over the last `window` episodes (at least 1).
    pub fn with_reward_window(window: usize) -> Self {
        let window = window.max(1);
        Self {
            env_steps: 0,
            train_steps: 0,
            episodes: 0,
            recent_rewards: VecDeque::with_capacity(window),
            reward_window: window,
        }
    }

    pub fn add_env_steps(&mut self, steps: usize) {
        self.env_steps += steps;
    }

    pub fn increment_train_steps(&mut self) {
        self.train_steps += 1;
    }

    /// Record a finished episode and its (clipped) return.
    pub fn record_episode(&mut self, reward: f32) {
        self.episodes += 1;
        if self.recent_rewards.len() == self.reward_window {
            self.recent_rewards.pop_front();
        }
        self.recent_rewards.push_back(reward);
    }

    pub fn env_steps(&self) -> usize {
        self.env_steps
    }

    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Mean return of the recent episodes; 0 before the first one finishes.
    pub fn avg_reward(&self) -> f32 {
        if self.recent_rewards.is_empty() {
            return 0.0;
        }
        self.recent_rewards.iter().sum::<f32>() / self.recent_rewards.len() as f32
    }

    pub fn reset(&mut self) {
        self.env_steps = 0;
        self.train_steps = 0;
        self.episodes = 0;
        self.recent_rewards.clear();
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
