//! Configuration of [`Trainer`](super::Trainer).
use crate::error::DeepqError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// The loop stops as soon as one of `max_env_steps`, `max_episodes` and
/// `max_opts` is reached. A budget left at `usize::MAX` is unbounded, and at
/// least one of them must be bounded.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct TrainerConfig {
    /// The maximum number of environment steps.
    pub max_env_steps: usize,

    /// The maximum number of episodes.
    pub max_episodes: usize,

    /// The maximum number of optimization steps.
    pub max_opts: usize,

    /// Number of transitions in the replay buffer before learning starts.
    pub warmup_period: usize,

    /// Interval of optimization steps in environment steps.
    pub opt_interval: usize,

    /// Interval of evaluation in optimization steps.
    pub eval_interval: usize,

    /// Interval of saving checkpoints in episodes.
    pub checkpoint_interval: usize,

    /// Interval of recording agent information in optimization steps.
    pub record_agent_info_interval: usize,

    /// Interval of recording computational cost in optimization steps.
    pub record_compute_cost_interval: usize,

    /// Interval of flushing records in environment steps.
    pub flush_record_interval: usize,

    /// Number of recent episodes in `mean_episode_reward`.
    pub reward_window: usize,

    /// Interval of progress logs in episodes.
    pub log_episode_interval: usize,

    /// Where checkpoints are saved. Nothing is saved if `None`.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_env_steps: usize::MAX,
            max_episodes: usize::MAX,
            max_opts: usize::MAX,
            warmup_period: 0,
            opt_interval: 1,
            eval_interval: usize::MAX,
            checkpoint_interval: usize::MAX,
            record_agent_info_interval: 100,
            record_compute_cost_interval: 1000,
            flush_record_interval: 1000,
            reward_window: 100,
            log_episode_interval: 10,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the maximum number of environment steps.
    pub fn max_env_steps(mut self, v: usize) -> Self {
        self.max_env_steps = v;
        self
    }

    /// Sets the maximum number of episodes.
    pub fn max_episodes(mut self, v: usize) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the maximum number of optimization steps.
    pub fn max_opts(mut self, v: usize) -> Self {
        self.max_opts = v;
        self
    }

    /// Sets warmup period in transitions.
    pub fn warmup_period(mut self, warmup_period: usize) -> Self {
        self.warmup_period = warmup_period;
        self
    }

    /// Sets the interval of optimization in environment steps.
    pub fn opt_interval(mut self, opt_interval: usize) -> Self {
        self.opt_interval = opt_interval;
        self
    }

    /// Sets the interval of evaluation in optimization steps.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of saving checkpoints in episodes.
    pub fn checkpoint_interval(mut self, v: usize) -> Self {
        self.checkpoint_interval = v;
        self
    }

    /// Sets the interval of recording agent information in optimization steps.
    pub fn record_agent_info_interval(mut self, v: usize) -> Self {
        self.record_agent_info_interval = v;
        self
    }

    /// Sets the interval of recording computation cost in optimization steps.
    pub fn record_compute_cost_interval(mut self, v: usize) -> Self {
        self.record_compute_cost_interval = v;
        self
    }

    /// Sets the interval of flushing records in environment steps.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Sets the number of episodes averaged in `mean_episode_reward`.
    pub fn reward_window(mut self, v: usize) -> Self {
        self.reward_window = v;
        self
    }

    /// Sets the interval of progress logs in episodes.
    pub fn log_episode_interval(mut self, v: usize) -> Self {
        self.log_episode_interval = v;
        self
    }

    /// Sets the directory where checkpoints are saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Checks that the loop terminates and that every interval is positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_env_steps == usize::MAX
            && self.max_episodes == usize::MAX
            && self.max_opts == usize::MAX
        {
            return Err(DeepqError::InvalidConfig(
                "one of max_env_steps, max_episodes and max_opts must be bounded".to_string(),
            )
            .into());
        }

        for (name, v) in [
            ("opt_interval", self.opt_interval),
            ("eval_interval", self.eval_interval),
            ("checkpoint_interval", self.checkpoint_interval),
            ("record_agent_info_interval", self.record_agent_info_interval),
            ("record_compute_cost_interval", self.record_compute_cost_interval),
            ("flush_record_interval", self.flush_record_interval),
            ("reward_window", self.reward_window),
            ("log_episode_interval", self.log_episode_interval),
        ] {
            if v == 0 {
                return Err(DeepqError::InvalidConfig(format!("{} must be positive", name)).into());
            }
        }

        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
