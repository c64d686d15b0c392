//! Train [`Agent`].
mod config;
mod sampler;
use crate::{
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::info;
pub use sampler::{EpisodeStats, Sampler};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// Counters at the end of [`Trainer::train()`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrainSummary {
    /// Number of environment steps.
    pub env_steps: usize,

    /// Number of optimization steps.
    pub opt_steps: usize,

    /// Number of finished episodes.
    pub episodes: usize,

    /// The best evaluation score, if an evaluation was run.
    pub best_eval_reward: Option<f32>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages training loop and related objects.
///
/// # Training loop
///
/// 1. Reset the counters `env_steps`, `opt_steps` and `episodes`.
/// 2. Do an environment step with [`Sampler`] and push the transition into
///    the replay buffer. `env_steps += 1`.
/// 3. If the replay buffer holds at least `warmup_period` transitions and
///    `env_steps % opt_interval == 0`:
///     1. Do an optimization step. `opt_steps += 1`. Every
///        `record_agent_info_interval` steps the record of the agent is kept.
///     2. Every `record_compute_cost_interval` optimization steps, add
///        `"env_steps_per_sec"` and `"opt_steps_per_sec"`.
///     3. Every `eval_interval` optimization steps, evaluate the agent in
///        evaluation mode and add `"eval_reward"`. If it is the best so far,
///        save the agent in `(model_dir)/best`.
/// 4. If the episode ended, `episodes += 1` and add `"episode_reward"`,
///    `"episode_length"`, `"mean_episode_reward"`, `"episodes"` and
///    `"env_steps"`. Every `checkpoint_interval` episodes, save the agent in
///    `(model_dir)/episode_(episodes)`.
/// 5. Store the record; every `flush_record_interval` environment steps
///    flush the recorder with `env_steps`.
/// 6. Stop if any of `max_env_steps`, `max_episodes` and `max_opts` is
///    reached, otherwise back to 2.
/// 7. Flush the recorder and save the agent in `(model_dir)/final`.
///
/// The target network is synchronized by the agent inside its
/// optimization step.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[StepProcessor]
///     C -->|ExperienceBufferBase::Item|D[ReplayBufferBase]
///     D -->|ReplayBufferBase::Batch|A
/// ```
pub struct Trainer {
    config: TrainerConfig,

    /// Optimization steps for computing optimization steps per second.
    opt_steps_for_ops: usize,

    /// Timer for computing optimization steps per second.
    timer_for_ops: Duration,
}

impl Trainer {
    /// Constructs a trainer, rejecting configurations that never stop.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            opt_steps_for_ops: 0,
            timer_for_ops: Duration::new(0, 0),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn save_model<E, R>(agent: &dyn Agent<E, R>, path: &Path) -> Result<()>
    where
        E: Env,
        R: ReplayBufferBase,
    {
        agent.save_params(path)?;
        info!("Saved the model in {:?}", path);
        Ok(())
    }

    fn model_path(&self, name: &str) -> Option<PathBuf> {
        self.config
            .model_dir
            .as_ref()
            .map(|dir| Path::new(dir).join(name))
    }

    /// Returns optimization steps per second, then resets the internal counter.
    fn opt_steps_per_sec(&mut self) -> f32 {
        let secs = self.timer_for_ops.as_secs_f32();
        let osps = if secs > 0.0 {
            self.opt_steps_for_ops as f32 / secs
        } else {
            0.0
        };
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        osps
    }

    /// Performs an optimization step if the warmup period is over and the
    /// environment step count is on the optimization interval.
    ///
    /// The second return value is `true` if an optimization step was done.
    fn opt_step<E, R>(
        &mut self,
        agent: &mut Box<dyn Agent<E, R>>,
        buffer: &mut R,
        env_steps: usize,
        opt_steps: &mut usize,
    ) -> Result<(Record, bool)>
    where
        E: Env,
        R: ExperienceBufferBase + ReplayBufferBase,
    {
        if buffer.len() < self.config.warmup_period || env_steps % self.config.opt_interval != 0 {
            return Ok((Record::empty(), false));
        }

        let timer = Instant::now();
        let record = if (*opt_steps + 1) % self.config.record_agent_info_interval == 0 {
            agent.opt_with_record(buffer)?
        } else {
            agent.opt(buffer)?;
            Record::empty()
        };
        *opt_steps += 1;
        self.timer_for_ops += timer.elapsed();
        self.opt_steps_for_ops += 1;

        Ok((record, true))
    }

    /// Trains the agent.
    ///
    /// `env` and `step_proc` produce the transitions pushed into `buffer`;
    /// `evaluator` holds its own environment.
    pub fn train<E, P, R, D>(
        &mut self,
        env: E,
        step_proc: P,
        agent: &mut Box<dyn Agent<E, R>>,
        buffer: &mut R,
        recorder: &mut Box<dyn AggregateRecorder>,
        evaluator: &mut D,
    ) -> Result<TrainSummary>
    where
        E: Env,
        P: StepProcessor<E>,
        R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
        D: Evaluator<E>,
    {
        let mut sampler = Sampler::new(env, step_proc);
        let mut env_steps: usize = 0;
        let mut opt_steps: usize = 0;
        let mut episodes: usize = 0;
        let mut best_eval_reward: Option<f32> = None;
        let mut recent_rewards = VecDeque::with_capacity(self.config.reward_window);
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        sampler.reset_fps_counter();
        agent.train();

        loop {
            let (mut record, episode) = sampler.sample_and_push(agent, buffer)?;
            env_steps += 1;

            let (record_agent, is_opt) = self.opt_step(agent, buffer, env_steps, &mut opt_steps)?;
            record.merge_inplace(record_agent);

            if is_opt {
                if opt_steps % self.config.record_compute_cost_interval == 0 {
                    record.insert("env_steps_per_sec", Scalar(sampler.fps()));
                    record.insert("opt_steps_per_sec", Scalar(self.opt_steps_per_sec()));
                }

                if opt_steps % self.config.eval_interval == 0 {
                    info!("Starts evaluation of the trained model");
                    agent.eval();
                    let record_eval = evaluator.evaluate(agent)?;
                    agent.train();
                    let eval_reward = record_eval.get_scalar("eval_reward")?;
                    info!("Evaluation at opt step {}: {}", opt_steps, eval_reward);
                    record.merge_inplace(record_eval);

                    if best_eval_reward.map_or(true, |best| eval_reward > best) {
                        best_eval_reward = Some(eval_reward);
                        if let Some(path) = self.model_path("best") {
                            Self::save_model(agent.as_ref(), &path)?;
                        }
                    }
                }
            }

            if let Some(stats) = episode {
                episodes += 1;
                if recent_rewards.len() == self.config.reward_window {
                    recent_rewards.pop_front();
                }
                recent_rewards.push_back(stats.reward);
                let mean_reward =
                    recent_rewards.iter().sum::<f32>() / recent_rewards.len() as f32;

                record.insert("episode_reward", Scalar(stats.reward));
                record.insert("episode_length", Scalar(stats.length as f32));
                record.insert("mean_episode_reward", Scalar(mean_reward));
                record.insert("episodes", Scalar(episodes as f32));
                record.insert("env_steps", Scalar(env_steps as f32));

                if episodes % self.config.log_episode_interval == 0 {
                    info!(
                        "episode {}, env steps {}, opt steps {}, reward {}, mean reward {:.3}",
                        episodes, env_steps, opt_steps, stats.reward, mean_reward
                    );
                }

                if episodes % self.config.checkpoint_interval == 0 {
                    if let Some(path) = self.model_path(&format!("episode_{}", episodes)) {
                        Self::save_model(agent.as_ref(), &path)?;
                    }
                }
            }

            if !record.is_empty() {
                recorder.store(record);
            }

            if env_steps % self.config.flush_record_interval == 0 {
                recorder.flush(env_steps as _);
            }

            if env_steps >= self.config.max_env_steps
                || episodes >= self.config.max_episodes
                || opt_steps >= self.config.max_opts
            {
                break;
            }
        }

        recorder.flush(env_steps as _);
        if let Some(path) = self.model_path("final") {
            Self::save_model(agent.as_ref(), &path)?;
        }

        Ok(TrainSummary {
            env_steps,
            opt_steps,
            episodes,
            best_eval_reward,
        })
    }
}
