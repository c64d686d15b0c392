//! Interaction with the training environment.
use crate::{record::Record, Agent, Env, ExperienceBufferBase, ReplayBufferBase, StepProcessor};
use anyhow::{Context, Result};
use std::time::Instant;

/// Return and length of a finished episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeStats {
    /// Sum of the rewards of the episode.
    pub reward: f32,

    /// Number of environment steps of the episode.
    pub length: usize,
}

/// Runs environment steps with an agent and pushes the resulting transitions
/// into a replay buffer.
///
/// The environment is reset lazily on the first step and automatically at the
/// end of every episode. The sampler also keeps track of the running episode
/// and of the number of environment steps per second.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,
    episode_reward: f32,
    episode_length: usize,
    n_env_steps_for_fps: usize,
    timer_for_fps: Instant,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a new sampler with the given environment and step processor.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
            episode_reward: 0.0,
            episode_length: 0,
            n_env_steps_for_fps: 0,
            timer_for_fps: Instant::now(),
        }
    }

    /// Resets the counter of environment steps per second.
    pub fn reset_fps_counter(&mut self) {
        self.n_env_steps_for_fps = 0;
        self.timer_for_fps = Instant::now();
    }

    /// Returns environment steps per second since the last call, then resets the counter.
    pub fn fps(&mut self) -> f32 {
        let secs = self.timer_for_fps.elapsed().as_secs_f32();
        let fps = if secs > 0.0 {
            self.n_env_steps_for_fps as f32 / secs
        } else {
            0.0
        };
        self.reset_fps_counter();
        fps
    }

    /// Samples an action, steps the environment and pushes a transition into `buffer`.
    ///
    /// Returns the record emitted by the environment and, if the step ended
    /// an episode, the statistics of that episode.
    pub fn sample_and_push<R, R_>(
        &mut self,
        agent: &mut Box<dyn Agent<E, R>>,
        buffer: &mut R_,
    ) -> Result<(Record, Option<EpisodeStats>)>
    where
        R: ReplayBufferBase,
        R_: ExperienceBufferBase<Item = P::Output>,
    {
        let obs = match self.prev_obs.take() {
            Some(obs) => obs,
            None => {
                let obs = self.env.reset()?;
                self.step_processor.reset(obs.clone());
                obs
            }
        };

        let act = agent.sample(&obs)?;
        let (step, record) = self.env.step_with_reset(&act)?;
        self.n_env_steps_for_fps += 1;
        self.episode_reward += step.reward;
        self.episode_length += 1;

        let is_done = step.is_done();
        self.prev_obs = match is_done {
            true => Some(
                step.init_obs
                    .clone()
                    .context("the environment did not reset at the end of an episode")?,
            ),
            false => Some(step.obs.clone()),
        };

        // The step processor restarts from `init_obs` by itself.
        let transition = self.step_processor.process(step)?;
        buffer.push(transition)?;

        let stats = if is_done {
            let stats = EpisodeStats {
                reward: self.episode_reward,
                length: self.episode_length,
            };
            self.episode_reward = 0.0;
            self.episode_length = 0;
            Some(stats)
        } else {
            None
        };

        Ok((record, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        replay_buffer::{
            SimpleReplayBuffer, SimpleReplayBufferConfig, SimpleStepProcessor,
            SimpleStepProcessorConfig,
        },
        test_util::{ChainEnv, CountingAgent, VecBatch},
    };

    type StepProc = SimpleStepProcessor<ChainEnv, VecBatch, VecBatch>;
    type ReplayBuffer = SimpleReplayBuffer<VecBatch, VecBatch>;

    #[test]
    fn test_sampler_reports_finished_episodes() -> Result<()> {
        let env = ChainEnv::build(&3, 0)?;
        let step_proc = StepProc::build(&SimpleStepProcessorConfig::default());
        let mut sampler = Sampler::new(env, step_proc);
        let mut buffer = ReplayBuffer::build(&SimpleReplayBufferConfig::default());
        let mut agent: Box<dyn Agent<ChainEnv, ReplayBuffer>> =
            Box::new(CountingAgent::default());

        let mut finished = vec![];
        for _ in 0..7 {
            let (_, stats) = sampler.sample_and_push(&mut agent, &mut buffer)?;
            finished.extend(stats);
        }

        assert_eq!(buffer.len(), 7);
        assert_eq!(
            finished,
            vec![
                EpisodeStats {
                    reward: 3.0,
                    length: 3
                };
                2
            ]
        );
        Ok(())
    }
}
