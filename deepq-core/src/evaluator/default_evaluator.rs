//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{record::Record, Agent, Env, ReplayBufferBase};
use anyhow::Result;

/// Runs a fixed number of episodes and scores the agent with the mean return.
///
/// The evaluation environment is separate from the training one, so
/// evaluating never disturbs an ongoing training episode.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<R>(&mut self, agent: &mut Box<dyn Agent<E, R>>) -> Result<Record>
    where
        R: ReplayBufferBase,
    {
        let mut r_total = 0f32;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;

            loop {
                let act = agent.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act)?;
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
        }

        Ok(Record::from_scalar(
            "eval_reward",
            r_total / self.n_episodes as f32,
        ))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration of the evaluation environment
    /// * `seed` - Random seed of the evaluation environment
    /// * `n_episodes` - Number of episodes per evaluation, at least 1
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            return Err(crate::error::DeepqError::InvalidConfig(
                "n_episodes of the evaluator must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}
