//! Scoring of agents.
use crate::{record::Record, Agent, Env, ReplayBufferBase};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Plays episodes with an agent and scores it.
pub trait Evaluator<E: Env> {
    /// Returns a record with the score under `eval_reward`.
    ///
    /// The agent is used as is; switching it to evaluation mode and back is
    /// up to the caller.
    fn evaluate<R>(&mut self, agent: &mut Box<dyn Agent<E, R>>) -> Result<Record>
    where
        R: ReplayBufferBase;
}
