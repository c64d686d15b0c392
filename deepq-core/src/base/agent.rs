//! Learning agents.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// A [`Policy`] that learns from transitions in a replay buffer.
///
/// [`Trainer`](crate::Trainer) and [`Evaluator`](crate::Evaluator) hold
/// agents as `Box<dyn Agent<E, R>>`, so every method takes `self` by
/// reference.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Switches to training mode, where actions are explored.
    fn train(&mut self);

    /// Switches to evaluation mode, where actions are (mostly) greedy.
    fn eval(&mut self);

    /// `true` in training mode.
    fn is_train(&self) -> bool;

    /// Runs one learning update on a batch drawn from `buffer`.
    fn opt(&mut self, buffer: &mut R) -> Result<()> {
        self.opt_with_record(buffer).map(|_| ())
    }

    /// Same as [`Agent::opt`], returning values such as the loss.
    fn opt_with_record(&mut self, buffer: &mut R) -> Result<Record>;

    /// Writes a checkpoint into the directory `path`, creating it if needed.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Restores a checkpoint written by [`Agent::save_params`].
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
