//! Conversion of environment steps into transitions.
use super::{BatchBase, GenericTransitionBatch};
use crate::{Env, StepProcessor};
use anyhow::{Context, Result};
use std::{default::Default, marker::PhantomData};

/// Configuration for the simple step processor.
#[derive(Clone, Debug, Default)]
pub struct SimpleStepProcessorConfig {}

/// A generic implementation of the [`StepProcessor`] trait.
///
/// It keeps the previous observation and emits one-step transitions
/// `(o_t, a_t, o_t+1, r_t, terminated_t, truncated_t)`.
///
/// # Type Parameters
///
/// * `E` - The environment type
/// * `O` - The observation batch type, must implement `BatchBase` and `From<E::Obs>`
/// * `A` - The action batch type, must implement `BatchBase` and `From<E::Act>`
pub struct SimpleStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for SimpleStepProcessor<E, O, A>
where
    E: Env,
    O: BatchBase + From<E::Obs>,
    A: BatchBase + From<E::Act>,
{
    type Config = SimpleStepProcessorConfig;
    type Output = GenericTransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
    }

    /// Processes a step into a transition.
    ///
    /// Fails if [`reset`](Self::reset) was never called, or if the step ends
    /// the episode without carrying the initial observation of the next one.
    fn process(&mut self, step: crate::Step<E>) -> Result<Self::Output> {
        let is_done = step.is_done();
        let next_obs = step.obs.clone().into();
        let obs = self
            .prev_obs
            .replace(step.obs.into())
            .context("prev_obs is not set. Forgot to call reset()?")?;

        if is_done {
            let init_obs = step
                .init_obs
                .context("init_obs must be set at the end of an episode")?;
            self.prev_obs.replace(init_obs.into());
        }

        Ok(GenericTransitionBatch {
            obs,
            act: step.act.into(),
            next_obs,
            reward: vec![step.reward],
            is_terminated: vec![step.is_terminated as i8],
            is_truncated: vec![step.is_truncated as i8],
        })
    }
}
