//! Environment step.
use super::Env;
use anyhow::Result;

/// Environment-specific data attached to each [`Step`].
pub trait Info {}

impl Info for () {}

/// Outcome of one call to [`Env::step`]: the action taken, the next
/// observation and the reward.
///
/// Together with the previous observation, kept by a [`StepProcessor`], it
/// forms a transition.
pub struct Step<E: Env> {
    /// Action taken.
    pub act: E::Act,

    /// Observation after the action.
    pub obs: E::Obs,

    /// Reward of the step, after any clipping done by the environment.
    pub reward: f32,

    /// The game ended the episode (game over, or a lost life).
    pub is_terminated: bool,

    /// The time limit ended the episode.
    pub is_truncated: bool,

    /// Environment-specific data, see [`Info`].
    pub info: E::Info,

    /// Initial observation of the next episode.
    ///
    /// Set by [`Env::step_with_reset`] when the episode ends.
    pub init_obs: Option<E::Obs>,
}

impl<E: Env> Step<E> {
    /// Constructs a step; `init_obs` is usually `None` and is set by
    /// [`Env::step_with_reset`].
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
        init_obs: Option<E::Obs>,
    ) -> Self {
        Self {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
            init_obs,
        }
    }

    /// `true` if the episode ended for any reason.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// Turns [`Step`]s into the items stored in a replay buffer.
///
/// `Output` is the [`ExperienceBufferBase::Item`](crate::ExperienceBufferBase::Item)
/// of the buffer the [`Trainer`](crate::Trainer) pushes into.
pub trait StepProcessor<E: Env> {
    /// Configuration of the processor.
    type Config: Clone;

    /// Item pushed into the replay buffer.
    type Output;

    /// Constructs a processor.
    fn build(config: &Self::Config) -> Self;

    /// Resets the object with the first observation of an episode.
    fn reset(&mut self, init_obs: E::Obs);

    /// Pairs the step with the previous observation.
    fn process(&mut self, step: Step<E>) -> Result<Self::Output>;
}
