//! Backend of [`AtariEnv`](crate::AtariEnv).
use crate::AtariEnvConfig;
use anyhow::Result;

/// An Atari emulator.
///
/// Actions are indices into the action set returned by
/// [`action_meanings`](Emulator::action_meanings), so that an agent sees
/// `0..n_actions` whatever the game. One call of [`act`](Emulator::act)
/// advances the emulator by one frame.
pub trait Emulator {
    /// Builds the emulator for the game named in the configuration.
    fn build(config: &AtariEnvConfig, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// The number of actions.
    fn n_actions(&self) -> usize;

    /// Names of the actions, e.g. `NOOP` and `FIRE`.
    fn action_meanings(&self) -> Vec<String>;

    /// Applies the `ix`-th action for one frame and returns the reward.
    fn act(&mut self, ix: usize) -> i32;

    fn is_game_over(&self) -> bool;

    /// Remaining lives.
    fn lives(&self) -> usize;

    /// Starts a new game.
    fn reset(&mut self);

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Writes the screen as RGB, row by row, into `buf` of length
    /// `width * height * 3`.
    fn render_rgb24(&self, buf: &mut [u8]);
}
