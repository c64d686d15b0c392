//! Atari environment for deepq.
//!
//! [`AtariEnv`] applies the preprocessing of the DeepMind Atari setup on top
//! of an [`Emulator`] backend:
//!
//! * repeat each action `frame_skip` times and take the pixel-wise max of the
//!   last two frames,
//! * end the episode on a lost life while training (`episode_life`),
//! * start episodes with a random number of no-ops and press FIRE in games
//!   that need it,
//! * resize to `patch_size`×`patch_size`, optionally to grayscale, and stack
//!   the last `frame_stack` frames channel-first,
//! * clip rewards to their sign,
//! * truncate episodes at `max_episode_steps`.
//!
//! The Arcade Learning Environment backend, [`AleEmulator`], is available
//! with feature `ale`. It loads the ROM `<rom_dir>/<name>.bin`, where
//! `rom_dir` defaults to the environment variable `ATARI_ROM_DIR`.
//! An easy way to get the ROMs is the [AutoROM](https://pypi.org/project/AutoROM/)
//! Python package.
//!
//! ```bash
//! pip install autorom
//! mkdir $HOME/atari_rom
//! AutoROM --install-dir $HOME/atari_rom
//! export ATARI_ROM_DIR=$HOME/atari_rom
//! ```
//!
//! Here is an example of running Pong with a random agent.
//!
//! ```no_run
//! # #[cfg(feature = "ale")]
//! # fn main() -> anyhow::Result<()> {
//! use deepq_atari_env::{AleEmulator, AtariEnv, AtariEnvConfig};
//! use deepq_core::{DefaultEvaluator, Env as _, Evaluator as _, RandomAgent};
//! # use deepq_atari_env::{AtariActBatch, AtariObsBatch};
//! # use deepq_core::{replay_buffer::SimpleReplayBuffer, Agent};
//! # type ReplayBuffer = SimpleReplayBuffer<AtariObsBatch, AtariActBatch>;
//!
//! let config = AtariEnvConfig::default().name("pong").eval();
//! let spec = AtariEnv::<AleEmulator>::build(&config, 0)?.spec();
//! let mut agent: Box<dyn Agent<AtariEnv<AleEmulator>, ReplayBuffer>> =
//!     Box::new(RandomAgent::new(&spec, 42));
//! let record = DefaultEvaluator::<AtariEnv<AleEmulator>>::new(&config, 0, 5)?
//!     .evaluate(&mut agent)?;
//! println!("{:?}", record.get_scalar("eval_reward")?);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "ale"))]
//! # fn main() {}
//! ```
mod act;
mod emulator;
mod env;
mod obs;
mod recorder;
pub mod util;
pub use act::{AtariAct, AtariActBatch};
pub use emulator::Emulator;
pub use env::{AtariEnv, AtariEnvConfig, AtariInfo};
pub use obs::{AtariObs, AtariObsBatch};
pub use recorder::{EpisodeRecorder, EpisodeRecorderConfig};

#[cfg(feature = "ale")]
mod ale;
#[cfg(feature = "ale")]
pub use ale::{AleAction, AleEmulator};
