//! Configuration of [`AtariEnv`](super::AtariEnv).
//!
//! If environment variable `ATARI_ROM_DIR` exists, it is used as the directory
//! from which ROM images of the Atari games are loaded. Otherwise ROMs are
//! looked up in `$HOME/atari_rom`.
use crate::EpisodeRecorderConfig;
use anyhow::Result;
use deepq_core::error::DeepqError;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    env,
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

fn default_rom_dir() -> String {
    if let Ok(var) = env::var("ATARI_ROM_DIR") {
        var
    } else {
        dirs::home_dir()
            .map(|p| p.join("atari_rom").to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Configurations of [`AtariEnv`](super::AtariEnv).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AtariEnvConfig {
    /// Name of the game, the ROM file without `.bin`.
    pub name: String,

    pub rom_dir: String,

    /// Emulator frames per agent step.
    pub frame_skip: usize,

    /// The number of preprocessed frames in an observation.
    pub frame_stack: usize,

    /// Frames are resized to `patch_size` × `patch_size`.
    pub patch_size: usize,

    pub grayscale: bool,

    /// Upper bound of the random number of no-ops at the start of a game.
    pub noop_max: usize,

    pub clip_rewards: bool,

    /// A lost life ends the episode.
    pub episode_life: bool,

    /// Press FIRE at reset in games whose second action is FIRE.
    pub fire_reset: bool,

    /// Episodes are truncated after this many agent steps.
    pub max_episode_steps: Option<usize>,

    /// Probability that the emulator repeats the previous action.
    pub repeat_action_probability: f32,

    /// Saves frames of episodes as PNG files.
    pub record: Option<EpisodeRecorderConfig>,
}

impl Default for AtariEnvConfig {
    fn default() -> Self {
        Self {
            name: "".to_string(),
            rom_dir: default_rom_dir(),
            frame_skip: 4,
            frame_stack: 4,
            patch_size: 84,
            grayscale: true,
            noop_max: 30,
            clip_rewards: true,
            episode_life: true,
            fire_reset: true,
            max_episode_steps: Some(27_000),
            repeat_action_probability: 0.0,
            record: None,
        }
    }
}

impl AtariEnvConfig {
    /// Sets the name of the game.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn rom_dir(mut self, rom_dir: impl Into<String>) -> Self {
        self.rom_dir = rom_dir.into();
        self
    }

    pub fn frame_skip(mut self, v: usize) -> Self {
        self.frame_skip = v;
        self
    }

    pub fn frame_stack(mut self, v: usize) -> Self {
        self.frame_stack = v;
        self
    }

    pub fn patch_size(mut self, v: usize) -> Self {
        self.patch_size = v;
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.grayscale = v;
        self
    }

    pub fn noop_max(mut self, v: usize) -> Self {
        self.noop_max = v;
        self
    }

    pub fn clip_rewards(mut self, v: bool) -> Self {
        self.clip_rewards = v;
        self
    }

    pub fn episode_life(mut self, v: bool) -> Self {
        self.episode_life = v;
        self
    }

    pub fn fire_reset(mut self, v: bool) -> Self {
        self.fire_reset = v;
        self
    }

    pub fn max_episode_steps(mut self, v: Option<usize>) -> Self {
        self.max_episode_steps = v;
        self
    }

    pub fn repeat_action_probability(mut self, v: f32) -> Self {
        self.repeat_action_probability = v;
        self
    }

    pub fn record(mut self, v: Option<EpisodeRecorderConfig>) -> Self {
        self.record = v;
        self
    }

    /// Evaluation setting: whole games with raw rewards.
    pub fn eval(mut self) -> Self {
        self.episode_life = false;
        self.clip_rewards = false;
        self
    }

    /// Path of the ROM file.
    pub fn rom_path(&self) -> PathBuf {
        Path::new(&self.rom_dir).join(format!("{}.bin", self.name))
    }

    /// Number of channels of a preprocessed frame.
    pub fn channels(&self) -> usize {
        if self.grayscale {
            1
        } else {
            3
        }
    }

    /// Shape of an observation, `[frame_stack * channels, patch_size, patch_size]`.
    pub fn obs_shape(&self) -> [usize; 3] {
        [
            self.frame_stack * self.channels(),
            self.patch_size,
            self.patch_size,
        ]
    }

    pub fn validate(&self) -> Result<(), DeepqError> {
        let check = |ok: bool, msg: &str| {
            if ok {
                Ok(())
            } else {
                Err(DeepqError::InvalidConfig(msg.to_string()))
            }
        };
        check(self.frame_skip > 0, "frame_skip must be positive")?;
        check(self.frame_stack > 0, "frame_stack must be positive")?;
        check(self.patch_size > 0, "patch_size must be positive")?;
        check(
            (0.0..=1.0).contains(&self.repeat_action_probability),
            "repeat_action_probability must be in [0, 1]",
        )?;
        check(
            self.max_episode_steps != Some(0),
            "max_episode_steps must be positive",
        )?;
        if let Some(record) = &self.record {
            check(record.every > 0, "record.every must be positive")?;
        }
        Ok(())
    }

    /// Loads configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves configuration into a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
