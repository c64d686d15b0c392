//! Writes raw frames of episodes as PNG files.
use anyhow::{Context, Result};
use image::{ImageBuffer, Rgb};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Configuration of [`EpisodeRecorder`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EpisodeRecorderConfig {
    /// Root directory of the frames.
    pub dir: String,

    /// Every `every`-th episode is recorded, starting with the first one.
    pub every: usize,

    /// Prefix of the directory of an episode.
    pub prefix: String,
}

impl Default for EpisodeRecorderConfig {
    fn default() -> Self {
        Self {
            dir: "./frames".to_string(),
            every: 1,
            prefix: "atari".to_string(),
        }
    }
}

impl EpisodeRecorderConfig {
    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn every(mut self, every: usize) -> Self {
        self.every = every;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Saves frames to `<dir>/<prefix>-episode-<n>/<step>.png`.
pub struct EpisodeRecorder {
    config: EpisodeRecorderConfig,
    n_episodes: usize,
    episode_dir: Option<PathBuf>,
}

impl EpisodeRecorder {
    pub fn new(config: EpisodeRecorderConfig) -> Self {
        Self {
            config,
            n_episodes: 0,
            episode_dir: None,
        }
    }

    /// Directory of the episode being recorded, if any.
    pub fn episode_dir(&self) -> Option<&Path> {
        self.episode_dir.as_deref()
    }

    /// Starts the next episode.
    pub fn start_episode(&mut self) -> Result<()> {
        let n = self.n_episodes;
        self.n_episodes += 1;

        self.episode_dir = if n % self.config.every.max(1) == 0 {
            let dir = Path::new(&self.config.dir)
                .join(format!("{}-episode-{}", self.config.prefix, n));
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {:?}", dir))?;
            debug!("Recording episode {} to {:?}", n, dir);
            Some(dir)
        } else {
            None
        };
        Ok(())
    }

    /// Saves an RGB frame of the current episode if it is recorded.
    pub fn record(&self, step: usize, width: usize, height: usize, rgb: &[u8]) -> Result<()> {
        if let Some(dir) = &self.episode_dir {
            let img = ImageBuffer::<Rgb<u8>, _>::from_raw(width as u32, height as u32, rgb)
                .context("frame does not match the screen size")?;
            let path = dir.join(format!("{}.png", step));
            img.save(&path)
                .with_context(|| format!("failed to save {:?}", path))?;
        }
        Ok(())
    }
}
