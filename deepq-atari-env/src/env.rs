mod config;
use crate::{AtariAct, AtariObs, Emulator, EpisodeRecorder};
use anyhow::{Context, Result};
pub use config::AtariEnvConfig;
use deepq_core::{error::DeepqError, record::Record, Env, EnvSpec, Info, Step};
use image::{
    imageops::{grayscale, resize, FilterType::Triangle},
    ImageBuffer, Rgb,
};
use log::{debug, info};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const NOOP: usize = 0;
const FIRE: usize = 1;

/// Information attached to every step.
#[derive(Clone, Debug, PartialEq)]
pub struct AtariInfo {
    /// The sum of rewards over the skipped frames before clipping.
    pub raw_reward: f32,

    /// Remaining lives.
    pub lives: usize,

    /// The game is over, as opposed to the end of a life.
    pub real_done: bool,
}

impl Info for AtariInfo {}

/// Atari environment with DeepMind-style preprocessing.
///
/// The preprocessing is the same as
/// [`AtariWrapper`](https://stable-baselines3.readthedocs.io/en/master/common/atari_wrappers.html#stable_baselines3.common.atari_wrappers.AtariWrapper)
/// with frame stacking. See [`AtariEnvConfig`] for the settings.
///
/// With `episode_life`, an episode ends when a life is lost, but the game is
/// restarted only after it is over; the next episode continues the game after
/// a no-op. The random no-ops are applied when the game is restarted.
pub struct AtariEnv<M: Emulator> {
    config: AtariEnvConfig,
    emulator: M,

    // Seeds the no-ops, see `reset_with_index()`
    seed: i64,
    rng: SmallRng,

    // The game's second action is FIRE and the config asks to press it
    fire_reset: bool,

    // The last two screens, the newest last
    raw_frames: [Vec<u8>; 2],

    // Stacked preprocessed frames, the oldest first
    frames: Vec<u8>,

    // Lives at the previous step
    lives: usize,

    // Set unless the last step lost a life without ending the game
    needs_full_reset: bool,

    // Agent steps since the game was restarted
    elapsed: usize,

    // Agent steps in the current episode
    episode_steps: usize,

    recorder: Option<EpisodeRecorder>,
}

impl<M: Emulator> AtariEnv<M> {
    /// Wraps an emulator that has already been built.
    pub fn from_emulator(config: &AtariEnvConfig, emulator: M, seed: i64) -> Result<Self> {
        config.validate()?;

        let meanings = emulator.action_meanings();
        let fire_reset = config.fire_reset
            && meanings.len() >= 3
            && meanings.get(FIRE).map_or(false, |m| m == "FIRE");
        let screen_len = emulator.width() * emulator.height() * 3;
        let frames_len = config.obs_shape().iter().product();
        let recorder = config.record.clone().map(EpisodeRecorder::new);

        info!(
            "Atari environment {}: {} actions, observation {:?}",
            config.name,
            emulator.n_actions(),
            config.obs_shape()
        );

        Ok(Self {
            config: config.clone(),
            emulator,
            seed,
            rng: SmallRng::seed_from_u64(seed as u64),
            fire_reset,
            raw_frames: [vec![0; screen_len], vec![0; screen_len]],
            frames: vec![0; frames_len],
            lives: 0,
            needs_full_reset: true,
            elapsed: 0,
            episode_steps: 0,
            recorder,
        })
    }

    pub fn emulator(&self) -> &M {
        &self.emulator
    }

    pub fn config(&self) -> &AtariEnvConfig {
        &self.config
    }

    /// Applies an action for one frame, restarting the game if it ends
    /// outside of an agent step.
    fn act_in_reset(&mut self, ix: usize) {
        self.emulator.act(ix);
        if self.emulator.is_game_over() {
            self.emulator.reset();
        }
    }

    /// Repeats the action `frame_skip` times and returns the sum of rewards.
    fn skip_frames(&mut self, ix: usize) -> f32 {
        let mut total_reward = 0.0;
        for _ in 0..self.config.frame_skip {
            total_reward += self.emulator.act(ix) as f32;
            self.raw_frames.swap(0, 1);
            self.emulator.render_rgb24(&mut self.raw_frames[1]);
            if self.emulator.is_game_over() {
                break;
            }
        }
        total_reward
    }

    /// Pixel-wise max of the last two screens.
    fn max_pool(&self) -> Vec<u8> {
        self.raw_frames[0]
            .iter()
            .zip(self.raw_frames[1].iter())
            .map(|(&a, &b)| a.max(b))
            .collect()
    }

    /// Resizes an RGB screen and returns it channel-first.
    fn warp(&self, rgb: Vec<u8>) -> Result<Vec<u8>> {
        let (w, h) = (self.emulator.width() as u32, self.emulator.height() as u32);
        let p = self.config.patch_size as u32;
        let img = ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, rgb)
            .context("screen does not match the emulator size")?;
        let img = resize(&img, p, p, Triangle);

        if self.config.grayscale {
            Ok(grayscale(&img).into_raw())
        } else {
            let n = (p * p) as usize;
            let mut buf = vec![0u8; 3 * n];
            for (i, px) in img.into_raw().chunks(3).enumerate() {
                for (c, &v) in px.iter().enumerate() {
                    buf[c * n + i] = v;
                }
            }
            Ok(buf)
        }
    }

    fn stack_frame(&mut self, frame: &[u8]) {
        let start = self.frames.len() - frame.len();
        self.frames.copy_within(frame.len().., 0);
        self.frames[start..].copy_from_slice(frame);
    }

    fn clip_reward(&self, r: f32) -> f32 {
        if !self.config.clip_rewards {
            r
        } else if r > 0.0 {
            1.0
        } else if r < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    fn obs(&self) -> AtariObs {
        AtariObs {
            frames: self.frames.clone(),
            shape: self.config.obs_shape(),
        }
    }

    fn record_screen(&self) -> Result<()> {
        match &self.recorder {
            Some(recorder) => recorder.record(
                self.episode_steps,
                self.emulator.width(),
                self.emulator.height(),
                &self.raw_frames[1],
            ),
            None => Ok(()),
        }
    }
}

impl<M: Emulator> Env for AtariEnv<M> {
    type Config = AtariEnvConfig;
    type Obs = AtariObs;
    type Act = AtariAct;
    type Info = AtariInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let emulator = M::build(config, seed)?;
        Self::from_emulator(config, emulator, seed)
    }

    fn spec(&self) -> EnvSpec {
        EnvSpec {
            n_actions: self.emulator.n_actions(),
            obs_shape: self.config.obs_shape().to_vec(),
        }
    }

    fn step(&mut self, act: &AtariAct) -> Result<(Step<Self>, Record)> {
        let ix = act.act as usize;
        let n_actions = self.emulator.n_actions();
        if ix >= n_actions {
            return Err(DeepqError::InvalidAction { act: ix, n_actions }.into());
        }

        let raw_reward = self.skip_frames(ix);
        let frame = self.warp(self.max_pool())?;
        self.stack_frame(&frame);
        self.elapsed += 1;
        self.episode_steps += 1;
        self.record_screen()?;

        let real_done = self.emulator.is_game_over();
        let lives = self.emulator.lives();
        let life_lost = self.config.episode_life && lives < self.lives && lives > 0;
        self.lives = lives;
        let time_up = self
            .config
            .max_episode_steps
            .map_or(false, |max| self.elapsed >= max);

        let is_terminated = real_done || life_lost;
        let is_truncated = time_up && !is_terminated;
        self.needs_full_reset = real_done || time_up || !life_lost;

        let info = AtariInfo {
            raw_reward,
            lives,
            real_done,
        };
        let step = Step::new(
            self.obs(),
            *act,
            self.clip_reward(raw_reward),
            is_terminated,
            is_truncated,
            info,
            None,
        );
        Ok((step, Record::from_scalar("raw_reward", raw_reward)))
    }

    fn reset(&mut self) -> Result<AtariObs> {
        if self.needs_full_reset {
            self.emulator.reset();
            self.elapsed = 0;
            let n_noops = if self.config.noop_max > 0 {
                self.rng.gen_range(1..=self.config.noop_max)
            } else {
                0
            };
            debug!("Restart the game with {} no-ops", n_noops);
            for _ in 0..n_noops {
                self.act_in_reset(NOOP);
            }
        } else {
            // Advances from the lost life
            self.act_in_reset(NOOP);
        }

        if self.fire_reset {
            self.act_in_reset(FIRE);
            self.act_in_reset(2);
        }

        self.needs_full_reset = true;
        self.lives = self.emulator.lives();
        self.emulator.render_rgb24(&mut self.raw_frames[1]);
        let (prev, last) = self.raw_frames.split_at_mut(1);
        prev[0].copy_from_slice(&last[0]);

        let frame = self.warp(self.raw_frames[1].clone())?;
        for i in 0..self.config.frame_stack {
            self.frames[i * frame.len()..(i + 1) * frame.len()].copy_from_slice(&frame);
        }

        self.episode_steps = 0;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.start_episode()?;
        }
        self.record_screen()?;

        Ok(self.obs())
    }

    /// Restarts the game with the no-ops seeded by `seed + ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<AtariObs> {
        self.rng = SmallRng::seed_from_u64(self.seed.wrapping_add(ix as i64) as u64);
        self.needs_full_reset = true;
        self.reset()
    }
}
