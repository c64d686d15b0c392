//! Arcade Learning Environment backend.
use crate::{AtariEnvConfig, Emulator};
use anyhow::{ensure, Context, Result};
use c_str_macro::c_str;
use log::info;
use std::{convert::TryFrom, ffi::CString, path::Path};

/// Actions of the ALE.
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum AleAction {
    Noop = 0,
    Fire = 1,
    Up = 2,
    Right = 3,
    Left = 4,
    Down = 5,
    UpRight = 6,
    UpLeft = 7,
    DownRight = 8,
    DownLeft = 9,
    UpFire = 10,
    RightFire = 11,
    LeftFire = 12,
    DownFire = 13,
    UpRightFire = 14,
    UpLeftFire = 15,
    DownRightFire = 16,
    DownLeftFire = 17,
}

impl TryFrom<i32> for AleAction {
    type Error = anyhow::Error;

    fn try_from(v: i32) -> Result<Self> {
        use AleAction::*;
        const ACTIONS: [AleAction; 18] = [
            Noop,
            Fire,
            Up,
            Right,
            Left,
            Down,
            UpRight,
            UpLeft,
            DownRight,
            DownLeft,
            UpFire,
            RightFire,
            LeftFire,
            DownFire,
            UpRightFire,
            UpLeftFire,
            DownRightFire,
            DownLeftFire,
        ];
        usize::try_from(v)
            .ok()
            .and_then(|ix| ACTIONS.get(ix).copied())
            .with_context(|| format!("unknown ALE action {}", v))
    }
}

/// The ALE playing one game with its minimal action set.
///
/// Frame skipping and sticky actions other than `repeat_action_probability`
/// are left to [`AtariEnv`](crate::AtariEnv), so the interface runs with
/// `frame_skip = 1`.
pub struct AleEmulator {
    inner: *mut atari_env_sys::ALEInterface,
    actions: Vec<AleAction>,
}

// The interface is owned by a single emulator and never shared.
unsafe impl Send for AleEmulator {}

impl Drop for AleEmulator {
    fn drop(&mut self) {
        unsafe {
            atari_env_sys::ALE_del(self.inner);
        }
    }
}

fn c_string(path: &Path) -> Result<CString> {
    let s = path
        .to_str()
        .with_context(|| format!("non UTF-8 path {:?}", path))?;
    Ok(CString::new(s)?)
}

impl AleEmulator {
    fn minimal_actions(ale: *mut atari_env_sys::ALEInterface) -> Result<Vec<AleAction>> {
        let n = unsafe { atari_env_sys::getMinimalActionSize(ale) } as usize;
        let mut buf = vec![0i32; n];
        unsafe {
            atari_env_sys::getMinimalActionSet(ale, buf.as_mut_ptr());
        }
        buf.into_iter().map(AleAction::try_from).collect()
    }

    /// Frame number of the current game.
    pub fn episode_frame_number(&self) -> i32 {
        unsafe { atari_env_sys::getEpisodeFrameNumber(self.inner) }
    }

    /// Saves the current screen as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = c_string(path.as_ref())?;
        unsafe {
            atari_env_sys::saveScreenPNG(self.inner, path.as_ptr());
        }
        Ok(())
    }
}

impl Emulator for AleEmulator {
    fn build(config: &AtariEnvConfig, seed: i64) -> Result<Self> {
        let rom_path = config.rom_path();
        ensure!(rom_path.is_file(), "ROM not found: {:?}", rom_path);
        let rom_path = c_string(&rom_path)?;

        let ale = unsafe { atari_env_sys::ALE_new() };
        unsafe {
            atari_env_sys::setInt(ale, c_str!("random_seed").as_ptr(), seed as i32);
            atari_env_sys::setBool(ale, c_str!("display_screen").as_ptr(), false);
            atari_env_sys::setBool(ale, c_str!("sound").as_ptr(), false);
            atari_env_sys::setBool(ale, c_str!("color_averaging").as_ptr(), false);
            atari_env_sys::setInt(ale, c_str!("frame_skip").as_ptr(), 1);
            atari_env_sys::setFloat(
                ale,
                c_str!("repeat_action_probability").as_ptr(),
                config.repeat_action_probability,
            );
            atari_env_sys::loadROM(ale, rom_path.as_ptr());
            atari_env_sys::reset_game(ale);
        }

        // The interface is released by Drop even if the action set is broken.
        let mut emulator = Self {
            inner: ale,
            actions: vec![],
        };
        emulator.actions = Self::minimal_actions(ale)?;
        info!(
            "Loaded {} with actions {:?}",
            config.name,
            emulator.action_meanings()
        );
        Ok(emulator)
    }

    fn n_actions(&self) -> usize {
        self.actions.len()
    }

    fn action_meanings(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.to_string()).collect()
    }

    fn act(&mut self, ix: usize) -> i32 {
        let action = self.actions.get(ix).copied().unwrap_or(AleAction::Noop);
        unsafe { atari_env_sys::act(self.inner, action as i32) }
    }

    fn is_game_over(&self) -> bool {
        unsafe { atari_env_sys::game_over(self.inner) }
    }

    fn lives(&self) -> usize {
        unsafe { atari_env_sys::lives(self.inner) as usize }
    }

    fn reset(&mut self) {
        unsafe {
            atari_env_sys::reset_game(self.inner);
        }
    }

    fn width(&self) -> usize {
        unsafe { atari_env_sys::getScreenWidth(self.inner) as usize }
    }

    fn height(&self) -> usize {
        unsafe { atari_env_sys::getScreenHeight(self.inner) as usize }
    }

    /// Always RGB regardless of endianness.
    fn render_rgb24(&self, buf: &mut [u8]) {
        unsafe {
            atari_env_sys::getScreenRGB2(self.inner, buf.as_mut_ptr());
        }
    }
}
