use anyhow::Result;
use deepq_atari_env::{
    util::test::{env_config, Env, ReplayBuffer, ScriptedEmulator, StepProc, SCREEN_WIDTH},
    AtariAct, AtariEnv, AtariEnvConfig, AtariObs, EpisodeRecorderConfig,
};
use deepq_core::{
    error::DeepqError,
    replay_buffer::{SimpleReplayBufferConfig, SimpleStepProcessorConfig},
    Env as _, ExperienceBufferBase, ReplayBufferBase, StepProcessor, TransitionBatch,
};
use tempdir::TempDir;

fn build(config: &AtariEnvConfig, emulator: ScriptedEmulator) -> Result<Env> {
    AtariEnv::from_emulator(config, emulator, 42)
}

fn noop() -> AtariAct {
    AtariAct::new(0)
}

fn close(a: u8, b: u8) -> bool {
    (a as i32 - b as i32).abs() <= 2
}

#[test]
fn test_observation_shape() -> Result<()> {
    let mut env = Env::build(&env_config(), 0)?;
    let spec = env.spec();
    assert_eq!(spec.n_actions, 4);
    assert_eq!(spec.obs_shape, vec![4, 8, 8]);

    let obs = env.reset()?;
    assert_eq!(obs.shape, [4, 8, 8]);
    assert_eq!(obs.frames.len(), 4 * 8 * 8);

    let (step, _) = env.step(&noop())?;
    assert_eq!(step.obs.shape, [4, 8, 8]);

    let config = env_config().grayscale(false).frame_stack(2);
    let mut env = Env::build(&config, 0)?;
    assert_eq!(env.reset()?.shape, [6, 8, 8]);
    Ok(())
}

#[test]
fn test_frame_stacking() -> Result<()> {
    let mut env = build(&env_config(), ScriptedEmulator::default())?;
    let obs0 = env.reset()?;
    for i in 1..4 {
        assert_eq!(obs0.channel(0), obs0.channel(i));
    }

    let (step1, _) = env.step(&noop())?;
    let (step2, _) = env.step(&noop())?;
    let (obs1, obs2): (&AtariObs, &AtariObs) = (&step1.obs, &step2.obs);
    for i in 0..3 {
        assert_eq!(obs1.channel(i), obs0.channel(i + 1));
        assert_eq!(obs2.channel(i), obs1.channel(i + 1));
    }
    assert_ne!(obs1.channel(3), obs0.channel(3));
    assert_ne!(obs2.channel(3), obs1.channel(3));
    Ok(())
}

#[test]
fn test_max_pooling_of_last_two_frames() -> Result<()> {
    // Keep the screen size so that pixels stay in their half
    let config = env_config()
        .grayscale(false)
        .patch_size(SCREEN_WIDTH)
        .frame_skip(2)
        .frame_stack(1);
    let mut env = build(&config, ScriptedEmulator::default())?;
    env.reset()?;

    // Frame 1 lights the right half, frame 2 the left half
    let (step, _) = env.step(&noop())?;
    let red = step.obs.channel(0);
    let row = SCREEN_WIDTH * (SCREEN_WIDTH / 2);
    assert!(close(red[row + 1], ScriptedEmulator::brightness(2)));
    assert!(close(
        red[row + SCREEN_WIDTH - 2],
        ScriptedEmulator::brightness(1)
    ));
    Ok(())
}

#[test]
fn test_reward_clipping() -> Result<()> {
    let mut env = build(&env_config(), ScriptedEmulator::default())?;
    env.reset()?;

    let (step, record) = env.step(&AtariAct::new(2))?;
    assert_eq!(step.reward, 1.0);
    assert_eq!(step.info.raw_reward, 8.0);
    assert_eq!(record.get_scalar("raw_reward")?, 8.0);

    let (step, _) = env.step(&AtariAct::new(3))?;
    assert_eq!(step.reward, -1.0);
    assert_eq!(step.info.raw_reward, -12.0);

    let (step, _) = env.step(&noop())?;
    assert_eq!(step.reward, 0.0);

    let mut env = build(&env_config().eval(), ScriptedEmulator::default())?;
    env.reset()?;
    let (step, _) = env.step(&AtariAct::new(2))?;
    assert_eq!(step.reward, 8.0);
    Ok(())
}

#[test]
fn test_life_loss_ends_episode() -> Result<()> {
    // 40 frames per life, 4 frames per step
    let mut env = build(&env_config(), ScriptedEmulator::default())?;
    env.reset()?;
    assert_eq!(env.emulator().n_resets(), 1);

    for _ in 0..9 {
        let (step, _) = env.step(&noop())?;
        assert!(!step.is_done());
    }
    let (step, _) = env.step(&noop())?;
    assert!(step.is_terminated);
    assert!(!step.is_truncated);
    assert!(!step.info.real_done);
    assert_eq!(step.info.lives, 2);

    // Continues the game after a no-op
    env.reset()?;
    assert_eq!(env.emulator().n_resets(), 1);
    assert_eq!(env.emulator().t(), 41);

    // Plays until the game is over
    let mut n_episodes = 1;
    loop {
        let (step, _) = env.step(&noop())?;
        if step.info.real_done {
            assert!(step.is_terminated);
            assert_eq!(step.info.lives, 0);
            break;
        }
        if step.is_done() {
            n_episodes += 1;
            env.reset()?;
        }
    }
    assert_eq!(n_episodes, 2);

    env.reset()?;
    assert_eq!(env.emulator().n_resets(), 2);
    assert_eq!(env.emulator().t(), 0);
    Ok(())
}

#[test]
fn test_lost_life_does_not_end_episode_without_episode_life() -> Result<()> {
    let config = env_config().episode_life(false);
    let mut env = build(&config, ScriptedEmulator::default())?;
    env.reset()?;

    for _ in 0..29 {
        let (step, _) = env.step(&noop())?;
        assert!(!step.is_done());
    }
    let (step, _) = env.step(&noop())?;
    assert!(step.is_terminated);
    assert!(step.info.real_done);
    Ok(())
}

#[test]
fn test_truncation() -> Result<()> {
    let config = env_config().max_episode_steps(Some(3));
    let mut env = build(&config, ScriptedEmulator::default())?;
    env.reset()?;

    env.step(&noop())?;
    env.step(&noop())?;
    let (step, _) = env.step(&noop())?;
    assert!(step.is_truncated);
    assert!(!step.is_terminated);

    env.reset()?;
    assert_eq!(env.emulator().n_resets(), 2);
    let (step, _) = env.step(&noop())?;
    assert!(!step.is_done());
    Ok(())
}

#[test]
fn test_invalid_action() -> Result<()> {
    let mut env = build(&env_config(), ScriptedEmulator::default())?;
    env.reset()?;

    let err = match env.step(&AtariAct::new(4)) {
        Ok(_) => panic!("action 4 should be rejected"),
        Err(e) => e,
    };
    match err.downcast_ref::<DeepqError>() {
        Some(DeepqError::InvalidAction { act, n_actions }) => {
            assert_eq!((*act, *n_actions), (4, 4));
        }
        _ => panic!("unexpected error: {}", err),
    }
    Ok(())
}

#[test]
fn test_noop_reset() -> Result<()> {
    let config = env_config().noop_max(5);
    let mut env = build(&config, ScriptedEmulator::default())?;

    let mut counts = vec![];
    for ix in 0..20 {
        env.reset_with_index(ix)?;
        let actions = env.emulator().actions();
        assert!((1..=5).contains(&actions.len()));
        assert!(actions.iter().all(|&a| a == 0));
        counts.push(actions.len());
    }
    assert!(counts.iter().any(|&n| n != counts[0]));

    // The same index gives the same no-ops
    let mut env2 = build(&config, ScriptedEmulator::default())?;
    env2.reset_with_index(7)?;
    env.reset_with_index(7)?;
    assert_eq!(env.emulator().actions(), env2.emulator().actions());
    Ok(())
}

#[test]
fn test_fire_reset() -> Result<()> {
    let config = env_config().fire_reset(true);
    let mut env = build(&config, ScriptedEmulator::default())?;
    env.reset()?;
    assert_eq!(env.emulator().actions(), &[1, 2]);

    let mut env = build(&config, ScriptedEmulator::default().without_fire())?;
    env.reset()?;
    assert!(env.emulator().actions().is_empty());
    Ok(())
}

#[test]
fn test_png_recording() -> Result<()> {
    let tmp = TempDir::new("atari_recording")?;
    let record = EpisodeRecorderConfig::default()
        .dir(tmp.path().to_string_lossy())
        .prefix("scripted");
    let config = env_config().record(Some(record));
    let mut env = build(&config, ScriptedEmulator::default())?;

    env.reset()?;
    for _ in 0..3 {
        env.step(&noop())?;
    }
    env.reset()?;

    let episode = tmp.path().join("scripted-episode-0");
    for step in 0..4 {
        assert!(episode.join(format!("{}.png", step)).is_file());
    }
    assert!(!episode.join("4.png").exists());
    assert!(tmp.path().join("scripted-episode-1/0.png").is_file());

    let img = image::open(episode.join("0.png"))?.to_rgb8();
    assert_eq!(img.dimensions(), (16, 12));
    Ok(())
}

#[test]
fn test_transitions_in_replay_buffer() -> Result<()> {
    let mut env = build(&env_config(), ScriptedEmulator::default())?;
    let mut step_proc = StepProc::build(&SimpleStepProcessorConfig::default());
    let mut buffer = ReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(8));

    step_proc.reset(env.reset()?);
    for _ in 0..12 {
        let (step, _) = env.step_with_reset(&AtariAct::new(2))?;
        buffer.push(step_proc.process(step)?)?;
    }
    assert_eq!(buffer.len(), 8);

    let batch = buffer.batch(5)?;
    assert_eq!(batch.len(), 5);
    assert_eq!(batch.obs().n, 5);
    assert_eq!(batch.obs().buf.len(), 5 * 4 * 8 * 8);
    assert_eq!(batch.act().buf, vec![2; 5]);
    Ok(())
}

#[cfg(feature = "candle")]
#[test]
fn test_tensor_shapes() -> Result<()> {
    use candle_core::{DType, Tensor};
    use std::convert::TryInto;

    let mut env = build(&env_config(), ScriptedEmulator::default())?;
    let obs: Tensor = env.reset()?.try_into()?;
    assert_eq!(obs.dims(), &[1, 4, 8, 8]);
    assert_eq!(obs.dtype(), DType::U8);

    let act: Tensor = AtariAct::new(3).try_into()?;
    assert_eq!(act.dims(), &[1, 1]);
    assert_eq!(act.dtype(), DType::I64);
    Ok(())
}
