//! Entry points of the binary, generic over the emulator.
use crate::DqnAtariConfig;
use anyhow::Result;
use deepq_atari_env::{AtariActBatch, AtariEnv, AtariObsBatch, Emulator};
use deepq_candle_agent::{dqn::Dqn as Dqn_, qnet::QNet};
use deepq_core::{
    record::{AggregateRecorder, NullRecorder},
    replay_buffer::{SimpleReplayBuffer, SimpleStepProcessor, SimpleStepProcessorConfig},
    Agent, Configurable, DefaultEvaluator, Env as _, EnvSpec, Evaluator as _, RandomAgent,
    ReplayBufferBase, StepProcessor, TrainSummary, Trainer,
};
use deepq_tensorboard::TensorboardRecorder;
use log::info;
use std::{fs, path::Path};

pub type Env<M> = AtariEnv<M>;
pub type ReplayBuffer = SimpleReplayBuffer<AtariObsBatch, AtariActBatch>;
pub type StepProc<M> = SimpleStepProcessor<Env<M>, AtariObsBatch, AtariActBatch>;
pub type Dqn<M> = Dqn_<Env<M>, QNet, ReplayBuffer>;
pub type Evaluator<M> = DefaultEvaluator<Env<M>>;

fn create_recorder(config: &DqnAtariConfig) -> Result<Box<dyn AggregateRecorder>> {
    if config.logging {
        let recorder = TensorboardRecorder::new(&config.log_dir)?;
        recorder.log_params(config)?;
        Ok(Box::new(recorder))
    } else {
        Ok(Box::new(NullRecorder::new()))
    }
}

fn eval_spec<M: Emulator + 'static>(config: &DqnAtariConfig) -> Result<EnvSpec> {
    Ok(Env::<M>::build(&config.eval_env_config(), config.seeds.test)?.spec())
}

/// Prints the configuration as YAML.
pub fn show_config(config: &DqnAtariConfig) -> Result<String> {
    Ok(serde_yaml::to_string(config)?)
}

/// Trains a DQN agent.
///
/// The configuration is saved as `config.yaml` in the model directory, next
/// to the checkpoints.
pub fn train<M: Emulator + 'static>(config: &DqnAtariConfig) -> Result<TrainSummary> {
    config.validate()?;

    let env = Env::<M>::build(&config.env, config.seeds.train)?;
    let spec = env.spec();
    let agent_config = config.agent_config(&spec)?;
    if let Some(model_dir) = &config.trainer.model_dir {
        fs::create_dir_all(model_dir)?;
        config.save(Path::new(model_dir).join("config.yaml"))?;
    }

    let mut agent: Box<dyn Agent<Env<M>, ReplayBuffer>> = Box::new(Dqn::<M>::build(agent_config)?);
    info!(
        "Replay buffer of {} transitions takes {:.1} GiB when full",
        config.replay_buffer.capacity,
        config.replay_buffer_bytes() as f64 / (1u64 << 30) as f64
    );
    let mut buffer = ReplayBuffer::build(&config.replay_buffer);
    let step_proc = StepProc::<M>::build(&SimpleStepProcessorConfig::default());
    let mut recorder = create_recorder(config)?;
    let mut evaluator = Evaluator::<M>::new(
        &config.eval_env_config(),
        config.seeds.test,
        config.n_episodes_per_eval,
    )?;
    let mut trainer = Trainer::build(config.trainer.clone())?;

    let summary = trainer.train(
        env,
        step_proc,
        &mut agent,
        &mut buffer,
        &mut recorder,
        &mut evaluator,
    )?;
    recorder.finish();
    info!(
        "Finished training: {} env steps, {} opt steps, {} episodes, best eval reward {:?}",
        summary.env_steps, summary.opt_steps, summary.episodes, summary.best_eval_reward
    );

    Ok(summary)
}

/// Evaluates the agent saved in `model_dir` and returns the mean return.
pub fn eval<M: Emulator + 'static>(config: &DqnAtariConfig, model_dir: &Path) -> Result<f32> {
    config.validate()?;

    let spec = eval_spec::<M>(config)?;
    let mut agent: Box<dyn Agent<Env<M>, ReplayBuffer>> =
        Box::new(Dqn::<M>::build(config.agent_config(&spec)?)?);
    agent.load_params(model_dir)?;
    agent.eval();

    let mut evaluator = Evaluator::<M>::new(
        &config.eval_env_config(),
        config.seeds.test,
        config.n_episodes_per_eval,
    )?;
    let reward = evaluator.evaluate(&mut agent)?.get_scalar("eval_reward")?;
    info!(
        "Mean return of {:?} over {} episodes: {}",
        model_dir, config.n_episodes_per_eval, reward
    );

    Ok(reward)
}

/// Evaluates a uniformly random agent and returns the mean return.
pub fn random<M: Emulator + 'static>(config: &DqnAtariConfig) -> Result<f32> {
    config.validate()?;

    let spec = eval_spec::<M>(config)?;
    let mut agent: Box<dyn Agent<Env<M>, ReplayBuffer>> =
        Box::new(RandomAgent::new(&spec, config.seeds.test as u64));
    let mut evaluator = Evaluator::<M>::new(
        &config.eval_env_config(),
        config.seeds.test,
        config.n_episodes_per_eval,
    )?;
    let reward = evaluator.evaluate(&mut agent)?.get_scalar("eval_reward")?;
    info!(
        "Mean return of the random agent over {} episodes: {}",
        config.n_episodes_per_eval, reward
    );

    Ok(reward)
}
