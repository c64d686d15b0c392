//! Configuration of a run, loaded from a single YAML file.
use anyhow::{Context, Result};
use deepq_atari_env::{AtariEnvConfig, EpisodeRecorderConfig};
use deepq_candle_agent::{dqn::DqnConfig, qnet::QNetConfig};
use deepq_core::{replay_buffer::SimpleReplayBufferConfig, EnvSpec, TrainerConfig};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Settings of the evaluation environment that differ from the training one.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct EvalEnvConfig {
    /// Saves frames of evaluation episodes.
    #[serde(default)]
    pub record: Option<EpisodeRecorderConfig>,
}

/// Random seeds of the environments.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Seeds {
    pub train: i64,
    pub test: i64,
}

impl Default for Seeds {
    fn default() -> Self {
        Self {
            train: 42,
            test: 1000,
        }
    }
}

fn default_n_episodes_per_eval() -> usize {
    5
}

fn default_logging() -> bool {
    true
}

fn default_log_dir() -> String {
    "./runs".to_string()
}

/// Configuration of training and evaluating DQN on an Atari game.
///
/// `agent.model_config.q_config.in_shape` and `out_dim` are filled in from
/// the environment and may be left out of the file.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DqnAtariConfig {
    pub env: AtariEnvConfig,

    #[serde(default)]
    pub eval_env: EvalEnvConfig,

    pub agent: DqnConfig<QNetConfig>,

    #[serde(default)]
    pub trainer: TrainerConfig,

    #[serde(default)]
    pub replay_buffer: SimpleReplayBufferConfig,

    #[serde(default)]
    pub seeds: Seeds,

    #[serde(default = "default_n_episodes_per_eval")]
    pub n_episodes_per_eval: usize,

    /// Write TensorBoard logs.
    #[serde(default = "default_logging")]
    pub logging: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl DqnAtariConfig {
    /// Loads configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)
            .with_context(|| format!("failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Saves configuration into a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.env.validate()?;
        self.trainer.validate()?;
        anyhow::ensure!(
            self.n_episodes_per_eval > 0,
            "n_episodes_per_eval must be positive"
        );
        Ok(())
    }

    /// Bytes taken by the observations of a full replay buffer.
    ///
    /// Each transition keeps both its observation and the next one, so a
    /// stacked frame is stored twice.
    pub fn replay_buffer_bytes(&self) -> usize {
        let obs_bytes: usize = self.env.obs_shape().iter().product();
        2 * self.replay_buffer.capacity * obs_bytes
    }

    /// The evaluation environment plays whole games with raw rewards.
    pub fn eval_env_config(&self) -> AtariEnvConfig {
        self.env
            .clone()
            .eval()
            .record(self.eval_env.record.clone())
    }

    /// Agent configuration with the shape of the Q-network set for `spec`.
    pub fn agent_config(&self, spec: &EnvSpec) -> Result<DqnConfig<QNetConfig>> {
        let mut agent = self.agent.clone();
        let q_config = agent
            .model_config
            .q_config
            .take()
            .context("agent.model_config.q_config is missing")?;
        Ok(agent
            .q_config(q_config.in_shape(spec.obs_shape.clone()))
            .out_dim(spec.n_actions))
    }
}
