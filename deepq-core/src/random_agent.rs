//! Uniform random baseline.
use crate::{record::Record, Agent, Env, EnvSpec, Policy, ReplayBufferBase};
use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::{fs, path::Path};

/// A policy taking a uniformly random action at every step.
///
/// It learns nothing; optimization steps only count themselves.
pub struct RandomAgent {
    n_actions: usize,
    n_opts: usize,
    train: bool,
    rng: SmallRng,
}

impl RandomAgent {
    /// Constructs a random agent over the action set of `spec`.
    pub fn new(spec: &EnvSpec, seed: u64) -> Self {
        Self {
            n_actions: spec.n_actions,
            n_opts: 0,
            train: true,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Returns the number of optimization steps.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }
}

impl<E> Policy<E> for RandomAgent
where
    E: Env,
    E::Act: From<usize>,
{
    fn sample(&mut self, _obs: &E::Obs) -> Result<E::Act> {
        Ok(self.rng.gen_range(0..self.n_actions).into())
    }
}

impl<E, R> Agent<E, R> for RandomAgent
where
    E: Env,
    E::Act: From<usize>,
    R: ReplayBufferBase,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt_with_record(&mut self, _buffer: &mut R) -> Result<Record> {
        self.n_opts += 1;
        Ok(Record::empty())
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
