//! Action selection and construction from configuration.
use super::Env;
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::{fs::File, io::BufReader, path::Path};

/// Selects actions from observations.
pub trait Policy<E: Env> {
    /// Returns the action taken on `obs`.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act>;
}

/// Objects built from a configuration value, such as agents.
pub trait Configurable<E: Env> {
    /// Configuration, usually read from YAML.
    type Config: Clone + DeserializeOwned;

    /// Constructs the object from its configuration.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Reads the configuration from a YAML file and builds the object.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let rdr = BufReader::new(File::open(path)?);
        Self::build(serde_yaml::from_reader(rdr)?)
    }
}
