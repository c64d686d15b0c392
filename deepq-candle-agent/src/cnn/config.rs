use crate::util::OutDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Cnn`](super::Cnn).
pub struct CnnConfig {
    /// Shape of the input, `[channels, height, width]`.
    pub in_shape: [usize; 3],

    /// Number of actions.
    pub out_dim: usize,
}

impl CnnConfig {
    /// Constructs [`CnnConfig`].
    pub fn new(in_shape: [usize; 3], out_dim: usize) -> Self {
        Self { in_shape, out_dim }
    }
}

impl OutDim for CnnConfig {
    fn get_out_dim(&self) -> usize {
        self.out_dim
    }

    fn set_out_dim(&mut self, out_dim: usize) {
        self.out_dim = out_dim;
    }
}
