//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{DType, Tensor};
use candle_nn::VarMap;
use serde::{Deserialize, Serialize};

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl Default for CriticLoss {
    fn default() -> Self {
        Self::SmoothL1
    }
}

/// Copies the variables of `src` into those of `dest`.
///
/// Variables are identified by their names; every variable of `dest` must
/// exist in `src`.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = dest.data().lock().map_err(|_| anyhow!("lock failed"))?;
    let src = src.data().lock().map_err(|_| anyhow!("lock failed"))?;

    for (name, v_dest) in dest.iter() {
        let v_src = src
            .get(name)
            .ok_or_else(|| anyhow!("Missing var {}", name))?;
        v_dest.set(&v_src.as_tensor().detach())?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = m1.ones_like()?.sub(&m1)?;
    ((0.5 * m1)?.mul(&d.powf(2.0)?)? + m2.mul(&(d - 0.5)?)?)?.mean_all()
}

/// Returns the index of the largest value, the first one on ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
