use super::MlpConfig;
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let dims: Vec<usize> = std::iter::once(config.in_dim)
        .chain(config.units.iter().copied())
        .chain(std::iter::once(config.out_dim))
        .collect();
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, d)| Ok(linear(d[0], d[1], vs.pp(format!("ln{}", i)))?))
        .collect()
}

/// Multilayer perceptron with ReLU activation function.
///
/// The input is flattened from the second dimension and converted to `f32`.
/// No activation is applied to the output layer.
pub struct Mlp {
    device: Device,
    layers: Vec<Linear>,
}

impl Module for Mlp {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let mut xs = xs
            .to_device(&self.device)?
            .to_dtype(DType::F32)?
            .flatten_from(1)?;
        let n_layers = self.layers.len();

        for (i, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if i + 1 < n_layers {
                xs = xs.relu()?;
            }
        }

        Ok(xs)
    }
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        Ok(Module::forward(self, xs)?)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;
        Ok(Self { device, layers })
    }
}
