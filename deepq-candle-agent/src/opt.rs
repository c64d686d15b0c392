//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::{
    adam::{Adam, ParamsAdam},
    rmsprop::{ParamsRMSprop, RMSprop},
};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training the Q-network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Decay rate of the second moment.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Term added to the denominator.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// RMSprop optimizer, as used for Atari in the DQN paper.
    RmsProp {
        /// Learning rate.
        lr: f64,
        /// Smoothing constant of the squared gradient average.
        alpha: f64,
        /// Momentum factor.
        momentum: f64,
        /// Term added to the denominator.
        eps: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// RMSprop with the hyperparameters commonly used for Atari.
    pub fn rmsprop_atari() -> Self {
        Self::RmsProp {
            lr: 2.5e-4,
            alpha: 0.95,
            momentum: 0.95,
            eps: 0.01,
        }
    }

    /// Constructs the optimizer over `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars, params)?;
                Ok(Optimizer::AdamW(opt))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
            OptimizerConfig::RmsProp {
                lr,
                alpha,
                momentum,
                eps,
            } => {
                let params = ParamsRMSprop {
                    lr: *lr,
                    alpha: *alpha,
                    eps: *eps,
                    momentum: Some(*momentum),
                    ..ParamsRMSprop::default()
                };
                let opt = RMSprop::new(vars, params)?;
                Ok(Optimizer::RmsProp(opt))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
            Self::RmsProp {
                lr: _,
                alpha,
                momentum,
                eps,
            } => Self::RmsProp {
                lr,
                alpha,
                momentum,
                eps,
            },
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let params = ParamsAdamW::default();
        Self::AdamW {
            lr: params.lr,
            beta1: params.beta1,
            beta2: params.beta2,
            eps: params.eps,
            weight_decay: params.weight_decay,
        }
    }
}

/// Optimizers.
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW),

    /// Adam optimizer.
    Adam(Adam),

    /// RMSprop optimizer.
    RmsProp(RMSprop),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
            Self::RmsProp(opt) => Ok(opt.backward_step(loss)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_serde_optimizer_config() -> Result<()> {
        let config = OptimizerConfig::rmsprop_atari().learning_rate(1e-4);
        let yaml = serde_yaml::to_string(&config)?;
        let config_: OptimizerConfig = serde_yaml::from_str(&yaml)?;
        assert_eq!(config, config_);

        let config: OptimizerConfig = serde_yaml::from_str("AdamW:\n  lr: 0.001\n")?;
        assert_eq!(config, OptimizerConfig::default().learning_rate(0.001));
        Ok(())
    }

    #[test]
    fn test_every_optimizer_decreases_a_quadratic() -> Result<()> {
        for config in [
            OptimizerConfig::default().learning_rate(0.1),
            OptimizerConfig::Adam { lr: 0.1 },
            OptimizerConfig::rmsprop_atari().learning_rate(0.01),
        ] {
            let x = Var::ones(2, DType::F32, &Device::Cpu)?;
            let mut opt = config.build(vec![x.clone()])?;
            let loss = |x: &Var| -> Result<Tensor> { Ok(x.as_tensor().sqr()?.sum_all()?) };
            let before = loss(&x)?.to_scalar::<f32>()?;
            for _ in 0..5 {
                opt.backward_step(&loss(&x)?)?;
            }
            let after = loss(&x)?.to_scalar::<f32>()?;
            assert!(after < before, "{:?}", config);
        }
        Ok(())
    }
}
